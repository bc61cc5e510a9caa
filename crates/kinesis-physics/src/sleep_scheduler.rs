//! Per-frame sleep/wake decisions for every physics body.
//!
//! Each body is evaluated against an ordered policy, first match wins:
//!
//! 1. A gameplay machine claims the body ([`WakeClaim`]) → Awake.
//! 2. A wake trigger fired this frame (frustum re-entry, or motion above the
//!    threshold after an external impulse) → Awake.
//! 3. Beyond the radial or vertical distance threshold → Asleep.
//! 4. Outside the view frustum → Asleep.
//! 5. Idle for longer than the inactivity threshold → Asleep.
//! 6. Otherwise → Awake.
//!
//! Triggers are detected once per frame time, so evaluating the same frame
//! twice yields the same decision and no further transitions.

use bevy_ecs::prelude::*;
use glam::Vec3;
use kinesis_config::SleepConfig;
use kinesis_ecs::{CameraRes, FrameClock, HookBuffer, Transform};

use crate::sync::sync_body_type;
use crate::{
    Body, PhysicsHandle, PhysicsWorld, SleepChanged, SleepState, ViewFrustum, WakeClaim,
};

/// Thresholds for the sleep/wake policy.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct SleepPolicy {
    /// Horizontal distance from the camera beyond which bodies sleep.
    pub radial_distance: f32,
    /// Vertical distance from the camera beyond which bodies sleep.
    pub vertical_distance: f32,
    /// Seconds without motion before a body sleeps.
    pub idle_seconds: f64,
    /// Speed above which a body counts as moving.
    pub motion_epsilon: f32,
}

impl From<&SleepConfig> for SleepPolicy {
    fn from(config: &SleepConfig) -> Self {
        Self {
            radial_distance: config.radial_distance,
            vertical_distance: config.vertical_distance,
            idle_seconds: config.idle_seconds,
            motion_epsilon: config.motion_epsilon,
        }
    }
}

impl Default for SleepPolicy {
    fn default() -> Self {
        Self::from(&SleepConfig::default())
    }
}

/// One body changing state during an [`update`](SleepPolicy::update).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepTransition {
    pub entity: Entity,
    pub from: SleepState,
    pub to: SleepState,
}

impl SleepPolicy {
    /// Evaluates every body and returns the transitions that happened.
    ///
    /// Refreshes camera distances and, when `frustum` is given, frustum
    /// membership before deciding. Velocities are never touched.
    pub fn update<'a>(
        &self,
        bodies: impl IntoIterator<Item = (Entity, Vec3, &'a mut Body, Option<&'a WakeClaim>)>,
        camera: &CameraRes,
        frustum: Option<&ViewFrustum>,
        frame_time: f64,
    ) -> Vec<SleepTransition> {
        let mut transitions = Vec::new();

        for (entity, position, body, claim) in bodies {
            body.refresh_view(position, camera.position, frustum);
            self.detect_triggers(body, frame_time);

            let next = self.decide(body, claim, frame_time);
            if next != body.sleep {
                tracing::trace!(
                    "Body {:?}: {:?} -> {:?} at t={:.3}",
                    entity,
                    body.sleep,
                    next,
                    frame_time
                );
                transitions.push(SleepTransition {
                    entity,
                    from: body.sleep,
                    to: next,
                });
                body.sleep = next;
            }
        }

        transitions
    }

    /// Records activity and wake triggers, once per frame time.
    fn detect_triggers(&self, body: &mut Body, frame_time: f64) {
        if body.last_eval == Some(frame_time) {
            return;
        }

        let moving = body.speed() > self.motion_epsilon;
        match body.sleep {
            SleepState::Awake => {
                if moving {
                    body.last_active = frame_time;
                }
            }
            SleepState::Asleep => {
                let reentered = body.in_frustum && !body.visible_at_last_eval;
                let struck = body.impact_speed > self.motion_epsilon;
                if reentered || struck {
                    body.wake_frame = Some(frame_time);
                    body.last_active = frame_time;
                }
            }
        }

        body.impact_speed = 0.0;
        body.visible_at_last_eval = body.in_frustum;
        body.last_eval = Some(frame_time);
    }

    fn decide(&self, body: &Body, claim: Option<&WakeClaim>, frame_time: f64) -> SleepState {
        if claim.is_some_and(|claim| claim.is_active(frame_time)) {
            return SleepState::Awake;
        }
        if body.wake_frame == Some(frame_time) {
            return SleepState::Awake;
        }
        if body.radial_distance > self.radial_distance
            || body.vertical_distance > self.vertical_distance
        {
            return SleepState::Asleep;
        }
        if !body.in_frustum {
            return SleepState::Asleep;
        }
        if frame_time - body.last_active > self.idle_seconds {
            return SleepState::Asleep;
        }
        SleepState::Awake
    }
}

/// Runs the scheduler over all bodies and mirrors transitions into rapier.
///
/// A sleeping body is parked in place as a kinematic rigid body; waking it
/// hands it back to the solver with the velocity retained on the [`Body`].
#[allow(clippy::type_complexity)]
pub fn sleep_wake_system(
    policy: Res<SleepPolicy>,
    clock: Res<FrameClock>,
    camera: Res<CameraRes>,
    physics: Option<ResMut<PhysicsWorld>>,
    mut hooks: ResMut<HookBuffer<SleepChanged>>,
    mut bodies: Query<(
        Entity,
        &Transform,
        &mut Body,
        Option<&WakeClaim>,
        Option<&PhysicsHandle>,
    )>,
) {
    let frame_time = clock.elapsed;
    let frustum = camera
        .view_projection
        .map(|vp| ViewFrustum::from_view_projection(&vp));

    let transitions = policy.update(
        bodies
            .iter_mut()
            .map(|(entity, transform, body, claim, _)| {
                (entity, transform.translation, body.into_inner(), claim)
            }),
        &camera,
        frustum.as_ref(),
        frame_time,
    );

    hooks.send_all(transitions.iter().map(|t| SleepChanged {
        entity: t.entity,
        state: t.to,
        frame_time,
    }));

    let Some(mut physics) = physics else {
        return;
    };
    for transition in &transitions {
        let Ok((_, _, body, _, Some(handle))) = bodies.get(transition.entity) else {
            continue;
        };
        if let Some(rb) = physics.rigid_body_set.get_mut(handle.0) {
            sync_body_type(rb, body);
        }
    }
}
