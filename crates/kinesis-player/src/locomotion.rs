//! Locomotion state machine: grounded, ascending, falling, landing.
//!
//! One evaluation per frame, in this order:
//!
//! 1. A `Landing` entered last frame settles into `Grounded`.
//! 2. Airborne actors integrate gravity.
//! 3. `Ascending` turns into `Falling` once vertical velocity is no longer positive.
//! 4. `Falling` with ground contact enters `Landing`: velocity zeroed, feet
//!    snapped to the surface, a [`Landed`] hook published.
//! 5. A grounded actor without support for longer than the ledge tolerance
//!    starts `Falling`.
//! 6. A jump edge launches a grounded actor (or spends the one air jump).

use bevy_ecs::prelude::*;
use kinesis_config::LocomotionConfig;
use kinesis_ecs::{Actor, FrameClock, HookBuffer, Transform};
use kinesis_input::{Action, ActorInput};
use kinesis_physics::{Body, GroundSensor, PhysicsHandle, PhysicsWorld, WakeClaim, probe_ground};

/// Vertical motion state of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LocomotionState {
    /// Standing on a surface.
    #[default]
    Grounded,
    /// Moving up after a jump.
    Ascending,
    /// Moving down, or unsupported past the ledge tolerance.
    Falling,
    /// Touched down this frame; settles on the next evaluation.
    Landing,
}

impl LocomotionState {
    pub fn is_airborne(self) -> bool {
        matches!(self, LocomotionState::Ascending | LocomotionState::Falling)
    }
}

/// Per-actor locomotion state.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Locomotion {
    state: LocomotionState,
    grounded: bool,
    /// Vertical velocity in m/s, positive up.
    pub vertical_velocity: f32,
    unsupported_for: f32,
    air_jump_spent: bool,
}

impl Locomotion {
    /// An actor standing on the ground.
    pub fn grounded() -> Self {
        Self {
            state: LocomotionState::Grounded,
            grounded: true,
            vertical_velocity: 0.0,
            unsupported_for: 0.0,
            air_jump_spent: false,
        }
    }

    /// An actor dropped into the world mid-air.
    pub fn falling() -> Self {
        Self {
            state: LocomotionState::Falling,
            grounded: false,
            ..Self::grounded()
        }
    }

    pub fn state(&self) -> LocomotionState {
        self.state
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// How far the feet will descend during the next evaluation of `dt` seconds.
    ///
    /// The ground query has to reach at least this far below the feet, or a
    /// long frame can carry them past the surface before it is ever seen.
    pub fn predicted_drop(&self, dt: f32, params: &LocomotionParams) -> f32 {
        if !self.state.is_airborne() {
            return 0.0;
        }
        let dt = dt.max(0.0);
        (-(self.vertical_velocity + params.gravity * dt) * dt).max(0.0)
    }

    /// Evaluates one frame. `feet_y` is the current feet height; the
    /// returned report carries the new one.
    pub fn step(&mut self, frame: &LocomotionFrame, params: &LocomotionParams) -> StepReport {
        let mut report = StepReport {
            feet_y: frame.feet_y,
            transitions: Vec::new(),
            landed: None,
        };
        let dt = frame.dt.max(0.0);

        if self.state == LocomotionState::Landing {
            self.enter(LocomotionState::Grounded, &mut report);
        }

        if self.state.is_airborne() {
            self.vertical_velocity += params.gravity * dt;
            report.feet_y += self.vertical_velocity * dt;
        }

        if self.state == LocomotionState::Ascending && self.vertical_velocity <= 0.0 {
            self.enter(LocomotionState::Falling, &mut report);
        }

        let contact = frame
            .surface
            .filter(|surface| report.feet_y - surface <= params.ground_snap_distance);

        if self.state == LocomotionState::Falling
            && self.vertical_velocity < 0.0
            && let Some(surface) = contact
        {
            report.landed = Some(-self.vertical_velocity);
            self.vertical_velocity = 0.0;
            report.feet_y = surface;
            self.grounded = true;
            self.unsupported_for = 0.0;
            self.air_jump_spent = false;
            self.enter(LocomotionState::Landing, &mut report);
        }

        if self.state == LocomotionState::Grounded {
            if contact.is_some() {
                self.unsupported_for = 0.0;
            } else {
                self.unsupported_for += dt;
                if self.unsupported_for > params.ledge_tolerance_s {
                    self.grounded = false;
                    self.enter(LocomotionState::Falling, &mut report);
                }
            }
        }

        if frame.jump {
            self.jump(params, &mut report);
        }

        report
    }

    fn jump(&mut self, params: &LocomotionParams, report: &mut StepReport) {
        match self.state {
            LocomotionState::Grounded if self.grounded => {
                self.vertical_velocity = params.launch_speed;
                self.grounded = false;
                self.unsupported_for = 0.0;
                self.enter(LocomotionState::Ascending, report);
            }
            LocomotionState::Ascending | LocomotionState::Falling
                if params.allow_double_jump && !self.air_jump_spent =>
            {
                self.vertical_velocity = params.launch_speed;
                self.air_jump_spent = true;
                self.enter(LocomotionState::Ascending, report);
            }
            state => {
                tracing::trace!("Jump ignored in {:?}", state);
            }
        }
    }

    fn enter(&mut self, next: LocomotionState, report: &mut StepReport) {
        if self.state != next {
            report.transitions.push((self.state, next));
        }
        self.state = next;
    }
}

impl Default for Locomotion {
    fn default() -> Self {
        Self::grounded()
    }
}

/// Inputs for one locomotion evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocomotionFrame {
    /// Seconds since the previous frame.
    pub dt: f32,
    /// A jump edge fired this frame.
    pub jump: bool,
    /// Current feet height.
    pub feet_y: f32,
    /// Surface height under the feet, `None` when the probe found nothing
    /// or failed.
    pub surface: Option<f32>,
}

/// Outcome of one locomotion evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Feet height after this frame.
    pub feet_y: f32,
    /// State changes in the order they happened.
    pub transitions: Vec<(LocomotionState, LocomotionState)>,
    /// Impact speed when the actor touched down this frame.
    pub landed: Option<f32>,
}

/// Tuning for the locomotion machine.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct LocomotionParams {
    pub launch_speed: f32,
    /// Vertical acceleration (m/s², negative is down).
    pub gravity: f32,
    pub allow_double_jump: bool,
    pub ledge_tolerance_s: f32,
    pub ground_snap_distance: f32,
}

impl From<&LocomotionConfig> for LocomotionParams {
    fn from(config: &LocomotionConfig) -> Self {
        Self {
            launch_speed: config.launch_speed,
            gravity: config.gravity,
            allow_double_jump: config.allow_double_jump,
            ledge_tolerance_s: config.ledge_tolerance_s,
            ground_snap_distance: config.ground_snap_distance,
        }
    }
}

impl Default for LocomotionParams {
    fn default() -> Self {
        Self::from(&LocomotionConfig::default())
    }
}

/// An actor's locomotion state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocomotionChanged {
    pub entity: Entity,
    pub from: LocomotionState,
    pub to: LocomotionState,
}

/// An actor touched down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landed {
    pub entity: Entity,
    /// Downward speed at impact (m/s).
    pub impact_speed: f32,
}

/// Runs the locomotion machine for every actor.
///
/// Expects the ground probe to have refreshed each [`GroundSensor`] earlier
/// in the frame. An actor that will drop further than the sensor reaches is
/// re-probed along its whole path. Writes the new height into the actor's
/// transform and keeps its body awake while off the ground.
#[allow(clippy::type_complexity)]
pub fn locomotion_system(
    params: Res<LocomotionParams>,
    clock: Res<FrameClock>,
    physics: Option<Res<PhysicsWorld>>,
    mut changed: ResMut<HookBuffer<LocomotionChanged>>,
    mut landed: ResMut<HookBuffer<Landed>>,
    mut actors: Query<
        (
            Entity,
            &mut Locomotion,
            &mut Transform,
            &GroundSensor,
            Option<&ActorInput>,
            Option<&mut Body>,
            Option<&mut WakeClaim>,
            Option<&PhysicsHandle>,
        ),
        With<Actor>,
    >,
) {
    for (entity, mut locomotion, mut transform, sensor, input, body, claim, handle) in
        actors.iter_mut()
    {
        let feet = sensor.feet(transform.translation);
        let drop = locomotion.predicted_drop(clock.delta, &params);
        let surface = match physics.as_deref() {
            Some(physics) if drop > 0.0 => probe_ground(
                physics,
                handle.map(|h| h.0),
                feet,
                sensor.lift,
                sensor.depth + drop,
            )
            .ok()
            .flatten()
            .map(|hit| hit.surface_height),
            _ => sensor.surface,
        };

        let frame = LocomotionFrame {
            dt: clock.delta,
            jump: input.is_some_and(|input| input.edges.just_pressed(Action::Jump)),
            feet_y: feet.y,
            surface,
        };
        let report = locomotion.step(&frame, &params);

        for &(from, to) in &report.transitions {
            tracing::debug!("Actor {:?} locomotion {:?} -> {:?}", entity, from, to);
            changed.send(LocomotionChanged { entity, from, to });
        }
        if let Some(impact_speed) = report.landed {
            tracing::debug!("Actor {:?} landed at {:.2} m/s", entity, impact_speed);
            landed.send(Landed {
                entity,
                impact_speed,
            });
        }

        let center_y = report.feet_y + sensor.foot_offset;
        if center_y != transform.translation.y {
            transform.translation.y = center_y;
            if let Some(mut body) = body {
                body.linear_velocity.y = locomotion.vertical_velocity;
                body.mark_dirty();
            }
        }
        if let Some(mut claim) = claim {
            claim.locomotion = locomotion.state() != LocomotionState::Grounded;
        }
    }
}
