//! Mirrors coordinator-side body state into rapier, steps it, and reads it back.
//!
//! An asleep body that the solver would normally drive is parked as a
//! position-based kinematic body: it stays in the broad phase, so it still
//! blocks other bodies and answers ray queries, but it takes no part in the
//! solve. Rapier's own island sleeping is never forced per body.

use std::collections::HashMap;

use bevy_ecs::prelude::*;
use glam::Vec3;
use kinesis_ecs::{FrameClock, Transform};
use rapier3d::prelude::{RigidBody, RigidBodyHandle, RigidBodyType};

use crate::{
    Body, PhysicsClock, PhysicsHandle, PhysicsWorld, SleepState, from_rotation, to_rotation,
    to_vector,
};

/// Rapier body type a [`Body`] should have right now.
fn target_body_type(body: &Body) -> RigidBodyType {
    if body.kinematic || body.sleep == SleepState::Asleep {
        RigidBodyType::KinematicPositionBased
    } else {
        RigidBodyType::Dynamic
    }
}

/// Switches the rapier body between solver-driven and parked to match `body`.
///
/// Parking holds the body at its current pose. Returning it to the solver
/// restores the velocity retained on the [`Body`].
pub(crate) fn sync_body_type(rb: &mut RigidBody, body: &Body) {
    if rb.is_fixed() {
        return;
    }
    let target = target_body_type(body);
    if rb.body_type() == target {
        return;
    }

    if target == RigidBodyType::Dynamic {
        rb.set_body_type(target, true);
        rb.set_linvel(to_vector(body.linear_velocity), true);
        rb.set_angvel(to_vector(body.angular_velocity), true);
    } else {
        let pose = *rb.position();
        rb.set_body_type(target, false);
        rb.set_next_kinematic_position(pose);
    }
}

/// Writes dirty transforms, velocities, and body types into rapier.
///
/// Kinematic bodies are moved with next-step targets so rapier derives their
/// velocity and contacts see them sweep rather than teleport.
pub fn push_bodies_system(
    mut physics: ResMut<PhysicsWorld>,
    mut bodies: Query<(Entity, &Transform, &mut Body, &PhysicsHandle)>,
) {
    for (entity, transform, mut body, handle) in bodies.iter_mut() {
        if !body.needs_push {
            continue;
        }
        body.needs_push = false;

        let Some(rb) = physics.rigid_body_set.get_mut(handle.0) else {
            tracing::warn!("Body {:?} references a missing rigid body", entity);
            continue;
        };

        sync_body_type(rb, &body);

        if rb.is_kinematic() {
            rb.set_next_kinematic_translation(to_vector(transform.translation));
            rb.set_next_kinematic_rotation(to_rotation(transform.rotation));
        } else if rb.is_dynamic() {
            rb.set_translation(to_vector(transform.translation), true);
            rb.set_rotation(to_rotation(transform.rotation), true);
            rb.set_linvel(to_vector(body.linear_velocity), true);
            rb.set_angvel(to_vector(body.angular_velocity), true);
        }
    }
}

/// Runs as many fixed physics steps as the frame delta pays for.
pub fn physics_step_system(
    mut physics: ResMut<PhysicsWorld>,
    mut clock: ResMut<PhysicsClock>,
    frame: Res<FrameClock>,
) {
    let steps = clock.advance(frame.delta);
    for _ in 0..steps {
        physics.step();
    }
}

/// Fastest approach speed of any solver-driven body touching `handle`.
///
/// Speeds are those from before this frame's steps, since the solver has
/// already absorbed the impact by the time contacts are read.
fn contact_speed(
    physics: &PhysicsWorld,
    handle: RigidBodyHandle,
    approach: &HashMap<RigidBodyHandle, f32>,
) -> f32 {
    let Some(rb) = physics.rigid_body_set.get(handle) else {
        return 0.0;
    };
    let mut fastest = 0.0_f32;
    for &collider in rb.colliders() {
        for pair in physics.narrow_phase.contact_pairs_with(collider) {
            if !pair.has_any_active_contact() {
                continue;
            }
            let other = if pair.collider1 == collider {
                pair.collider2
            } else {
                pair.collider1
            };
            let speed = physics
                .collider_set
                .get(other)
                .and_then(|c| c.parent())
                .and_then(|parent| approach.get(&parent));
            if let Some(&speed) = speed {
                fastest = fastest.max(speed);
            }
        }
    }
    fastest
}

/// Copies simulated poses and velocities of awake, solver-driven bodies back
/// onto their components.
///
/// Asleep bodies keep the velocity of their last awake frame. Instead, the
/// speed of anything striking them is recorded for the scheduler's motion
/// trigger.
pub fn pull_bodies_system(
    physics: Res<PhysicsWorld>,
    mut bodies: Query<(&mut Transform, &mut Body, &PhysicsHandle)>,
) {
    let approach: HashMap<RigidBodyHandle, f32> = bodies
        .iter()
        .filter(|(_, body, _)| !body.kinematic && body.sleep == SleepState::Awake)
        .map(|(_, body, handle)| (handle.0, body.speed()))
        .collect();

    for (mut transform, mut body, handle) in bodies.iter_mut() {
        if body.kinematic {
            continue;
        }
        match body.sleep {
            SleepState::Asleep => {
                let struck = contact_speed(&physics, handle.0, &approach);
                body.impact_speed = body.impact_speed.max(struck);
            }
            SleepState::Awake => {
                let Some(rb) = physics.rigid_body_set.get(handle.0) else {
                    continue;
                };
                let t = rb.translation();
                let linvel = rb.linvel();
                let angvel = rb.angvel();
                transform.translation = Vec3::new(t.x, t.y, t.z);
                transform.rotation = from_rotation(rb.rotation());
                body.linear_velocity = Vec3::new(linvel.x, linvel.y, linvel.z);
                body.angular_velocity = Vec3::new(angvel.x, angvel.y, angvel.z);
            }
        }
    }
}
