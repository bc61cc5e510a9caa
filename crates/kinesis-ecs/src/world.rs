//! World factory function and core resource registration.

use bevy_ecs::prelude::*;

use crate::{CameraRes, FrameClock};

/// Registers the resources every coordinator world needs.
///
/// Subsystem resources (physics world, tuning, settings, hook buffers) are
/// inserted by their own crates.
pub fn register_core_resources(world: &mut World) {
    world.insert_resource(FrameClock::default());
    world.insert_resource(CameraRes::default());
}

/// Creates an ECS world with [`FrameClock`] and [`CameraRes`] pre-inserted.
pub fn create_world() -> World {
    let mut world = World::new();
    register_core_resources(&mut world);
    world
}
