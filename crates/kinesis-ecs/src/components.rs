//! Core ECS components shared across the coordinator's subsystems.

use bevy_ecs::prelude::*;
use glam::{Quat, Vec3};

/// Position and orientation in world space (meters).
///
/// For physics bodies this mirrors the simulated pose: gameplay machines
/// write it for carried or docked objects, and the physics read-back writes
/// it for free bodies.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// World-space translation.
    pub translation: Vec3,
    /// World-space rotation.
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Transform {
    /// Creates a transform at `translation` with identity rotation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
        }
    }

    /// Creates a transform from translation and rotation.
    pub fn from_parts(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }
}

/// Marks a player-controlled actor.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Actor;

/// Marks the actor driven by this session's input latch.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct LocalActor;

/// Human-readable debug name for an entity. Used in log messages only.
#[derive(Component, Clone, Debug, PartialEq, Eq, Default)]
pub struct Name(pub String);

impl Name {
    /// Creates a new [`Name`] from anything that converts to `String`.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}
