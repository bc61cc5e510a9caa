//! Interaction components, parameters, and hook payloads.

use bevy_ecs::prelude::*;
use glam::Vec3;
use kinesis_config::{InteractionConfig, SnapMode};

/// Lifecycle of a grabbable object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InteractionState {
    /// Not targeted.
    #[default]
    Idle,
    /// Under an actor's pointer.
    Hovered,
    /// Carried by an actor.
    Held,
    /// Released with a throw impulse; resolves to `Idle` in the same frame.
    Thrown,
}

/// A point on an interactable that can snap onto a socket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnetAnchor {
    /// Offset from the body origin, in body space.
    pub local_offset: Vec3,
    /// Horizontal capture distance.
    pub radial_range: f32,
    /// Vertical capture distance.
    pub vertical_range: f32,
    /// Socket this anchor fits.
    pub socket: Entity,
}

impl MagnetAnchor {
    /// An anchor using the configured default capture ranges.
    pub fn new(local_offset: Vec3, socket: Entity, params: &InteractionParams) -> Self {
        Self {
            local_offset,
            radial_range: params.anchor_radial_range,
            vertical_range: params.anchor_vertical_range,
            socket,
        }
    }
}

/// A grabbable entity.
///
/// Only the interaction systems change its state, holder, and socket link.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Interactable {
    pub(crate) state: InteractionState,
    pub(crate) holder: Option<Entity>,
    /// Entity carrying the [`Body`](kinesis_physics::Body) this object moves.
    pub body: Option<Entity>,
    /// Snap points.
    pub anchors: Vec<MagnetAnchor>,
    pub(crate) snap_candidate: Option<usize>,
    pub(crate) docked: Option<Entity>,
}

impl Interactable {
    pub fn new(body: Option<Entity>) -> Self {
        Self {
            state: InteractionState::Idle,
            holder: None,
            body,
            anchors: Vec::new(),
            snap_candidate: None,
            docked: None,
        }
    }

    /// Adds a snap anchor.
    pub fn with_anchor(mut self, anchor: MagnetAnchor) -> Self {
        self.anchors.push(anchor);
        self
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    /// Actor currently holding this object.
    pub fn holder(&self) -> Option<Entity> {
        self.holder
    }

    /// Anchor index that would dock if released now.
    pub fn snap_candidate(&self) -> Option<usize> {
        self.snap_candidate
    }

    /// Socket this object is locked to.
    pub fn docked(&self) -> Option<Entity> {
        self.docked
    }
}

/// A fixed pose an anchor can dock onto. The pose is the entity's transform.
#[derive(Component, Debug, Clone, Default, PartialEq, Eq)]
pub struct Socket {
    pub(crate) occupant: Option<Entity>,
}

impl Socket {
    pub fn occupant(&self) -> Option<Entity> {
        self.occupant
    }
}

/// What an actor is pointing at and holding. One hand: at most one held object.
#[derive(Component, Debug, Clone, Default, PartialEq, Eq)]
pub struct Grip {
    pub(crate) held: Option<Entity>,
    pub(crate) hovered: Option<Entity>,
}

impl Grip {
    pub fn held(&self) -> Option<Entity> {
        self.held
    }

    pub fn hovered(&self) -> Option<Entity> {
        self.hovered
    }
}

/// Tuning for grab, carry, throw, and snap.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct InteractionParams {
    pub hold_distance: f32,
    pub release_grace_s: f64,
    pub throw_window_s: f64,
    pub throw_scale: f32,
    pub max_throw_speed: f32,
    pub snap_mode: SnapMode,
    pub anchor_radial_range: f32,
    pub anchor_vertical_range: f32,
}

impl From<&InteractionConfig> for InteractionParams {
    fn from(config: &InteractionConfig) -> Self {
        Self {
            hold_distance: config.hold_distance,
            release_grace_s: config.release_grace_s,
            throw_window_s: config.throw_window_s,
            throw_scale: config.throw_scale,
            max_throw_speed: config.max_throw_speed,
            snap_mode: config.snap_mode,
            anchor_radial_range: config.anchor_radial_range,
            anchor_vertical_range: config.anchor_vertical_range,
        }
    }
}

impl Default for InteractionParams {
    fn default() -> Self {
        Self::from(&InteractionConfig::default())
    }
}

/// An interactable changed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionChanged {
    pub entity: Entity,
    pub from: InteractionState,
    pub to: InteractionState,
    /// Actor that caused the change, if any.
    pub actor: Option<Entity>,
    /// Socket the object docked onto.
    pub socket: Option<Entity>,
}
