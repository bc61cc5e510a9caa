//! Hook payloads published by the physics crate.

use bevy_ecs::entity::Entity;

use crate::{DeviceProfile, PhysicsTuning, SleepState};

/// A body switched between active and dormant simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SleepChanged {
    /// Entity owning the [`Body`](crate::Body).
    pub entity: Entity,
    /// The state the body entered.
    pub state: SleepState,
    /// Frame time of the decision.
    pub frame_time: f64,
}

/// A tuning table was written into the physics engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TuningApplied {
    /// The applied tuning.
    pub tuning: PhysicsTuning,
    /// The profile it was derived from (`None` when unknown).
    pub profile: Option<DeviceProfile>,
}
