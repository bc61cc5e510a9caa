//! Player vertical motion: the locomotion state machine and its ECS system.

pub mod locomotion;


pub use locomotion::{
    Landed, Locomotion, LocomotionChanged, LocomotionFrame, LocomotionParams, LocomotionState,
    StepReport, locomotion_system,
};
