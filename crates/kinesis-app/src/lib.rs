//! Kinesis application layer.
//!
//! Owns the [`FrameCoordinator`] that runs every state machine once per
//! rendered frame in a fixed order, the wall-clock [`FrameLoop`] that feeds
//! it, platform directory resolution, and the demo scene used by the
//! headless binary.

pub mod coordinator;
pub mod frame_loop;
pub mod invariants;
pub mod platform;
pub mod scene;

#[cfg(test)]
mod coordinator_tests;

pub use coordinator::FrameCoordinator;
pub use frame_loop::{FrameLoop, MAX_FRAME_TIME};
pub use invariants::{InvariantChecks, InvariantViolation, check_invariants, invariant_check_system};
pub use platform::{PlatformDirs, PlatformError};
pub use scene::{DemoScene, spawn_demo_scene};
