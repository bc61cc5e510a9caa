//! ECS world setup, frame stages, shared components, and per-frame hook buffers.
//!
//! Provides the [`World`](bevy_ecs::world::World) factory and the
//! [`FrameSchedules`] runner that executes the coordinator's stages in their
//! fixed order once per rendered frame.

mod camera;
mod components;
mod hooks;
mod schedule;
mod time;
mod world;

pub use camera::CameraRes;
pub use components::{Actor, LocalActor, Name, Transform};
pub use hooks::HookBuffer;
pub use schedule::{FrameSchedules, FrameStage};
pub use time::FrameClock;
pub use world::{create_world, register_core_resources};
