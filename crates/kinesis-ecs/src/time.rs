//! Frame clock resource for the ECS world.

use bevy_ecs::prelude::*;

/// Global frame clock, advanced once at the start of every frame.
///
/// `elapsed` is the frame time every per-frame decision is stamped with;
/// it never changes while a frame's stages run.
#[derive(Resource, Debug, Clone, Default)]
pub struct FrameClock {
    /// Seconds elapsed since the previous frame.
    pub delta: f32,
    /// Seconds elapsed since the session started, at the start of this frame.
    pub elapsed: f64,
    /// Number of frames started so far.
    pub frame: u64,
}

impl FrameClock {
    /// Begin a new frame lasting `delta` seconds.
    ///
    /// Negative or non-finite deltas are treated as zero.
    pub fn advance(&mut self, delta: f32) {
        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };
        self.delta = delta;
        self.elapsed += delta as f64;
        self.frame += 1;
    }
}
