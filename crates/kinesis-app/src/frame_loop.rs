//! Wall-clock driver for the frame coordinator.
//!
//! Measures the time between frames, clamps pathological frame times, and
//! hands the result to [`FrameCoordinator::step`]. Fixed-rate physics stepping
//! happens inside the coordinator's physics stage.

use std::time::Instant;

use tracing::warn;

use crate::FrameCoordinator;

/// Maximum frame time passed to the coordinator.
/// Longer frames (debugger pauses, window drags) are clamped and the
/// simulation accepts the slowdown.
pub const MAX_FRAME_TIME: f64 = 0.25;

/// Frame time assumed for the very first frame, before any interval exists.
const FIRST_FRAME_TIME: f64 = 1.0 / 60.0;

/// Frame driver state.
pub struct FrameLoop {
    previous_time: Option<Instant>,
    frame_count: u64,
    total_time: f64,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self {
            previous_time: None,
            frame_count: 0,
            total_time: 0.0,
        }
    }

    /// Runs one frame timed against the wall clock. Returns the delta used.
    pub fn tick(&mut self, coordinator: &mut FrameCoordinator) -> f64 {
        let now = Instant::now();
        let frame_time = match self.previous_time.replace(now) {
            Some(previous) => now.duration_since(previous).as_secs_f64(),
            None => FIRST_FRAME_TIME,
        };
        self.tick_with(frame_time, coordinator)
    }

    /// Runs one frame with an explicit frame time. Returns the delta used.
    pub fn tick_with(&mut self, frame_time: f64, coordinator: &mut FrameCoordinator) -> f64 {
        let mut delta = if frame_time.is_finite() {
            frame_time.max(0.0)
        } else {
            0.0
        };
        if delta > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                delta * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
            delta = MAX_FRAME_TIME;
        }

        coordinator.step(delta as f32);
        self.total_time += delta;
        self.frame_count += 1;
        delta
    }

    /// Frames run so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Sum of the deltas handed to the coordinator.
    pub fn total_time(&self) -> f64 {
        self.total_time
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}
