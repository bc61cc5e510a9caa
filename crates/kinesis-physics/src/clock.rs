//! Fixed-step accumulator bridging variable frame deltas and the physics tick rate.

use bevy_ecs::prelude::*;

use crate::PhysicsTuning;

/// Tolerance absorbing float error when a frame delta equals the step exactly.
const STEP_EPSILON: f64 = 1e-9;

/// Accumulates frame time and hands out whole physics steps.
///
/// At most `max_substeps` steps are granted per frame. Time beyond that is
/// dropped so a slow frame cannot snowball into ever longer frames.
#[derive(Resource, Debug, Clone)]
pub struct PhysicsClock {
    accumulator: f64,
    step_dt: f64,
    max_substeps: u32,
    /// Total simulated seconds dropped by the substep cap.
    pub dropped_seconds: f64,
}

impl PhysicsClock {
    /// Creates a clock for the given tuning.
    pub fn new(tuning: &PhysicsTuning) -> Self {
        let mut clock = Self {
            accumulator: 0.0,
            step_dt: 0.0,
            max_substeps: 1,
            dropped_seconds: 0.0,
        };
        clock.configure(tuning);
        clock
    }

    /// Switches to a new tick rate and substep cap. Pending time is kept.
    pub fn configure(&mut self, tuning: &PhysicsTuning) {
        self.step_dt = tuning.step_dt() as f64;
        self.max_substeps = tuning.max_substeps.max(1);
    }

    /// Length of one physics step in seconds.
    pub fn step_dt(&self) -> f64 {
        self.step_dt
    }

    /// Time accumulated but not yet simulated.
    pub fn pending(&self) -> f64 {
        self.accumulator
    }

    /// Adds `delta` seconds and returns how many steps to run this frame.
    pub fn advance(&mut self, delta: f32) -> u32 {
        if delta.is_finite() && delta > 0.0 {
            self.accumulator += delta as f64;
        }

        let due = ((self.accumulator + STEP_EPSILON) / self.step_dt).floor();
        let due = if due.is_finite() && due > 0.0 { due as u64 } else { 0 };
        let steps = due.min(self.max_substeps as u64) as u32;
        self.accumulator = (self.accumulator - steps as f64 * self.step_dt).max(0.0);

        if due > steps as u64 {
            let excess = self.accumulator;
            self.accumulator = 0.0;
            self.dropped_seconds += excess;
            tracing::warn!(
                "Physics fell behind: {} steps due, {} run, dropped {:.4}s",
                due,
                steps,
                excess
            );
        }

        steps
    }
}

impl Default for PhysicsClock {
    fn default() -> Self {
        Self::new(&PhysicsTuning::CONSERVATIVE)
    }
}
