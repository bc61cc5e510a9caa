//! Trailing-window velocity sampling for throws.

use std::collections::VecDeque;

use bevy_ecs::prelude::*;
use glam::Vec3;

use crate::InteractionParams;

/// Recent positions of an actor's grip point.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct MotionSampler {
    samples: VecDeque<(f64, Vec3)>,
    window: f64,
}

impl MotionSampler {
    /// Keeps samples from the last `window` seconds.
    pub fn new(window: f64) -> Self {
        Self {
            samples: VecDeque::new(),
            window: window.max(0.0),
        }
    }

    /// Records the grip point at `time`, dropping samples older than the window.
    pub fn record(&mut self, time: f64, point: Vec3) {
        if self.samples.back().is_some_and(|&(last, _)| time <= last) {
            self.samples.pop_back();
        }
        self.samples.push_back((time, point));

        let cutoff = time - self.window;
        while self.samples.len() > 2 && self.samples.front().is_some_and(|&(t, _)| t < cutoff) {
            self.samples.pop_front();
        }
    }

    /// Average velocity across the retained samples; zero with fewer than two.
    pub fn velocity(&self) -> Vec3 {
        let (Some(&(t0, p0)), Some(&(t1, p1))) = (self.samples.front(), self.samples.back()) else {
            return Vec3::ZERO;
        };
        let elapsed = t1 - t0;
        if elapsed <= 0.0 {
            return Vec3::ZERO;
        }
        (p1 - p0) / elapsed as f32
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl Default for MotionSampler {
    fn default() -> Self {
        Self::new(0.1)
    }
}

/// Scales the sampled velocity and clamps it to the maximum throw speed.
pub fn throw_velocity(sampled: Vec3, params: &InteractionParams) -> Vec3 {
    (sampled * params.throw_scale).clamp_length_max(params.max_throw_speed.max(0.0))
}
