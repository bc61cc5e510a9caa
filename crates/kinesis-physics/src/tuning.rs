//! Physics tuning policy: device profile in, tick rate and solver caps out.

use bevy_ecs::prelude::*;
use kinesis_config::TuningConfig;
use kinesis_ecs::HookBuffer;

use crate::{DeviceProfile, PhysicsClock, PhysicsWorld, TuningApplied};

/// Simulation rate and effort caps for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicsTuning {
    /// Physics steps per simulated second.
    pub tick_rate_hz: u32,
    /// Maximum physics steps run in one frame.
    pub max_substeps: u32,
    /// Constraint solver iterations per step.
    pub solver_iterations: u32,
}

impl PhysicsTuning {
    /// Used before any profile is known.
    pub const CONSERVATIVE: PhysicsTuning = PhysicsTuning {
        tick_rate_hz: 60,
        max_substeps: 2,
        solver_iterations: 4,
    };

    /// Derives the tuning for `profile`.
    ///
    /// Full-power desktops get the desktop table. Everything else, including
    /// an unknown profile or a low-power desktop, gets the mobile table.
    pub fn derive(profile: Option<&DeviceProfile>, config: &TuningConfig) -> Self {
        let tuning = match profile {
            Some(profile) if profile.is_full_power_desktop() => Self {
                tick_rate_hz: config.desktop_tick_rate_hz,
                max_substeps: config.desktop_max_substeps,
                solver_iterations: config.desktop_solver_iterations,
            },
            _ => Self {
                tick_rate_hz: config.mobile_tick_rate_hz,
                max_substeps: config.mobile_max_substeps,
                solver_iterations: config.mobile_solver_iterations,
            },
        };
        tuning.sanitized()
    }

    /// Length of one physics step in seconds.
    pub fn step_dt(&self) -> f32 {
        1.0 / self.tick_rate_hz.max(1) as f32
    }

    fn sanitized(self) -> Self {
        Self {
            tick_rate_hz: self.tick_rate_hz.max(1),
            max_substeps: self.max_substeps.max(1),
            solver_iterations: self.solver_iterations.max(1),
        }
    }
}

/// Current device profile, tuning tables, and whether tuning must be re-derived.
#[derive(Resource, Debug, Clone)]
pub struct TuningState {
    profile: Option<DeviceProfile>,
    config: TuningConfig,
    changed: bool,
    current: Option<PhysicsTuning>,
}

impl TuningState {
    /// Creates the state; the first frame applies the derived tuning.
    pub fn new(config: TuningConfig, profile: Option<DeviceProfile>) -> Self {
        Self {
            profile,
            config,
            changed: true,
            current: None,
        }
    }

    /// Records a device change. Tuning is re-derived on the next frame.
    pub fn set_profile(&mut self, profile: Option<DeviceProfile>) {
        self.profile = profile;
        self.changed = true;
    }

    /// Replaces the tuning tables (config reload) and marks the state changed.
    pub fn set_config(&mut self, config: TuningConfig) {
        self.config = config;
        self.changed = true;
    }

    /// The profile tuning is derived from.
    pub fn profile(&self) -> Option<DeviceProfile> {
        self.profile
    }

    /// The tuning currently written into the engine, if any.
    pub fn current(&self) -> Option<PhysicsTuning> {
        self.current
    }

    /// Whether the next frame will re-derive tuning.
    pub fn is_changed(&self) -> bool {
        self.changed
    }
}

impl Default for TuningState {
    fn default() -> Self {
        Self::new(TuningConfig::default(), None)
    }
}

/// Re-derives and applies tuning when the profile was marked changed.
pub fn tuning_system(
    mut state: ResMut<TuningState>,
    mut physics: ResMut<PhysicsWorld>,
    mut clock: ResMut<PhysicsClock>,
    mut hooks: ResMut<HookBuffer<TuningApplied>>,
) {
    if !state.changed {
        return;
    }
    state.changed = false;

    let profile = state.profile;
    if profile.is_none_or(|p| p.class.is_none()) {
        tracing::warn!("Device profile unknown, using conservative tuning");
    }

    let tuning = PhysicsTuning::derive(profile.as_ref(), &state.config);
    physics.apply_tuning(&tuning);
    clock.configure(&tuning);
    state.current = Some(tuning);
    hooks.send(TuningApplied { tuning, profile });

    tracing::info!(
        "Physics tuning applied: {} Hz, {} substeps, {} solver iterations",
        tuning.tick_rate_hz,
        tuning.max_substeps,
        tuning.solver_iterations
    );
}
