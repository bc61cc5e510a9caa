//! Frame stage labels and the ordered schedule runner.

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::{IntoSystemConfigs, ScheduleLabel};

/// Labels for each coordinator stage.
///
/// Stages run in the order listed, top to bottom, exactly once per frame.
/// Gameplay machines run before the sleep/wake pass so that forced-awake
/// decisions see this frame's activity, and everything that touches body
/// flags runs before the physics step.
#[derive(ScheduleLabel, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameStage {
    /// Move latched input edges onto actors.
    Input,
    /// Re-derive physics tuning if the device profile changed.
    Tuning,
    /// Ground probes and the locomotion machine.
    Locomotion,
    /// Pointer hover, grab/release, snap and throw.
    Interaction,
    /// Visibility refresh and the sleep/wake scheduler.
    SleepWake,
    /// Push body state to the physics engine, step it, read it back.
    Physics,
    /// Invariant checks and end-of-frame input clearing.
    Finish,
}

impl FrameStage {
    /// All stages in execution order.
    pub const ORDER: [FrameStage; 7] = [
        FrameStage::Input,
        FrameStage::Tuning,
        FrameStage::Locomotion,
        FrameStage::Interaction,
        FrameStage::SleepWake,
        FrameStage::Physics,
        FrameStage::Finish,
    ];
}

/// Ordered collection of [`Schedule`]s that drives one coordinator frame.
pub struct FrameSchedules {
    schedules: Vec<(FrameStage, Schedule)>,
}

impl FrameSchedules {
    /// Create one empty schedule per stage.
    pub fn new() -> Self {
        let schedules = FrameStage::ORDER
            .into_iter()
            .map(|label| (label, Schedule::new(label)))
            .collect();

        Self { schedules }
    }

    /// Register a system (or system tuple) into a specific stage.
    pub fn add_system<M>(&mut self, stage: FrameStage, system: impl IntoSystemConfigs<M>) {
        if let Some(schedule) = self.get_schedule_mut(&stage) {
            schedule.add_systems(system);
        }
    }

    /// Run all stages in order for one frame.
    pub fn run(&mut self, world: &mut World) {
        for (_label, schedule) in &mut self.schedules {
            schedule.run(world);
        }
    }

    /// Run a single stage.
    pub fn run_stage(&mut self, target: FrameStage, world: &mut World) {
        if let Some(schedule) = self.get_schedule_mut(&target) {
            schedule.run(world);
        }
    }

    /// Returns a mutable reference to the schedule for a given stage.
    pub fn get_schedule_mut(&mut self, stage: &FrameStage) -> Option<&mut Schedule> {
        self.schedules
            .iter_mut()
            .find(|(label, _)| label == stage)
            .map(|(_, schedule)| schedule)
    }

    /// Force-initialize all schedules, validating the system graphs.
    pub fn initialize_all(&mut self, world: &mut World) {
        for (_label, schedule) in &mut self.schedules {
            let _ = schedule.initialize(world);
        }
    }
}

impl Default for FrameSchedules {
    fn default() -> Self {
        Self::new()
    }
}
