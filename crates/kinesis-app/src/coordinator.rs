//! The frame coordinator.
//!
//! One call to [`FrameCoordinator::step`] is one rendered frame. Stages run in
//! this order:
//!
//! | Stage         | Systems                                                    |
//! |---------------|------------------------------------------------------------|
//! | `Input`       | latch input edges onto the local actor                     |
//! | `Tuning`      | re-derive physics tuning when the profile changed          |
//! | `Locomotion`  | ground probes, then the locomotion machine                 |
//! | `Interaction` | hover, then grab/carry/release                             |
//! | `SleepWake`   | the sleep/wake scheduler                                   |
//! | `Physics`     | push body state, step rapier, read it back                 |
//! | `Finish`      | invariant checks, then clear consumed input edges          |
//!
//! Machines that write wake claims run before the scheduler, and everything
//! that flags bodies runs before the physics step.

use bevy_ecs::prelude::*;
use kinesis_config::Config;
use kinesis_ecs::{FrameClock, FrameSchedules, FrameStage, HookBuffer, create_world};
use kinesis_input::{InputLatch, clear_actor_input_system, latch_input_system};
use kinesis_interaction::{InteractionChanged, InteractionParams, hover_system, interaction_system};
use kinesis_physics::{
    DeviceProfile, PhysicsClock, PhysicsTuning, PhysicsWorld, SleepChanged, SleepPolicy,
    TuningApplied, TuningState, ground_probe_system, physics_step_system, pull_bodies_system,
    push_bodies_system, sleep_wake_system, tuning_system,
};
use kinesis_player::{Landed, LocomotionChanged, LocomotionParams, locomotion_system};

use crate::{InvariantChecks, invariant_check_system};

/// Drives every machine once per frame over a single ECS world.
pub struct FrameCoordinator {
    world: World,
    schedules: FrameSchedules,
}

impl FrameCoordinator {
    /// Builds the world and registers every stage for `config`.
    ///
    /// `profile` is what the platform layer reported; `None` selects the
    /// conservative tuning on the first frame.
    pub fn new(config: &Config, profile: Option<DeviceProfile>) -> Self {
        let mut world = create_world();

        world.insert_resource(PhysicsWorld::new());
        world.insert_resource(PhysicsClock::new(&PhysicsTuning::CONSERVATIVE));
        world.insert_resource(TuningState::new(config.tuning.clone(), profile));
        world.insert_resource(InputLatch::new());
        world.init_resource::<HookBuffer<TuningApplied>>();
        world.init_resource::<HookBuffer<SleepChanged>>();
        world.init_resource::<HookBuffer<LocomotionChanged>>();
        world.init_resource::<HookBuffer<Landed>>();
        world.init_resource::<HookBuffer<InteractionChanged>>();
        insert_params(&mut world, config);

        let mut schedules = FrameSchedules::new();
        schedules.add_system(FrameStage::Input, latch_input_system);
        schedules.add_system(FrameStage::Tuning, tuning_system);
        schedules.add_system(
            FrameStage::Locomotion,
            (ground_probe_system, locomotion_system).chain(),
        );
        schedules.add_system(
            FrameStage::Interaction,
            (hover_system, interaction_system).chain(),
        );
        schedules.add_system(FrameStage::SleepWake, sleep_wake_system);
        schedules.add_system(
            FrameStage::Physics,
            (push_bodies_system, physics_step_system, pull_bodies_system).chain(),
        );
        schedules.add_system(
            FrameStage::Finish,
            (invariant_check_system, clear_actor_input_system).chain(),
        );
        schedules.initialize_all(&mut world);

        tracing::info!(
            "Frame coordinator ready (device profile: {:?})",
            profile.and_then(|p| p.class)
        );

        Self { world, schedules }
    }

    /// Runs one frame lasting `delta` seconds.
    ///
    /// Hooks written by the previous frame stay readable until the next call.
    pub fn step(&mut self, delta: f32) {
        self.world.resource_mut::<FrameClock>().advance(delta);
        swap_hooks(&mut self.world);
        self.schedules.run(&mut self.world);
    }

    /// Reports a device change. Tuning is re-derived on the next frame.
    pub fn set_device_profile(&mut self, profile: Option<DeviceProfile>) {
        tracing::info!("Device profile changed: {:?}", profile);
        self.world
            .resource_mut::<TuningState>()
            .set_profile(profile);
    }

    /// Swaps in a reloaded configuration. Thresholds apply from the next frame.
    pub fn apply_config(&mut self, config: &Config) {
        insert_params(&mut self.world, config);
        self.world
            .resource_mut::<TuningState>()
            .set_config(config.tuning.clone());
    }

    /// Latch for forwarding raw button and pointer events between frames.
    pub fn input(&mut self) -> Mut<'_, InputLatch> {
        self.world.resource_mut::<InputLatch>()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Scene loading and teardown go through here.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

fn insert_params(world: &mut World, config: &Config) {
    world.insert_resource(SleepPolicy::from(&config.sleep));
    world.insert_resource(LocomotionParams::from(&config.locomotion));
    world.insert_resource(InteractionParams::from(&config.interaction));

    let enabled = config.debug.check_invariants;
    if world.contains_resource::<InvariantChecks>() {
        world.resource_mut::<InvariantChecks>().enabled = enabled;
    } else {
        world.insert_resource(InvariantChecks::new(enabled));
    }
}

fn swap_hooks(world: &mut World) {
    world.resource_mut::<HookBuffer<TuningApplied>>().swap();
    world.resource_mut::<HookBuffer<SleepChanged>>().swap();
    world.resource_mut::<HookBuffer<LocomotionChanged>>().swap();
    world.resource_mut::<HookBuffer<Landed>>().swap();
    world.resource_mut::<HookBuffer<InteractionChanged>>().swap();
}
