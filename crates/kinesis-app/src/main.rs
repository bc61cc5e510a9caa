//! Headless driver for the Kinesis runtime.
//!
//! Loads `config.ron`, applies CLI overrides, builds the demo room, and runs
//! the frame coordinator with a scripted input sequence: pick up a crate and
//! throw it, jump, then carry another crate onto the wall socket.
//!
//! Run with `cargo run -p kinesis-app -- --frames 600 --log-level debug`.

use clap::Parser;
use glam::Vec3;
use kinesis_app::{DemoScene, FrameCoordinator, FrameLoop, PlatformDirs, spawn_demo_scene};
use kinesis_config::{CliArgs, Config};
use kinesis_ecs::{HookBuffer, Transform};
use kinesis_input::{Action, PointerRay};
use kinesis_interaction::InteractionChanged;
use kinesis_physics::{DeviceClass, DeviceProfile, SleepChanged, TuningApplied};
use kinesis_player::{Landed, LocomotionChanged};
use tracing::{info, warn};

/// Fixed frame time of the scripted run.
const FRAME_TIME: f64 = 1.0 / 60.0;
/// Frames between config hot-reload checks.
const RELOAD_INTERVAL: u32 = 120;

#[derive(Debug, Clone, Copy)]
enum Cue {
    AimAt(usize),
    AimAtSocket,
    Swing(f32),
    Press(Action),
    Release(Action),
}

const SCRIPT: &[(u32, Cue)] = &[
    (20, Cue::AimAt(0)),
    (30, Cue::Press(Action::Grab)),
    (40, Cue::Swing(0.05)),
    (41, Cue::Swing(0.10)),
    (42, Cue::Swing(0.15)),
    (43, Cue::Swing(0.20)),
    (44, Cue::Release(Action::Grab)),
    (120, Cue::Press(Action::Jump)),
    (122, Cue::Release(Action::Jump)),
    (200, Cue::AimAt(1)),
    (210, Cue::Press(Action::Grab)),
    (230, Cue::AimAtSocket),
    (240, Cue::Release(Action::Grab)),
];

fn main() {
    let args = CliArgs::parse();

    let dirs = match args.config.clone() {
        Some(dir) => PlatformDirs::from_config_dir(dir),
        None => match PlatformDirs::resolve() {
            Ok(dirs) => dirs,
            Err(e) => {
                eprintln!("Failed to resolve platform directories: {e}");
                std::process::exit(1);
            }
        },
    };
    if let Err(e) = dirs.create_dirs() {
        eprintln!("Failed to create platform directories: {e}");
    }

    let mut config = Config::load_or_create(&dirs.config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    kinesis_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));

    // Headless runs have no platform probe; report a desktop.
    let profile = DeviceProfile::from_config(&config.device, Some(DeviceClass::Desktop));
    let mut coordinator = FrameCoordinator::new(&config, Some(profile));
    let scene = spawn_demo_scene(coordinator.world_mut(), &config);
    let mut frame_loop = FrameLoop::new();

    for frame in 0..args.frames {
        for &(_, cue) in SCRIPT.iter().filter(|(at, _)| *at == frame) {
            play(cue, &scene, &mut coordinator);
        }

        frame_loop.tick_with(FRAME_TIME, &mut coordinator);
        log_hooks(&coordinator);

        if frame > 0 && frame % RELOAD_INTERVAL == 0 {
            match config.reload(&dirs.config_dir) {
                Ok(Some(mut reloaded)) => {
                    reloaded.apply_cli_overrides(&args);
                    coordinator.apply_config(&reloaded);
                    config = reloaded;
                    info!("Configuration reloaded");
                }
                Ok(None) => {}
                Err(e) => warn!("Config reload failed: {e}"),
            }
        }
    }

    info!(
        "Ran {} frames ({:.2}s simulated)",
        frame_loop.frame_count(),
        frame_loop.total_time()
    );
}

fn play(cue: Cue, scene: &DemoScene, coordinator: &mut FrameCoordinator) {
    match cue {
        Cue::AimAt(index) => {
            let target = coordinator
                .world()
                .get::<Transform>(scene.crates[index])
                .map(|t| t.translation);
            if let Some(target) = target {
                coordinator
                    .input()
                    .set_pointer(PointerRay::new(scene.eye, target - scene.eye));
            }
        }
        Cue::AimAtSocket => {
            coordinator
                .input()
                .set_pointer(PointerRay::new(scene.eye, scene.socket_aim));
        }
        Cue::Swing(offset) => {
            let pointer = coordinator.input().pointer();
            if let Some(ray) = pointer {
                let swung = ray.direction + Vec3::X * offset;
                coordinator
                    .input()
                    .set_pointer(PointerRay::new(ray.origin, swung));
            }
        }
        Cue::Press(action) => coordinator.input().press(action),
        Cue::Release(action) => coordinator.input().release(action),
    }
}

fn log_hooks(coordinator: &FrameCoordinator) {
    let world = coordinator.world();
    for hook in world.resource::<HookBuffer<TuningApplied>>().read_current() {
        info!(
            "Tuning: {} Hz, {} substeps, {} iterations",
            hook.tuning.tick_rate_hz, hook.tuning.max_substeps, hook.tuning.solver_iterations
        );
    }
    for hook in world.resource::<HookBuffer<SleepChanged>>().read_current() {
        info!(
            "Body {:?} is now {:?} (t={:.2})",
            hook.entity, hook.state, hook.frame_time
        );
    }
    for hook in world.resource::<HookBuffer<LocomotionChanged>>().read_current() {
        info!("Actor {:?}: {:?} -> {:?}", hook.entity, hook.from, hook.to);
    }
    for hook in world.resource::<HookBuffer<Landed>>().read_current() {
        info!("Actor {:?} landed at {:.2} m/s", hook.entity, hook.impact_speed);
    }
    for hook in world.resource::<HookBuffer<InteractionChanged>>().read_current() {
        info!(
            "Interactable {:?}: {:?} -> {:?} (actor {:?}, socket {:?})",
            hook.entity, hook.from, hook.to, hook.actor, hook.socket
        );
    }
}
