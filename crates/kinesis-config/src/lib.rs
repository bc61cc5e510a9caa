//! Configuration system for the Kinesis runtime core.
//!
//! Every tunable threshold of the frame coordinator lives here: sleep/wake
//! distances and timers, device tuning tables, locomotion and interaction
//! parameters. Settings persist to disk as RON, accept CLI overrides via clap,
//! and support hot-reload detection.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, DeviceConfig, DeviceSetting, InteractionConfig, LocomotionConfig,
    SleepConfig, SnapMode, TuningConfig,
};
pub use error::ConfigError;
