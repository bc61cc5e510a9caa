//! Command-line argument parsing for the Kinesis runtime.

use std::path::PathBuf;

use clap::Parser;

use crate::{Config, DeviceSetting};

/// Kinesis command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "kinesis", about = "Kinesis runtime coordination core")]
pub struct CliArgs {
    /// Device class override (auto, desktop, mobile).
    #[arg(long)]
    pub device: Option<String>,

    /// Physics tick rate for both device classes (Hz).
    #[arg(long)]
    pub tick_rate: Option<u32>,

    /// Jump launch speed (m/s).
    #[arg(long)]
    pub launch_speed: Option<f32>,

    /// Allow one extra jump while airborne.
    #[arg(long)]
    pub double_jump: Option<bool>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of frames the headless driver runs.
    #[arg(long, default_value_t = 600)]
    pub frames: u32,
}

/// Parses a device class name; unknown names yield `None`.
fn parse_device(name: &str) -> Option<DeviceSetting> {
    match name.to_ascii_lowercase().as_str() {
        "auto" => Some(DeviceSetting::Auto),
        "desktop" => Some(DeviceSetting::Desktop),
        "mobile" => Some(DeviceSetting::Mobile),
        _ => None,
    }
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref name) = args.device {
            match parse_device(name) {
                Some(setting) => self.device.class = setting,
                None => log::warn!("Unknown device class '{name}', keeping {:?}", self.device.class),
            }
        }
        if let Some(rate) = args.tick_rate {
            self.tuning.desktop_tick_rate_hz = rate;
            self.tuning.mobile_tick_rate_hz = rate;
        }
        if let Some(speed) = args.launch_speed {
            self.locomotion.launch_speed = speed;
        }
        if let Some(double_jump) = args.double_jump {
            self.locomotion.allow_double_jump = double_jump;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_args() -> CliArgs {
        CliArgs {
            device: None,
            tick_rate: None,
            launch_speed: None,
            double_jump: None,
            log_level: None,
            config: None,
            frames: 600,
        }
    }

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            device: Some("Mobile".to_string()),
            tick_rate: Some(90),
            launch_speed: Some(7.0),
            ..empty_args()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.device.class, DeviceSetting::Mobile);
        assert_eq!(config.tuning.desktop_tick_rate_hz, 90);
        assert_eq!(config.tuning.mobile_tick_rate_hz, 90);
        assert_eq!(config.locomotion.launch_speed, 7.0);
        // Non-overridden fields retain defaults
        assert!(!config.locomotion.allow_double_jump);
        assert_eq!(config.debug.log_level, "info");
    }

    #[test]
    fn test_cli_no_override() {
        let defaults = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&empty_args());
        assert_eq!(config, defaults);
    }

    #[test]
    fn test_unknown_device_keeps_setting() {
        let mut config = Config::default();
        let args = CliArgs {
            device: Some("toaster".to_string()),
            ..empty_args()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.device.class, DeviceSetting::Auto);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from(["kinesis", "--double-jump", "true", "--frames", "30"]);
        assert_eq!(args.double_jump, Some(true));
        assert_eq!(args.frames, 30);
    }
}
