//! Configuration structs with sensible defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Device classification override.
    pub device: DeviceConfig,
    /// Sleep/wake scheduler thresholds.
    pub sleep: SleepConfig,
    /// Per-device physics tuning tables.
    pub tuning: TuningConfig,
    /// Player locomotion parameters.
    pub locomotion: LocomotionConfig,
    /// Grab/throw/snap parameters.
    pub interaction: InteractionConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// How the device class is chosen at startup.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeviceSetting {
    /// Use whatever the platform layer reports.
    #[default]
    Auto,
    /// Force desktop tuning.
    Desktop,
    /// Force mobile tuning.
    Mobile,
}

/// Device classification settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeviceConfig {
    /// Device class override.
    pub class: DeviceSetting,
    /// Treat the device as running in a battery-saving mode.
    pub low_power: bool,
}

/// Sleep/wake scheduler thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SleepConfig {
    /// Horizontal distance from the camera beyond which bodies sleep (meters).
    pub radial_distance: f32,
    /// Vertical distance from the camera beyond which bodies sleep (meters).
    pub vertical_distance: f32,
    /// Seconds without significant motion before a body sleeps.
    pub idle_seconds: f64,
    /// Speed (m/s) above which a body counts as moving.
    pub motion_epsilon: f32,
}

/// Physics tuning tables for each device class.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TuningConfig {
    /// Physics tick rate on desktop (Hz).
    pub desktop_tick_rate_hz: u32,
    /// Maximum physics substeps per frame on desktop.
    pub desktop_max_substeps: u32,
    /// Solver iterations per step on desktop.
    pub desktop_solver_iterations: u32,
    /// Physics tick rate on mobile (Hz).
    pub mobile_tick_rate_hz: u32,
    /// Maximum physics substeps per frame on mobile.
    pub mobile_max_substeps: u32,
    /// Solver iterations per step on mobile.
    pub mobile_solver_iterations: u32,
}

/// Player vertical motion parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Upward velocity applied on jump (m/s).
    pub launch_speed: f32,
    /// Vertical gravity acceleration (m/s², negative = down).
    pub gravity: f32,
    /// Grant one extra jump while airborne.
    pub allow_double_jump: bool,
    /// Seconds without ground support before a grounded actor starts falling.
    pub ledge_tolerance_s: f32,
    /// Maximum gap between feet and surface still counted as contact (meters).
    pub ground_snap_distance: f32,
    /// How far below the feet the ground probe searches (meters).
    pub probe_depth: f32,
}

/// When a held object docks onto a socket.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SnapMode {
    /// Dock only when the object is released over an active snap candidate.
    #[default]
    OnRelease,
    /// Dock as soon as a snap candidate appears while held.
    Continuous,
}

/// Grab, throw and magnet-snap parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InteractionConfig {
    /// Distance along the pointer ray at which a held object is carried (meters).
    pub hold_distance: f32,
    /// Seconds a released object is kept awake after release.
    pub release_grace_s: f64,
    /// Trailing window used to average the carry velocity (seconds).
    pub throw_window_s: f64,
    /// Multiplier applied to the averaged carry velocity on throw.
    pub throw_scale: f32,
    /// Upper bound on throw speed (m/s).
    pub max_throw_speed: f32,
    /// Snap trigger mode.
    pub snap_mode: SnapMode,
    /// Default horizontal capture range for magnet anchors (meters).
    pub anchor_radial_range: f32,
    /// Default vertical capture range for magnet anchors (meters).
    pub anchor_vertical_range: f32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Validate cross-machine invariants after every frame.
    pub check_invariants: bool,
}

// --- Default implementations ---

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            radial_distance: 20.0,
            vertical_distance: 10.0,
            idle_seconds: 2.0,
            motion_epsilon: 0.05,
        }
    }
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            desktop_tick_rate_hz: 120,
            desktop_max_substeps: 4,
            desktop_solver_iterations: 8,
            mobile_tick_rate_hz: 60,
            mobile_max_substeps: 2,
            mobile_solver_iterations: 4,
        }
    }
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            launch_speed: 5.0,
            gravity: -9.81,
            allow_double_jump: false,
            ledge_tolerance_s: 0.1,
            ground_snap_distance: 0.05,
            probe_depth: 0.5,
        }
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            hold_distance: 1.5,
            release_grace_s: 0.5,
            throw_window_s: 0.1,
            throw_scale: 1.0,
            max_throw_speed: 25.0,
            snap_mode: SnapMode::OnRelease,
            anchor_radial_range: 0.3,
            anchor_vertical_range: 0.1,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            check_invariants: true,
        }
    }
}

// --- Load / Save / Reload ---

const CONFIG_FILE: &str = "config.ron";

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl Config {
    /// Loads `config.ron` from `config_dir`, writing the defaults there first
    /// when the file does not exist yet.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            return Ok(config);
        }

        let config = read_config(&config_path)?;
        log::info!("Loaded config from {}", config_path.display());
        Ok(config)
    }

    /// Writes this config to `config_dir/config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        let write_error = |source| ConfigError::Write {
            path: config_path.clone(),
            source,
        };

        std::fs::create_dir_all(config_dir).map_err(write_error)?;
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .enumerate_arrays(false);
        let serialized = ron::ser::to_string_pretty(self, pretty)?;
        std::fs::write(&config_path, serialized).map_err(write_error)
    }

    /// Re-reads the file. `Some` only when its contents differ from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let fresh = read_config(&config_dir.join(CONFIG_FILE))?;
        if fresh == *self {
            return Ok(None);
        }
        log::info!("Config file changed on disk");
        Ok(Some(fresh))
    }
}
