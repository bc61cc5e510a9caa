//! Platform directory resolution.
//!
//! Resolves where `config.ron` and log files live, following OS conventions
//! (XDG on Linux, Known Folders on Windows, Library on macOS).

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur during platform operations.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The OS did not provide a configuration directory.
    #[error("could not determine OS configuration directory")]
    NoConfigDir,
    /// Directory creation failed.
    #[error("platform I/O error: {0}")]
    Io(#[from] io::Error),
}

/// OS-specific directories used by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDirs {
    /// Holds `config.ron`.
    pub config_dir: PathBuf,
    /// Log files.
    pub log_dir: PathBuf,
}

const APP_NAME: &str = "kinesis";

impl PlatformDirs {
    /// Resolve platform-specific directories without creating them on disk.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::NoConfigDir`] if the OS does not expose a
    /// configuration directory.
    pub fn resolve() -> Result<Self, PlatformError> {
        let config_base = dirs::config_dir().ok_or(PlatformError::NoConfigDir)?;
        Ok(Self::resolve_with_root(&config_base))
    }

    /// Resolve directories rooted under a custom base path.
    ///
    /// Used for `--config` and for tests that must not touch real OS
    /// directories.
    pub fn resolve_with_root(root: &Path) -> Self {
        let app_dir = root.join(APP_NAME);
        Self {
            config_dir: app_dir.clone(),
            log_dir: app_dir.join("logs"),
        }
    }

    /// Directories for an explicit config directory given on the command line.
    pub fn from_config_dir(config_dir: PathBuf) -> Self {
        Self {
            log_dir: config_dir.join("logs"),
            config_dir,
        }
    }

    /// Create all directories on disk.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Io`] if any directory cannot be created.
    pub fn create_dirs(&self) -> Result<(), PlatformError> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}
