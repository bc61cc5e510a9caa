//! Configuration error types.

use std::path::PathBuf;

/// Failure to load or persist `config.ron`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not valid RON for [`Config`](crate::Config).
    #[error("invalid config in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
}
