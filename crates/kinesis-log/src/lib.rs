//! Structured logging for the Kinesis runtime.
//!
//! Installs a `tracing` subscriber with console output (uptime timestamps and
//! module targets) and, in debug builds, a JSON file layer for post-mortem
//! analysis of frame-by-frame state transitions. The filter honors `RUST_LOG`
//! first, then the configured `debug.log_level`.

use kinesis_config::Config;
use std::path::Path;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config supplies one.
const DEFAULT_FILTER: &str = "info";

/// Name of the JSON log file written in debug builds.
pub const LOG_FILE_NAME: &str = "kinesis.log";

/// Resolve the filter string from an optional config.
///
/// An empty `log_level` falls back to [`DEFAULT_FILTER`].
pub fn filter_string(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.debug.log_level.is_empty() => config.debug.log_level.clone(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - Directory for the JSON log file (debug builds only)
/// * `debug_build` - Whether file logging is enabled
/// * `config` - Optional configuration supplying the log level
///
/// ```no_run
/// use kinesis_log::init_logging;
/// use kinesis_config::Config;
///
/// let config = Config::default();
/// init_logging(None, false, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let filter_str = filter_string(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join(LOG_FILE_NAME))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

/// Create an `EnvFilter` with the default filter string.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}
