//! # Logging Module
//!
//! Sets up `tracing` output: console always, plus a daily-rolling log file
//! when enabled in the `[logging]` config section. `RUST_LOG` takes
//! precedence over the configured level.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Keeps the file writer alive; logs are flushed when this is dropped
pub struct LoggingGuard {
    _guard: Option<WorkerGuard>,
}

/// Build the level filter, preferring `RUST_LOG` over the configured level
fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber
///
/// # Errors
///
/// Returns error if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<LoggingGuard> {
    let console_layer = fmt::layer().with_writer(std::io::stdout).with_target(true);

    let (file_layer, guard) = if config.file_logging_enabled {
        let appender = tracing_appender::rolling::daily(&config.log_dir, &config.file_name_prefix);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(level_filter(&config.level))
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(LoggingGuard { _guard: guard })
}
