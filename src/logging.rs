//! Tracing subscriber setup for the binaries.

use crate::config::LoggingConfig;
use crate::error::{AcademyError, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Log file name prefix; the appender adds a `.YYYY-MM-DD` suffix.
pub const LOG_FILE_PREFIX: &str = "academy.log";

/// Build the filter: `RUST_LOG` wins, then the configured directive.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter))
}

/// Install the global subscriber.
///
/// Logs go to stderr, and additionally to a daily-rotated file when
/// `config.directory` is set. Keep the returned guard alive for the life of
/// the process or buffered file output is lost.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let (file_layer, guard) = match &config.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| AcademyError::Config(format!("logging already initialised: {e}")))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn configured_filter_parses() {
        let config = LoggingConfig::default();
        let filter = env_filter(&config);
        assert!(!filter.to_string().is_empty());
    }

    #[test]
    fn second_init_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            directory: Some(dir.path().join("logs")),
            ..LoggingConfig::default()
        };
        let first = init(&config);
        let second = init(&config);
        // Another test may have installed a subscriber first.
        assert!(first.is_err() || second.is_err());
        assert!(dir.path().join("logs").is_dir());
    }
}
