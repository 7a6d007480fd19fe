//! Structured logging.
//!
//! JSON lines by default, pretty output for development, written to stdout
//! or appended to a file.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level filter used when `RUST_LOG` is unset (e.g. `"info"`).
    pub level: String,

    /// Emit JSON lines instead of pretty output.
    pub json_format: bool,

    /// Append to this file instead of writing to stdout.
    pub file: Option<PathBuf>,

    /// Include the event target (module path or `scoring::audit`).
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: true,
            file: None,
            include_target: true,
        }
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` if the filter is invalid or a
/// subscriber is already installed, and `TelemetryError::LogFile` if the log
/// file cannot be opened.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| create_env_filter(&config.level))?;

    let (writer, ansi) = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| TelemetryError::LogFile {
                    path: path.display().to_string(),
                    source,
                })?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stdout), true),
    };

    let layer = if config.json_format {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(config.include_target)
            .with_filter(filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .pretty()
            .with_ansi(ansi)
            .with_writer(writer)
            .with_target(config.include_target)
            .with_filter(filter)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Creates an env filter from a string such as `"info,scoring_store=debug"`.
///
/// # Errors
///
/// Returns error if the filter string is invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::LoggingInit(format!("Invalid log level: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert!(config.json_format);
        assert_eq!(config.level, "info");
        assert!(config.file.is_none());
    }

    #[test]
    fn test_create_env_filter() {
        assert!(create_env_filter("info,scoring_store=debug").is_ok());
        assert!(create_env_filter("scoring=loud").is_err());
    }

    #[test]
    fn test_unwritable_log_file() {
        let config = LogConfig {
            file: Some(PathBuf::from("/nonexistent-dir/scoring.log")),
            ..LogConfig::default()
        };
        assert!(matches!(
            init_logging(&config),
            Err(TelemetryError::LogFile { .. })
        ));
    }
}
