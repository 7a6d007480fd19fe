//! Server error types.

use scoring_config::ConfigError;
use scoring_store::StoreError;
use scoring_telemetry::TelemetryError;
use thiserror::Error;

/// Errors that stop the server from starting or running.
///
/// Per-request failures never surface here; they become response
/// envelopes.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address does not parse.
    #[error("invalid listen address '{addr}'")]
    InvalidAddress {
        /// The configured address.
        addr: String,
    },

    /// The listener could not be bound.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        /// The address that was tried.
        addr: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The store could not be set up.
    #[error("store setup failed: {0}")]
    Store(#[from] StoreError),

    /// Logging or metrics could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}
