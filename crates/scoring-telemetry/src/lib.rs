//! Observability for the scoring service.
//!
//! - **Logging**: `tracing-subscriber` with JSON or pretty output, to stdout
//!   or a file ([`logging`])
//! - **Audit**: one structured event per request ([`audit`])
//! - **Metrics**: Prometheus counters and histograms ([`metrics`])
//!
//! # Example
//!
//! ```no_run
//! use scoring_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::default()).expect("logging");
//! tracing::info!(addr = "127.0.0.1:8080", "starting");
//! ```

#![forbid(unsafe_code)]

pub mod audit;
mod error;
pub mod logging;
pub mod metrics;

pub use audit::{log_audit, AUDIT_TARGET};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use crate::metrics::{init_metrics, record_request, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
