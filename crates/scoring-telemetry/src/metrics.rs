//! Prometheus metrics.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `scoring_requests_total` | Counter | `method`, `code` |
//! | `scoring_request_duration_seconds` | Histogram | `method` |
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Request counter name.
pub const REQUESTS_TOTAL: &str = "scoring_requests_total";

/// Request duration histogram name.
pub const REQUEST_DURATION: &str = "scoring_request_duration_seconds";

/// Label used when the method is unknown (e.g. the envelope failed validation).
pub const UNKNOWN_METHOD: &str = "unknown";

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether to install the exporter.
    pub enabled: bool,

    /// Address of the Prometheus scrape listener.
    pub addr: String,

    /// Histogram buckets for request duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: "127.0.0.1:9090".to_string(),
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

/// Installs the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` for a bad address and
/// `TelemetryError::MetricsInit` if the exporter cannot be installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .addr
        .parse()
        .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", config.addr)))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets(&config.duration_buckets)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .install()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    describe_counter!(REQUESTS_TOTAL, "Total number of method calls by response code");
    describe_histogram!(REQUEST_DURATION, "Method call duration in seconds");

    tracing::info!(%addr, "prometheus exporter listening");
    Ok(())
}

/// Records a completed request.
pub fn record_request(method: Option<&str>, code: u16, duration: Duration) {
    let method = method.unwrap_or(UNKNOWN_METHOD).to_string();

    counter!(
        REQUESTS_TOTAL,
        "method" => method.clone(),
        "code" => code.to_string()
    )
    .increment(1);

    histogram!(REQUEST_DURATION, "method" => method).record(duration.as_secs_f64());
}
