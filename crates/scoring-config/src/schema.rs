//! Configuration schema types.
//!
//! Every section denies unknown keys and defaults every field, so an empty
//! file is a valid configuration.

use serde::{Deserialize, Serialize};

/// HTTP server section.
///
/// # Example
///
/// ```
/// use scoring_config::ServerConfig;
///
/// let config = ServerConfig {
///     http_addr: "0.0.0.0:8080".to_string(),
///     ..Default::default()
/// };
/// assert_eq!(config.request_timeout_ms, 30_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Limit on reading a request body, in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Largest accepted request body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            request_timeout_ms: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_http_addr() -> String {
    "127.0.0.1:8080".to_string()
}

const fn default_request_timeout() -> u64 {
    30_000
}

const fn default_shutdown_timeout() -> u64 {
    30
}

const fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable output.
    Pretty,
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default level filter (`RUST_LOG` takes precedence).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Append to this file instead of stdout.
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Serve Prometheus metrics.
    #[serde(default)]
    pub enabled: bool,

    /// Prometheus listener address.
    #[serde(default = "default_metrics_addr")]
    pub addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: default_metrics_addr(),
        }
    }
}

fn default_metrics_addr() -> String {
    "127.0.0.1:9090".to_string()
}

/// Token authentication section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Salt appended to `account + login`.
    #[serde(default = "default_salt")]
    pub salt: String,

    /// Login that authenticates with the hourly admin token.
    #[serde(default = "default_admin_login")]
    pub admin_login: String,

    /// Salt appended to the admin hour stamp.
    #[serde(default = "default_admin_salt")]
    pub admin_salt: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            salt: default_salt(),
            admin_login: default_admin_login(),
            admin_salt: default_admin_salt(),
        }
    }
}

fn default_salt() -> String {
    "Otus".to_string()
}

fn default_admin_login() -> String {
    "admin".to_string()
}

fn default_admin_salt() -> String {
    "42".to_string()
}

/// Store backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Redis at `store.dsn`.
    #[default]
    Redis,
    /// In-process map; nothing persists.
    Memory,
}

/// Store section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Which backend to use.
    #[serde(default)]
    pub backend: StoreBackend,

    /// Redis DSN.
    #[serde(default = "default_dsn")]
    pub dsn: String,

    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Per-operation timeout in milliseconds.
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_ms: u64,

    /// Retries after a failed attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Linear backoff step in milliseconds.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            dsn: default_dsn(),
            connect_timeout_ms: default_connect_timeout(),
            operation_timeout_ms: default_operation_timeout(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff(),
        }
    }
}

fn default_dsn() -> String {
    "redis://127.0.0.1:6379/0".to_string()
}

const fn default_connect_timeout() -> u64 {
    2_000
}

const fn default_operation_timeout() -> u64 {
    1_000
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_retry_backoff() -> u64 {
    2_000
}

/// Scoring policy section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringSection {
    /// Added when a phone is supplied.
    #[serde(default = "default_signal_weight")]
    pub phone_weight: f64,

    /// Added when an email is supplied.
    #[serde(default = "default_signal_weight")]
    pub email_weight: f64,

    /// Added when both birthday and gender are supplied.
    #[serde(default = "default_signal_weight")]
    pub birthday_gender_weight: f64,

    /// Added when both first and last name are supplied.
    #[serde(default = "default_full_name_weight")]
    pub full_name_weight: f64,

    /// Score returned to the admin.
    #[serde(default = "default_admin_score")]
    pub admin_score: f64,

    /// Lifetime of cached scores in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Oldest accepted birthday, in full years.
    #[serde(default = "default_max_age_years")]
    pub max_age_years: u32,
}

impl Default for ScoringSection {
    fn default() -> Self {
        Self {
            phone_weight: default_signal_weight(),
            email_weight: default_signal_weight(),
            birthday_gender_weight: default_signal_weight(),
            full_name_weight: default_full_name_weight(),
            admin_score: default_admin_score(),
            cache_ttl_secs: default_cache_ttl(),
            max_age_years: default_max_age_years(),
        }
    }
}

const fn default_signal_weight() -> f64 {
    1.5
}

const fn default_full_name_weight() -> f64 {
    0.5
}

const fn default_admin_score() -> f64 {
    42.0
}

const fn default_cache_ttl() -> u64 {
    3_600
}

const fn default_max_age_years() -> u32 {
    70
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, "127.0.0.1:8080");
        assert_eq!(config.max_body_bytes, 1_048_576);
    }

    #[test]
    fn test_partial_section_fills_defaults() {
        let store: StoreConfig = toml::from_str("backend = \"memory\"").unwrap();
        assert_eq!(store.backend, StoreBackend::Memory);
        assert_eq!(store.max_retries, 3);
        assert_eq!(store.dsn, "redis://127.0.0.1:6379/0");
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result: Result<AuthConfig, _> = toml::from_str("pepper = \"x\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_scoring_defaults() {
        let scoring = ScoringSection::default();
        assert!((scoring.phone_weight - 1.5).abs() < f64::EPSILON);
        assert!((scoring.full_name_weight - 0.5).abs() < f64::EPSILON);
        assert!((scoring.admin_score - 42.0).abs() < f64::EPSILON);
        assert_eq!(scoring.cache_ttl_secs, 3600);
    }
}
