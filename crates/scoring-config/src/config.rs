//! Main configuration types.
//!
//! The top-level [`ScoringConfig`] and the duration helpers of its sections.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    AuthConfig, ConfigError, LoggingConfig, MetricsConfig, ScoringSection, ServerConfig,
    StoreBackend, StoreConfig,
};

/// Complete scoring service configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use scoring_config::ScoringConfig;
///
/// let config = ScoringConfig::default();
/// assert_eq!(config.server.http_addr, "127.0.0.1:8080");
/// assert_eq!(config.auth.admin_login, "admin");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// HTTP server.
    #[serde(default)]
    pub server: ServerConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Prometheus metrics.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Token authentication.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Key-value store.
    #[serde(default)]
    pub store: StoreConfig,

    /// Scoring policy.
    #[serde(default)]
    pub scoring: ScoringSection,
}

impl ScoringConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_addr("server.http_addr", &self.server.http_addr)?;
        if self.metrics.enabled {
            parse_addr("metrics.addr", &self.metrics.addr)?;
        }

        non_zero("server.request_timeout_ms", self.server.request_timeout_ms)?;
        non_zero("store.connect_timeout_ms", self.store.connect_timeout_ms)?;
        non_zero("store.operation_timeout_ms", self.store.operation_timeout_ms)?;
        non_zero("scoring.cache_ttl_secs", self.scoring.cache_ttl_secs)?;
        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }

        for (field, value) in [
            ("auth.salt", &self.auth.salt),
            ("auth.admin_login", &self.auth.admin_login),
            ("auth.admin_salt", &self.auth.admin_salt),
        ] {
            if value.is_empty() {
                return Err(ConfigError::invalid_value(field, "must not be empty"));
            }
        }

        for (field, value) in [
            ("scoring.phone_weight", self.scoring.phone_weight),
            ("scoring.email_weight", self.scoring.email_weight),
            ("scoring.birthday_gender_weight", self.scoring.birthday_gender_weight),
            ("scoring.full_name_weight", self.scoring.full_name_weight),
            ("scoring.admin_score", self.scoring.admin_score),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid_value(
                    field,
                    "must be a finite, non-negative number",
                ));
            }
        }

        if self.store.backend == StoreBackend::Redis && self.store.dsn.is_empty() {
            return Err(ConfigError::invalid_value(
                "store.dsn",
                "must be set for the redis backend",
            ));
        }

        // a score request reads and then writes the cache
        let cache_time = self.store.cache_call_budget().saturating_mul(2);
        if cache_time >= self.server.request_timeout() {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_ms",
                format!(
                    "must exceed two cache calls ({} ms with the store timeouts)",
                    cache_time.as_millis()
                ),
            ));
        }

        Ok(())
    }

    /// Replaces the port of `server.http_addr`.
    ///
    /// # Errors
    ///
    /// Returns an error if the current address does not parse.
    pub fn set_port(&mut self, port: u16) -> Result<(), ConfigError> {
        let mut addr = parse_addr("server.http_addr", &self.server.http_addr)?;
        addr.set_port(port);
        self.server.http_addr = addr.to_string();
        Ok(())
    }
}

fn parse_addr(field: &str, value: &str) -> Result<SocketAddr, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::invalid_value(field, format!("invalid socket address: {value}")))
}

fn non_zero(field: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        Err(ConfigError::invalid_value(field, "must be greater than zero"))
    } else {
        Ok(())
    }
}

impl ServerConfig {
    /// Request body timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Graceful shutdown timeout.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl StoreConfig {
    /// Connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Per-operation timeout.
    #[must_use]
    pub const fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    /// Backoff step between retries.
    #[must_use]
    pub const fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Upper bound on one cache call.
    ///
    /// Cache calls make a single attempt: a Redis connect, if one is
    /// needed, plus one command.
    #[must_use]
    pub fn cache_call_budget(&self) -> Duration {
        match self.backend {
            StoreBackend::Memory => self.operation_timeout(),
            StoreBackend::Redis => self.connect_timeout().saturating_add(self.operation_timeout()),
        }
    }

    /// Upper bound on one durable read.
    ///
    /// Redis reads retry, so the bound covers every attempt and the backoff
    /// between them.
    #[must_use]
    pub fn read_call_budget(&self) -> Duration {
        match self.backend {
            StoreBackend::Memory => self.operation_timeout(),
            StoreBackend::Redis => {
                let backoff = (1..=self.max_retries).fold(Duration::ZERO, |total, attempt| {
                    total.saturating_add(self.retry_backoff().saturating_mul(attempt))
                });
                self.cache_call_budget()
                    .saturating_mul(self.max_retries.saturating_add(1))
                    .saturating_add(backoff)
            }
        }
    }
}

impl ScoringSection {
    /// Cached score lifetime.
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
