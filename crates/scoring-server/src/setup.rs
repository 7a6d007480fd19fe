//! Wiring from [`ScoringConfig`] to running components.

use std::path::PathBuf;
use std::sync::Arc;

use scoring_api::{Authenticator, MethodDispatcher, ScoringPolicy};
use scoring_config::{LogFormat, LoggingConfig, ScoringConfig, StoreBackend, StoreConfig};
use scoring_store::{MemoryStore, RedisOptions, RedisStore, SharedStore};
use scoring_telemetry::{LogConfig, MetricsConfig};
use tracing::info;

use crate::error::ServerError;

/// Creates the configured store backend.
///
/// The Redis connection is opened lazily, so an unreachable server is not
/// an error here.
///
/// # Errors
///
/// Returns an error if the Redis DSN is malformed.
pub fn build_store(config: &StoreConfig) -> Result<SharedStore, ServerError> {
    match config.backend {
        StoreBackend::Memory => {
            info!("using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Redis => {
            let options = RedisOptions {
                connect_timeout: config.connect_timeout(),
                operation_timeout: config.operation_timeout(),
                max_retries: config.max_retries,
                retry_backoff: config.retry_backoff(),
            };
            let store = RedisStore::open(&config.dsn, options)?;
            info!(dsn = %config.dsn, "using redis store");
            Ok(Arc::new(store))
        }
    }
}

/// Builds the dispatcher from the `[auth]` and `[scoring]` sections.
#[must_use]
pub fn build_dispatcher(config: &ScoringConfig, store: SharedStore) -> MethodDispatcher {
    let authenticator = Authenticator::new(
        config.auth.salt.clone(),
        config.auth.admin_login.clone(),
        config.auth.admin_salt.clone(),
    );
    let policy = ScoringPolicy {
        phone_weight: config.scoring.phone_weight,
        email_weight: config.scoring.email_weight,
        birthday_gender_weight: config.scoring.birthday_gender_weight,
        full_name_weight: config.scoring.full_name_weight,
        admin_score: config.scoring.admin_score,
        cache_ttl: config.scoring.cache_ttl(),
        cache_timeout: config.store.cache_call_budget(),
        read_timeout: config.store.read_call_budget(),
    };

    MethodDispatcher::new(store)
        .with_authenticator(authenticator)
        .with_policy(policy)
        .with_max_age_years(config.scoring.max_age_years)
}

/// Maps the `[logging]` section to the subscriber settings.
#[must_use]
pub fn log_config(config: &LoggingConfig) -> LogConfig {
    LogConfig {
        level: config.level.clone(),
        json_format: config.format == LogFormat::Json,
        file: config.file.as_ref().map(PathBuf::from),
        ..LogConfig::default()
    }
}

/// Maps the `[metrics]` section to the exporter settings.
#[must_use]
pub fn metrics_config(config: &scoring_config::MetricsConfig) -> MetricsConfig {
    MetricsConfig {
        enabled: config.enabled,
        addr: config.addr.clone(),
        ..MetricsConfig::default()
    }
}
