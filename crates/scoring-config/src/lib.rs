//! Typed configuration for the scoring service.
//!
//! Configuration is layered: defaults, then a TOML or JSON file, then
//! environment variables. Every section rejects unknown keys.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "127.0.0.1:8080"
//! request_timeout_ms = 30000
//! shutdown_timeout_secs = 30
//! max_body_bytes = 1048576
//!
//! [logging]
//! level = "info"
//! format = "json"
//! # file = "/var/log/scoring.log"
//!
//! [metrics]
//! enabled = false
//! addr = "127.0.0.1:9090"
//!
//! [auth]
//! salt = "Otus"
//! admin_login = "admin"
//! admin_salt = "42"
//!
//! [store]
//! backend = "redis"
//! dsn = "redis://127.0.0.1:6379/0"
//! connect_timeout_ms = 2000
//! operation_timeout_ms = 1000
//! max_retries = 3
//! retry_backoff_ms = 2000
//!
//! [scoring]
//! phone_weight = 1.5
//! email_weight = 1.5
//! birthday_gender_weight = 1.5
//! full_name_weight = 0.5
//! admin_score = 42.0
//! cache_ttl_secs = 3600
//! max_age_years = 70
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `SCORING__SERVER__HTTP_ADDR=0.0.0.0:9000`
//! - `SCORING__STORE__BACKEND=memory`
//! - `REDIS_DSN=redis://cache:6379/0` (overrides `store.dsn`)

#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::ScoringConfig;
pub use error::ConfigError;
pub use loader::{ConfigLoader, REDIS_DSN_VAR};
pub use schema::{
    AuthConfig, LogFormat, LoggingConfig, MetricsConfig, ScoringSection, ServerConfig,
    StoreBackend, StoreConfig,
};
