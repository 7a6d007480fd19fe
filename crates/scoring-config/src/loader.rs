//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, and environment variables.

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::{ConfigError, LogFormat, ScoringConfig, StoreBackend};

/// Environment variable that overrides `store.dsn`.
pub const REDIS_DSN_VAR: &str = "REDIS_DSN";

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values
/// 2. Configuration file (TOML or JSON)
/// 3. `REDIS_DSN`
/// 4. `PREFIX__SECTION__KEY` environment variables
///
/// # Example
///
/// ```no_run
/// use scoring_config::ConfigLoader;
///
/// # fn main() -> Result<(), scoring_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("scoring.toml")?
///     .with_env_prefix("SCORING")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: ScoringConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a loader starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ScoringConfig::default(),
            env_prefix: None,
        }
    }

    /// Load configuration from a file.
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, malformed,
    /// or contains unknown keys.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        self.config = Self::parse_file(&content, path)?;

        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or the format is unknown.
    ///
    /// # Example
    ///
    /// ```
    /// use scoring_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [auth]
    ///     salt = "pepper"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.auth.salt, "pepper");
    /// assert_eq!(config.auth.admin_login, "admin");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        Ok(self)
    }

    /// Set the environment variable prefix for overrides.
    ///
    /// Variables use the format `PREFIX__SECTION__KEY`, for example
    /// `SCORING__STORE__BACKEND=memory`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load `.env` from the working directory into the process environment,
    /// if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if the file exists but cannot be read
    /// or parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        ignore_missing(dotenvy::dotenv().map(drop))?;
        Ok(self)
    }

    /// Load the given dotenv file into the process environment, if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if the file exists but cannot be read
    /// or parsed.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        ignore_missing(dotenvy::from_path(path))?;
        Ok(self)
    }

    /// Apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override does not parse or validation
    /// fails.
    pub fn load(mut self) -> Result<ScoringConfig, ConfigError> {
        self.apply_redis_dsn(env::var(REDIS_DSN_VAR).ok());

        if let Some(prefix) = self.env_prefix.take() {
            let vars: Vec<(String, String)> = env::vars()
                .filter(|(k, _)| k.starts_with(&prefix))
                .collect();
            for (key, value) in vars {
                self.apply_env_var(&key, &value, &prefix)?;
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Finalize without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> ScoringConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<ScoringConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    fn apply_redis_dsn(&mut self, dsn: Option<String>) {
        if let Some(dsn) = dsn.filter(|d| !d.is_empty()) {
            self.config.store.dsn = dsn;
        }
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(rest) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__")) else {
            // SCORING_OTHER and friends are not ours
            return Ok(());
        };

        let parts: Vec<&str> = rest.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => config.server.http_addr = value.to_string(),
            ["SERVER", "REQUEST_TIMEOUT_MS"] => {
                config.server.request_timeout_ms = parse_num(key, value)?;
            }
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                config.server.shutdown_timeout_secs = parse_num(key, value)?;
            }
            ["SERVER", "MAX_BODY_BYTES"] => config.server.max_body_bytes = parse_num(key, value)?,

            ["LOGGING", "LEVEL"] => config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => return Err(ConfigError::env_parse_error(key, "expected 'json' or 'pretty'")),
                };
            }
            ["LOGGING", "FILE"] => config.logging.file = non_empty(value),

            ["METRICS", "ENABLED"] => {
                config.metrics.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["METRICS", "ADDR"] => config.metrics.addr = value.to_string(),

            ["AUTH", "SALT"] => config.auth.salt = value.to_string(),
            ["AUTH", "ADMIN_LOGIN"] => config.auth.admin_login = value.to_string(),
            ["AUTH", "ADMIN_SALT"] => config.auth.admin_salt = value.to_string(),

            ["STORE", "BACKEND"] => {
                config.store.backend = match value.to_lowercase().as_str() {
                    "redis" => StoreBackend::Redis,
                    "memory" => StoreBackend::Memory,
                    _ => return Err(ConfigError::env_parse_error(key, "expected 'redis' or 'memory'")),
                };
            }
            ["STORE", "DSN"] => config.store.dsn = value.to_string(),
            ["STORE", "CONNECT_TIMEOUT_MS"] => {
                config.store.connect_timeout_ms = parse_num(key, value)?;
            }
            ["STORE", "OPERATION_TIMEOUT_MS"] => {
                config.store.operation_timeout_ms = parse_num(key, value)?;
            }
            ["STORE", "MAX_RETRIES"] => config.store.max_retries = parse_num(key, value)?,
            ["STORE", "RETRY_BACKOFF_MS"] => {
                config.store.retry_backoff_ms = parse_num(key, value)?;
            }

            ["SCORING", "PHONE_WEIGHT"] => config.scoring.phone_weight = parse_num(key, value)?,
            ["SCORING", "EMAIL_WEIGHT"] => config.scoring.email_weight = parse_num(key, value)?,
            ["SCORING", "BIRTHDAY_GENDER_WEIGHT"] => {
                config.scoring.birthday_gender_weight = parse_num(key, value)?;
            }
            ["SCORING", "FULL_NAME_WEIGHT"] => {
                config.scoring.full_name_weight = parse_num(key, value)?;
            }
            ["SCORING", "ADMIN_SCORE"] => config.scoring.admin_score = parse_num(key, value)?,
            ["SCORING", "CACHE_TTL_SECS"] => config.scoring.cache_ttl_secs = parse_num(key, value)?,
            ["SCORING", "MAX_AGE_YEARS"] => config.scoring.max_age_years = parse_num(key, value)?,

            // Unknown key - ignore
            _ => {}
        }

        Ok(())
    }
}

fn parse_num<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected a number"))
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn ignore_missing(result: dotenvy::Result<()>) -> Result<(), ConfigError> {
    match result {
        Err(err) if !err.not_found() => Err(ConfigError::Dotenv(err)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load_unvalidated();
        assert_eq!(config.server.http_addr, "127.0.0.1:8080");
    }

    #[test]
    fn test_dotenv_missing_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigLoader::new().with_dotenv_file(dir.path().join(".env"));
        assert!(result.is_ok());
    }

    #[test]
    fn test_dotenv_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "SCORING_TEST_DOTENV_QUOTE='never closed").unwrap();

        let result = ConfigLoader::new().with_dotenv_file(file.path());
        assert!(matches!(result, Err(ConfigError::Dotenv(_))));
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"store": {"backend": "memory"}, "scoring": {"admin_score": 100}}"#;
        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load_unvalidated();

        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert!((config.scoring.admin_score - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_loader_with_string_unknown_format() {
        let result = ConfigLoader::new().with_string("", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_loader_rejects_unknown_section() {
        let result = ConfigLoader::new().with_string("[contract]\nenabled = true", "toml");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_loader_with_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nhttp_addr = \"0.0.0.0:9100\"\n\n[store]\nmax_retries = 5"
        )
        .unwrap();

        let config = ConfigLoader::new()
            .with_file(file.path())
            .unwrap()
            .load_unvalidated();

        assert_eq!(config.server.http_addr, "0.0.0.0:9100");
        assert_eq!(config.store.max_retries, 5);
        assert_eq!(config.store.retry_backoff_ms, 2000);
    }

    #[test]
    fn test_loader_with_unsupported_file_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let result = ConfigLoader::new().with_file(file.path());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/scoring.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/scoring.toml")
            .unwrap()
            .load_unvalidated();
        assert_eq!(config.auth.salt, "Otus");
    }

    #[test]
    fn test_redis_dsn_override() {
        let mut loader = ConfigLoader::new();
        loader.apply_redis_dsn(Some(String::new()));
        assert_eq!(loader.config.store.dsn, "redis://127.0.0.1:6379/0");
        loader.apply_redis_dsn(Some("redis://cache:6379/1".to_string()));
        assert_eq!(loader.config.store.dsn, "redis://cache:6379/1");
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("ON"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    // The process environment is shared between tests, so overrides are
    // exercised through apply_env_var directly.

    #[test]
    fn test_apply_env_var_sections() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__SERVER__HTTP_ADDR", "0.0.0.0:9000", "TEST").unwrap();
        loader.apply_env_var("TEST__STORE__BACKEND", "memory", "TEST").unwrap();
        loader.apply_env_var("TEST__STORE__MAX_RETRIES", "7", "TEST").unwrap();
        loader.apply_env_var("TEST__AUTH__ADMIN_LOGIN", "root", "TEST").unwrap();
        loader.apply_env_var("TEST__SCORING__FULL_NAME_WEIGHT", "0.75", "TEST").unwrap();
        loader.apply_env_var("TEST__LOGGING__FILE", "/var/log/scoring.log", "TEST").unwrap();

        let config = loader.load_unvalidated();
        assert_eq!(config.server.http_addr, "0.0.0.0:9000");
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.max_retries, 7);
        assert_eq!(config.auth.admin_login, "root");
        assert!((config.scoring.full_name_weight - 0.75).abs() < f64::EPSILON);
        assert_eq!(config.logging.file.as_deref(), Some("/var/log/scoring.log"));
    }

    #[test]
    fn test_apply_env_var_invalid_values() {
        let mut loader = ConfigLoader::new();
        assert!(loader
            .apply_env_var("TEST__STORE__MAX_RETRIES", "many", "TEST")
            .is_err());
        assert!(loader
            .apply_env_var("TEST__METRICS__ENABLED", "perhaps", "TEST")
            .is_err());
        assert!(loader
            .apply_env_var("TEST__LOGGING__FORMAT", "xml", "TEST")
            .is_err());
    }

    #[test]
    fn test_apply_env_var_ignores_foreign_keys() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TESTING_MODE", "1", "TEST").unwrap();
        loader.apply_env_var("TEST__NOPE__KEY", "1", "TEST").unwrap();
        assert_eq!(loader.load_unvalidated(), ScoringConfig::default());
    }
}
