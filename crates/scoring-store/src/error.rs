//! Store error types.

use std::time::Duration;

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The DSN could not be parsed.
    #[error("invalid store DSN '{dsn}': {source}")]
    InvalidDsn {
        /// The rejected DSN.
        dsn: String,
        /// Parser error.
        #[source]
        source: redis::RedisError,
    },

    /// The backend returned an error.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// An operation did not finish in time.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// The operation that timed out.
        operation: &'static str,
        /// The limit that was hit.
        after: Duration,
    },

    /// The backend is unreachable.
    #[error("store unavailable: {reason}")]
    Unavailable {
        /// Why the store is unavailable.
        reason: String,
    },

    /// Every retry failed.
    #[error("{operation} failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// The operation that failed.
        operation: &'static str,
        /// Number of attempts made.
        attempts: u32,
        /// The last error seen.
        #[source]
        last: Box<StoreError>,
    },
}

impl StoreError {
    /// Creates an unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub const fn timeout(operation: &'static str, after: Duration) -> Self {
        Self::Timeout { operation, after }
    }

    /// Returns `true` if retrying might help.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        !matches!(self, Self::InvalidDsn { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = StoreError::timeout("GET", Duration::from_millis(5));
        assert_eq!(err.to_string(), "GET timed out after 5ms");

        let err = StoreError::RetriesExhausted {
            operation: "GET",
            attempts: 4,
            last: Box::new(StoreError::unavailable("down")),
        };
        assert_eq!(err.to_string(), "GET failed after 4 attempts: store unavailable: down");
        assert!(err.is_transient());
    }
}
