//! Error types for the scoring API.
//!
//! [`ScoringError`] is the terminal outcome of a single request. Field-level
//! validation problems are collected upstream and arrive here already
//! rendered as `"<field>: <message>"` strings.
//!
//! | `ErrorCategory` | HTTP status | envelope `error` |
//! |---|---|---|
//! | `BadRequest` | 400 | `Bad Request` |
//! | `Forbidden` | 403 | `Forbidden` |
//! | `NotFound` | 404 | `Not Found` |
//! | `Validation` | 422 | joined field errors |
//! | `Internal` | 500 | `Internal Server Error` |

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`ScoringError`].
pub type ScoringResult<T> = Result<T, ScoringError>;

/// Categories of request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The body was not a JSON object.
    BadRequest,
    /// Authentication failed.
    Forbidden,
    /// Unknown method or path.
    NotFound,
    /// One or more fields failed validation.
    Validation,
    /// Store failure or any other unexpected condition.
    Internal,
}

impl ErrorCategory {
    /// Returns the HTTP status code for this category.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the client-facing reason phrase for this category.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::BadRequest => "Bad Request",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not Found",
            Self::Validation => "Invalid Request",
            Self::Internal => "Internal Server Error",
        }
    }
}

/// Terminal outcome of a request that did not succeed.
///
/// # Example
///
/// ```
/// use scoring_core::{ErrorCategory, ScoringError};
///
/// let err = ScoringError::method_not_found("frobnicate");
/// assert_eq!(err.category(), ErrorCategory::NotFound);
/// assert_eq!(err.status_code().as_u16(), 404);
/// ```
#[derive(Error, Debug)]
pub enum ScoringError {
    /// The request body could not be used as a JSON object.
    #[error("bad request: {reason}")]
    BadRequest {
        /// What was wrong with the body.
        reason: String,
    },

    /// The supplied token did not match.
    #[error("forbidden: invalid token for login '{login}'")]
    Forbidden {
        /// Login of the rejected caller.
        login: String,
    },

    /// No method or route with this name.
    #[error("not found: {target}")]
    NotFound {
        /// The method name or path that was requested.
        target: String,
    },

    /// Field validation failed.
    #[error("validation failed: {}", errors.join("; "))]
    Validation {
        /// Field errors rendered as `"<field>: <message>"`, in declaration order.
        errors: Vec<String>,
    },

    /// Internal failure (store outage, corrupt data).
    #[error("internal error: {message}")]
    Internal {
        /// Message for logs; never sent to clients.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl ScoringError {
    /// Creates a bad request error.
    #[must_use]
    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::BadRequest {
            reason: reason.into(),
        }
    }

    /// Creates a forbidden error for the given login.
    #[must_use]
    pub fn forbidden(login: impl Into<String>) -> Self {
        Self::Forbidden {
            login: login.into(),
        }
    }

    /// Creates a not found error for an unknown method.
    #[must_use]
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::NotFound {
            target: format!("method '{}'", method.into()),
        }
    }

    /// Creates a not found error for an unknown route.
    #[must_use]
    pub fn route_not_found(path: impl Into<String>) -> Self {
        Self::NotFound {
            target: format!("route '{}'", path.into()),
        }
    }

    /// Creates a validation error from rendered field errors.
    #[must_use]
    pub fn validation(errors: Vec<String>) -> Self {
        Self::Validation { errors }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::BadRequest { .. } => ErrorCategory::BadRequest,
            Self::Forbidden { .. } => ErrorCategory::Forbidden,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().status_code()
    }

    /// Returns the message placed in the response envelope.
    ///
    /// Validation failures expose their field errors; every other category
    /// only exposes its reason phrase.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation { errors } if !errors.is_empty() => errors.join("; "),
            other => other.category().reason().to_string(),
        }
    }
}
