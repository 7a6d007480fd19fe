//! Response envelope.
//!
//! Every request, successful or not, ends in exactly one envelope:
//!
//! ```text
//! {"response": {...}, "code": 200}
//! {"error": "Forbidden", "code": 403}
//! ```

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ScoringError;

/// The JSON body returned to the transport, paired with its status code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    /// Handler result.
    Success {
        /// The handler's return value.
        response: Value,
        /// Always 200.
        code: u16,
    },
    /// Terminal failure.
    Failure {
        /// Reason phrase or joined field errors.
        error: String,
        /// 400, 403, 404, 422 or 500.
        code: u16,
    },
}

impl ResponseEnvelope {
    /// Wraps a successful handler result.
    #[must_use]
    pub fn ok(response: Value) -> Self {
        Self::Success {
            response,
            code: StatusCode::OK.as_u16(),
        }
    }

    /// Builds the failure envelope for an error.
    #[must_use]
    pub fn from_error(error: &ScoringError) -> Self {
        Self::Failure {
            error: error.public_message(),
            code: error.status_code().as_u16(),
        }
    }

    /// Builds the envelope for a dispatch outcome.
    #[must_use]
    pub fn from_result(result: &Result<Value, ScoringError>) -> Self {
        match result {
            Ok(value) => Self::ok(value.clone()),
            Err(err) => Self::from_error(err),
        }
    }

    /// Returns the numeric code carried in the body.
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::Success { code, .. } | Self::Failure { code, .. } => *code,
        }
    }

    /// Returns the HTTP status matching the body code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Returns `true` for a success envelope.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
