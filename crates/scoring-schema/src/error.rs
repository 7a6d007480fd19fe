//! Field-level validation errors.
//!
//! Errors are collected, never raised: a validation pass returns every
//! violation of a shape at once as a [`ValidationErrors`].

use scoring_core::ScoringError;
use thiserror::Error;

/// What went wrong with a single field (or with the shape as a whole).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldErrorKind {
    /// A required field is absent or null.
    #[error("field is required")]
    Required,

    /// A non-nullable field holds its empty representation.
    #[error("field must not be empty")]
    NotNullable,

    /// The JSON type is wrong.
    #[error("must be {expected}")]
    TypeMismatch {
        /// Human description of the accepted type.
        expected: &'static str,
    },

    /// The value has the right type but the wrong shape.
    #[error("must be {expected}")]
    Format {
        /// Human description of the accepted format.
        expected: &'static str,
    },

    /// The value is well-formed but outside the allowed range.
    #[error("{reason}")]
    Range {
        /// Which bound was violated.
        reason: String,
    },

    /// A rule spanning several fields failed.
    #[error("{message}")]
    CrossField {
        /// The rule's message.
        message: String,
    },

    /// The validated value is not a JSON object.
    #[error("{shape} must be a JSON object")]
    NotAnObject {
        /// Name of the shape being validated.
        shape: &'static str,
    },
}

/// A single collected error.
///
/// Field errors render as `"<field>: <message>"`; shape-level errors
/// (cross-field, not-an-object) render as the bare message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct FieldError {
    /// Offending field; `None` for shape-level errors.
    pub field: Option<&'static str>,
    /// The violation.
    pub kind: FieldErrorKind,
}

impl FieldError {
    /// Creates an error for a named field.
    #[must_use]
    pub const fn field(field: &'static str, kind: FieldErrorKind) -> Self {
        Self {
            field: Some(field),
            kind,
        }
    }

    /// Creates a shape-level error.
    #[must_use]
    pub const fn shape(kind: FieldErrorKind) -> Self {
        Self { field: None, kind }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.field {
            Some(field) => write!(f, "{field}: {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// All errors from one validation pass, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{shape} is invalid: {}", self.messages().join("; "))]
pub struct ValidationErrors {
    shape: &'static str,
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Creates the error list for a shape.
    #[must_use]
    pub const fn new(shape: &'static str, errors: Vec<FieldError>) -> Self {
        Self { shape, errors }
    }

    /// Returns the shape name.
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        self.shape
    }

    /// Returns the collected errors.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Returns the errors rendered as strings.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// Returns the number of errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns `true` if there are no errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns `true` if the value was rejected before field validation.
    #[must_use]
    pub fn is_not_an_object(&self) -> bool {
        matches!(
            self.errors.as_slice(),
            [FieldError {
                kind: FieldErrorKind::NotAnObject { .. },
                ..
            }]
        )
    }
}

impl From<ValidationErrors> for ScoringError {
    fn from(errors: ValidationErrors) -> Self {
        if errors.is_not_an_object() {
            Self::bad_request(errors.messages().join("; "))
        } else {
            Self::validation(errors.messages())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoring_core::ErrorCategory;

    #[test]
    fn test_field_error_display() {
        let err = FieldError::field("login", FieldErrorKind::Required);
        assert_eq!(err.to_string(), "login: field is required");

        let err = FieldError::field(
            "email",
            FieldErrorKind::Format {
                expected: "an email address containing '@'",
            },
        );
        assert_eq!(err.to_string(), "email: must be an email address containing '@'");
    }

    #[test]
    fn test_shape_error_has_no_prefix() {
        let err = FieldError::shape(FieldErrorKind::CrossField {
            message: "pairs".to_string(),
        });
        assert_eq!(err.to_string(), "pairs");
    }

    #[test]
    fn test_conversion_to_scoring_error() {
        let errors = ValidationErrors::new(
            "method",
            vec![FieldError::field("token", FieldErrorKind::Required)],
        );
        let err: ScoringError = errors.into();
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(err.public_message(), "token: field is required");

        let errors = ValidationErrors::new(
            "method",
            vec![FieldError::shape(FieldErrorKind::NotAnObject { shape: "method" })],
        );
        let err: ScoringError = errors.into();
        assert_eq!(err.category(), ErrorCategory::BadRequest);
    }
}
