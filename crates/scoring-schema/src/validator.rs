//! The validation pass.

use chrono::{Local, NaiveDate};
use serde_json::Value;
use tracing::debug;

use crate::error::{FieldError, FieldErrorKind, ValidationErrors};
use crate::field::{FieldContext, FieldValue, DEFAULT_MAX_AGE_YEARS};
use crate::requests::RequestShape;
use crate::shape::{Shape, ValidatedFields};

/// Validates raw JSON against a [`Shape`].
///
/// Every declared field is checked, in declaration order, and every error
/// is collected. Keys the shape does not declare are ignored. The shape's
/// cross-field rule runs only once all fields passed on their own.
///
/// A validator captures "today" when it is created, so ages are stable for
/// the lifetime of one request.
///
/// # Example
///
/// ```
/// use scoring_schema::{OnlineScoreRequest, Validator};
/// use serde_json::json;
///
/// let validator = Validator::new();
/// let request: OnlineScoreRequest = validator
///     .parse(&json!({"phone": "79175002040", "email": "stupnikov@otus.ru"}))
///     .unwrap();
/// assert_eq!(request.has(), ["phone", "email"]);
///
/// let errors = validator
///     .parse::<OnlineScoreRequest>(&json!({"first_name": "A"}))
///     .unwrap_err();
/// assert_eq!(errors.len(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validator {
    ctx: FieldContext,
}

impl Validator {
    /// Creates a validator for the current local date.
    #[must_use]
    pub fn new() -> Self {
        Self::at(Local::now().date_naive())
    }

    /// Creates a validator for a fixed date.
    #[must_use]
    pub const fn at(today: NaiveDate) -> Self {
        Self {
            ctx: FieldContext {
                today,
                max_age_years: DEFAULT_MAX_AGE_YEARS,
            },
        }
    }

    /// Overrides the maximum birthday age.
    #[must_use]
    pub const fn with_max_age_years(mut self, years: u32) -> Self {
        self.ctx.max_age_years = years;
        self
    }

    /// Returns the date ages are computed against.
    #[must_use]
    pub const fn today(&self) -> NaiveDate {
        self.ctx.today
    }

    /// Validates `raw` against `shape`.
    ///
    /// # Errors
    ///
    /// Returns every field error in declaration order, followed by the
    /// cross-field error if one applies. A non-object input yields a single
    /// not-an-object error.
    pub fn validate(&self, shape: &Shape, raw: &Value) -> Result<ValidatedFields, ValidationErrors> {
        let Value::Object(object) = raw else {
            debug!(shape = shape.name(), "rejecting non-object input");
            return Err(ValidationErrors::new(
                shape.name(),
                vec![FieldError::shape(FieldErrorKind::NotAnObject {
                    shape: shape.name(),
                })],
            ));
        };

        let mut fields = ValidatedFields::default();
        let mut errors = Vec::new();

        for (name, descriptor) in shape.fields() {
            match descriptor.validate(object.get(name), &self.ctx) {
                Ok(value) => fields.insert(name, value),
                Err(kind) => {
                    fields.insert(name, FieldValue::Absent);
                    errors.push(FieldError::field(name, kind));
                }
            }
        }

        if errors.is_empty() {
            if let Some(message) = shape.cross_field().and_then(|rule| rule(&fields)) {
                errors.push(FieldError::shape(FieldErrorKind::CrossField { message }));
            }
        }

        if errors.is_empty() {
            Ok(fields)
        } else {
            debug!(
                shape = shape.name(),
                error_count = errors.len(),
                "validation failed"
            );
            Err(ValidationErrors::new(shape.name(), errors))
        }
    }

    /// Validates `raw` against `T`'s shape and builds the typed request.
    ///
    /// # Errors
    ///
    /// Same as [`Validator::validate`].
    pub fn parse<T: RequestShape>(&self, raw: &Value) -> Result<T, ValidationErrors> {
        self.validate(T::shape(), raw).map(T::from_fields)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldDescriptor;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn validator() -> Validator {
        Validator::at(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
    }

    fn login_shape() -> Shape {
        Shape::builder("login")
            .field("login", FieldDescriptor::char().required())
            .field("email", FieldDescriptor::email())
            .field("birthday", FieldDescriptor::birthday().nullable())
            .build()
    }

    #[test]
    fn test_collects_all_errors_in_order() {
        let errors = validator()
            .validate(
                &login_shape(),
                &json!({"email": "nope", "birthday": "not-a-date"}),
            )
            .unwrap_err();

        assert_eq!(
            errors.messages(),
            vec![
                "login: field is required".to_string(),
                "email: must be an email address containing '@'".to_string(),
                "birthday: must be a date in DD.MM.YYYY format".to_string(),
            ]
        );
    }

    #[test]
    fn test_non_object_is_rejected_up_front() {
        let errors = validator().validate(&login_shape(), &json!([1, 2])).unwrap_err();
        assert!(errors.is_not_an_object());
        assert_eq!(errors.messages(), vec!["login must be a JSON object".to_string()]);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let fields = validator()
            .validate(&login_shape(), &json!({"login": "bob", "extra": 1}))
            .unwrap();
        assert_eq!(fields.filled_names(), ["login"]);
        assert_eq!(fields.get("birthday"), &FieldValue::Absent);
    }

    #[test]
    fn test_cross_field_runs_after_fields_pass() {
        fn needs_email(fields: &ValidatedFields) -> Option<String> {
            (!fields.is_filled("email")).then(|| "email is needed".to_string())
        }
        let shape = Shape::builder("cross")
            .field("login", FieldDescriptor::char().required())
            .field("email", FieldDescriptor::email())
            .cross_field(needs_email)
            .build();

        let errors = validator().validate(&shape, &json!({"login": "x"})).unwrap_err();
        assert_eq!(errors.messages(), vec!["email is needed".to_string()]);

        // field errors suppress the cross-field rule
        let errors = validator().validate(&shape, &json!({})).unwrap_err();
        assert_eq!(errors.messages(), vec!["login: field is required".to_string()]);
    }

    #[test]
    fn test_max_age_override() {
        let shape = login_shape();
        let raw = json!({"login": "bob", "birthday": "01.01.2000"});
        assert!(validator().validate(&shape, &raw).is_ok());
        assert!(validator()
            .with_max_age_years(18)
            .validate(&shape, &raw)
            .is_err());
    }
}
