//! Field descriptors.
//!
//! A [`FieldDescriptor`] is a reusable, immutable validation unit. It sees a
//! single raw JSON value (or its absence) and turns it into a typed
//! [`FieldValue`] or a [`FieldErrorKind`]. Descriptors never look at other
//! fields; rules spanning several fields live on the shape.

use chrono::{Datelike, NaiveDate};
use serde_json::{Map, Value};

use crate::error::FieldErrorKind;

/// Date format accepted by date and birthday fields.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Default upper bound on a birthday's age, in full years.
pub const DEFAULT_MAX_AGE_YEARS: u32 = 70;

/// The type rule applied to a present, non-empty value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Any string.
    Char,
    /// A string containing `@`.
    Email,
    /// 11 digits starting with `7`, as a string or an integer.
    Phone,
    /// A `DD.MM.YYYY` date.
    Date,
    /// A `DD.MM.YYYY` date within the allowed age range.
    Birthday,
    /// One of the gender codes 0, 1, 2.
    Gender,
    /// A list of integers.
    ClientIds,
    /// A JSON object.
    Arguments,
}

/// Gender code.
///
/// `Unknown` (0) is a real value, not an empty marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    /// Code 0.
    Unknown,
    /// Code 1.
    Male,
    /// Code 2.
    Female,
}

impl Gender {
    /// Maps a wire code to a gender.
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            1 => Some(Self::Male),
            2 => Some(Self::Female),
            _ => None,
        }
    }

    /// Returns the wire code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Male => 1,
            Self::Female => 2,
        }
    }
}

/// A validated field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// The key was missing or null.
    Absent,
    /// The value was the type's empty representation.
    Empty,
    /// A string (char, email, or normalized phone digits).
    Text(String),
    /// A parsed date.
    Date(NaiveDate),
    /// A gender code.
    Gender(Gender),
    /// A list of client ids.
    ClientIds(Vec<i64>),
    /// A JSON object.
    Object(Map<String, Value>),
}

impl FieldValue {
    /// Returns `true` for a present, non-empty value.
    #[must_use]
    pub const fn is_filled(&self) -> bool {
        !matches!(self, Self::Absent | Self::Empty)
    }

    /// Returns the string, with an empty value as `""`.
    #[must_use]
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s),
            Self::Empty => Some(String::new()),
            _ => None,
        }
    }

    /// Returns the date, if filled.
    #[must_use]
    pub const fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the gender, if filled.
    #[must_use]
    pub const fn as_gender(&self) -> Option<Gender> {
        match self {
            Self::Gender(g) => Some(*g),
            _ => None,
        }
    }

    /// Returns the client ids, empty when absent.
    #[must_use]
    pub fn into_client_ids(self) -> Vec<i64> {
        match self {
            Self::ClientIds(ids) => ids,
            _ => Vec::new(),
        }
    }

    /// Returns the object, empty when absent.
    #[must_use]
    pub fn into_object(self) -> Map<String, Value> {
        match self {
            Self::Object(map) => map,
            _ => Map::new(),
        }
    }
}

/// Inputs to validation that do not come from the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldContext {
    /// The date ages are computed against.
    pub today: NaiveDate,
    /// Upper bound on a birthday's age.
    pub max_age_years: u32,
}

/// A field's validation rule plus its presence policy.
///
/// # Example
///
/// ```
/// use scoring_schema::FieldDescriptor;
///
/// let login = FieldDescriptor::char().required().nullable();
/// assert!(login.is_required());
/// assert!(login.is_nullable());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    kind: FieldKind,
    required: bool,
    nullable: bool,
}

impl FieldDescriptor {
    /// Creates an optional, non-nullable descriptor.
    #[must_use]
    pub const fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            nullable: false,
        }
    }

    /// Character string field.
    #[must_use]
    pub const fn char() -> Self {
        Self::new(FieldKind::Char)
    }

    /// Email field.
    #[must_use]
    pub const fn email() -> Self {
        Self::new(FieldKind::Email)
    }

    /// Phone field.
    #[must_use]
    pub const fn phone() -> Self {
        Self::new(FieldKind::Phone)
    }

    /// Date field.
    #[must_use]
    pub const fn date() -> Self {
        Self::new(FieldKind::Date)
    }

    /// Birthday field.
    #[must_use]
    pub const fn birthday() -> Self {
        Self::new(FieldKind::Birthday)
    }

    /// Gender field.
    #[must_use]
    pub const fn gender() -> Self {
        Self::new(FieldKind::Gender)
    }

    /// Client-id list field.
    #[must_use]
    pub const fn client_ids() -> Self {
        Self::new(FieldKind::ClientIds)
    }

    /// Arguments object field.
    #[must_use]
    pub const fn arguments() -> Self {
        Self::new(FieldKind::Arguments)
    }

    /// Marks the field as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Allows the field's empty representation.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Returns the field kind.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns `true` if the field must be present.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Returns `true` if the field may be empty.
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Validates one raw value.
    ///
    /// `None` and JSON `null` both mean the key is absent.
    ///
    /// # Errors
    ///
    /// Returns the first violation of the presence policy or type rule.
    pub fn validate(
        &self,
        raw: Option<&Value>,
        ctx: &FieldContext,
    ) -> Result<FieldValue, FieldErrorKind> {
        let raw = match raw {
            None | Some(Value::Null) => {
                return if self.required {
                    Err(FieldErrorKind::Required)
                } else {
                    Ok(FieldValue::Absent)
                };
            }
            Some(raw) => raw,
        };

        if self.is_empty_repr(raw) {
            return if self.nullable {
                Ok(FieldValue::Empty)
            } else {
                Err(FieldErrorKind::NotNullable)
            };
        }

        match self.kind {
            FieldKind::Char => validate_char(raw),
            FieldKind::Email => validate_email(raw),
            FieldKind::Phone => validate_phone(raw),
            FieldKind::Date => validate_date(raw).map(FieldValue::Date),
            FieldKind::Birthday => validate_birthday(raw, ctx),
            FieldKind::Gender => validate_gender(raw),
            FieldKind::ClientIds => validate_client_ids(raw),
            FieldKind::Arguments => validate_arguments(raw),
        }
    }

    fn is_empty_repr(&self, raw: &Value) -> bool {
        match raw {
            Value::String(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Object(map) => map.is_empty(),
            Value::Number(n) => self.kind == FieldKind::Phone && n.as_u64() == Some(0),
            Value::Null | Value::Bool(_) => false,
        }
    }
}

fn validate_char(raw: &Value) -> Result<FieldValue, FieldErrorKind> {
    match raw {
        Value::String(s) => Ok(FieldValue::Text(s.clone())),
        _ => Err(FieldErrorKind::TypeMismatch {
            expected: "a string",
        }),
    }
}

fn validate_email(raw: &Value) -> Result<FieldValue, FieldErrorKind> {
    match raw {
        Value::String(s) if s.contains('@') => Ok(FieldValue::Text(s.clone())),
        Value::String(_) => Err(FieldErrorKind::Format {
            expected: "an email address containing '@'",
        }),
        _ => Err(FieldErrorKind::TypeMismatch {
            expected: "a string",
        }),
    }
}

fn validate_phone(raw: &Value) -> Result<FieldValue, FieldErrorKind> {
    let digits = match raw {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
        _ => {
            return Err(FieldErrorKind::TypeMismatch {
                expected: "a string or an integer",
            })
        }
    };

    if digits.len() == 11 && digits.starts_with('7') && digits.bytes().all(|b| b.is_ascii_digit())
    {
        Ok(FieldValue::Text(digits))
    } else {
        Err(FieldErrorKind::Format {
            expected: "11 digits starting with 7",
        })
    }
}

/// Parses a strict `DD.MM.YYYY` date.
///
/// chrono alone would accept a short year, so the layout is checked first.
#[must_use]
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let bytes = s.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            2 | 5 => *b == b'.',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

fn validate_date(raw: &Value) -> Result<NaiveDate, FieldErrorKind> {
    let Value::String(s) = raw else {
        return Err(FieldErrorKind::TypeMismatch {
            expected: "a string",
        });
    };
    parse_date(s).ok_or(FieldErrorKind::Format {
        expected: "a date in DD.MM.YYYY format",
    })
}

/// Returns the age in full years on `today`.
#[must_use]
pub fn age_on(birthday: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birthday.year();
    if (today.month(), today.day()) < (birthday.month(), birthday.day()) {
        age -= 1;
    }
    age
}

fn validate_birthday(raw: &Value, ctx: &FieldContext) -> Result<FieldValue, FieldErrorKind> {
    let birthday = validate_date(raw)?;
    if birthday > ctx.today {
        return Err(FieldErrorKind::Range {
            reason: "birthday must not be in the future".to_string(),
        });
    }
    if i64::from(age_on(birthday, ctx.today)) > i64::from(ctx.max_age_years) {
        return Err(FieldErrorKind::Range {
            reason: format!("age must not exceed {} years", ctx.max_age_years),
        });
    }
    Ok(FieldValue::Date(birthday))
}

fn validate_gender(raw: &Value) -> Result<FieldValue, FieldErrorKind> {
    let Some(code) = raw.as_i64() else {
        return Err(FieldErrorKind::TypeMismatch {
            expected: "an integer",
        });
    };
    Gender::from_code(code)
        .map(FieldValue::Gender)
        .ok_or(FieldErrorKind::Range {
            reason: "must be one of 0, 1, 2".to_string(),
        })
}

fn validate_client_ids(raw: &Value) -> Result<FieldValue, FieldErrorKind> {
    const EXPECTED: FieldErrorKind = FieldErrorKind::TypeMismatch {
        expected: "a list of integers",
    };
    let Value::Array(items) = raw else {
        return Err(EXPECTED);
    };
    items
        .iter()
        .map(Value::as_i64)
        .collect::<Option<Vec<_>>>()
        .map(FieldValue::ClientIds)
        .ok_or(EXPECTED)
}

fn validate_arguments(raw: &Value) -> Result<FieldValue, FieldErrorKind> {
    match raw {
        Value::Object(map) => Ok(FieldValue::Object(map.clone())),
        _ => Err(FieldErrorKind::TypeMismatch {
            expected: "an object",
        }),
    }
}
