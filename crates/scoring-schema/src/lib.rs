//! # Scoring Schema
//!
//! Declarative request validation for the scoring API.
//!
//! A request type is a [`Shape`]: an ordered set of named
//! [`FieldDescriptor`]s plus an optional cross-field rule. The
//! [`Validator`] walks a shape against raw JSON and either yields typed
//! values or the full list of field errors.
//!
//! ## Presence policy
//!
//! | input | `required` | `nullable` | outcome |
//! |---|---|---|---|
//! | key missing or `null` | no | any | absent, no error |
//! | key missing or `null` | yes | any | `field is required` |
//! | empty (`""`, `[]`, `{}`, phone `0`) | any | no | `field must not be empty` |
//! | empty | any | yes | empty, no error |
//! | anything else | any | any | type rule |
//!
//! ## Example
//!
//! ```
//! use scoring_schema::{ClientsInterestsRequest, Validator};
//! use serde_json::json;
//!
//! let request: ClientsInterestsRequest = Validator::new()
//!     .parse(&json!({"client_ids": [1, 2, 3]}))
//!     .unwrap();
//! assert_eq!(request.client_ids, vec![1, 2, 3]);
//! assert!(request.date.is_none());
//! ```

#![forbid(unsafe_code)]

mod error;
mod field;
pub mod registry;
mod requests;
mod shape;
mod validator;

pub use error::{FieldError, FieldErrorKind, ValidationErrors};
pub use field::{
    age_on, parse_date, FieldContext, FieldDescriptor, FieldKind, FieldValue, Gender,
    DATE_FORMAT, DEFAULT_MAX_AGE_YEARS,
};
pub use requests::{ClientsInterestsRequest, MethodRequest, OnlineScoreRequest, RequestShape};
pub use shape::{CrossFieldRule, Shape, ShapeBuilder, ValidatedFields};
pub use validator::Validator;
