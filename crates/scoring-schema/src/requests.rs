//! Typed requests built from validated shapes.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::field::Gender;
use crate::registry::{CLIENTS_INTERESTS_SHAPE, METHOD_SHAPE, ONLINE_SCORE_SHAPE};
use crate::shape::{Shape, ValidatedFields};

/// A typed request backed by a declared shape.
pub trait RequestShape: Sized {
    /// The shape this request validates against.
    fn shape() -> &'static Shape;

    /// Builds the request from fields that passed validation.
    fn from_fields(fields: ValidatedFields) -> Self;
}

/// The method envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodRequest {
    /// Account name; `None` when absent.
    pub account: Option<String>,
    /// Login name, possibly empty.
    pub login: String,
    /// Auth token, possibly empty.
    pub token: String,
    /// Method arguments, possibly empty.
    pub arguments: Map<String, Value>,
    /// Requested method.
    pub method: String,
}

impl MethodRequest {
    /// Returns the arguments as a JSON value for nested validation.
    #[must_use]
    pub fn arguments_value(&self) -> Value {
        Value::Object(self.arguments.clone())
    }
}

impl RequestShape for MethodRequest {
    fn shape() -> &'static Shape {
        &METHOD_SHAPE
    }

    fn from_fields(mut fields: ValidatedFields) -> Self {
        Self {
            account: fields.take("account").into_text(),
            login: fields.take("login").into_text().unwrap_or_default(),
            token: fields.take("token").into_text().unwrap_or_default(),
            arguments: fields.take("arguments").into_object(),
            method: fields.take("method").into_text().unwrap_or_default(),
        }
    }
}

/// Arguments of `online_score`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OnlineScoreRequest {
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Phone digits.
    pub phone: Option<String>,
    /// Date of birth.
    pub birthday: Option<NaiveDate>,
    /// Gender code.
    pub gender: Option<Gender>,
}

impl OnlineScoreRequest {
    /// Names of the supplied non-empty fields, in declaration order.
    #[must_use]
    pub fn has(&self) -> Vec<&'static str> {
        [
            ("first_name", self.first_name.is_some()),
            ("last_name", self.last_name.is_some()),
            ("email", self.email.is_some()),
            ("phone", self.phone.is_some()),
            ("birthday", self.birthday.is_some()),
            ("gender", self.gender.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, filled)| filled.then_some(name))
        .collect()
    }
}

fn filled_text(fields: &mut ValidatedFields, name: &str) -> Option<String> {
    fields.take(name).into_text().filter(|s| !s.is_empty())
}

impl RequestShape for OnlineScoreRequest {
    fn shape() -> &'static Shape {
        &ONLINE_SCORE_SHAPE
    }

    fn from_fields(mut fields: ValidatedFields) -> Self {
        Self {
            birthday: fields.get("birthday").as_date(),
            gender: fields.get("gender").as_gender(),
            first_name: filled_text(&mut fields, "first_name"),
            last_name: filled_text(&mut fields, "last_name"),
            email: filled_text(&mut fields, "email"),
            phone: filled_text(&mut fields, "phone"),
        }
    }
}

/// Arguments of `clients_interests`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientsInterestsRequest {
    /// Requested client ids, never empty.
    pub client_ids: Vec<i64>,
    /// Optional date.
    pub date: Option<NaiveDate>,
}

impl RequestShape for ClientsInterestsRequest {
    fn shape() -> &'static Shape {
        &CLIENTS_INTERESTS_SHAPE
    }

    fn from_fields(mut fields: ValidatedFields) -> Self {
        Self {
            date: fields.get("date").as_date(),
            client_ids: fields.take("client_ids").into_client_ids(),
        }
    }
}
