//! Process-wide shape declarations.
//!
//! Shapes are built once on first use and shared by every validation.

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::field::FieldDescriptor;
use crate::shape::{Shape, ValidatedFields};

/// Name of the method envelope shape.
pub const METHOD: &str = "method";
/// Name of the online-score arguments shape.
pub const ONLINE_SCORE: &str = "online_score";
/// Name of the clients-interests arguments shape.
pub const CLIENTS_INTERESTS: &str = "clients_interests";

/// Message of the online-score cross-field rule.
pub const MISSING_PAIR: &str =
    "at least one pair of phone-email, first_name-last_name, gender-birthday must be filled";

const SCORE_PAIRS: [(&str, &str); 3] = [
    ("phone", "email"),
    ("first_name", "last_name"),
    ("gender", "birthday"),
];

fn at_least_one_pair(fields: &ValidatedFields) -> Option<String> {
    let filled = SCORE_PAIRS
        .iter()
        .any(|(a, b)| fields.is_filled(a) && fields.is_filled(b));
    (!filled).then(|| MISSING_PAIR.to_string())
}

/// The method envelope.
pub static METHOD_SHAPE: Lazy<Shape> = Lazy::new(|| {
    Shape::builder(METHOD)
        .field("account", FieldDescriptor::char().nullable())
        .field("login", FieldDescriptor::char().required().nullable())
        .field("token", FieldDescriptor::char().required().nullable())
        .field("arguments", FieldDescriptor::arguments().required().nullable())
        .field("method", FieldDescriptor::char().required())
        .build()
});

/// Online-score arguments.
pub static ONLINE_SCORE_SHAPE: Lazy<Shape> = Lazy::new(|| {
    Shape::builder(ONLINE_SCORE)
        .field("first_name", FieldDescriptor::char().nullable())
        .field("last_name", FieldDescriptor::char().nullable())
        .field("email", FieldDescriptor::email().nullable())
        .field("phone", FieldDescriptor::phone().nullable())
        .field("birthday", FieldDescriptor::birthday().nullable())
        .field("gender", FieldDescriptor::gender().nullable())
        .cross_field(at_least_one_pair)
        .build()
});

/// Clients-interests arguments.
pub static CLIENTS_INTERESTS_SHAPE: Lazy<Shape> = Lazy::new(|| {
    Shape::builder(CLIENTS_INTERESTS)
        .field("client_ids", FieldDescriptor::client_ids().required())
        .field("date", FieldDescriptor::date().nullable())
        .build()
});

static REGISTRY: Lazy<IndexMap<&'static str, &'static Shape>> = Lazy::new(|| {
    [&*METHOD_SHAPE, &*ONLINE_SCORE_SHAPE, &*CLIENTS_INTERESTS_SHAPE]
        .into_iter()
        .map(|shape| (shape.name(), shape))
        .collect()
});

/// Looks up a shape by name.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static Shape> {
    REGISTRY.get(name).copied()
}

/// Names of all registered shapes.
pub fn shape_names() -> impl Iterator<Item = &'static str> {
    REGISTRY.keys().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(lookup(METHOD).map(Shape::name), Some(METHOD));
        assert_eq!(lookup(ONLINE_SCORE).map(Shape::name), Some(ONLINE_SCORE));
        assert!(lookup("frobnicate").is_none());
        assert_eq!(
            shape_names().collect::<Vec<_>>(),
            [METHOD, ONLINE_SCORE, CLIENTS_INTERESTS]
        );
    }

    #[test]
    fn test_only_online_score_has_cross_field_rule() {
        assert!(ONLINE_SCORE_SHAPE.cross_field().is_some());
        assert!(METHOD_SHAPE.cross_field().is_none());
        assert!(CLIENTS_INTERESTS_SHAPE.cross_field().is_none());
    }

    #[test]
    fn test_envelope_policy() {
        let login = METHOD_SHAPE.field("login").unwrap();
        assert!(login.is_required() && login.is_nullable());
        let method = METHOD_SHAPE.field("method").unwrap();
        assert!(method.is_required() && !method.is_nullable());
        let account = METHOD_SHAPE.field("account").unwrap();
        assert!(!account.is_required() && account.is_nullable());
    }
}
