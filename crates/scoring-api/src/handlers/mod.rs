//! The built-in scoring methods.

mod clients_interests;
mod online_score;

pub use clients_interests::clients_interests;
pub use online_score::{online_score, ScoreResponse};

use scoring_schema::registry::{CLIENTS_INTERESTS, ONLINE_SCORE};

use crate::registry::HandlerRegistry;

/// Returns a registry with `online_score` and `clients_interests`.
#[must_use]
pub fn builtin_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry.register(ONLINE_SCORE, online_score);
    registry.register(CLIENTS_INTERESTS, clients_interests);
    registry
}
