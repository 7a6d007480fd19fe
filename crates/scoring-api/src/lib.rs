//! # Scoring API
//!
//! The method layer of the scoring service:
//!
//! - [`Authenticator`] - SHA-512 token checks, with an hourly admin token
//! - [`ScoringPolicy`] - score weights, the score cache and interest lookups
//! - [`HandlerRegistry`] - typed async handlers bound to method names
//! - [`MethodDispatcher`] - validate, authenticate, route, respond
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use scoring_api::MethodDispatcher;
//! use scoring_core::RequestContext;
//! use scoring_store::MemoryStore;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let dispatcher = MethodDispatcher::new(Arc::new(MemoryStore::new()));
//! let mut ctx = RequestContext::new();
//!
//! let response = dispatcher
//!     .dispatch(&mut ctx, &json!({"login": "h&f", "method": "online_score"}))
//!     .await;
//! assert_eq!(response.code(), 422);
//! # });
//! ```

#![forbid(unsafe_code)]

pub mod auth;
mod dispatcher;
pub mod handlers;
mod registry;
pub mod scoring;

pub use auth::Authenticator;
pub use dispatcher::MethodDispatcher;
pub use handlers::builtin_registry;
pub use registry::{
    BoxedHandlerResult, ErasedHandler, HandlerContext, HandlerRegistry, MethodArguments,
    PreparedCall,
};
pub use scoring::ScoringPolicy;
