//! # Scoring Server
//!
//! The HTTP front of the scoring API and the `scoring-server` binary.
//!
//! - [`Server`] - hyper HTTP/1.1 server with `POST /method` and `GET /health`
//! - [`ShutdownSignal`] - graceful shutdown on SIGTERM/SIGINT
//! - [`setup`] - builds the store, dispatcher and telemetry settings from
//!   a [`ScoringConfig`](scoring_config::ScoringConfig)

#![forbid(unsafe_code)]

mod error;
mod server;
pub mod setup;
pub mod shutdown;

pub use error::ServerError;
pub use server::{HttpResponse, ResponseBody, Server, HEALTH_PATH, METHOD_PATH, REQUEST_ID_HEADER};
pub use shutdown::ShutdownSignal;

/// Crate version, reported by `--version` and `/health`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
