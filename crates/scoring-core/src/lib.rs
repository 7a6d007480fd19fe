//! # Scoring Core
//!
//! Core types shared by every crate of the scoring API:
//!
//! - [`ScoringError`] / [`ErrorCategory`] - per-request failure outcomes and their HTTP codes
//! - [`ResponseEnvelope`] - the `{"response", "code"}` / `{"error", "code"}` wire shape
//! - [`RequestContext`] / [`RequestId`] - per-request state carried through dispatch
//! - [`CallerIdentity`] - who the authenticated caller is
//! - [`AuditRecord`] / [`ArgumentSummary`] - the non-sensitive audit trail of a request

#![forbid(unsafe_code)]

mod audit;
mod context;
mod envelope;
mod error;
mod identity;

pub use audit::{ArgumentSummary, AuditRecord};
pub use context::{RequestContext, RequestId};
pub use envelope::ResponseEnvelope;
pub use error::{ErrorCategory, ScoringError, ScoringResult};
pub use identity::CallerIdentity;
