//! # Scoring Store
//!
//! The key-value collaborator used by the scoring handlers.
//!
//! A [`Store`] offers two kinds of access:
//!
//! - **durable** reads through [`Store::get`], which must either succeed or
//!   report the failure;
//! - **cache** access through [`Store::cache_get`] and [`Store::cache_set`],
//!   which never fail: an unavailable backend reads as a miss and drops
//!   writes.
//!
//! Two backends are provided: [`RedisStore`] for deployments and
//! [`MemoryStore`] for tests and single-process runs.

#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

mod error;
mod memory;
mod redis_store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use redis_store::{RedisOptions, RedisStore, DEFAULT_DSN};

/// A store shared across concurrent requests.
pub type SharedStore = Arc<dyn Store>;

/// Key-value access used by the scoring handlers.
#[async_trait]
pub trait Store: Send + Sync + std::fmt::Debug {
    /// Reads a durable value. `Ok(None)` means the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot be reached.
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Reads a cached value. Backend failures read as a miss.
    async fn cache_get(&self, key: &str) -> Option<Vec<u8>>;

    /// Writes a cached value with a time to live. Failures are ignored.
    async fn cache_set(&self, key: &str, value: &[u8], ttl: Duration);
}
