//! In-process store.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::Store;

/// Cache writes between two sweeps of expired entries.
pub const SWEEP_INTERVAL: usize = 64;

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// A [`Store`] backed by a concurrent map.
///
/// Used by tests and by the `memory` backend. Durable keys are written with
/// [`MemoryStore::insert`]; cache keys carry a TTL. The store can be marked
/// unavailable to exercise outage handling.
///
/// Expired cache entries are dropped when read, and every
/// [`SWEEP_INTERVAL`] cache writes the whole map is swept, so keys that are
/// never read again do not pile up.
///
/// # Example
///
/// ```
/// use scoring_store::{MemoryStore, Store};
///
/// # tokio_test::block_on(async {
/// let store = MemoryStore::new();
/// store.insert("i:1", br#"["books"]"#.to_vec());
/// assert_eq!(store.get("i:1").await.unwrap(), Some(br#"["books"]"#.to_vec()));
///
/// store.set_available(false);
/// assert!(store.get("i:1").await.is_err());
/// assert_eq!(store.cache_get("i:1").await, None);
/// # });
/// ```
#[derive(Debug)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
    available: AtomicBool,
    cache_writes: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty, available store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            available: AtomicBool::new(true),
            cache_writes: AtomicUsize::new(0),
        }
    }

    /// Writes a durable value without expiry.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.entries.insert(
            key.into(),
            Entry {
                value: value.into(),
                expires_at: None,
            },
        );
    }

    /// Simulates an outage (`false`) or recovery (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Returns `true` unless an outage is being simulated.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Returns the number of stored keys, including expired entries that
    /// have not been swept yet.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every expired cache entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, "swept expired cache entries");
        }
        removed
    }

    fn read(&self, key: &str) -> Option<Vec<u8>> {
        let now = Instant::now();
        let live = self
            .entries
            .get(key)
            .map(|entry| (entry.is_live(now), entry.value.clone()));

        match live {
            Some((true, value)) => Some(value),
            Some((false, _)) => {
                self.entries.remove_if(key, |_, entry| !entry.is_live(now));
                None
            }
            None => None,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        if !self.is_available() {
            return Err(StoreError::unavailable("memory store is offline"));
        }
        Ok(self.read(key))
    }

    async fn cache_get(&self, key: &str) -> Option<Vec<u8>> {
        if !self.is_available() {
            debug!(key, "cache miss: memory store is offline");
            return None;
        }
        self.read(key)
    }

    async fn cache_set(&self, key: &str, value: &[u8], ttl: Duration) {
        if !self.is_available() {
            debug!(key, "cache write dropped: memory store is offline");
            return;
        }
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at: Some(Instant::now() + ttl),
            },
        );

        let writes = self.cache_writes.fetch_add(1, Ordering::Relaxed) + 1;
        if writes % SWEEP_INTERVAL == 0 {
            self.purge_expired();
        }
    }
}
