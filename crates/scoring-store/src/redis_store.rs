//! Redis-backed store.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::RedisResult;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::Store;

/// Default Redis DSN.
pub const DEFAULT_DSN: &str = "redis://127.0.0.1:6379/0";

/// Connection and retry settings for [`RedisStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisOptions {
    /// Limit on establishing a connection.
    pub connect_timeout: Duration,
    /// Limit on a single command.
    pub operation_timeout: Duration,
    /// Retries after the first failed attempt.
    pub max_retries: u32,
    /// Base delay; attempt `n` waits `n * retry_backoff`.
    pub retry_backoff: Duration,
}

impl Default for RedisOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(2),
            operation_timeout: Duration::from_secs(1),
            max_retries: 3,
            retry_backoff: Duration::from_secs(2),
        }
    }
}

/// A [`Store`] talking to Redis over a shared multiplexed connection.
///
/// The connection is opened lazily on first use and dropped after a failure,
/// so the next attempt reconnects. Concurrent callers never wait on each
/// other's connect. Durable reads are retried up to `max_retries` times with
/// linear backoff and surface the final error. Cache operations make a single
/// attempt, log any failure and carry on.
#[derive(Debug)]
pub struct RedisStore {
    client: redis::Client,
    connection: RwLock<Option<MultiplexedConnection>>,
    options: RedisOptions,
}

impl RedisStore {
    /// Creates a store for `dsn`. No connection is made yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidDsn`] if the DSN does not parse.
    pub fn open(dsn: &str, options: RedisOptions) -> StoreResult<Self> {
        let client = redis::Client::open(dsn).map_err(|source| StoreError::InvalidDsn {
            dsn: dsn.to_string(),
            source,
        })?;
        Ok(Self {
            client,
            connection: RwLock::new(None),
            options,
        })
    }

    /// Returns the store options.
    #[must_use]
    pub const fn options(&self) -> &RedisOptions {
        &self.options
    }

    async fn connection(&self) -> StoreResult<MultiplexedConnection> {
        if let Some(conn) = self.connection.read().await.as_ref() {
            return Ok(conn.clone());
        }

        // connect without holding the lock; the first connection installed wins
        let conn = tokio::time::timeout(
            self.options.connect_timeout,
            self.client.get_multiplexed_tokio_connection(),
        )
        .await
        .map_err(|_| StoreError::timeout("connect", self.options.connect_timeout))??;

        let mut slot = self.connection.write().await;
        if slot.is_none() {
            info!(addr = %self.client.get_connection_info().addr, "connected to redis");
        }
        Ok(slot.get_or_insert(conn).clone())
    }

    async fn reset(&self) {
        self.connection.write().await.take();
    }

    async fn once<T, F, Fut>(&self, operation: &'static str, command: F) -> StoreResult<T>
    where
        F: Fn(MultiplexedConnection) -> Fut + Sync,
        Fut: Future<Output = RedisResult<T>> + Send,
    {
        let result = self.attempt(operation, &command).await;
        if result.is_err() {
            self.reset().await;
        }
        result
    }

    async fn attempt<T, F, Fut>(&self, operation: &'static str, command: &F) -> StoreResult<T>
    where
        F: Fn(MultiplexedConnection) -> Fut + Sync,
        Fut: Future<Output = RedisResult<T>> + Send,
    {
        let conn = self.connection().await?;
        match tokio::time::timeout(self.options.operation_timeout, command(conn)).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::timeout(operation, self.options.operation_timeout)),
        }
    }

    async fn with_retry<T, F, Fut>(&self, operation: &'static str, command: F) -> StoreResult<T>
    where
        F: Fn(MultiplexedConnection) -> Fut + Sync,
        Fut: Future<Output = RedisResult<T>> + Send,
    {
        let mut attempts = 0;
        loop {
            let err = match self.attempt(operation, &command).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            self.reset().await;
            attempts += 1;
            if attempts > self.options.max_retries || !err.is_transient() {
                return Err(StoreError::RetriesExhausted {
                    operation,
                    attempts,
                    last: Box::new(err),
                });
            }

            let backoff = self.options.retry_backoff * attempts;
            warn!(
                operation,
                attempt = attempts,
                backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "redis operation failed, retrying"
            );
            tokio::time::sleep(backoff).await;
        }
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.with_retry("GET", |mut conn| async move {
            redis::cmd("GET")
                .arg(key)
                .query_async::<_, Option<Vec<u8>>>(&mut conn)
                .await
        })
        .await
    }

    async fn cache_get(&self, key: &str) -> Option<Vec<u8>> {
        let result = self
            .once("GET", |mut conn| async move {
                redis::cmd("GET")
                    .arg(key)
                    .query_async::<_, Option<Vec<u8>>>(&mut conn)
                    .await
            })
            .await;

        match result {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "cache read failed, treating as miss");
                None
            }
        }
    }

    async fn cache_set(&self, key: &str, value: &[u8], ttl: Duration) {
        let seconds = ttl.as_secs().max(1);
        let result = self
            .once("SET", |mut conn| async move {
                redis::cmd("SET")
                    .arg(key)
                    .arg(value)
                    .arg("EX")
                    .arg(seconds)
                    .query_async::<_, ()>(&mut conn)
                    .await
            })
            .await;

        match result {
            Ok(()) => debug!(key, ttl_secs = seconds, "cache entry written"),
            Err(err) => warn!(key, error = %err, "cache write failed, ignoring"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn test_invalid_dsn() {
        let err = RedisStore::open("not a dsn", RedisOptions::default()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidDsn { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_open_is_lazy() {
        let store = RedisStore::open(DEFAULT_DSN, RedisOptions::default()).unwrap();
        assert_eq!(store.options().max_retries, 3);
    }

    #[tokio::test]
    async fn test_unreachable_server_exhausts_retries() {
        let options = RedisOptions {
            connect_timeout: Duration::from_millis(200),
            operation_timeout: Duration::from_millis(200),
            max_retries: 2,
            retry_backoff: Duration::from_millis(1),
        };
        // port 1 is reserved and refuses connections
        let store = RedisStore::open("redis://127.0.0.1:1/0", options).unwrap();

        match store.get("i:1").await {
            Err(StoreError::RetriesExhausted { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected exhausted retries, got {other:?}"),
        }
        assert_eq!(store.cache_get("i:1").await, None);
        store.cache_set("uid:1", b"1", Duration::from_secs(1)).await;
    }

    /// Accepts TCP connections and never answers on them.
    async fn silent_server() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });
        format!("redis://{addr}/0")
    }

    fn slow_options() -> RedisOptions {
        RedisOptions {
            connect_timeout: Duration::from_millis(300),
            operation_timeout: Duration::from_millis(300),
            max_retries: 3,
            retry_backoff: Duration::from_millis(500),
        }
    }

    #[tokio::test]
    async fn test_cache_calls_make_one_attempt() {
        let store = RedisStore::open(&silent_server().await, slow_options()).unwrap();

        let started = Instant::now();
        assert_eq!(store.cache_get("uid:1").await, None);
        store.cache_set("uid:1", b"1", Duration::from_secs(1)).await;

        // one connect plus one command each, no retries or backoff
        assert!(started.elapsed() < Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_concurrent_calls_do_not_queue_behind_connect() {
        let store = Arc::new(RedisStore::open(&silent_server().await, slow_options()).unwrap());

        let started = Instant::now();
        let calls: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.cache_get(&format!("uid:{i}")).await })
            })
            .collect();
        for call in calls {
            assert_eq!(call.await.unwrap(), None);
        }

        // serialized connects alone would take 8 * 300ms
        assert!(started.elapsed() < Duration::from_millis(1500));
    }
}
