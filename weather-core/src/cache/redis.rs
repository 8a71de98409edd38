use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::CacheProvider;
use crate::error::CacheError;

/// Redis-backed cache store.
///
/// The connection is established lazily on first use and held as one logical
/// handle. Any I/O error drops the handle so the next operation reconnects;
/// the error itself is re-raised to the caller.
pub struct RedisCacheProvider {
    url: String,
    conn: Mutex<Option<MultiplexedConnection>>,
}

impl std::fmt::Debug for RedisCacheProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheProvider").field("url", &self.url).finish()
    }
}

impl RedisCacheProvider {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), conn: Mutex::new(None) }
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        let mut guard = self.conn.lock().await;

        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }

        let client = redis::Client::open(self.url.as_str())
            .map_err(|err| CacheError::Connection(format!("failed to create redis client: {err}")))?;

        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|err| CacheError::Connection(format!("failed to connect to redis: {err}")))?;

        debug!("redis cache connected");
        *guard = Some(conn.clone());
        Ok(conn)
    }

    /// Drop the cached handle and wrap the backend error.
    async fn fail(&self, op: &str, err: redis::RedisError) -> CacheError {
        *self.conn.lock().await = None;
        CacheError::Backend(format!("redis {op} failed: {err}"))
    }
}

#[async_trait]
impl CacheProvider for RedisCacheProvider {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;

        match conn.get::<_, Option<String>>(key).await {
            Ok(value) => Ok(value),
            Err(err) => Err(self.fail("GET", err).await),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let ttl_seconds = ttl.as_secs().max(1);

        match conn.set_ex::<_, _, ()>(key, value, ttl_seconds).await {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail("SETEX", err).await),
        }
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;

        match conn.del::<_, ()>(key).await {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail("DEL", err).await),
        }
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;

        match redis::cmd("FLUSHDB").query_async::<_, ()>(&mut conn).await {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail("FLUSHDB", err).await),
        }
    }

    async fn disconnect(&self) -> Result<(), CacheError> {
        *self.conn.lock().await = None;
        Ok(())
    }
}
