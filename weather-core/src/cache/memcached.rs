use async_memcached::{AsciiProtocol, Client};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::CacheProvider;
use crate::error::CacheError;

/// Memcached-backed cache store.
///
/// Same connection policy as the Redis store: one logical client, created
/// lazily, dropped on any I/O error so the next operation reconnects.
pub struct MemcachedCacheProvider {
    location: String,
    client: Mutex<Option<Client>>,
}

impl std::fmt::Debug for MemcachedCacheProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemcachedCacheProvider")
            .field("location", &self.location)
            .finish()
    }
}

impl MemcachedCacheProvider {
    pub fn new(location: impl Into<String>) -> Self {
        Self { location: location.into(), client: Mutex::new(None) }
    }
}

#[async_trait]
impl CacheProvider for MemcachedCacheProvider {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut guard = self.client.lock().await;
        let client = connect_if_needed(&mut guard, &self.location).await?;

        match client.get(key).await {
            Ok(Some(value)) => {
                let data = String::from_utf8(value.data.unwrap_or_default()).map_err(|err| {
                    CacheError::Backend(format!("memcached returned invalid utf-8: {err}"))
                })?;
                Ok(Some(data))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                *guard = None;
                Err(CacheError::Backend(format!("memcached GET failed: {err}")))
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut guard = self.client.lock().await;
        let client = connect_if_needed(&mut guard, &self.location).await?;
        let ttl_seconds = ttl.as_secs().max(1) as i64;

        match client.set(key, value.as_bytes(), Some(ttl_seconds), None).await {
            Ok(()) => Ok(()),
            Err(err) => {
                *guard = None;
                Err(CacheError::Backend(format!("memcached SET failed: {err}")))
            }
        }
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        let mut guard = self.client.lock().await;
        let client = connect_if_needed(&mut guard, &self.location).await?;

        match client.delete(key).await {
            Ok(()) => Ok(()),
            Err(err) => {
                *guard = None;
                Err(CacheError::Backend(format!("memcached DELETE failed: {err}")))
            }
        }
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut guard = self.client.lock().await;
        let client = connect_if_needed(&mut guard, &self.location).await?;

        match client.flush_all().await {
            Ok(()) => Ok(()),
            Err(err) => {
                *guard = None;
                Err(CacheError::Backend(format!("memcached FLUSH_ALL failed: {err}")))
            }
        }
    }

    async fn disconnect(&self) -> Result<(), CacheError> {
        *self.client.lock().await = None;
        Ok(())
    }
}

async fn connect_if_needed<'a>(
    guard: &'a mut Option<Client>,
    location: &str,
) -> Result<&'a mut Client, CacheError> {
    match guard {
        Some(client) => Ok(client),
        None => {
            let client = Client::new(location).await.map_err(|err| {
                CacheError::Connection(format!("failed to connect to memcached: {err}"))
            })?;
            debug!("memcached cache connected");
            Ok(guard.insert(client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn construction_does_not_connect() {
        let cache = MemcachedCacheProvider::new("tcp://localhost:11211");
        assert!(cache.client.lock().await.is_none());
    }

    #[tokio::test]
    async fn disconnect_drops_the_client() {
        let cache = MemcachedCacheProvider::new("tcp://localhost:11211");
        cache.disconnect().await.unwrap();
        assert!(cache.client.lock().await.is_none());
    }
}
