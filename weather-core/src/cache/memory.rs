use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::cache::CacheProvider;
use crate::error::CacheError;

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-process cache store. Entries expire lazily: an expired entry is
/// evicted on the read that observes it, no background sweep.
#[derive(Debug, Default)]
pub struct InMemoryCacheProvider {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryCacheProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheProvider for InMemoryCacheProvider {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries.lock().await;

        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };

        self.entries.lock().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.entries.lock().await.clear();
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), CacheError> {
        // Nothing to release for the in-process store.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_roundtrip() {
        let cache = InMemoryCacheProvider::new();

        cache.set("weather:Kyiv", "{\"city\":\"Kyiv\"}", Duration::from_secs(60)).await.unwrap();

        let value = cache.get("weather:Kyiv").await.unwrap();
        assert_eq!(value.as_deref(), Some("{\"city\":\"Kyiv\"}"));
    }

    #[tokio::test]
    async fn missing_key_is_absent() {
        let cache = InMemoryCacheProvider::new();
        assert_eq!(cache.get("weather:Nowhere").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_entry_is_absent_and_evicted() {
        let cache = InMemoryCacheProvider::new();

        cache.set("weather:Kyiv", "stale", Duration::from_millis(10)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.get("weather:Kyiv").await.unwrap(), None);
        assert!(cache.entries.lock().await.is_empty());
    }

    #[tokio::test]
    async fn set_overwrites_previous_entry() {
        let cache = InMemoryCacheProvider::new();

        cache.set("weather:Kyiv", "old", Duration::from_secs(60)).await.unwrap();
        cache.set("weather:Kyiv", "new", Duration::from_secs(60)).await.unwrap();

        assert_eq!(cache.get("weather:Kyiv").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn del_and_clear_remove_entries() {
        let cache = InMemoryCacheProvider::new();

        cache.set("weather:Kyiv", "a", Duration::from_secs(60)).await.unwrap();
        cache.set("city:Kyiv", "b", Duration::from_secs(60)).await.unwrap();

        cache.del("weather:Kyiv").await.unwrap();
        assert_eq!(cache.get("weather:Kyiv").await.unwrap(), None);
        assert!(cache.get("city:Kyiv").await.unwrap().is_some());

        cache.clear().await.unwrap();
        assert_eq!(cache.get("city:Kyiv").await.unwrap(), None);
    }

    #[tokio::test]
    async fn disconnect_is_a_noop() {
        let cache = InMemoryCacheProvider::new();
        cache.set("weather:Kyiv", "a", Duration::from_secs(60)).await.unwrap();

        cache.disconnect().await.unwrap();

        assert!(cache.get("weather:Kyiv").await.unwrap().is_some());
    }
}
