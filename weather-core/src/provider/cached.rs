use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::{
    cache::CacheProvider,
    error::{CacheError, ProviderError},
    model::{City, Weather},
    provider::WeatherProvider,
};

/// Cache-aside proxy in front of the provider chain.
///
/// Looks the key up before consulting the chain and populates the cache
/// after a miss. Keys are namespaced by operation (`weather:<query>`,
/// `city:<query>`) so the two lookups never collide.
///
/// Concurrent misses for one key each call the chain and each write the
/// cache; there is no single-flight de-duplication. Cache backend failures
/// propagate to the caller instead of degrading to an uncached fetch.
#[derive(Debug)]
pub struct CachedWeatherProvider {
    inner: Box<dyn WeatherProvider>,
    cache: Arc<dyn CacheProvider>,
    ttl: Duration,
}

impl CachedWeatherProvider {
    pub fn new(inner: Box<dyn WeatherProvider>, cache: Arc<dyn CacheProvider>, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    async fn get_or_fetch<T, F>(&self, key: &str, fetch: F) -> Result<T, ProviderError>
    where
        T: Serialize + DeserializeOwned,
        F: Future<Output = Result<T, ProviderError>> + Send,
    {
        if let Some(raw) = self.cache.get(key).await? {
            match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!(key, "cache hit");
                    return Ok(value);
                }
                // An undecodable entry (format drift, truncated write) is a
                // miss; the fresh value overwrites it below.
                Err(err) => debug!(key, error = %err, "discarding undecodable cache entry"),
            }
        }

        let value = fetch.await?;

        let raw = serde_json::to_string(&value).map_err(CacheError::from)?;
        self.cache.set(key, &raw, self.ttl).await?;

        Ok(value)
    }
}

#[async_trait]
impl WeatherProvider for CachedWeatherProvider {
    async fn get_weather_by_city(&self, city: &str) -> Result<Weather, ProviderError> {
        let key = format!("weather:{city}");
        self.get_or_fetch(&key, self.inner.get_weather_by_city(city)).await
    }

    async fn search_city(&self, query: &str) -> Result<Vec<City>, ProviderError> {
        let key = format!("city:{query}");
        self.get_or_fetch(&key, self.inner.search_city(query)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory::InMemoryCacheProvider;
    use crate::model::Temperature;
    use crate::provider::ProviderId;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn kyiv() -> Weather {
        Weather {
            city: "Kyiv".to_string(),
            temperature: Temperature { c: 20.0, f: 68.0 },
            humidity: 50,
            short_description: "clear sky".to_string(),
        }
    }

    #[derive(Debug)]
    struct CountingProvider {
        weather: Option<Weather>,
        calls: Arc<AtomicUsize>,
    }

    impl CountingProvider {
        fn ok(weather: Weather) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (Self { weather: Some(weather), calls: Arc::clone(&calls) }, calls)
        }

        fn failing() -> Self {
            Self { weather: None, calls: Arc::new(AtomicUsize::new(0)) }
        }

        fn outcome(&self) -> Result<Weather, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.weather {
                Some(weather) => Ok(weather.clone()),
                None => Err(ProviderError::Api {
                    provider: ProviderId::WeatherApi,
                    status: 500,
                    message: "all providers down".to_string(),
                }),
            }
        }
    }

    #[async_trait]
    impl WeatherProvider for CountingProvider {
        async fn get_weather_by_city(&self, _city: &str) -> Result<Weather, ProviderError> {
            self.outcome()
        }

        async fn search_city(&self, _query: &str) -> Result<Vec<City>, ProviderError> {
            self.outcome().map(|_| Vec::new())
        }
    }

    /// Store that fails every operation, to assert fail-closed behavior.
    #[derive(Debug)]
    struct BrokenStore;

    #[async_trait]
    impl CacheProvider for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Backend("store down".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Backend("store down".to_string()))
        }

        async fn del(&self, _key: &str) -> Result<(), CacheError> {
            Ok(())
        }

        async fn clear(&self) -> Result<(), CacheError> {
            Ok(())
        }

        async fn disconnect(&self) -> Result<(), CacheError> {
            Ok(())
        }
    }

    fn proxy_with_ttl(
        provider: CountingProvider,
        cache: Arc<dyn CacheProvider>,
        ttl: Duration,
    ) -> CachedWeatherProvider {
        CachedWeatherProvider::new(Box::new(provider), cache, ttl)
    }

    #[tokio::test]
    async fn cache_hit_avoids_the_chain() {
        let (provider, calls) = CountingProvider::ok(kyiv());
        let cache = Arc::new(InMemoryCacheProvider::new());
        let proxy = proxy_with_ttl(provider, cache, Duration::from_secs(60));

        let first = proxy.get_weather_by_city("Kyiv").await.unwrap();
        let second = proxy.get_weather_by_city("Kyiv").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_entry_consults_the_chain_again() {
        let (provider, calls) = CountingProvider::ok(kyiv());
        let cache = Arc::new(InMemoryCacheProvider::new());
        let proxy = proxy_with_ttl(provider, cache, Duration::from_millis(10));

        proxy.get_weather_by_city("Kyiv").await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        proxy.get_weather_by_city("Kyiv").await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn operations_use_namespaced_keys() {
        let (provider, calls) = CountingProvider::ok(kyiv());
        let cache = Arc::new(InMemoryCacheProvider::new());
        let proxy = proxy_with_ttl(provider, Arc::clone(&cache) as _, Duration::from_secs(60));

        proxy.get_weather_by_city("Kyiv").await.unwrap();
        proxy.search_city("Kyiv").await.unwrap();

        // Same query, two operations: two chain calls, two distinct keys.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.get("weather:Kyiv").await.unwrap().is_some());
        assert!(cache.get("city:Kyiv").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn miss_then_chain_failure_fails_the_lookup() {
        let provider = CountingProvider::failing();
        let cache = Arc::new(InMemoryCacheProvider::new());
        let proxy = proxy_with_ttl(provider, cache, Duration::from_secs(60));

        let err = proxy.get_weather_by_city("Kyiv").await.unwrap_err();
        assert!(matches!(err, ProviderError::Api { .. }));
    }

    #[tokio::test]
    async fn cache_backend_failure_propagates() {
        let (provider, calls) = CountingProvider::ok(kyiv());
        let proxy = proxy_with_ttl(provider, Arc::new(BrokenStore), Duration::from_secs(60));

        let err = proxy.get_weather_by_city("Kyiv").await.unwrap_err();

        assert!(matches!(err, ProviderError::Cache(_)));
        // Fail-closed: the chain is never reached when the cache read fails.
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn undecodable_cache_entry_is_treated_as_a_miss() {
        let (provider, calls) = CountingProvider::ok(kyiv());
        let cache = Arc::new(InMemoryCacheProvider::new());
        cache.set("weather:Kyiv", "not json", Duration::from_secs(60)).await.unwrap();

        let proxy = proxy_with_ttl(provider, Arc::clone(&cache) as _, Duration::from_secs(60));

        let weather = proxy.get_weather_by_city("Kyiv").await.unwrap();

        assert_eq!(weather, kyiv());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // The bad entry was overwritten with the fresh payload.
        let raw = cache.get("weather:Kyiv").await.unwrap().unwrap();
        assert!(raw.contains("clear sky"));
    }

    #[tokio::test]
    async fn cached_payload_round_trips_byte_identically() {
        let (provider, _calls) = CountingProvider::ok(kyiv());
        let cache = Arc::new(InMemoryCacheProvider::new());
        let proxy = proxy_with_ttl(provider, Arc::clone(&cache) as _, Duration::from_secs(60));

        proxy.get_weather_by_city("Kyiv").await.unwrap();

        let raw = cache.get("weather:Kyiv").await.unwrap().unwrap();
        assert_eq!(raw, serde_json::to_string(&kyiv()).unwrap());
    }
}
