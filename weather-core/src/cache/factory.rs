use std::sync::Arc;

use crate::{
    cache::{
        CacheProvider, instrumented::InstrumentedCacheProvider,
        memcached::MemcachedCacheProvider, memory::InMemoryCacheProvider,
        redis::RedisCacheProvider,
    },
    config::{CacheBackend, CacheConfig},
    error::ConfigError,
    metrics::MetricsService,
};

/// Select and construct the configured cache store.
///
/// Validates that the chosen backend's connection parameter is present and
/// always wraps the store in the instrumented decorator; instrumentation is
/// not optional. Network-backed stores connect lazily, so this never blocks
/// on the backend being reachable.
pub fn create(
    config: &CacheConfig,
    metrics: Arc<dyn MetricsService>,
    service_name: &str,
) -> Result<Arc<dyn CacheProvider>, ConfigError> {
    let inner: Box<dyn CacheProvider> = match config.provider {
        CacheBackend::Redis => {
            let url = config.redis_url.as_deref().ok_or(ConfigError::MissingRedisUrl)?;
            Box::new(RedisCacheProvider::new(url))
        }
        CacheBackend::Memcached => {
            let location = config
                .memcached_location
                .as_deref()
                .ok_or(ConfigError::MissingMemcachedLocation)?;
            Box::new(MemcachedCacheProvider::new(location))
        }
        CacheBackend::InMemory => Box::new(InMemoryCacheProvider::new()),
    };

    Ok(Arc::new(InstrumentedCacheProvider::new(inner, metrics, service_name)))
}
