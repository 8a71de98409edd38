use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::CacheProvider;
use crate::error::CacheError;
use crate::metrics::MetricsService;

/// Decorator recording hit/miss counters and operation-duration histograms
/// around an inner store, transparent to the cached proxy.
///
/// Durations are recorded unconditionally, error paths included. A failed
/// `get` counts as neither hit nor miss: the store did not answer, so
/// classifying it either way would skew both ratios.
#[derive(Debug)]
pub struct InstrumentedCacheProvider {
    inner: Box<dyn CacheProvider>,
    metrics: Arc<dyn MetricsService>,
    service: String,
}

impl InstrumentedCacheProvider {
    pub fn new(
        inner: Box<dyn CacheProvider>,
        metrics: Arc<dyn MetricsService>,
        service: impl Into<String>,
    ) -> Self {
        Self { inner, metrics, service: service.into() }
    }
}

#[async_trait]
impl CacheProvider for InstrumentedCacheProvider {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let started = Instant::now();
        let result = self.inner.get(key).await;
        self.metrics.record_get_duration(&self.service, started.elapsed().as_secs_f64());

        match &result {
            Ok(Some(_)) => self.metrics.increment_cache_hits(&self.service),
            Ok(None) => self.metrics.increment_cache_misses(&self.service),
            Err(_) => {}
        }

        result
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let started = Instant::now();
        let result = self.inner.set(key, value, ttl).await;
        self.metrics.record_set_duration(&self.service, started.elapsed().as_secs_f64());
        result
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.inner.del(key).await
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.inner.clear().await
    }

    async fn disconnect(&self) -> Result<(), CacheError> {
        self.inner.disconnect().await
    }
}
