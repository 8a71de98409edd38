use std::fmt::Debug;

/// Sink for cache instrumentation.
///
/// Counters are process-wide and additive, labeled by the logical service
/// name chosen at construction time; they reset only on process restart.
/// A trait seam (rather than the `metrics` macros inline) keeps the
/// decorator testable with a recording sink.
pub trait MetricsService: Send + Sync + Debug {
    fn increment_cache_hits(&self, service: &str);

    fn increment_cache_misses(&self, service: &str);

    fn record_get_duration(&self, service: &str, seconds: f64);

    fn record_set_duration(&self, service: &str, seconds: f64);
}

/// Production sink emitting through the `metrics` facade, to be picked up by
/// whatever recorder the hosting process installs (Prometheus exporter in
/// the reference deployment).
#[derive(Debug, Default, Clone, Copy)]
pub struct RuntimeMetrics;

impl MetricsService for RuntimeMetrics {
    fn increment_cache_hits(&self, service: &str) {
        metrics::counter!("cache_hits_total", "service" => service.to_owned()).increment(1);
    }

    fn increment_cache_misses(&self, service: &str) {
        metrics::counter!("cache_misses_total", "service" => service.to_owned()).increment(1);
    }

    fn record_get_duration(&self, service: &str, seconds: f64) {
        metrics::histogram!("cache_get_duration_seconds", "service" => service.to_owned())
            .record(seconds);
    }

    fn record_set_duration(&self, service: &str, seconds: f64) {
        metrics::histogram!("cache_set_duration_seconds", "service" => service.to_owned())
            .record(seconds);
    }
}
