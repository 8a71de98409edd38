//! Core library for the weather data access layer.
//!
//! This crate defines:
//! - Configuration handling (providers, cache backend, TTL)
//! - The provider failover chain and its adapters (WeatherAPI, OpenWeather)
//! - The cache store contract with in-memory, Redis and Memcached backends
//! - The cache-aside proxy and the instrumented cache decorator
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or
//! services that need resilient weather lookups.

pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod provider;

pub use cache::CacheProvider;
pub use config::{CacheBackend, CacheConfig, Config, ProviderConfig, ProvidersConfig};
pub use error::{CacheError, ConfigError, ProviderError};
pub use metrics::{MetricsService, RuntimeMetrics};
pub use model::{City, Temperature, Weather};
pub use provider::{ProviderId, WeatherProvider, cached::CachedWeatherProvider};
