use crate::provider::ProviderId;

/// Errors raised by a single weather provider adapter, or by the chain
/// once every configured provider has been exhausted.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider answered, but knows no city matching the query.
    #[error("{provider}: city not found")]
    CityNotFound { provider: ProviderId },

    /// The provider answered with an error envelope.
    #[error("{provider} request failed with status {status}: {message}")]
    Api {
        provider: ProviderId,
        status: u16,
        message: String,
    },

    /// The request never produced a usable response (DNS, TLS, timeout...).
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: ProviderId,
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered 200 but the body did not match its schema.
    #[error("failed to decode {provider} response: {source}")]
    Decode {
        provider: ProviderId,
        #[source]
        source: serde_json::Error,
    },

    /// A cache backend failure surfaced through the cached proxy.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl ProviderError {
    /// True when the query itself is at fault rather than the provider.
    pub fn is_city_not_found(&self) -> bool {
        matches!(self, ProviderError::CityNotFound { .. })
    }
}

/// Errors raised by a cache store backend.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache connection failed: {0}")]
    Connection(String),

    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("failed to serialize cached value: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Startup-time configuration failures. These are fatal: the factories
/// refuse to build a partially wired core.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no weather providers configured")]
    NoProviders,

    #[error("redis cache selected but redis_url is not set")]
    MissingRedisUrl,

    #[error("memcached cache selected but memcached_location is not set")]
    MissingMemcachedLocation,
}
