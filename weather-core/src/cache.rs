use crate::error::CacheError;
use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;

pub mod factory;
pub mod instrumented;
pub mod memcached;
pub mod memory;
pub mod redis;

/// Backend-agnostic key/value store with TTL expiry.
///
/// Values are opaque serialized strings; callers own the (de)serialization
/// so the same store can hold weather payloads and city lists. An entry
/// observed after its TTL must be reported as absent whatever the backend.
///
/// Network-backed stores treat any I/O failure as connection-invalidating:
/// the next operation attempts a fresh connection instead of reusing a
/// known-bad handle, and the error is re-raised to the caller.
#[async_trait]
pub trait CacheProvider: Send + Sync + Debug {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    async fn del(&self, key: &str) -> Result<(), CacheError>;

    async fn clear(&self) -> Result<(), CacheError>;

    /// Release backend resources; a no-op for the in-process store. Exposed
    /// so shutdown hooks can close connections cleanly.
    async fn disconnect(&self) -> Result<(), CacheError>;
}
