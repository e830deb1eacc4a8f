use crate::cache::error::CacheError;
use async_trait::async_trait;
use std::time::Duration;

/// A shared key-value store with per-entry expiry.
///
/// Each call is atomic for its key. An entry written with `ttl: None` never
/// expires; otherwise it disappears once `ttl` has elapsed.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
