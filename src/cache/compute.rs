use crate::cache::error::CacheError;
use crate::cache::keyed_locks::KeyedLocks;
use crate::cache::store::CacheStore;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Get-or-compute over a [`CacheStore`], with values stored as JSON.
///
/// Concurrent callers asking for the same missing key inside one process run
/// the loader once: the first caller computes while the others wait on the
/// key's lock and then read the stored value. Processes do not coordinate
/// with each other.
pub struct ComputeCache {
    store: Arc<dyn CacheStore>,
    locks: KeyedLocks,
}

impl ComputeCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            locks: KeyedLocks::default(),
        }
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Returns the cached value for `key`, or runs `loader`, stores its result
    /// for `ttl` and returns it.
    ///
    /// Entries that fail to deserialize are deleted and recomputed. Loader
    /// errors are returned as-is and nothing is stored.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        loader: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.read(key).await? {
            info!("Cache hit for '{}'", key);
            return Ok(value);
        }

        let _guard = self.locks.lock(key).await;
        if let Some(value) = self.read(key).await? {
            debug!("'{}' was computed while waiting for its lock", key);
            return Ok(value);
        }

        info!("Cache miss for '{}', computing", key);
        let value = loader().await?;
        let bytes = serde_json::to_vec(&value).map_err(|source| CacheError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, bytes, Some(ttl)).await?;
        Ok(value)
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let Some(bytes) = self.store.get(key).await? else {
            return Ok(None);
        };
        if bytes.is_empty() {
            return Ok(None);
        }
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Deleting corrupted cache entry '{}': {}", key, e);
                self.store.delete(key).await?;
                Ok(None)
            }
        }
    }
}
