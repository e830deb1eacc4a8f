use crate::cache::error::CacheError;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Deterministic cache key: `prefix` followed by the SHA-256 of the JSON form
/// of `parts`.
///
/// Callers normalize list-valued parts (sorting, de-duplicating) before
/// calling so that equivalent requests share a key.
pub fn cache_key<T: Serialize + ?Sized>(prefix: &str, parts: &T) -> Result<String, CacheError> {
    let encoded = serde_json::to_vec(parts).map_err(|source| CacheError::Serialize {
        key: prefix.to_string(),
        source,
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&encoded);
    Ok(format!("{}:{:x}", prefix, hasher.finalize()))
}
