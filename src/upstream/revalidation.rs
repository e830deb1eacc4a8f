use crate::cache::error::CacheError;
use crate::cache::store::CacheStore;
use std::time::Duration;

/// `ETag` / `Last-Modified` values of an upstream response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validators {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

/// What is remembered about a station's last successful upstream response.
///
/// Stored as three independent entries: the validators never expire, the raw
/// body lives for the raw TTL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevalidationState {
    pub validators: Validators,
    pub raw_body: Option<String>,
}

fn etag_key(station: &str) -> String {
    format!("etag:{}", station)
}

fn last_modified_key(station: &str) -> String {
    format!("lastmod:{}", station)
}

fn raw_key(station: &str) -> String {
    format!("raw:{}", station)
}

async fn get_text(store: &dyn CacheStore, key: &str) -> Result<Option<String>, CacheError> {
    Ok(store
        .get(key)
        .await?
        .and_then(|bytes| String::from_utf8(bytes).ok()))
}

impl RevalidationState {
    pub async fn load(store: &dyn CacheStore, station: &str) -> Result<Self, CacheError> {
        Ok(Self {
            validators: Validators {
                etag: get_text(store, &etag_key(station)).await?,
                last_modified: get_text(store, &last_modified_key(station)).await?,
            },
            raw_body: get_text(store, &raw_key(station)).await?,
        })
    }

    /// Records a fresh response for `station`.
    ///
    /// Old validators are removed before the body is written and the new ones
    /// are written only after it, so stored validators never describe a body
    /// other than the stored one. Validators the response did not carry stay
    /// cleared.
    pub async fn save(
        store: &dyn CacheStore,
        station: &str,
        validators: &Validators,
        body: &str,
        raw_ttl: Duration,
    ) -> Result<(), CacheError> {
        store.delete(&etag_key(station)).await?;
        store.delete(&last_modified_key(station)).await?;
        store
            .set(&raw_key(station), body.as_bytes().to_vec(), Some(raw_ttl))
            .await?;

        if let Some(etag) = &validators.etag {
            store
                .set(&etag_key(station), etag.as_bytes().to_vec(), None)
                .await?;
        }
        if let Some(last_modified) = &validators.last_modified {
            store
                .set(
                    &last_modified_key(station),
                    last_modified.as_bytes().to_vec(),
                    None,
                )
                .await?;
        }
        Ok(())
    }
}
