use crate::cache::store::CacheStore;
use crate::config::Settings;
use crate::upstream::error::UpstreamError;
use crate::upstream::revalidation::{RevalidationState, Validators};
use log::{debug, info, warn};
use reqwest::header::{HeaderMap, HeaderName, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;

/// Downloads raw station documents, revalidating against what was stored last time.
pub struct UpstreamFetcher {
    base_url: String,
    client: Client,
    store: Arc<dyn CacheStore>,
    raw_ttl: Duration,
}

fn header_text(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

impl UpstreamFetcher {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        raw_ttl: Duration,
        store: Arc<dyn CacheStore>,
    ) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(UpstreamError::ClientBuild)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            store,
            raw_ttl,
        })
    }

    pub fn from_settings(
        settings: &Settings,
        store: Arc<dyn CacheStore>,
    ) -> Result<Self, UpstreamError> {
        Self::new(
            &settings.upstream_base,
            settings.request_timeout(),
            settings.raw_ttl(),
            store,
        )
    }

    /// Returns the raw document text for `station`.
    ///
    /// When a body is still cached, the request carries the stored
    /// `If-None-Match` / `If-Modified-Since` validators and a `304` answer
    /// returns the cached body. A `2xx` answer replaces the stored validators
    /// and body. Every other status and any transport failure is an error;
    /// nothing is retried.
    pub async fn fetch_raw(&self, station: &str) -> Result<String, UpstreamError> {
        let url = format!("{}/historical_weather", self.base_url);
        let state = RevalidationState::load(self.store.as_ref(), station).await?;

        let mut request = self.client.get(&url).query(&[("station", station)]);
        if state.raw_body.is_some() {
            if let Some(etag) = &state.validators.etag {
                request = request.header(IF_NONE_MATCH, etag);
            }
            if let Some(last_modified) = &state.validators.last_modified {
                request = request.header(IF_MODIFIED_SINCE, last_modified);
            }
            debug!(
                "Revalidating station {} with {:?}",
                station, state.validators
            );
        }

        let response = request
            .send()
            .await
            .map_err(|e| UpstreamError::NetworkRequest(url.clone(), e))?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED {
            return match state.raw_body {
                Some(body) => {
                    info!("Upstream data for station {} not modified", station);
                    Ok(body)
                }
                None => {
                    warn!("Got 304 for station {} with nothing cached", station);
                    Err(UpstreamError::NotModifiedWithoutBody {
                        station: station.to_string(),
                    })
                }
            };
        }
        if !status.is_success() {
            warn!("HTTP error for {} (station {}): {}", url, station, status);
            return Err(UpstreamError::HttpStatus { url, status });
        }

        let validators = Validators {
            etag: header_text(response.headers(), ETAG),
            last_modified: header_text(response.headers(), LAST_MODIFIED),
        };
        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::Body(url.clone(), e))?;
        info!(
            "Downloaded {} bytes for station {} from {}",
            body.len(),
            station,
            url
        );

        RevalidationState::save(
            self.store.as_ref(),
            station,
            &validators,
            &body,
            self.raw_ttl,
        )
        .await?;
        Ok(body)
    }
}
