use crate::cache::error::CacheError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to read response body from {0}")]
    Body(String, #[source] reqwest::Error),

    #[error("Upstream answered 304 Not Modified for station '{station}' but no body is cached")]
    NotModifiedWithoutBody { station: String },

    #[error(transparent)]
    Cache(#[from] CacheError),
}
