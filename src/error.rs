use crate::cache::error::CacheError;
use crate::config::ConfigError;
use crate::slice::error::SliceError;
use crate::upstream::error::UpstreamError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Slice(#[from] SliceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Upstream document for station '{station}' is not valid JSON")]
    InvalidDocument {
        station: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),
}
