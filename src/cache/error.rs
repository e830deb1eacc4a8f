use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to create cache directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to read cache file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to write cache file '{0}'")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("Failed to delete cache file '{0}'")]
    Delete(PathBuf, #[source] std::io::Error),

    #[error("Failed to encode cache entry")]
    Encode(#[source] Box<bincode::error::EncodeError>),

    #[error("Failed to serialize value for cache key '{key}'")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
