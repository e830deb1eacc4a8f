//! Weather-station time series from an upstream JSON source.
//!
//! Raw documents in any of three layouts are normalized into one canonical
//! series, sliced by time range and variables, optionally resampled onto
//! fixed-width buckets, and merged across stations on a shared timeline.
//! [`StationSeries`] puts this behind a get-or-compute cache with single-flight
//! loading and `ETag` / `Last-Modified` revalidation of upstream fetches.

mod cache;
mod compare;
mod config;
mod error;
mod normalize;
mod slice;
mod station_series;
mod types;
mod upstream;
mod utils;

pub use error::SeriesError;
pub use station_series::*;

pub use config::{ConfigError, Settings};

pub use normalize::normalize;
pub use slice::builder::build_slice;
pub use slice::error::SliceError;
pub use compare::merge;

pub use types::canonical::{CanonicalPoint, CanonicalSeries};
pub use types::datetime::{format_iso, from_epoch, parse_datetime};
pub use types::resample_rule::ResampleRule;
pub use types::results::{MergedResult, SliceResult, StationPoints};
pub use types::row::SeriesRow;
pub use types::slice_spec::{parse_variables, SliceSpec};

pub use cache::compute::ComputeCache;
pub use cache::error::CacheError;
pub use cache::file_store::FileStore;
pub use cache::key::cache_key;
pub use cache::memory_store::MemoryStore;
pub use cache::store::CacheStore;

pub use upstream::error::UpstreamError;
pub use upstream::fetcher::UpstreamFetcher;
pub use upstream::revalidation::{RevalidationState, Validators};
