//! Filtering, projection and resampling of a station's series.

pub mod builder;
pub mod error;
pub(crate) mod resample;
