//! Conditional fetching of raw station documents.

pub mod error;
pub mod fetcher;
pub mod revalidation;
