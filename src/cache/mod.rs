//! Key-value stores and the get-or-compute layer built on them.

pub mod compute;
pub mod error;
pub mod file_store;
pub mod key;
mod keyed_locks;
pub mod memory_store;
pub mod store;
