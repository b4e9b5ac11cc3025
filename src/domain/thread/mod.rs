//! Thread domain module.
//!
//! Threads, their cached summaries and listing queries, plus the cache key
//! layout used by the read-through cache.

mod aggregate;
pub mod cache_keys;

pub use aggregate::{Thread, ThreadListQuery, ThreadSort, ThreadSummary};
