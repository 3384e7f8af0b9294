//! # traficocache
//!
//! Volatile key -> bytes cache with per-key TTL, used on the cache-aside
//! read path in front of the record store.
//!
//! ## Design
//! - **HashMap**: AHash for fast lookups (O(1))
//! - **Expiry**: passive, checked on read; no sweeper thread
//! - **No eviction policy** beyond expiry, matching the backing contract

#![warn(missing_docs)]

mod cache;
mod stats;

pub use cache::{Cache, CacheError, Result, TtlCache};
pub use stats::CacheStats;
