//! Cache-aside lookup path
//!
//! The cache key is always the literal caller-supplied id prefixed by the
//! kind. The store lookup is the only place encodings are bridged: an
//! ordered list of candidate encodings is tried until one matches.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::warn;
use traficocache::Cache;
use traficostore::{IdentValue, Record, RecordKind, RecordStore, Result};

/// Result of a single lookup, with the latency of the branch that served it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Served from the cache; carries the cache-read duration
    Hit(Duration),
    /// Cache miss, served from the store; carries the store-query duration
    Miss(Duration),
    /// No candidate encoding matched a stored record
    NotFound,
}

/// Candidate encodings for a raw id, in evaluation order:
/// the literal string, the integer form when the id is syntactically a
/// non-negative integer, and the hyphen-stripped form when hyphens are
/// present.
pub fn candidate_encodings(raw_id: &str) -> Vec<IdentValue> {
    let mut candidates = vec![IdentValue::Str(raw_id.to_string())];

    if !raw_id.is_empty() && raw_id.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = raw_id.parse::<u64>() {
            candidates.push(IdentValue::Int(n));
        }
    }

    if raw_id.contains('-') {
        candidates.push(IdentValue::Str(raw_id.replace('-', "")));
    }

    candidates
}

/// Cache-aside read path over a record store and a volatile cache
///
/// Store and cache handles are constructed by the caller and injected;
/// the service holds no other state and is safe to share across requests.
pub struct LookupService {
    store: Arc<dyn RecordStore>,
    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl LookupService {
    /// Create a service over injected store and cache handles
    pub fn new(store: Arc<dyn RecordStore>, cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self { store, cache, ttl }
    }

    /// Configured cache TTL
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// List every known id for a kind, in stored encodings
    pub fn list_ids(&self, kind: RecordKind) -> Result<Vec<IdentValue>> {
        self.store.list_ids(kind)
    }

    /// Look up a record by kind and raw id
    ///
    /// Negative results are never cached: every lookup of a nonexistent id
    /// repeats the full store query. Cache backend failures degrade the
    /// request to store-only instead of failing it; store failures are
    /// returned as errors, distinct from [`Outcome::NotFound`].
    pub fn lookup(&self, kind: RecordKind, raw_id: &str) -> Result<Outcome> {
        let key = format!("{}:{}", kind.wire_name(), raw_id);

        let cache_start = Instant::now();
        match self.cache.get(&key) {
            Ok(Some(bytes)) => {
                let cache_elapsed = cache_start.elapsed();
                match serde_json::from_slice::<Record>(&bytes) {
                    Ok(_) => return Ok(Outcome::Hit(cache_elapsed)),
                    Err(e) => {
                        warn!("undecodable cache entry for {}: {}", key, e);
                    }
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!("cache read failed for {}: {}", key, e);
            }
        }

        let store_start = Instant::now();
        let mut found = None;
        for candidate in candidate_encodings(raw_id) {
            if let Some(record) = self.store.find_one(kind, &candidate)? {
                found = Some(record);
                break;
            }
        }
        let store_elapsed = store_start.elapsed();

        let record = match found {
            Some(record) => record,
            None => return Ok(Outcome::NotFound),
        };

        let bytes = serde_json::to_vec(&record)?;
        if let Err(e) = self.cache.set(&key, bytes, self.ttl) {
            warn!("cache write failed for {}: {}", key, e);
        }

        Ok(Outcome::Miss(store_elapsed))
    }
}
