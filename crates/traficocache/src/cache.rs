//! TTL byte cache
//!
//! Keys are independent; the only eviction policy is per-entry expiry,
//! checked passively on read. Nothing sweeps the map in the background.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use ahash::RandomState;
use parking_lot::RwLock;

use crate::stats::CacheStats;

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Error types for cache backends
///
/// The in-process cache is infallible, but the contract admits backends
/// that can fail per call (a remote cache, for instance).
#[derive(Debug)]
pub enum CacheError {
    /// Cache backend failure
    Unavailable(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Unavailable(msg) => write!(f, "Cache unavailable: {}", msg),
        }
    }
}

impl std::error::Error for CacheError {}

/// Capabilities the lookup path consumes: get and set with TTL.
/// No deletes, no listings.
pub trait Cache: Send + Sync {
    /// Fetch a value; an expired entry behaves as absent
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store a value with a per-key time-to-live
    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;
}

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// In-process key -> bytes cache with per-key expiry
#[derive(Default)]
pub struct TtlCache {
    entries: RwLock<HashMap<String, Entry, RandomState>>,
    stats: CacheStats,
}

impl TtlCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Number of entries currently held, expired ones included
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Cache for TtlCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut entries = self.entries.write();

        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                self.stats.record_hit();
                Ok(Some(entry.value.clone()))
            }
            Some(_) => {
                // Past its TTL: drop it and report absence
                entries.remove(key);
                self.stats.record_expired();
                self.stats.record_miss();
                Ok(None)
            }
            None => {
                self.stats.record_miss();
                Ok(None)
            }
        }
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().insert(key.to_string(), entry);
        self.stats.record_insert();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const LONG_TTL: Duration = Duration::from_secs(300);

    #[test]
    fn test_set_and_get() {
        let cache = TtlCache::new();

        cache.set("alerta:a1", b"payload".to_vec(), LONG_TTL).unwrap();

        let value = cache.get("alerta:a1").unwrap();
        assert_eq!(value, Some(b"payload".to_vec()));
        assert_eq!(cache.stats().hits(), 1);
    }

    #[test]
    fn test_absent_key_is_miss() {
        let cache = TtlCache::new();

        assert_eq!(cache.get("atasco:99").unwrap(), None);
        assert_eq!(cache.stats().misses(), 1);
    }

    #[test]
    fn test_expiry_is_checked_on_read() {
        let cache = TtlCache::new();

        cache
            .set("alerta:a1", b"payload".to_vec(), Duration::from_millis(30))
            .unwrap();
        thread::sleep(Duration::from_millis(60));

        assert_eq!(cache.get("alerta:a1").unwrap(), None);
        assert_eq!(cache.stats().expired(), 1);
        // Entry was dropped on that read
        assert!(cache.is_empty());
    }

    #[test]
    fn test_rewrite_same_key_is_safe() {
        let cache = TtlCache::new();

        cache.set("alerta:a1", b"payload".to_vec(), LONG_TTL).unwrap();
        cache.set("alerta:a1", b"payload".to_vec(), LONG_TTL).unwrap();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("alerta:a1").unwrap(), Some(b"payload".to_vec()));
    }

    #[test]
    fn test_keys_are_independent() {
        let cache = TtlCache::new();

        cache
            .set("alerta:a1", b"a".to_vec(), Duration::from_millis(30))
            .unwrap();
        cache.set("atasco:42", b"b".to_vec(), LONG_TTL).unwrap();
        thread::sleep(Duration::from_millis(60));

        assert_eq!(cache.get("alerta:a1").unwrap(), None);
        assert_eq!(cache.get("atasco:42").unwrap(), Some(b"b".to_vec()));
    }

    #[test]
    fn test_concurrent_access() {
        use std::sync::Arc;

        let cache = Arc::new(TtlCache::new());
        let mut handles = Vec::new();

        for i in 0..4 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                let key = format!("atasco:{}", i);
                for _ in 0..100 {
                    cache.set(&key, vec![i as u8], LONG_TTL).unwrap();
                    assert_eq!(cache.get(&key).unwrap(), Some(vec![i as u8]));
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 4);
    }
}
