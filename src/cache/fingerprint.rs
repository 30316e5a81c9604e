//! Fingerprint Cache - Content digests of payloads already seen
//!
//! Digests are SHA-256 hex strings. Both the set of seen digests and the
//! payload -> digest memo are LRU-bounded.

use lru::LruCache;
use std::num::NonZeroUsize;

use super::stats::CacheStats;
use crate::codec::sha256_hex;

/// Bounded set of seen payload digests
pub struct FingerprintCache {
    seen: LruCache<String, ()>,
    /// Memoized digests keyed by raw payload
    digests: LruCache<String, String>,
    stats: CacheStats,
}

impl FingerprintCache {
    /// Create a cache remembering at most `capacity` digests
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            seen: LruCache::new(cap),
            digests: LruCache::new(cap),
            stats: CacheStats::new(cap.get()),
        }
    }

    /// Digest of `payload`, memoized
    pub fn digest(&mut self, payload: &str) -> String {
        if let Some(hash) = self.digests.get(payload) {
            return hash.clone();
        }
        let hash = sha256_hex(payload);
        self.digests.put(payload.to_string(), hash.clone());
        hash
    }

    /// Whether a digest has been recorded. Counts toward hit/miss stats.
    pub fn seen(&mut self, digest: &str) -> bool {
        if self.seen.get(digest).is_some() {
            self.stats.record_hit();
            true
        } else {
            self.stats.record_miss();
            false
        }
    }

    /// Record a digest, evicting the least recently seen one when full
    pub fn record(&mut self, digest: String) {
        if let Some((evicted, _)) = self.seen.push(digest, ()) {
            // push returns the old entry on key update too
            if !self.seen.contains(&evicted) {
                self.stats.record_eviction();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.seen.len(),
            ..self.stats.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_memoized_and_stable() {
        let mut cache = FingerprintCache::new(4);
        let a = cache.digest("1 OR 1=1");
        assert_eq!(a.len(), 64);
        assert_eq!(a, cache.digest("1 OR 1=1"));
        assert_ne!(a, cache.digest("1 OR 1=2"));
    }

    #[test]
    fn seen_after_record() {
        let mut cache = FingerprintCache::new(4);
        let d = cache.digest("payload");
        assert!(!cache.seen(&d));
        cache.record(d.clone());
        assert!(cache.seen(&d));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn evicts_least_recent_digest() {
        let mut cache = FingerprintCache::new(2);
        cache.record("a".into());
        cache.record("b".into());
        cache.record("a".into());
        cache.record("c".into());

        assert!(cache.seen("a"));
        assert!(cache.seen("c"));
        assert!(!cache.seen("b"));
        assert_eq!(cache.stats().evictions, 1);
    }
}
