//! Encoding Cache - Memoized compress + base64 of mutated payloads

use lru::LruCache;
use std::num::NonZeroUsize;

use super::stats::CacheStats;
use crate::codec::{base64_encode, compress};

/// LRU-bounded map from raw payload to its compressed base64 form
pub struct EncodingCache {
    entries: LruCache<String, String>,
    stats: CacheStats,
}

impl EncodingCache {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(cap),
            stats: CacheStats::new(cap.get()),
        }
    }

    /// zlib + base64 of `raw`, computed once per distinct string
    pub fn encode(&mut self, raw: &str) -> String {
        if let Some(encoded) = self.entries.get(raw) {
            self.stats.record_hit();
            return encoded.clone();
        }
        self.stats.record_miss();

        let encoded = match compress(raw.as_bytes()) {
            Ok(bytes) => base64_encode(&bytes),
            Err(e) => {
                tracing::warn!("Compression failed, encoding raw bytes: {}", e);
                base64_encode(raw.as_bytes())
            }
        };

        if self.entries.push(raw.to_string(), encoded.clone()).is_some() {
            self.stats.record_eviction();
        }
        encoded
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            ..self.stats.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    #[test]
    fn encode_decodes_back() {
        let mut cache = EncodingCache::new(8);
        let encoded = cache.encode("IF(1=1,(SELECT 1),NULL)");

        let compressed = BASE64.decode(encoded).unwrap();
        let mut raw = String::new();
        ZlibDecoder::new(compressed.as_slice())
            .read_to_string(&mut raw)
            .unwrap();
        assert_eq!(raw, "IF(1=1,(SELECT 1),NULL)");
    }

    #[test]
    fn repeated_input_hits_cache() {
        let mut cache = EncodingCache::new(8);
        let first = cache.encode("x");
        let second = cache.encode("x");
        assert_eq!(first, second);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn capacity_bounds_entries() {
        let mut cache = EncodingCache::new(2);
        cache.encode("a");
        cache.encode("b");
        cache.encode("c");
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 1);
    }
}
