//! Cache Module - Bounded in-memory caches for the mutation engine
//!
//! Provides:
//! - `FingerprintCache`: digests of payloads already fed to the engine
//! - `EncodingCache`: memoized compress + base64 of mutated payloads
//!
//! Both are LRU-bounded so a long-running engine does not grow without limit.

pub mod encoding;
pub mod fingerprint;
pub mod stats;

pub use encoding::EncodingCache;
pub use fingerprint::FingerprintCache;
pub use stats::CacheStats;

use serde::{Deserialize, Serialize};

/// Cache capacities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of payload digests remembered for dedup
    pub fingerprint_capacity: usize,
    /// Maximum number of memoized encodings
    pub encoding_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            fingerprint_capacity: 4096,
            encoding_capacity: 1024,
        }
    }
}
