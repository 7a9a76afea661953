//! Cache entry and statistics types

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

use crate::core::types::CompletionResponse;

/// Stored response with bookkeeping
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Stored with `cached = false`; readers get a tagged copy
    pub value: CompletionResponse,
    pub created_at: Instant,
    pub last_accessed: Instant,
    /// Estimated size (serialized length of the response)
    pub size_bytes: usize,
    pub hit_count: u64,
    /// Monotonic insertion order, orders FIFO victims
    pub insert_seq: u64,
    /// Monotonic access order, orders LRU victims
    pub access_seq: u64,
}

impl CacheEntry {
    pub fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) > ttl
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

/// Lock-free counters updated on the hot path
#[derive(Debug, Default)]
pub(super) struct AtomicCacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub evictions: AtomicU64,
    pub expirations: AtomicU64,
    pub insertions: AtomicU64,
}

impl AtomicCacheStats {
    pub fn snapshot(&self, entries: usize, size_bytes: usize, max_size_bytes: usize) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        CacheStats {
            hits,
            misses,
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            insertions: self.insertions.load(Ordering::Relaxed),
            entries,
            size_bytes,
            max_size_bytes,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                hits as f64 / lookups as f64
            },
        }
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.expirations.store(0, Ordering::Relaxed);
        self.insertions.store(0, Ordering::Relaxed);
    }
}

/// Cache statistics snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries removed to make room
    pub evictions: u64,
    /// Entries removed past their TTL
    pub expirations: u64,
    pub insertions: u64,
    pub entries: usize,
    pub size_bytes: usize,
    pub max_size_bytes: usize,
    /// Hits over lookups, 0.0 before the first lookup
    pub hit_rate: f64,
}
