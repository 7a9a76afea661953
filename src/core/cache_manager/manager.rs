//! Response cache implementation

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::time::Instant;
use tracing::{debug, trace};

use super::key::CacheKey;
use super::types::{AtomicCacheStats, CacheEntry, CacheStats};
use crate::config::models::cache::{CacheConfig, EvictionStrategy};
use crate::core::events::{EventBus, EvictionReason, OrchestratorEvent};
use crate::core::types::CompletionResponse;
use crate::utils::sys::Ticker;

/// Estimated size of a cached response: its serialized length
pub fn estimate_size(value: &CompletionResponse) -> usize {
    serde_json::to_vec(value).map_or(value.content.len(), |bytes| bytes.len())
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    size_bytes: usize,
    next_seq: u64,
}

impl CacheState {
    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn remove(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.size_bytes -= entry.size_bytes;
        Some(entry)
    }
}

struct CacheInner {
    config: CacheConfig,
    state: Mutex<CacheState>,
    stats: AtomicCacheStats,
    events: EventBus,
}

impl CacheInner {
    /// Remove every entry past its TTL, returning how many went
    fn sweep(&self) -> usize {
        let now = Instant::now();
        let ttl = self.config.ttl();

        let expired: Vec<(CacheKey, usize)> = {
            let mut state = self.state.lock();
            let keys: Vec<CacheKey> = state
                .entries
                .iter()
                .filter(|(_, entry)| entry.is_expired(ttl, now))
                .map(|(key, _)| key.clone())
                .collect();
            keys.into_iter()
                .filter_map(|key| state.remove(&key).map(|entry| (key, entry.size_bytes)))
                .collect()
        };

        for (key, size_bytes) in &expired {
            self.stats.expirations.fetch_add(1, Ordering::Relaxed);
            self.events.emit(OrchestratorEvent::CacheEviction {
                key: key.to_string(),
                reason: EvictionReason::Expired,
                size_bytes: *size_bytes,
            });
        }
        if !expired.is_empty() {
            debug!(expired = expired.len(), "swept expired cache entries");
        }
        expired.len()
    }
}

/// Shared response cache.
///
/// One lock guards the entry map and the running size, so the size bound
/// holds whenever the lock is released. Concurrent writers to the same key
/// are last-writer-wins.
pub struct ResponseCache {
    inner: Arc<CacheInner>,
    sweeper: Mutex<Option<Ticker>>,
    stopped: AtomicBool,
}

impl ResponseCache {
    pub fn new(config: CacheConfig, events: EventBus) -> Self {
        let cache = Self {
            inner: Arc::new(CacheInner {
                config,
                state: Mutex::new(CacheState::default()),
                stats: AtomicCacheStats::default(),
                events,
            }),
            sweeper: Mutex::new(None),
            stopped: AtomicBool::new(false),
        };
        cache.ensure_sweeper();
        cache
    }

    fn ensure_sweeper(&self) {
        let mut sweeper = self.sweeper.lock();
        if sweeper.is_some() || self.stopped.load(Ordering::Acquire) {
            return;
        }
        let weak: Weak<CacheInner> = Arc::downgrade(&self.inner);
        *sweeper = Ticker::spawn(
            "cache-sweeper",
            self.inner.config.sweep_interval(),
            move || match weak.upgrade() {
                Some(inner) => {
                    inner.sweep();
                    true
                }
                None => false,
            },
        );
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Look up a response. Expired entries are removed and reported as misses.
    pub fn get(&self, key: &CacheKey) -> Option<CompletionResponse> {
        self.ensure_sweeper();
        let now = Instant::now();
        let ttl = self.inner.config.ttl();

        let mut expired_size = None;
        let found = {
            let mut state = self.inner.state.lock();
            let expired = state
                .entries
                .get(key)
                .is_some_and(|entry| entry.is_expired(ttl, now));

            if expired {
                expired_size = state.remove(key).map(|entry| entry.size_bytes);
                None
            } else {
                let seq = state.next_seq();
                state.entries.get_mut(key).map(|entry| {
                    entry.last_accessed = now;
                    entry.access_seq = seq;
                    entry.hit_count += 1;
                    let mut value = entry.value.clone();
                    value.cached = true;
                    value
                })
            }
        };

        if let Some(size_bytes) = expired_size {
            self.inner.stats.expirations.fetch_add(1, Ordering::Relaxed);
            self.inner.events.emit(OrchestratorEvent::CacheEviction {
                key: key.to_string(),
                reason: EvictionReason::Expired,
                size_bytes,
            });
        }

        match &found {
            Some(_) => {
                trace!(key = %key, "cache hit");
                self.inner.stats.hits.fetch_add(1, Ordering::Relaxed);
                self.inner.events.emit(OrchestratorEvent::CacheHit {
                    key: key.to_string(),
                });
            }
            None => {
                trace!(key = %key, "cache miss");
                self.inner.stats.misses.fetch_add(1, Ordering::Relaxed);
                self.inner.events.emit(OrchestratorEvent::CacheMiss {
                    key: key.to_string(),
                });
            }
        }
        found
    }

    /// Store a response, evicting by the configured strategy until it fits.
    ///
    /// Returns `false` when the response alone is larger than the cache.
    pub fn set(&self, key: CacheKey, mut value: CompletionResponse) -> bool {
        self.ensure_sweeper();
        value.cached = false;
        let size_bytes = estimate_size(&value);
        let max_size = self.inner.config.max_size_bytes;
        if size_bytes > max_size {
            debug!(key = %key, size_bytes, max_size, "response larger than cache, not stored");
            return false;
        }

        let now = Instant::now();
        let evicted = {
            let mut state = self.inner.state.lock();
            state.remove(&key);

            let projected = state.size_bytes + size_bytes;
            let evicted = if projected > max_size {
                self.evict(&mut state, projected - max_size)
            } else {
                Vec::new()
            };

            let seq = state.next_seq();
            state.entries.insert(
                key,
                CacheEntry {
                    value,
                    created_at: now,
                    last_accessed: now,
                    size_bytes,
                    hit_count: 0,
                    insert_seq: seq,
                    access_seq: seq,
                },
            );
            state.size_bytes += size_bytes;
            evicted
        };

        self.inner.stats.insertions.fetch_add(1, Ordering::Relaxed);
        for (key, size_bytes) in evicted {
            self.inner.stats.evictions.fetch_add(1, Ordering::Relaxed);
            self.inner.events.emit(OrchestratorEvent::CacheEviction {
                key: key.to_string(),
                reason: EvictionReason::Capacity,
                size_bytes,
            });
        }
        true
    }

    /// Evict victims in policy order until at least `needed` bytes are free
    fn evict(&self, state: &mut CacheState, needed: usize) -> Vec<(CacheKey, usize)> {
        let strategy = self.inner.config.strategy;
        let mut candidates: Vec<(u64, CacheKey)> = state
            .entries
            .iter()
            .map(|(key, entry)| {
                let order = match strategy {
                    EvictionStrategy::Lru => entry.access_seq,
                    EvictionStrategy::Fifo => entry.insert_seq,
                };
                (order, key.clone())
            })
            .collect();
        candidates.sort_unstable();

        let mut freed = 0;
        let mut evicted = Vec::new();
        for (_, key) in candidates {
            if freed >= needed {
                break;
            }
            if let Some(entry) = state.remove(&key) {
                freed += entry.size_bytes;
                evicted.push((key, entry.size_bytes));
            }
        }
        debug!(?strategy, evicted = evicted.len(), freed, "evicted cache entries");
        evicted
    }

    pub fn remove(&self, key: &CacheKey) -> bool {
        self.inner.state.lock().remove(key).is_some()
    }

    pub fn clear(&self) {
        let mut state = self.inner.state.lock();
        state.entries.clear();
        state.size_bytes = 0;
    }

    /// Remove every expired entry now, returning how many were removed
    pub fn sweep_expired(&self) -> usize {
        self.inner.sweep()
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn size_bytes(&self) -> usize {
        self.inner.state.lock().size_bytes
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner.state.lock().entries.contains_key(key)
    }

    pub fn stats(&self) -> CacheStats {
        let (entries, size_bytes) = {
            let state = self.inner.state.lock();
            (state.entries.len(), state.size_bytes)
        };
        self.inner
            .stats
            .snapshot(entries, size_bytes, self.inner.config.max_size_bytes)
    }

    pub fn reset_stats(&self) {
        self.inner.stats.reset();
    }

    /// Stop the background sweeper. Reads still expire entries lazily.
    pub fn shutdown(&self) {
        self.stopped.store(true, Ordering::Release);
        if let Some(sweeper) = self.sweeper.lock().take() {
            sweeper.stop();
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(CacheConfig::default(), EventBus::default())
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ResponseCache")
            .field("entries", &state.entries.len())
            .field("size_bytes", &state.size_bytes)
            .field("max_size_bytes", &self.inner.config.max_size_bytes)
            .field("strategy", &self.inner.config.strategy)
            .finish()
    }
}
