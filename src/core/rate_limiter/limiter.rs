//! Core rate limiter implementation

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, warn};

use super::bucket::TokenBucket;
use super::types::{BucketConfig, DEFAULT_CAPACITY, QueueTimeout, RateLimitSnapshot};
use crate::config::models::rate_limit::RateLimitConfig;
use crate::core::events::{EventBus, OrchestratorEvent};
use crate::utils::error::{OrchestratorError, RateLimitReason, Result};

const GLOBAL_BUCKET: &str = "global";

/// Bucket plus the cost model used to charge it
#[derive(Debug)]
struct LimitedBucket {
    bucket: TokenBucket,
    token_based: bool,
}

impl LimitedBucket {
    fn from_config(name: &str, config: &RateLimitConfig) -> Self {
        let capacity = config
            .requests_per_minute
            .or(config.tokens_per_minute)
            .unwrap_or(DEFAULT_CAPACITY);
        Self {
            bucket: TokenBucket::new(name, BucketConfig::per_minute(capacity)),
            token_based: config.is_token_based(),
        }
    }

    fn cost(&self, estimated_tokens: u32) -> f64 {
        if self.token_based {
            f64::from(estimated_tokens.max(1))
        } else {
            1.0
        }
    }

    async fn acquire(&self, estimated_tokens: u32) -> std::result::Result<u64, QueueTimeout> {
        self.bucket
            .acquire(self.cost(estimated_tokens))
            .await
            .map(|waited| waited.as_millis() as u64)
    }
}

#[derive(Debug)]
struct ProviderLimit {
    limited: LimitedBucket,
    max_concurrent: Option<u32>,
    active: Arc<AtomicU32>,
}

/// Per-provider admission control with an optional global bucket.
///
/// `acquire` checks, in order: the provider's concurrency cap (rejects
/// immediately), the global bucket, then the provider bucket (both queue).
/// Tokens are never refunded.
#[derive(Debug)]
pub struct RateLimiter {
    configs: HashMap<String, RateLimitConfig>,
    providers: DashMap<String, Arc<ProviderLimit>>,
    global: Option<LimitedBucket>,
    events: EventBus,
}

impl RateLimiter {
    pub fn new(
        configs: HashMap<String, RateLimitConfig>,
        global: Option<RateLimitConfig>,
    ) -> Self {
        Self {
            global: global
                .as_ref()
                .map(|config| LimitedBucket::from_config(GLOBAL_BUCKET, config)),
            configs,
            providers: DashMap::new(),
            events: EventBus::default(),
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    fn limit_for(&self, provider: &str) -> Arc<ProviderLimit> {
        if let Some(limit) = self.providers.get(provider) {
            return limit.clone();
        }

        self.providers
            .entry(provider.to_string())
            .or_insert_with(|| {
                let config = self.configs.get(provider).cloned().unwrap_or_default();
                debug!(provider, ?config, "creating rate limit bucket");
                Arc::new(ProviderLimit {
                    limited: LimitedBucket::from_config(provider, &config),
                    max_concurrent: config.max_concurrent,
                    active: Arc::new(AtomicU32::new(0)),
                })
            })
            .clone()
    }

    /// Admit one call to `provider`.
    ///
    /// `estimated_tokens` is charged only by token-based buckets. The returned
    /// permit holds a concurrency slot until it is released or dropped.
    pub async fn acquire(&self, provider: &str, estimated_tokens: u32) -> Result<RateLimitPermit> {
        let limit = self.limit_for(provider);

        let claimed = limit
            .active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |active| {
                match limit.max_concurrent {
                    Some(max) if active >= max => None,
                    _ => Some(active + 1),
                }
            });
        if claimed.is_err() {
            let max_concurrent = limit.max_concurrent.unwrap_or_default();
            warn!(provider, max_concurrent, "concurrency limit reached");
            self.events.emit(OrchestratorEvent::ConcurrentLimitExceeded {
                provider: provider.to_string(),
                max_concurrent,
            });
            return Err(OrchestratorError::rate_limit(
                provider,
                RateLimitReason::ConcurrencyLimit { max_concurrent },
            ));
        }

        // Dropped on any early return below, which frees the slot
        let permit = RateLimitPermit {
            provider: provider.to_string(),
            active: limit.active.clone(),
            released: false,
        };

        let mut waited_ms = 0;
        if let Some(global) = &self.global {
            waited_ms += global
                .acquire(estimated_tokens)
                .await
                .map_err(|timeout| self.queue_timeout(provider, timeout))?;
        }
        waited_ms += limit
            .limited
            .acquire(estimated_tokens)
            .await
            .map_err(|timeout| self.queue_timeout(provider, timeout))?;

        self.events.emit(OrchestratorEvent::RateLimitAcquired {
            provider: provider.to_string(),
            waited_ms,
        });
        Ok(permit)
    }

    fn queue_timeout(&self, provider: &str, timeout: QueueTimeout) -> OrchestratorError {
        let waited_ms = timeout.waited.as_millis() as u64;
        warn!(provider, waited_ms, "rate limit queue timeout");
        self.events.emit(OrchestratorEvent::RateLimitQueueTimeout {
            provider: provider.to_string(),
            waited_ms,
        });
        OrchestratorError::rate_limit(provider, RateLimitReason::QueueTimeout { waited_ms })
    }

    /// Current state of a provider's limits, if it has been used or configured
    pub fn snapshot(&self, provider: &str) -> Option<RateLimitSnapshot> {
        if !self.providers.contains_key(provider) && !self.configs.contains_key(provider) {
            return None;
        }
        let limit = self.limit_for(provider);
        Some(RateLimitSnapshot {
            provider: provider.to_string(),
            bucket: limit.limited.bucket.snapshot(),
            active: limit.active.load(Ordering::Acquire),
            max_concurrent: limit.max_concurrent,
            token_based: limit.limited.token_based,
        })
    }

    pub fn global_snapshot(&self) -> Option<super::types::BucketSnapshot> {
        self.global.as_ref().map(|g| g.bucket.snapshot())
    }

    /// In-flight calls admitted for `provider`
    pub fn active(&self, provider: &str) -> u32 {
        self.providers
            .get(provider)
            .map_or(0, |limit| limit.active.load(Ordering::Acquire))
    }

    /// Stop every refill ticker
    pub fn shutdown(&self) {
        if let Some(global) = &self.global {
            global.bucket.stop();
        }
        for limit in self.providers.iter() {
            limit.limited.bucket.stop();
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(HashMap::new(), None)
    }
}

/// Concurrency slot held for the duration of one provider call.
///
/// Releasing only frees the slot; consumed tokens stay consumed.
#[derive(Debug)]
#[must_use = "dropping the permit releases the concurrency slot immediately"]
pub struct RateLimitPermit {
    provider: String,
    active: Arc<AtomicU32>,
    released: bool,
}

impl RateLimitPermit {
    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn release(mut self) {
        self.release_slot();
    }

    fn release_slot(&mut self) {
        if !self.released {
            self.released = true;
            self.active.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

impl Drop for RateLimitPermit {
    fn drop(&mut self) {
        self.release_slot();
    }
}
