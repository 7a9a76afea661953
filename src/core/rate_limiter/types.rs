//! Rate limiter types and data structures

use serde::Serialize;
use std::time::Duration;

/// Requests-per-minute used for providers without a configured limit
pub const DEFAULT_CAPACITY: u32 = 60;
/// Longest a caller waits in a bucket queue
pub const DEFAULT_QUEUE_TIMEOUT: Duration = Duration::from_secs(30);
/// Refill tick
pub const DEFAULT_REFILL_INTERVAL: Duration = Duration::from_secs(1);

/// Token bucket parameters
#[derive(Debug, Clone, PartialEq)]
pub struct BucketConfig {
    /// Maximum tokens held
    pub capacity: f64,
    /// Tokens added per elapsed interval
    pub refill_amount: f64,
    pub interval: Duration,
    pub queue_timeout: Duration,
}

impl BucketConfig {
    /// `capacity` tokens per minute, refilled in one-second steps of
    /// `capacity / 60`
    pub fn per_minute(capacity: u32) -> Self {
        let capacity = f64::from(capacity.max(1));
        Self {
            capacity,
            refill_amount: capacity / 60.0,
            interval: DEFAULT_REFILL_INTERVAL,
            queue_timeout: DEFAULT_QUEUE_TIMEOUT,
        }
    }

    pub fn with_queue_timeout(mut self, queue_timeout: Duration) -> Self {
        self.queue_timeout = queue_timeout;
        self
    }
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self::per_minute(DEFAULT_CAPACITY)
    }
}

/// Point-in-time bucket state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketSnapshot {
    pub tokens: f64,
    pub capacity: f64,
    /// Callers waiting for tokens
    pub queued: usize,
}

/// A queued acquire gave up waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueTimeout {
    pub waited: Duration,
}

/// Point-in-time limiter state for one provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateLimitSnapshot {
    pub provider: String,
    pub bucket: BucketSnapshot,
    pub active: u32,
    pub max_concurrent: Option<u32>,
    /// Requests are charged estimated tokens rather than one each
    pub token_based: bool,
}
