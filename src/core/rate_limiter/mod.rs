//! Rate Limiting Implementation
//!
//! Token buckets with FIFO wait queues per provider, an optional global
//! bucket, and per-provider concurrency caps.

mod bucket;
mod limiter;
mod types;


pub use bucket::TokenBucket;
pub use limiter::{RateLimitPermit, RateLimiter};
pub use types::{
    BucketConfig, BucketSnapshot, DEFAULT_CAPACITY, DEFAULT_QUEUE_TIMEOUT,
    DEFAULT_REFILL_INTERVAL, QueueTimeout, RateLimitSnapshot,
};
