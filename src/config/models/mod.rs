//! Configuration data models
//!
//! Every struct deserializes from snake_case YAML and fills missing fields
//! from the `default_*` functions below.

pub mod cache;
pub mod logging;
pub mod orchestrator;
pub mod provider;
pub mod rate_limit;

pub use cache::*;
pub use logging::*;
pub use orchestrator::*;
pub use provider::*;
pub use rate_limit::*;

/// Per-call dispatch timeout
pub fn default_timeout_ms() -> u64 {
    60_000
}

/// Call-boundary attempts for transient HTTP failures
pub fn default_retry_attempts() -> u32 {
    3
}

pub fn default_true() -> bool {
    true
}

pub fn default_priority() -> u32 {
    crate::core::providers::DEFAULT_PRIORITY
}

pub fn default_cache_ttl_ms() -> u64 {
    5 * 60 * 1000
}

pub fn default_cache_max_size_bytes() -> usize {
    50 * 1024 * 1024
}

pub fn default_cache_sweep_interval_ms() -> u64 {
    60_000
}

pub fn default_history_size() -> usize {
    1000
}

pub fn default_log_level() -> String {
    "info".to_string()
}
