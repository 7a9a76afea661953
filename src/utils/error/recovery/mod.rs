//! Call-boundary recovery
//!
//! Transient failures (network, timeout, 5xx) are retried here with capped
//! exponential backoff before the error reaches the orchestrator.

mod retry;
mod types;

pub use retry::RetryPolicy;
pub use types::RetryConfig;
