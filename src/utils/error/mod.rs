//! Error handling utilities
//!
//! Defines the crate-wide [`OrchestratorError`] and the call-boundary retry
//! policy used by HTTP adapters.

mod types;
pub mod recovery;

pub use recovery::{RetryConfig, RetryPolicy};
pub use types::{OrchestratorError, RateLimitReason, Result};

#[cfg(test)]
mod tests;
