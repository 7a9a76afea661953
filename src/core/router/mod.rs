//! Provider orchestration
//!
//! Request lifecycle: cache check, provider selection, rate-limit admission,
//! dispatch bounded by a timeout, then cache store and metrics on success or
//! metrics and fallback on failure.

mod builder;
mod execution;
mod fallback;
mod health;
mod operations;
mod orchestrator;
mod selection;
mod status;

#[cfg(test)]
mod tests;

pub use builder::OrchestratorBuilder;
pub use orchestrator::Orchestrator;
pub use status::{OrchestratorStatus, ProviderStatus};
