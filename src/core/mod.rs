//! Core orchestration components
//!
//! - **providers**: the adapter contract, registry and bundled adapters
//! - **rate_limiter**: token buckets with per-provider concurrency caps
//! - **cache_manager**: TTL + size-bounded response cache
//! - **metrics**: per-provider outcome history and rankings
//! - **router**: the [`Orchestrator`](router::Orchestrator) facade

pub mod cache_manager;
pub mod events;
pub mod metrics;
pub mod providers;
pub mod rate_limiter;
pub mod router;
pub mod types;
