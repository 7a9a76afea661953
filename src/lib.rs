//! # llm-orchestrator
//!
//! A resilience layer in front of several LLM providers. One entry point
//! routes each request to a provider, holds it to per-provider and global
//! rate limits, caches completions, tracks provider health and falls back
//! to other providers when a completion fails.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use llm_orchestrator::{CompletionOptions, MockProvider, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orchestrator = Orchestrator::builder()
//!         .provider(Arc::new(MockProvider::new("primary").failing_with_status(503)), 1)
//!         .provider(Arc::new(MockProvider::new("backup").with_response("hello")), 2)
//!         .build()?;
//!
//!     let response = orchestrator
//!         .complete("Say hello", &CompletionOptions::new())
//!         .await?;
//!     assert_eq!(response.provider, "backup");
//!
//!     orchestrator.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! ## From configuration
//!
//! ```rust,no_run
//! use llm_orchestrator::{Config, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config/orchestrator.yaml").await?;
//!     let orchestrator = Orchestrator::from_config(config.orchestrator())?;
//!     println!("{}", serde_json::to_string_pretty(&orchestrator.get_status())?);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod core;
pub mod utils;

pub use config::{Config, FallbackStrategy, OrchestratorConfig};
pub use utils::error::{OrchestratorError, Result};

pub use core::cache_manager::{CacheKey, CacheStats, ResponseCache};
pub use core::events::{EventBus, OrchestratorEvent};
pub use core::metrics::{MetricSample, MetricsRegistry, MetricsSummary, ProviderStats};
pub use core::providers::{
    Capability, MockProvider, OpenAICompatibleProvider, ProviderAdapter, ProviderCapabilities,
    ProviderRegistry, StreamSink,
};
pub use core::rate_limiter::{RateLimiter, TokenBucket};
pub use core::router::{Orchestrator, OrchestratorBuilder, OrchestratorStatus, ProviderStatus};
pub use core::types::{
    ChatMessage, CompletionOptions, CompletionResponse, EmbeddingResponse, MessageRole,
    ResponseFormat, StreamChunk, TokenUsage,
};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Description of the crate
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Build metadata captured by the build script
#[derive(Debug, Clone, serde::Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    /// Unix seconds
    pub build_time: &'static str,
    pub git_hash: &'static str,
    pub rust_version: &'static str,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            version: VERSION,
            build_time: option_env!("BUILD_TIME").unwrap_or("unknown"),
            git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
            rust_version: option_env!("RUST_VERSION").unwrap_or("unknown"),
        }
    }
}

pub fn build_info() -> BuildInfo {
    BuildInfo::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_info() {
        let info = build_info();
        assert_eq!(info.version, VERSION);
        assert!(!info.git_hash.is_empty());
        assert!(!info.rust_version.is_empty());
    }

    #[test]
    fn test_constants() {
        assert_eq!(NAME, "llm-orchestrator");
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
        assert!(!DESCRIPTION.is_empty());
    }
}
