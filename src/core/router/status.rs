//! Status and inspection

use serde::Serialize;

use super::orchestrator::Orchestrator;
use crate::config::models::FallbackStrategy;
use crate::core::cache_manager::CacheStats;
use crate::core::metrics::{MetricsSummary, ProviderStats};
use crate::core::providers::ProviderCapabilities;
use crate::core::rate_limiter::RateLimitSnapshot;

#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub id: String,
    pub priority: u32,
    pub available: bool,
    pub capabilities: ProviderCapabilities,
    /// `None` until the provider has been called
    pub stats: Option<ProviderStats>,
    pub rate_limit: Option<RateLimitSnapshot>,
}

/// Point-in-time view of the orchestrator
#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorStatus {
    pub providers: Vec<ProviderStatus>,
    pub default_provider: Option<String>,
    pub fallback_strategy: FallbackStrategy,
    pub cache_enabled: bool,
    pub cache_stats: CacheStats,
    pub total_requests: u64,
    pub metrics: MetricsSummary,
}

impl Orchestrator {
    pub fn get_status(&self) -> OrchestratorStatus {
        let providers = self
            .registry
            .descriptors()
            .into_iter()
            .map(|descriptor| ProviderStatus {
                stats: self.metrics.provider_stats(&descriptor.id),
                rate_limit: self.limiter.snapshot(&descriptor.id),
                id: descriptor.id,
                priority: descriptor.priority,
                available: descriptor.available,
                capabilities: descriptor.capabilities,
            })
            .collect();

        let metrics = self.metrics.summary();
        OrchestratorStatus {
            providers,
            default_provider: self.default_provider.clone(),
            fallback_strategy: self.strategy,
            cache_enabled: self.enable_cache,
            cache_stats: self.cache.stats(),
            total_requests: metrics.total_requests,
            metrics,
        }
    }
}
