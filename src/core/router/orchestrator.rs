//! Orchestrator state and lifecycle

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::builder::OrchestratorBuilder;
use crate::config::models::{FallbackStrategy, OrchestratorConfig};
use crate::config::validation::Validate;
use crate::core::cache_manager::ResponseCache;
use crate::core::events::{EventBus, OrchestratorEvent};
use crate::core::metrics::MetricsRegistry;
use crate::core::providers::{ProviderAdapter, ProviderRegistry, build_registry};
use crate::core::rate_limiter::RateLimiter;
use crate::utils::error::{OrchestratorError, Result};
use crate::utils::sys::Ticker;

/// Resilience layer over a set of provider adapters.
///
/// `complete` cascades across providers on failure. `chat`, `embed` and
/// `stream` use the single selected provider and surface its error.
pub struct Orchestrator {
    pub(super) registry: ProviderRegistry,
    pub(super) default_provider: Option<String>,
    pub(super) strategy: FallbackStrategy,
    pub(super) enable_cache: bool,
    pub(super) timeout: Duration,
    pub(super) cache: ResponseCache,
    pub(super) limiter: RateLimiter,
    pub(super) metrics: MetricsRegistry,
    pub(super) events: EventBus,
    pub(super) health_ticker: Mutex<Option<Ticker>>,
}

impl Orchestrator {
    /// Validate `config` and build an adapter for every enabled provider
    pub fn from_config(config: &OrchestratorConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| OrchestratorError::Config(format!("Orchestrator config error: {}", e)))?;

        let registry = build_registry(config)?;
        OrchestratorBuilder::from_config(config.clone())
            .with_registry(registry)
            .build()
    }

    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    pub fn has_provider(&self, id: &str) -> bool {
        self.registry.contains(id)
    }

    pub fn provider(&self, id: &str) -> Option<&Arc<dyn ProviderAdapter>> {
        self.registry.get(id)
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn default_provider(&self) -> Option<&str> {
        self.default_provider.as_deref()
    }

    pub fn fallback_strategy(&self) -> FallbackStrategy {
        self.strategy
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<OrchestratorEvent> {
        self.events.subscribe()
    }

    /// Stop every background ticker: bucket refill, cache sweep and health
    /// probing. In-flight and later calls keep working with lazy maintenance.
    pub fn shutdown(&self) {
        info!("Shutting down orchestrator");
        self.stop_health_checks();
        self.limiter.shutdown();
        self.cache.shutdown();
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("providers", &self.registry.ids())
            .field("default_provider", &self.default_provider)
            .field("strategy", &self.strategy)
            .field("enable_cache", &self.enable_cache)
            .field("timeout", &self.timeout)
            .finish()
    }
}
