//! Programmatic orchestrator construction

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::orchestrator::Orchestrator;
use crate::config::models::{CacheConfig, FallbackStrategy, OrchestratorConfig, RateLimitConfig};
use crate::core::cache_manager::ResponseCache;
use crate::core::events::EventBus;
use crate::core::metrics::MetricsRegistry;
use crate::core::providers::{ProviderAdapter, ProviderRegistry};
use crate::core::rate_limiter::RateLimiter;
use crate::utils::error::{OrchestratorError, Result};

/// Builder for [`Orchestrator`] with injected adapters.
///
/// Settings come from an [`OrchestratorConfig`]; its `providers` list is
/// ignored in favor of adapters registered through [`provider`].
///
/// [`provider`]: OrchestratorBuilder::provider
pub struct OrchestratorBuilder {
    config: OrchestratorConfig,
    registry: ProviderRegistry,
    errors: Vec<OrchestratorError>,
    events: EventBus,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self::from_config(OrchestratorConfig::default())
    }

    pub fn from_config(config: OrchestratorConfig) -> Self {
        Self {
            config,
            registry: ProviderRegistry::new(),
            errors: Vec::new(),
            events: EventBus::default(),
        }
    }

    pub(super) fn with_registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Register an adapter. Lower priority values are tried first.
    pub fn provider(mut self, adapter: Arc<dyn ProviderAdapter>, priority: u32) -> Self {
        if let Err(e) = self.registry.register(adapter, priority) {
            self.errors.push(e);
        }
        self
    }

    pub fn default_provider(mut self, id: impl Into<String>) -> Self {
        self.config.default_provider = Some(id.into());
        self
    }

    pub fn fallback_strategy(mut self, strategy: FallbackStrategy) -> Self {
        self.config.fallback_strategy = strategy;
        self
    }

    pub fn enable_cache(mut self, enabled: bool) -> Self {
        self.config.enable_cache = enabled;
        self
    }

    pub fn cache_config(mut self, cache: CacheConfig) -> Self {
        self.config.cache = cache;
        self
    }

    pub fn rate_limit(mut self, provider: impl Into<String>, limit: RateLimitConfig) -> Self {
        self.config.rate_limits.insert(provider.into(), limit);
        self
    }

    pub fn global_rate_limit(mut self, limit: RateLimitConfig) -> Self {
        self.config.global_rate_limit = Some(limit);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn history_size(mut self, history_size: usize) -> Self {
        self.config.metrics.history_size = history_size;
        self
    }

    pub fn health_check_interval(mut self, interval: Duration) -> Self {
        self.config.health_check_interval_ms = Some(interval.as_millis() as u64);
        self
    }

    /// Share an existing event bus instead of creating one
    pub fn events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn build(mut self) -> Result<Orchestrator> {
        if let Some(error) = self.errors.drain(..).next() {
            return Err(error);
        }
        if self.registry.is_empty() {
            return Err(OrchestratorError::Config(
                "at least one provider must be registered".to_string(),
            ));
        }

        let default_provider = match self.config.default_provider.take() {
            Some(id) if !self.registry.contains(&id) => {
                return Err(OrchestratorError::Config(format!(
                    "default provider '{}' is not registered",
                    id
                )));
            }
            Some(id) => Some(id),
            None => self.registry.ids().into_iter().next(),
        };

        let config = self.config;
        let events = self.events;
        let limiter = RateLimiter::new(config.rate_limits.clone(), config.global_rate_limit.clone())
            .with_events(events.clone());
        let cache = ResponseCache::new(config.cache.clone(), events.clone());
        let metrics = MetricsRegistry::new(config.metrics.history_size).with_events(events.clone());

        info!(
            providers = ?self.registry.ids(),
            default_provider = default_provider.as_deref(),
            strategy = %config.fallback_strategy,
            cache = config.enable_cache,
            "orchestrator ready"
        );

        let orchestrator = Orchestrator {
            registry: self.registry,
            default_provider,
            strategy: config.fallback_strategy,
            enable_cache: config.enable_cache,
            timeout: config.timeout(),
            cache,
            limiter,
            metrics,
            events,
            health_ticker: Mutex::new(None),
        };

        if let Some(interval_ms) = config.health_check_interval_ms {
            orchestrator.start_health_checks(Duration::from_millis(interval_ms));
        }
        Ok(orchestrator)
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
