//! Primary provider selection

use std::sync::Arc;
use tracing::debug;

use super::orchestrator::Orchestrator;
use crate::config::models::FallbackStrategy;
use crate::core::providers::ProviderAdapter;
use crate::core::types::CompletionOptions;
use crate::utils::error::{OrchestratorError, Result};

impl Orchestrator {
    /// Pick the provider for the first attempt.
    ///
    /// Precedence: the caller's provider, the best-ranked provider under
    /// `loadbalance` (once any has samples), the default provider, then the
    /// first available provider by priority. Unknown or unavailable choices
    /// fall through to the next rule.
    pub(super) fn select_primary(&self, options: &CompletionOptions) -> Result<Arc<dyn ProviderAdapter>> {
        if let Some(requested) = options.provider.as_deref() {
            match self.registry.get(requested) {
                Some(adapter) if adapter.is_available() => return Ok(adapter.clone()),
                Some(_) => debug!(provider = requested, "requested provider unavailable"),
                None => debug!(provider = requested, "requested provider not registered"),
            }
        }

        let eligible = self.registry.eligible(&[]);

        if self.strategy == FallbackStrategy::Loadbalance {
            let top = self
                .metrics
                .top_provider(eligible.iter().map(|adapter| adapter.id()));
            if let Some(adapter) = top.and_then(|id| eligible.iter().find(|a| a.id() == id)) {
                debug!(provider = adapter.id(), "selected top-ranked provider");
                return Ok(adapter.clone());
            }
        }

        if let Some(default) = self.default_provider.as_deref() {
            if let Some(adapter) = eligible.iter().find(|a| a.id() == default) {
                return Ok(adapter.clone());
            }
            debug!(provider = default, "default provider unavailable");
        }

        eligible.into_iter().next().ok_or_else(|| {
            OrchestratorError::unavailable(
                self.default_provider.as_deref().unwrap_or("none"),
                "no available provider",
            )
        })
    }
}
