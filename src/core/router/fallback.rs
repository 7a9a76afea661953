//! Cascading fallback for `complete`

use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::{info, warn};

use super::orchestrator::Orchestrator;
use crate::config::models::FallbackStrategy;
use crate::core::events::OrchestratorEvent;
use crate::core::providers::ProviderAdapter;
use crate::core::types::{CompletionOptions, CompletionResponse};
use crate::utils::error::{OrchestratorError, Result};

impl Orchestrator {
    /// Candidates after `failed`, by strategy: every available provider in
    /// priority order (`cascade`, `loadbalance`) or one picked at random
    /// (`random`).
    fn fallback_candidates(&self, failed: &str) -> Vec<Arc<dyn ProviderAdapter>> {
        let eligible = self.registry.eligible(&[failed]);
        match self.strategy {
            FallbackStrategy::Cascade | FallbackStrategy::Loadbalance => eligible,
            FallbackStrategy::Random => eligible
                .choose(&mut rand::thread_rng())
                .cloned()
                .into_iter()
                .collect(),
        }
    }

    /// Try the fallback candidates after `failed` until one succeeds
    pub(super) async fn complete_with_fallback(
        &self,
        failed: &str,
        error: OrchestratorError,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<CompletionResponse> {
        let candidates = self.fallback_candidates(failed);
        let estimated_tokens = options.estimate_tokens(prompt);
        let timeout = self.call_timeout(options);

        let mut attempted = vec![failed.to_string()];
        let mut last_error = error;

        for adapter in candidates {
            let from = attempted.last().cloned().unwrap_or_default();
            info!(from = %from, to = adapter.id(), strategy = %self.strategy, "falling back");
            self.events.emit(OrchestratorEvent::ProviderFallback {
                from,
                to: adapter.id().to_string(),
            });

            match self
                .attempt(
                    &adapter,
                    estimated_tokens,
                    timeout,
                    adapter.complete(prompt, options),
                )
                .await
            {
                Ok(response) => return Ok(response),
                Err(err) => {
                    attempted.push(adapter.id().to_string());
                    last_error = err;
                }
            }
        }

        warn!(attempted = ?attempted, error = %last_error, "all providers failed");
        Err(OrchestratorError::AllProvidersFailed {
            attempted,
            last_error: last_error.to_string(),
        })
    }
}
