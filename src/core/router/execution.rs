//! One provider attempt: admission, bounded dispatch, release, metrics

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::orchestrator::Orchestrator;
use crate::core::providers::ProviderAdapter;
use crate::core::types::{CompletionOptions, CompletionResponse, EmbeddingResponse, TokenUsage};
use crate::utils::error::{OrchestratorError, Result};

/// Successful call results the metrics layer can read usage from
pub(super) trait CallOutcome {
    fn usage(&self) -> Option<TokenUsage>;

    fn set_latency(&mut self, _latency_ms: u64) {}
}

impl CallOutcome for CompletionResponse {
    fn usage(&self) -> Option<TokenUsage> {
        self.usage
    }

    fn set_latency(&mut self, latency_ms: u64) {
        self.latency_ms = latency_ms;
    }
}

impl CallOutcome for EmbeddingResponse {
    fn usage(&self) -> Option<TokenUsage> {
        self.usage
    }
}

impl Orchestrator {
    /// Per-call timeout: the caller's override, else the configured default
    pub(super) fn call_timeout(&self, options: &CompletionOptions) -> Duration {
        options
            .timeout_ms
            .map_or(self.timeout, Duration::from_millis)
    }

    /// Run `call` against `adapter` under its rate limits and the timeout.
    ///
    /// `call` is not polled until admission succeeds. Every outcome,
    /// including a rejected admission, records exactly one metric sample;
    /// a rejection records zero latency.
    /// The concurrency slot is released on every path.
    pub(super) async fn attempt<T, Fut>(
        &self,
        adapter: &Arc<dyn ProviderAdapter>,
        estimated_tokens: u32,
        timeout: Duration,
        call: Fut,
    ) -> Result<T>
    where
        T: CallOutcome,
        Fut: Future<Output = Result<T>>,
    {
        let provider = adapter.id();

        let permit = match self.limiter.acquire(provider, estimated_tokens).await {
            Ok(permit) => permit,
            Err(err) => {
                // Queue wait is not provider latency
                self.metrics
                    .record_completion(provider, Duration::ZERO, None, Some(&err));
                return Err(err);
            }
        };

        let started = Instant::now();
        let result = match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(OrchestratorError::timeout(
                provider,
                timeout.as_millis() as u64,
            )),
        };
        permit.release();
        let latency = started.elapsed();

        match result {
            Ok(mut outcome) => {
                debug!(provider, latency_ms = latency.as_millis() as u64, "provider call succeeded");
                outcome.set_latency(latency.as_millis() as u64);
                self.metrics
                    .record_completion(provider, latency, outcome.usage(), None);
                Ok(outcome)
            }
            Err(err) => {
                warn!(provider, error = %err, "provider call failed");
                self.metrics
                    .record_completion(provider, latency, None, Some(&err));
                Err(err)
            }
        }
    }
}
