//! Retry mechanism with exponential backoff

use super::types::RetryConfig;
use crate::utils::error::Result;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retries retryable [`OrchestratorError`]s with exponential backoff.
///
/// Non-retryable errors (4xx, capability, configuration) are returned on the
/// first occurrence.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Execute `f` until it succeeds, fails permanently, or attempts run out
    pub async fn call<F, Fut, R>(&self, mut f: F) -> Result<R>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match f().await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!("Retry succeeded on attempt {}", attempt);
                    }
                    return Ok(result);
                }
                Err(error) if !error.is_retryable() => return Err(error),
                Err(error) => {
                    if attempt >= self.config.max_attempts {
                        warn!("Giving up after {} attempts: {}", attempt, error);
                        return Err(error);
                    }

                    let delay = self.jittered(self.config.delay_for(attempt));
                    debug!(
                        "Attempt {} failed: {}, retrying in {:?}",
                        attempt, error, delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if !self.config.jitter {
            return delay;
        }
        let jitter_factor = 0.1;
        let jitter = delay.as_millis() as f64 * jitter_factor * (rand::random::<f64>() - 0.5);
        Duration::from_millis((delay.as_millis() as f64 + jitter).max(0.0) as u64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

