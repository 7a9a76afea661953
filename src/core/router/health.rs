//! Provider health probing

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::orchestrator::Orchestrator;
use crate::core::providers::ProviderAdapter;
use crate::utils::sys::Ticker;

async fn check_all(adapters: &[Arc<dyn ProviderAdapter>]) -> Vec<(String, bool)> {
    let results = join_all(adapters.iter().map(|adapter| adapter.check_health())).await;
    adapters
        .iter()
        .zip(results)
        .map(|(adapter, healthy)| {
            if !healthy {
                warn!(provider = adapter.id(), "provider failed health check");
            }
            (adapter.id().to_string(), healthy)
        })
        .collect()
}

impl Orchestrator {
    /// Check every provider concurrently. Adapters update their own
    /// availability, which selection and fallback read.
    pub async fn check_health(&self) -> Vec<(String, bool)> {
        let adapters: Vec<Arc<dyn ProviderAdapter>> = self.registry.iter().cloned().collect();
        check_all(&adapters).await
    }

    /// Check every `interval` until [`Orchestrator::shutdown`] or drop
    pub fn start_health_checks(&self, interval: Duration) {
        let mut ticker = self.health_ticker.lock();
        if ticker.is_some() {
            return;
        }

        let adapters: Arc<[Arc<dyn ProviderAdapter>]> = self.registry.iter().cloned().collect();
        *ticker = Ticker::spawn_async("health-check", interval, move || {
            let adapters = adapters.clone();
            async move {
                check_all(&adapters).await;
                true
            }
        });
        if ticker.is_some() {
            info!(interval_ms = interval.as_millis() as u64, "periodic health checks started");
        }
    }

    pub(super) fn stop_health_checks(&self) {
        if let Some(ticker) = self.health_ticker.lock().take() {
            ticker.stop();
        }
    }
}
