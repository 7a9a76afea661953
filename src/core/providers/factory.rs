//! Adapter construction from configuration

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::adapter::ProviderAdapter;
use super::mock::MockProvider;
use super::openai_compatible::OpenAICompatibleProvider;
use super::registry::ProviderRegistry;
use crate::config::models::{OrchestratorConfig, ProviderConfig, ProviderKind};
use crate::utils::error::Result;

/// Build one adapter. Returns `None` for disabled providers.
pub fn create_adapter(
    config: &ProviderConfig,
    retry_attempts: u32,
) -> Result<Option<Arc<dyn ProviderAdapter>>> {
    if !config.enabled {
        debug!(provider = %config.id, "skipping disabled provider");
        return Ok(None);
    }

    let adapter: Arc<dyn ProviderAdapter> = match config.kind {
        ProviderKind::OpenAICompatible => {
            Arc::new(OpenAICompatibleProvider::new(config, retry_attempts)?)
        }
        ProviderKind::Mock => Arc::new(build_mock(config)),
    };
    Ok(Some(adapter))
}

fn build_mock(config: &ProviderConfig) -> MockProvider {
    let mut provider = MockProvider::new(config.id.clone());
    if let Some(model) = &config.model {
        provider = provider.with_model(model.clone());
    }
    if let Some(capabilities) = &config.capabilities {
        provider = provider.with_capabilities(capabilities.iter().copied().collect());
    }
    if let Some(settings) = &config.mock {
        if let Some(reply) = &settings.response {
            provider = provider.with_response(reply.clone());
        }
        if settings.delay_ms > 0 {
            provider = provider.with_delay(Duration::from_millis(settings.delay_ms));
        }
        if let Some(status) = settings.fail_status {
            provider = provider.failing_with_status(status);
        }
    }
    provider
}

/// Build the registry for every enabled provider in the configuration
pub fn build_registry(config: &OrchestratorConfig) -> Result<ProviderRegistry> {
    let mut registry = ProviderRegistry::new();
    for provider in &config.providers {
        if let Some(adapter) = create_adapter(provider, config.retry_attempts)? {
            registry.register(adapter, provider.priority())?;
        }
    }
    info!(providers = ?registry.ids(), "provider registry built");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::models::MockSettings;
    use crate::core::providers::Capability;

    #[test]
    fn test_disabled_providers_are_not_registered() {
        let mut disabled = ProviderConfig::mock("off");
        disabled.enabled = false;
        let config = OrchestratorConfig {
            providers: vec![ProviderConfig::mock("on"), disabled],
            ..Default::default()
        };

        let registry = build_registry(&config).unwrap();
        assert_eq!(registry.ids(), vec!["on"]);
    }

    #[test]
    fn test_registry_orders_by_priority_then_position() {
        let mut late = ProviderConfig::mock("late");
        late.priority = Some(5);
        let mut first = ProviderConfig::mock("first");
        first.priority = Some(1);
        let mut tie = ProviderConfig::mock("tie");
        tie.priority = Some(5);

        let config = OrchestratorConfig {
            providers: vec![late, first, tie],
            ..Default::default()
        };
        let registry = build_registry(&config).unwrap();
        assert_eq!(registry.ids(), vec!["first", "late", "tie"]);
        assert_eq!(registry.priority("tie"), Some(5));
    }

    #[tokio::test]
    async fn test_mock_settings_applied() {
        let mut config = ProviderConfig::mock("canned");
        config.capabilities = Some(vec![Capability::Embeddings]);
        config.mock = Some(MockSettings {
            response: Some("fixed".into()),
            ..Default::default()
        });

        let adapter = create_adapter(&config, 1).unwrap().unwrap();
        assert!(adapter.supports(Capability::Embeddings));
        assert!(!adapter.supports(Capability::Chat));

        let response = adapter
            .complete("anything", &Default::default())
            .await
            .unwrap();
        assert_eq!(response.content, "fixed");
    }
}
