//! Common test utilities for llm-orchestrator

pub mod fixtures;

use llm_orchestrator::config::{ProviderConfig, ProviderKind};
use wiremock::MockServer;

/// OpenAI-compatible provider config pointed at `server`
pub fn http_provider(id: &str, server: &MockServer) -> ProviderConfig {
    let mut config = ProviderConfig::new(id);
    config.kind = ProviderKind::OpenAICompatible;
    config.endpoint = Some(format!("{}/v1", server.uri()));
    config.api_key = Some("sk-test".to_string());
    config.model = Some("test-model".to_string());
    config
}
