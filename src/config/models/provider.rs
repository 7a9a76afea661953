//! Provider configuration

use super::*;
use crate::core::providers::Capability;
use serde::{Deserialize, Serialize};

/// Which adapter implementation backs a provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderKind {
    #[default]
    #[serde(rename = "openai_compatible", alias = "openai")]
    OpenAICompatible,
    #[serde(rename = "mock")]
    Mock,
}

/// Behaviour of a `mock` provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockSettings {
    /// Fixed reply; the prompt is echoed when unset
    pub response: Option<String>,
    pub delay_ms: u64,
    /// Fail every call with this HTTP status
    pub fail_status: Option<u16>,
}

/// Configuration record for one backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Unique provider id
    pub id: String,
    #[serde(default)]
    pub kind: ProviderKind,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Base URL, e.g. `https://api.openai.com/v1`
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub embedding_model: Option<String>,
    /// Lower is tried first
    #[serde(default)]
    pub priority: Option<u32>,
    /// Overrides the adapter's advertised capabilities
    #[serde(default)]
    pub capabilities: Option<Vec<Capability>>,
    #[serde(default)]
    pub mock: Option<MockSettings>,
}

impl ProviderConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ProviderKind::default(),
            enabled: true,
            endpoint: None,
            api_key: None,
            api_key_env: None,
            model: None,
            embedding_model: None,
            priority: None,
            capabilities: None,
            mock: None,
        }
    }

    pub fn mock(id: impl Into<String>) -> Self {
        Self {
            kind: ProviderKind::Mock,
            ..Self::new(id)
        }
    }

    pub fn priority(&self) -> u32 {
        self.priority.unwrap_or_else(default_priority)
    }

    /// Inline key first, then the configured environment variable
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| {
                self.api_key_env
                    .as_deref()
                    .and_then(|var| std::env::var(var).ok())
            })
            .filter(|key| !key.trim().is_empty())
    }
}
