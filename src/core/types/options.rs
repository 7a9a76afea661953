//! Per-call request options

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Output format hint forwarded to providers that support a JSON mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Text,
    Json,
}

/// Options accepted by every public orchestrator operation.
///
/// All fields are optional. `provider`, `use_cache` and `timeout_ms` steer the
/// orchestrator itself, the rest are forwarded to the adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionOptions {
    /// Pin the primary provider
    pub provider: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub system_prompt: Option<String>,
    pub format: Option<ResponseFormat>,
    /// Set to `false` to bypass the response cache for this call
    pub use_cache: Option<bool>,
    /// Per-call dispatch timeout, overriding the configured default
    pub timeout_ms: Option<u64>,
}

impl CompletionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_format(mut self, format: ResponseFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.use_cache = Some(false);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn cache_enabled(&self) -> bool {
        self.use_cache.unwrap_or(true)
    }

    /// Rough token estimate for admission control: prompt chars / 4 plus the
    /// completion allowance.
    pub fn estimate_tokens(&self, prompt: &str) -> u32 {
        let prompt_chars = prompt.chars().count()
            + self
                .system_prompt
                .as_deref()
                .map_or(0, |s| s.chars().count());
        let prompt_tokens = prompt_chars.div_ceil(4) as u32;
        prompt_tokens.saturating_add(self.max_tokens.unwrap_or(0)).max(1)
    }
}
