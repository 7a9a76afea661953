//! Response types returned by providers and the orchestrator

use serde::{Deserialize, Serialize};

/// Token accounting reported by a provider (or estimated)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt token count
    pub prompt_tokens: u32,
    /// Completion token count
    pub completion_tokens: u32,
    /// Total token count
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Completion result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    /// Provider that produced the response
    pub provider: String,
    pub model: Option<String>,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
    /// True when served from the response cache
    #[serde(default)]
    pub cached: bool,
    /// Provider-side latency in milliseconds, as measured by the orchestrator
    #[serde(default)]
    pub latency_ms: u64,
}

impl CompletionResponse {
    pub fn new(provider: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            provider: provider.into(),
            model: None,
            usage: None,
            finish_reason: None,
            cached: false,
            latency_ms: 0,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Embedding result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    pub embedding: Vec<f32>,
    pub provider: String,
    pub model: Option<String>,
    pub usage: Option<TokenUsage>,
}

/// Incremental piece of a streamed completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamChunk {
    pub content: String,
    /// Position of the chunk within the stream
    pub index: usize,
    pub is_final: bool,
}
