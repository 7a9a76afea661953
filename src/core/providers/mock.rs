//! In-process provider
//!
//! Deterministic adapter used by the `mock` provider kind, tests and benches.
//! Responses, failures, latency and availability are all configurable and can
//! be changed while the provider is registered.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use super::adapter::{ProviderAdapter, StreamSink};
use super::capabilities::{Capability, ProviderCapabilities};
use crate::core::types::{
    ChatMessage, CompletionOptions, CompletionResponse, EmbeddingResponse, StreamChunk,
    TokenUsage, format_chat_prompt,
};
use crate::utils::error::{OrchestratorError, Result};

const EMBEDDING_DIMENSIONS: usize = 8;

#[derive(Debug, Default)]
struct MockBehavior {
    /// Fixed reply; `None` echoes the prompt
    reply: Option<String>,
    /// Returned on every call when set
    failure: Option<OrchestratorError>,
    /// Returned once each, before `failure`/success
    queued_failures: VecDeque<OrchestratorError>,
    delay: Duration,
}

/// Configurable in-process adapter
#[derive(Debug)]
pub struct MockProvider {
    id: String,
    model: String,
    capabilities: ProviderCapabilities,
    available: AtomicBool,
    behavior: RwLock<MockBehavior>,
    calls: AtomicU32,
    prompts: RwLock<Vec<String>>,
}

impl MockProvider {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            model: "mock-model".to_string(),
            capabilities: ProviderCapabilities::completion_only().with(Capability::Chat),
            available: AtomicBool::new(true),
            behavior: RwLock::new(MockBehavior::default()),
            calls: AtomicU32::new(0),
            prompts: RwLock::new(Vec::new()),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_response(self, reply: impl Into<String>) -> Self {
        self.behavior.write().reply = Some(reply.into());
        self
    }

    pub fn with_failure(self, error: OrchestratorError) -> Self {
        self.set_failure(Some(error));
        self
    }

    /// Fail every call with an HTTP status
    pub fn failing_with_status(self, status: u16) -> Self {
        let error = OrchestratorError::http(self.id.clone(), status, "mock failure");
        self.with_failure(error)
    }

    /// Fail the next call with `error`, then behave normally
    pub fn fail_once(self, error: OrchestratorError) -> Self {
        self.behavior.write().queued_failures.push_back(error);
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        self.behavior.write().delay = delay;
        self
    }

    pub fn with_capabilities(mut self, capabilities: ProviderCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn unavailable(self) -> Self {
        self.set_available(false);
        self
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_failure(&self, failure: Option<OrchestratorError>) {
        self.behavior.write().failure = failure;
    }

    /// Number of dispatches across all operations
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.read().clone()
    }

    async fn respond(&self, prompt: &str) -> Result<CompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.write().push(prompt.to_string());

        let (delay, outcome) = {
            let mut behavior = self.behavior.write();
            let outcome = match behavior.queued_failures.pop_front() {
                Some(error) => Err(error),
                None => match &behavior.failure {
                    Some(error) => Err(error.clone()),
                    None => Ok(behavior
                        .reply
                        .clone()
                        .unwrap_or_else(|| format!("{}: {}", self.id, prompt))),
                },
            };
            (behavior.delay, outcome)
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let content = outcome?;
        let usage = TokenUsage::new(
            prompt.chars().count().div_ceil(4) as u32,
            content.chars().count().div_ceil(4) as u32,
        );
        Ok(CompletionResponse::new(self.id.clone(), content)
            .with_model(self.model.clone())
            .with_usage(usage))
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn capabilities(&self) -> ProviderCapabilities {
        self.capabilities
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn complete(
        &self,
        prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<CompletionResponse> {
        self.respond(prompt).await
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        _options: &CompletionOptions,
    ) -> Result<CompletionResponse> {
        self.respond(&format_chat_prompt(messages)).await
    }

    async fn stream(
        &self,
        prompt: &str,
        sink: &mut dyn StreamSink,
        _options: &CompletionOptions,
    ) -> Result<CompletionResponse> {
        let response = self.respond(prompt).await?;
        let words: Vec<&str> = response.content.split_inclusive(' ').collect();
        let last = words.len().saturating_sub(1);
        for (index, word) in words.iter().enumerate() {
            sink.on_chunk(StreamChunk {
                content: (*word).to_string(),
                index,
                is_final: index == last,
            });
        }
        sink.on_complete(&response);
        Ok(response)
    }

    async fn embed(&self, text: &str, _options: &CompletionOptions) -> Result<EmbeddingResponse> {
        if !self.capabilities.embeddings {
            return Err(OrchestratorError::unsupported(
                self.id.clone(),
                Capability::Embeddings,
            ));
        }
        let response = self.respond(text).await?;

        // Stable pseudo-embedding derived from the input bytes
        let mut embedding = vec![0.0f32; EMBEDDING_DIMENSIONS];
        for (i, byte) in text.bytes().enumerate() {
            embedding[i % EMBEDDING_DIMENSIONS] += f32::from(byte) / 255.0;
        }

        Ok(EmbeddingResponse {
            embedding,
            provider: self.id.clone(),
            model: Some(self.model.clone()),
            usage: response.usage,
        })
    }

    async fn check_health(&self) -> bool {
        self.is_available()
    }
}
