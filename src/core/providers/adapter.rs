//! Provider adapter interface
//!
//! Every backend implements [`ProviderAdapter`]. Only `complete` is required.
//! `chat` and `stream` have defaults built on `complete`; `embed` has none.
//! Adapters never fall back across providers, that belongs to the router.

use async_trait::async_trait;
use std::fmt::Debug;

use super::capabilities::{Capability, ProviderCapabilities};
use crate::core::types::{
    ChatMessage, CompletionOptions, CompletionResponse, EmbeddingResponse, StreamChunk,
    format_chat_prompt,
};
use crate::utils::error::{OrchestratorError, Result};

/// Receiver for streamed chunks
pub trait StreamSink: Send {
    fn on_chunk(&mut self, chunk: StreamChunk);

    /// Called once after the last chunk
    fn on_complete(&mut self, _response: &CompletionResponse) {}
}

impl<F> StreamSink for F
where
    F: FnMut(StreamChunk) + Send,
{
    fn on_chunk(&mut self, chunk: StreamChunk) {
        self(chunk)
    }
}

/// Uniform surface over heterogeneous LLM backends
#[async_trait]
pub trait ProviderAdapter: Send + Sync + Debug {
    /// Unique provider id, the registry key
    fn id(&self) -> &str;

    fn capabilities(&self) -> ProviderCapabilities;

    fn supports(&self, capability: Capability) -> bool {
        self.capabilities().supports(capability)
    }

    /// Outcome of the last health check
    fn is_available(&self) -> bool;

    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<CompletionResponse>;

    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse> {
        chat_via_complete(self, messages, options).await
    }

    /// Deliver the response through `sink` and return the aggregated result
    async fn stream(
        &self,
        prompt: &str,
        sink: &mut dyn StreamSink,
        options: &CompletionOptions,
    ) -> Result<CompletionResponse> {
        stream_via_complete(self, prompt, sink, options).await
    }

    async fn embed(&self, _text: &str, _options: &CompletionOptions) -> Result<EmbeddingResponse> {
        Err(OrchestratorError::unsupported(
            self.id(),
            Capability::Embeddings,
        ))
    }

    /// Check the backend and refresh the availability flag
    async fn check_health(&self) -> bool {
        self.is_available()
    }
}

/// Chat for adapters without native chat: flatten the conversation and call
/// `complete`.
pub async fn chat_via_complete<A>(
    adapter: &A,
    messages: &[ChatMessage],
    options: &CompletionOptions,
) -> Result<CompletionResponse>
where
    A: ProviderAdapter + ?Sized,
{
    adapter.complete(&format_chat_prompt(messages), options).await
}

/// Streaming for adapters without native streaming: one `complete` call
/// delivered as a single final chunk.
pub async fn stream_via_complete<A>(
    adapter: &A,
    prompt: &str,
    sink: &mut dyn StreamSink,
    options: &CompletionOptions,
) -> Result<CompletionResponse>
where
    A: ProviderAdapter + ?Sized,
{
    let response = adapter.complete(prompt, options).await?;
    sink.on_chunk(StreamChunk {
        content: response.content.clone(),
        index: 0,
        is_final: true,
    });
    sink.on_complete(&response);
    Ok(response)
}
