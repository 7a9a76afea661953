//! Public request operations

use tracing::{debug, instrument};
use uuid::Uuid;

use super::orchestrator::Orchestrator;
use crate::core::cache_manager::CacheKey;
use crate::core::providers::{Capability, StreamSink, chat_via_complete, stream_via_complete};
use crate::core::types::{
    ChatMessage, CompletionOptions, CompletionResponse, EmbeddingResponse, format_chat_prompt,
};
use crate::utils::error::{OrchestratorError, Result};

impl Orchestrator {
    /// Complete `prompt`, falling back across providers on failure.
    ///
    /// Cache hits return without touching the rate limiter or any adapter.
    #[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
    pub async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<CompletionResponse> {
        let cache_key = (self.enable_cache && options.cache_enabled())
            .then(|| CacheKey::new(prompt, options));
        if let Some(key) = &cache_key {
            if let Some(hit) = self.cache.get(key) {
                debug!(provider = %hit.provider, "served from cache");
                return Ok(hit);
            }
        }

        let primary = self.select_primary(options)?;
        let estimated_tokens = options.estimate_tokens(prompt);
        let timeout = self.call_timeout(options);

        let response = match self
            .attempt(
                &primary,
                estimated_tokens,
                timeout,
                primary.complete(prompt, options),
            )
            .await
        {
            Ok(response) => response,
            Err(err) => {
                self.complete_with_fallback(primary.id(), err, prompt, options)
                    .await?
            }
        };

        if let Some(key) = cache_key {
            self.cache.set(key, response.clone());
        }
        Ok(response)
    }

    /// Chat with the selected provider. Providers without native chat get
    /// the conversation flattened into one prompt. No fallback.
    #[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse> {
        let adapter = self.select_primary(options)?;
        let estimated_tokens = options.estimate_tokens(&format_chat_prompt(messages));

        let call = async {
            if adapter.supports(Capability::Chat) {
                adapter.chat(messages, options).await
            } else {
                chat_via_complete(adapter.as_ref(), messages, options).await
            }
        };
        self.attempt(&adapter, estimated_tokens, self.call_timeout(options), call)
            .await
    }

    /// Embed `text` with the selected provider, which must advertise
    /// embeddings. No fallback.
    #[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
    pub async fn embed(&self, text: &str, options: &CompletionOptions) -> Result<EmbeddingResponse> {
        let adapter = self.select_primary(options)?;
        if !adapter.supports(Capability::Embeddings) {
            return Err(OrchestratorError::unsupported(
                adapter.id(),
                Capability::Embeddings,
            ));
        }

        self.attempt(
            &adapter,
            options.estimate_tokens(text),
            self.call_timeout(options),
            adapter.embed(text, options),
        )
        .await
    }

    /// Stream a completion into `sink` from the selected provider. Providers
    /// without streaming deliver the whole response as one final chunk.
    /// No fallback.
    #[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
    pub async fn stream(
        &self,
        prompt: &str,
        sink: &mut dyn StreamSink,
        options: &CompletionOptions,
    ) -> Result<CompletionResponse> {
        let adapter = self.select_primary(options)?;
        let estimated_tokens = options.estimate_tokens(prompt);

        let call = async {
            if adapter.supports(Capability::Streaming) {
                adapter.stream(prompt, sink, options).await
            } else {
                stream_via_complete(adapter.as_ref(), prompt, sink, options).await
            }
        };
        self.attempt(&adapter, estimated_tokens, self.call_timeout(options), call)
            .await
    }
}
