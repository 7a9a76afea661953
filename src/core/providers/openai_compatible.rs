//! OpenAI-compatible HTTP adapter
//!
//! Speaks the `/chat/completions`, `/embeddings` and `/models` endpoints shared
//! by OpenAI and the many servers that mirror its API. Transient failures are
//! retried here at the call boundary; everything else surfaces to the router.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use super::adapter::{ProviderAdapter, StreamSink};
use super::capabilities::{Capability, ProviderCapabilities};
use crate::config::models::provider::ProviderConfig;
use crate::core::types::{
    ChatMessage, CompletionOptions, CompletionResponse, EmbeddingResponse, MessageRole,
    ResponseFormat, StreamChunk, TokenUsage,
};
use crate::utils::error::{OrchestratorError, Result, RetryConfig, RetryPolicy};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Error bodies are cut to this many characters
const MAX_ERROR_BODY: usize = 512;

/// Adapter for OpenAI-compatible chat completion APIs
#[derive(Debug)]
pub struct OpenAICompatibleProvider {
    id: String,
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    embedding_model: Option<String>,
    capabilities: ProviderCapabilities,
    available: AtomicBool,
    retry: RetryPolicy,
}

impl OpenAICompatibleProvider {
    /// Build from a provider config record. `retry_attempts` bounds the
    /// call-boundary retries for transient errors.
    pub fn new(config: &ProviderConfig, retry_attempts: u32) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                OrchestratorError::Config(format!(
                    "failed to create HTTP client for '{}': {}",
                    config.id, e
                ))
            })?;

        let capabilities = match &config.capabilities {
            Some(list) => list.iter().copied().collect(),
            None => Self::default_capabilities(config.embedding_model.is_some()),
        };

        Ok(Self {
            id: config.id.clone(),
            client,
            base_url: config
                .endpoint
                .as_deref()
                .unwrap_or(DEFAULT_ENDPOINT)
                .trim_end_matches('/')
                .to_string(),
            api_key: config.resolved_api_key(),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            embedding_model: config.embedding_model.clone(),
            capabilities,
            available: AtomicBool::new(true),
            retry: RetryPolicy::new(RetryConfig::with_attempts(retry_attempts)),
        })
    }

    fn default_capabilities(embeddings: bool) -> ProviderCapabilities {
        let caps = ProviderCapabilities::completion_only()
            .with(Capability::Chat)
            .with(Capability::Streaming)
            .with(Capability::FunctionCalling)
            .with(Capability::JsonMode);
        if embeddings {
            caps.with(Capability::Embeddings)
        } else {
            caps
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    fn map_transport_error(&self, err: reqwest::Error) -> OrchestratorError {
        if err.is_timeout() {
            OrchestratorError::timeout(self.id.clone(), CONNECT_TIMEOUT.as_millis() as u64)
        } else {
            OrchestratorError::network(self.id.clone(), err.to_string())
        }
    }

    async fn check_status(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message: String = body.chars().take(MAX_ERROR_BODY).collect();
        Err(OrchestratorError::http(
            self.id.clone(),
            status.as_u16(),
            message,
        ))
    }

    /// POST with call-boundary retries and decode the JSON body
    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        let url = self.url(path);
        let url = url.as_str();

        self.retry
            .call(|| async move {
                let response = self
                    .authorize(self.client.post(url).json(body))
                    .send()
                    .await
                    .map_err(|e| self.map_transport_error(e))?;
                let response = self.check_status(response).await?;
                response.json::<T>().await.map_err(|e| {
                    OrchestratorError::invalid_response(self.id.clone(), e.to_string())
                })
            })
            .await
    }

    fn chat_body(&self, messages: &[ChatMessage], options: &CompletionOptions, stream: bool) -> Value {
        let mut wire_messages = Vec::with_capacity(messages.len() + 1);
        if let Some(system) = &options.system_prompt {
            wire_messages.push(json!({ "role": "system", "content": system }));
        }
        for message in messages {
            wire_messages.push(json!({ "role": message.role.to_string(), "content": message.content }));
        }

        let mut body = json!({
            "model": options.model.clone().unwrap_or_else(|| self.model.clone()),
            "messages": wire_messages,
            "stream": stream,
        });
        if let Value::Object(map) = &mut body {
            if let Some(temperature) = options.temperature {
                map.insert("temperature".into(), json!(temperature));
            }
            if let Some(max_tokens) = options.max_tokens {
                map.insert("max_tokens".into(), json!(max_tokens));
            }
            if let Some(top_p) = options.top_p {
                map.insert("top_p".into(), json!(top_p));
            }
            if let Some(top_k) = options.top_k {
                map.insert("top_k".into(), json!(top_k));
            }
            if options.format == Some(ResponseFormat::Json) {
                map.insert("response_format".into(), json!({ "type": "json_object" }));
            }
        }
        body
    }

    fn to_completion(&self, body: ChatCompletionBody) -> Result<CompletionResponse> {
        let choice = body.choices.into_iter().next().ok_or_else(|| {
            OrchestratorError::invalid_response(self.id.clone(), "response contained no choices")
        })?;

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            provider: self.id.clone(),
            model: body.model.or_else(|| Some(self.model.clone())),
            usage: body.usage.map(UsageBody::into_usage),
            finish_reason: choice.finish_reason,
            cached: false,
            latency_ms: 0,
        })
    }

    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse> {
        let body = self.chat_body(messages, options, false);
        let parsed: ChatCompletionBody = self.post_json("chat/completions", &body).await?;
        self.to_completion(parsed)
    }

    /// Open the SSE stream. Only the connection attempt is retried; once bytes
    /// have been delivered a failure surfaces as is.
    async fn open_stream(&self, body: &Value) -> Result<Response> {
        let url = self.url("chat/completions");
        let url = url.as_str();

        self.retry
            .call(|| async move {
                let response = self
                    .authorize(self.client.post(url).json(body))
                    .send()
                    .await
                    .map_err(|e| self.map_transport_error(e))?;
                self.check_status(response).await
            })
            .await
    }
}

#[async_trait]
impl ProviderAdapter for OpenAICompatibleProvider {
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
        options: &CompletionOptions,
    ) -> Result<CompletionResponse> {
        self.chat_completion(&[ChatMessage::new(MessageRole::User, prompt)], options)
            .await
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse> {
        self.chat_completion(messages, options).await
    }

    async fn stream(
        &self,
        prompt: &str,
        sink: &mut dyn StreamSink,
        options: &CompletionOptions,
    ) -> Result<CompletionResponse> {
        let body = self.chat_body(&[ChatMessage::user(prompt)], options, true);
        let response = self.open_stream(&body).await?;

        let mut bytes = response.bytes_stream();
        let mut parser = SseLineBuffer::default();
        let mut content = String::new();
        let mut finish_reason = None;
        let mut usage = None;
        let mut model = None;
        let mut pending: Option<String> = None;
        let mut index = 0;

        'outer: while let Some(next) = bytes.next().await {
            let data = next.map_err(|e| self.map_transport_error(e))?;
            let payloads = parser.push(&data).map_err(|e| {
                OrchestratorError::invalid_response(
                    self.id.clone(),
                    format!("invalid UTF-8 in stream: {}", e),
                )
            })?;
            for payload in payloads {
                if payload.trim() == "[DONE]" {
                    break 'outer;
                }
                let chunk: StreamChunkBody = serde_json::from_str(&payload).map_err(|e| {
                    OrchestratorError::invalid_response(self.id.clone(), e.to_string())
                })?;
                if model.is_none() {
                    model = chunk.model;
                }
                if let Some(u) = chunk.usage {
                    usage = Some(u.into_usage());
                }
                for choice in chunk.choices {
                    if choice.finish_reason.is_some() {
                        finish_reason = choice.finish_reason;
                    }
                    let Some(piece) = choice.delta.content.filter(|c| !c.is_empty()) else {
                        continue;
                    };
                    // Hold one piece back so the last delivered chunk can be marked final
                    if let Some(previous) = pending.replace(piece.clone()) {
                        sink.on_chunk(StreamChunk {
                            content: previous,
                            index,
                            is_final: false,
                        });
                        index += 1;
                    }
                    content.push_str(&piece);
                }
            }
        }

        if let Some(last) = pending {
            sink.on_chunk(StreamChunk {
                content: last,
                index,
                is_final: true,
            });
        }

        let response = CompletionResponse {
            content,
            provider: self.id.clone(),
            model: model.or_else(|| Some(self.model.clone())),
            usage,
            finish_reason,
            cached: false,
            latency_ms: 0,
        };
        sink.on_complete(&response);
        Ok(response)
    }

    async fn embed(&self, text: &str, options: &CompletionOptions) -> Result<EmbeddingResponse> {
        if !self.capabilities.embeddings {
            return Err(OrchestratorError::unsupported(
                self.id.clone(),
                Capability::Embeddings,
            ));
        }

        let model = options
            .model
            .clone()
            .or_else(|| self.embedding_model.clone())
            .unwrap_or_else(|| self.model.clone());
        let body = json!({ "model": model, "input": text });
        let parsed: EmbeddingBody = self.post_json("embeddings", &body).await?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| {
                OrchestratorError::invalid_response(self.id.clone(), "no embedding returned")
            })?;

        Ok(EmbeddingResponse {
            embedding,
            provider: self.id.clone(),
            model: parsed.model.or(Some(model)),
            usage: parsed.usage.map(UsageBody::into_usage),
        })
    }

    async fn check_health(&self) -> bool {
        let request = self.authorize(self.client.get(self.url("models")));
        let healthy = match request.send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(provider = %self.id, error = %e, "health check failed");
                false
            }
        };

        let was = self.available.swap(healthy, Ordering::SeqCst);
        if was != healthy {
            warn!(provider = %self.id, available = healthy, "provider availability changed");
        }
        healthy
    }
}

/// Splits an SSE byte stream into `data:` payloads across chunk boundaries.
///
/// Bytes are held until a full line arrives, so a multi-byte character split
/// between network chunks decodes intact.
#[derive(Debug, Default)]
struct SseLineBuffer {
    buffer: Vec<u8>,
}

impl SseLineBuffer {
    fn push(&mut self, bytes: &[u8]) -> std::result::Result<Vec<String>, std::str::Utf8Error> {
        self.buffer.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = std::str::from_utf8(&line)?.trim_end_matches(['\r', '\n']);
            if let Some(data) = line.strip_prefix("data:") {
                payloads.push(data.trim_start().to_string());
            }
        }
        Ok(payloads)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionBody {
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChoiceBody>,
    usage: Option<UsageBody>,
}

#[derive(Debug, Deserialize)]
struct ChoiceBody {
    message: MessageBody,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunkBody {
    model: Option<String>,
    #[serde(default)]
    choices: Vec<StreamChoiceBody>,
    usage: Option<UsageBody>,
}

#[derive(Debug, Deserialize)]
struct StreamChoiceBody {
    #[serde(default)]
    delta: DeltaBody,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DeltaBody {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageBody {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    total_tokens: Option<u32>,
}

impl UsageBody {
    fn into_usage(self) -> TokenUsage {
        TokenUsage {
            prompt_tokens: self.prompt_tokens,
            completion_tokens: self.completion_tokens,
            total_tokens: self
                .total_tokens
                .unwrap_or(self.prompt_tokens.saturating_add(self.completion_tokens)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingBody {
    #[serde(default)]
    data: Vec<EmbeddingData>,
    model: Option<String>,
    usage: Option<UsageBody>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sse_buffer_handles_split_lines() {
        let mut buffer = SseLineBuffer::default();
        assert!(buffer.push(b"data: {\"a\":").unwrap().is_empty());
        let payloads = buffer.push(b"1}\n\ndata: [DONE]\n").unwrap();
        assert_eq!(payloads, vec!["{\"a\":1}".to_string(), "[DONE]".to_string()]);
    }

    #[test]
    fn test_sse_buffer_ignores_comments_and_events() {
        let mut buffer = SseLineBuffer::default();
        let payloads = buffer
            .push(b": keep-alive\r\nevent: message\r\ndata: x\r\n")
            .unwrap();
        assert_eq!(payloads, vec!["x".to_string()]);
    }

    #[test]
    fn test_sse_buffer_keeps_split_multibyte_characters() {
        let line = "data: {\"c\":\"\u{e9}\"}\n".as_bytes();
        let split = line.iter().position(|&b| b == 0xC3).unwrap() + 1;

        let mut buffer = SseLineBuffer::default();
        assert!(buffer.push(&line[..split]).unwrap().is_empty());
        let payloads = buffer.push(&line[split..]).unwrap();
        assert_eq!(payloads, vec!["{\"c\":\"\u{e9}\"}".to_string()]);
    }

    #[test]
    fn test_sse_buffer_rejects_invalid_utf8() {
        let mut buffer = SseLineBuffer::default();
        assert!(buffer.push(b"data: \xff\xfe\n").is_err());
    }

    #[test]
    fn test_default_capabilities_follow_embedding_model() {
        let config = ProviderConfig::new("openai");
        let provider = OpenAICompatibleProvider::new(&config, 1).unwrap();
        assert!(provider.supports(Capability::Streaming));
        assert!(!provider.supports(Capability::Embeddings));
        assert_eq!(provider.base_url(), DEFAULT_ENDPOINT);

        let mut config = ProviderConfig::new("openai");
        config.embedding_model = Some("text-embedding-3-small".into());
        config.endpoint = Some("http://localhost:8080/v1/".into());
        let provider = OpenAICompatibleProvider::new(&config, 1).unwrap();
        assert!(provider.supports(Capability::Embeddings));
        assert_eq!(provider.url("/models"), "http://localhost:8080/v1/models");
    }

    #[test]
    fn test_chat_body_includes_only_set_options() {
        let provider = OpenAICompatibleProvider::new(&ProviderConfig::new("p"), 1).unwrap();
        let options = CompletionOptions::new()
            .with_system_prompt("be terse")
            .with_max_tokens(32)
            .with_format(ResponseFormat::Json);
        let body = provider.chat_body(&[ChatMessage::user("hi")], &options, false);

        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
        assert_eq!(body["max_tokens"], 32);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!(body.get("temperature").is_none());
        assert_eq!(body["model"], DEFAULT_MODEL);
    }
}
