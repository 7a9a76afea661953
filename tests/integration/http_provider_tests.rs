//! OpenAI-compatible adapter tests against a local mock server

#[cfg(test)]
mod tests {
    use crate::common::fixtures::{chat_completion_body, embedding_body, models_body, sse_body};
    use crate::common::http_provider;
    use llm_orchestrator::core::providers::OpenAICompatibleProvider;
    use llm_orchestrator::{
        ChatMessage, CompletionOptions, OrchestratorError, ProviderAdapter, StreamChunk,
    };
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer, retry_attempts: u32) -> OpenAICompatibleProvider {
        OpenAICompatibleProvider::new(&http_provider("remote", server), retry_attempts).unwrap()
    }

    #[tokio::test]
    async fn test_complete_posts_chat_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "test-model",
                "stream": false,
                "messages": [{ "role": "user", "content": "Say hi" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion_body("hi")))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider(&server, 1)
            .complete("Say hi", &CompletionOptions::new())
            .await
            .unwrap();

        assert_eq!(response.content, "hi");
        assert_eq!(response.provider, "remote");
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
        assert_eq!(response.usage.unwrap().total_tokens, 12);
        assert!(!response.cached);
    }

    #[tokio::test]
    async fn test_chat_sends_roles_and_options() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({
                "model": "override-model",
                "max_tokens": 16,
                "messages": [
                    { "role": "system", "content": "be brief" },
                    { "role": "user", "content": "hello" },
                    { "role": "assistant", "content": "hi" },
                    { "role": "user", "content": "bye" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion_body("bye")))
            .expect(1)
            .mount(&server)
            .await;

        let options = CompletionOptions::new()
            .with_model("override-model")
            .with_max_tokens(16)
            .with_system_prompt("be brief");
        let messages = [
            ChatMessage::user("hello"),
            ChatMessage::assistant("hi"),
            ChatMessage::user("bye"),
        ];

        let response = provider(&server, 1).chat(&messages, &options).await.unwrap();
        assert_eq!(response.content, "bye");
    }

    #[tokio::test]
    async fn test_stream_delivers_ordered_chunks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({ "stream": true })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_body(&["Hel", "lo", " world"])),
            )
            .mount(&server)
            .await;

        let mut chunks: Vec<StreamChunk> = Vec::new();
        let mut sink = |chunk: StreamChunk| chunks.push(chunk);
        let response = provider(&server, 1)
            .stream("greet", &mut sink, &CompletionOptions::new())
            .await
            .unwrap();

        assert_eq!(response.content, "Hello world");
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
        let pieces: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(pieces, vec!["Hel", "lo", " world"]);
        assert_eq!(
            chunks.iter().map(|c| c.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert!(chunks[2].is_final);
        assert!(!chunks[0].is_final && !chunks[1].is_final);
    }

    #[tokio::test]
    async fn test_embed_uses_embedding_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(body_partial_json(json!({ "model": "test-embedding", "input": "vector me" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(embedding_body(&[0.1, 0.2, 0.3])))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = http_provider("remote", &server);
        config.embedding_model = Some("test-embedding".to_string());
        let provider = OpenAICompatibleProvider::new(&config, 1).unwrap();

        let response = provider
            .embed("vector me", &CompletionOptions::new())
            .await
            .unwrap();
        assert_eq!(response.embedding, vec![0.1, 0.2, 0.3]);
        assert_eq!(response.model.as_deref(), Some("test-embedding"));
    }

    #[tokio::test]
    async fn test_embed_without_capability_is_rejected_locally() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = provider(&server, 1)
            .embed("text", &CompletionOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::UnsupportedCapability { .. }));
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion_body("recovered")))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider(&server, 2)
            .complete("retry me", &CompletionOptions::new())
            .await
            .unwrap();
        assert_eq!(response.content, "recovered");
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .expect(1)
            .mount(&server)
            .await;

        let err = provider(&server, 3)
            .complete("no", &CompletionOptions::new())
            .await
            .unwrap_err();
        match err {
            OrchestratorError::Http {
                provider,
                status,
                message,
            } => {
                assert_eq!(provider, "remote");
                assert_eq!(status, 401);
                assert_eq!(message, "bad key");
            }
            other => panic!("expected HTTP error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = provider(&server, 1)
            .complete("x", &CompletionOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_health_check_updates_availability() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(models_body()))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider = provider(&server, 1);
        assert!(provider.check_health().await);
        assert!(provider.is_available());

        assert!(!provider.check_health().await);
        assert!(!provider.is_available());
    }
}
