//! Orchestrator end-to-end tests over HTTP providers

#[cfg(test)]
mod tests {
    use crate::common::fixtures::{chat_completion_body, models_body};
    use crate::common::http_provider;
    use llm_orchestrator::config::{OrchestratorConfig, RateLimitConfig};
    use llm_orchestrator::{
        CompletionOptions, FallbackStrategy, Orchestrator, OrchestratorError, OrchestratorEvent,
    };
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn completion_mock(server: &MockServer, status: u16, content: &str, expected: u64) {
        let template = if status == 200 {
            ResponseTemplate::new(200).set_body_json(chat_completion_body(content))
        } else {
            ResponseTemplate::new(status).set_body_string(content)
        };
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(template)
            .expect(expected)
            .mount(server)
            .await;
    }

    fn config(servers: &[(&str, &MockServer)]) -> OrchestratorConfig {
        let providers = servers
            .iter()
            .enumerate()
            .map(|(i, (id, server))| {
                let mut provider = http_provider(id, server);
                provider.priority = Some(i as u32 + 1);
                provider
            })
            .collect();
        OrchestratorConfig {
            providers,
            retry_attempts: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_cascade_over_http_and_cache() {
        let primary = MockServer::start().await;
        let backup = MockServer::start().await;
        completion_mock(&primary, 503, "down", 1).await;
        completion_mock(&backup, 200, "from backup", 1).await;

        let orchestrator =
            Orchestrator::from_config(&config(&[("primary", &primary), ("backup", &backup)]))
                .unwrap();
        let mut events = orchestrator.subscribe();
        let options = CompletionOptions::new();

        let first = orchestrator.complete("hello", &options).await.unwrap();
        assert_eq!(first.provider, "backup");
        assert_eq!(first.content, "from backup");
        assert!(!first.cached);

        // Served from cache: neither server sees a second request
        let second = orchestrator.complete("hello", &options).await.unwrap();
        assert!(second.cached);
        assert_eq!(second.content, "from backup");

        let primary_stats = orchestrator.metrics().provider_stats("primary").unwrap();
        assert_eq!(primary_stats.failure_count, 1);
        let backup_stats = orchestrator.metrics().provider_stats("backup").unwrap();
        assert_eq!(backup_stats.success_count, 1);
        assert_eq!(backup_stats.total_tokens, 12);

        let mut saw_fallback = false;
        while let Ok(event) = events.try_recv() {
            if event
                == (OrchestratorEvent::ProviderFallback {
                    from: "primary".into(),
                    to: "backup".into(),
                })
            {
                saw_fallback = true;
            }
        }
        assert!(saw_fallback);
        orchestrator.shutdown();
    }

    #[tokio::test]
    async fn test_all_http_providers_failing() {
        let a = MockServer::start().await;
        let b = MockServer::start().await;
        completion_mock(&a, 500, "boom", 1).await;
        completion_mock(&b, 429, "slow down", 1).await;

        let orchestrator = Orchestrator::from_config(&config(&[("a", &a), ("b", &b)])).unwrap();
        let err = orchestrator
            .complete("x", &CompletionOptions::new())
            .await
            .unwrap_err();

        match err {
            OrchestratorError::AllProvidersFailed {
                attempted,
                last_error,
            } => {
                assert_eq!(attempted, vec!["a".to_string(), "b".to_string()]);
                assert!(last_error.contains("429"), "{}", last_error);
            }
            other => panic!("expected AllProvidersFailed, got {:?}", other),
        }
        assert_eq!(orchestrator.metrics().summary().failure_count, 2);
    }

    #[tokio::test]
    async fn test_caller_provider_overrides_priority() {
        let a = MockServer::start().await;
        let b = MockServer::start().await;
        completion_mock(&a, 200, "from a", 0).await;
        completion_mock(&b, 200, "from b", 1).await;

        let orchestrator = Orchestrator::from_config(&config(&[("a", &a), ("b", &b)])).unwrap();
        let response = orchestrator
            .complete("x", &CompletionOptions::new().with_provider("b"))
            .await
            .unwrap();
        assert_eq!(response.content, "from b");
    }

    #[tokio::test]
    async fn test_unhealthy_provider_is_skipped() {
        let a = MockServer::start().await;
        let b = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&a)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(models_body()))
            .mount(&b)
            .await;
        completion_mock(&a, 200, "from a", 0).await;
        completion_mock(&b, 200, "from b", 1).await;

        let orchestrator = Orchestrator::from_config(&config(&[("a", &a), ("b", &b)])).unwrap();
        let health = orchestrator.check_health().await;
        assert_eq!(
            health,
            vec![("a".to_string(), false), ("b".to_string(), true)]
        );

        let response = orchestrator
            .complete("x", &CompletionOptions::new())
            .await
            .unwrap();
        assert_eq!(response.provider, "b");
        assert!(orchestrator.metrics().provider_stats("a").is_none());
    }

    #[tokio::test]
    async fn test_loadbalance_prefers_healthier_provider() {
        let flaky = MockServer::start().await;
        let steady = MockServer::start().await;
        completion_mock(&flaky, 502, "bad gateway", 1).await;
        completion_mock(&steady, 200, "steady", 3).await;

        let mut config = config(&[("flaky", &flaky), ("steady", &steady)]);
        config.fallback_strategy = FallbackStrategy::Loadbalance;
        config.enable_cache = false;
        let orchestrator = Orchestrator::from_config(&config).unwrap();

        // First call has no samples, so it starts at the default and falls back
        let first = orchestrator
            .complete("one", &CompletionOptions::new())
            .await
            .unwrap();
        assert_eq!(first.provider, "steady");

        for prompt in ["two", "three"] {
            let response = orchestrator
                .complete(prompt, &CompletionOptions::new())
                .await
                .unwrap();
            assert_eq!(response.provider, "steady");
        }
        assert_eq!(
            orchestrator.metrics().provider_stats("flaky").unwrap().total_requests,
            1
        );
    }

    #[tokio::test]
    async fn test_status_includes_rate_limits() {
        let server = MockServer::start().await;
        completion_mock(&server, 200, "ok", 1).await;

        let mut config = config(&[("remote", &server)]);
        config.rate_limits.insert(
            "remote".to_string(),
            RateLimitConfig::requests_per_minute(30).with_max_concurrent(2),
        );
        let orchestrator = Orchestrator::from_config(&config).unwrap();
        orchestrator
            .complete("status", &CompletionOptions::new())
            .await
            .unwrap();

        let status = orchestrator.get_status();
        assert_eq!(status.total_requests, 1);
        let remote = &status.providers[0];
        let limits = remote.rate_limit.as_ref().unwrap();
        assert_eq!(limits.max_concurrent, Some(2));
        assert_eq!(limits.active, 0);
        assert!(limits.bucket.capacity > 0.0);
        assert_eq!(remote.stats.as_ref().unwrap().success_count, 1);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["providers"][0]["id"], "remote");
        assert_eq!(json["fallback_strategy"], "cascade");
    }
}
