//! Configuration files on disk

#[cfg(test)]
mod tests {
    use llm_orchestrator::config::{EvictionStrategy, ProviderKind};
    use llm_orchestrator::{CompletionOptions, Config, FallbackStrategy, Orchestrator, OrchestratorError};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const MOCK_CONFIG: &str = r#"
orchestrator:
  fallback_strategy: cascade
  cache:
    ttl_ms: 60000
    max_size_bytes: 65536
    strategy: lru
  rate_limits:
    primary:
      requests_per_minute: 600
      max_concurrent: 8
  providers:
    - id: primary
      kind: mock
      priority: 1
      mock:
        fail_status: 503
    - id: backup
      kind: mock
      priority: 2
      mock:
        response: "backup answer"
logging:
  level: info
"#;

    #[tokio::test]
    async fn test_load_file_and_run() {
        let file = write_config(MOCK_CONFIG);
        let config = Config::from_file(file.path()).await.unwrap();

        assert_eq!(config.providers().len(), 2);
        assert_eq!(config.providers()[0].kind, ProviderKind::Mock);
        assert_eq!(config.orchestrator().cache.strategy, EvictionStrategy::Lru);
        assert_eq!(
            config.orchestrator().fallback_strategy,
            FallbackStrategy::Cascade
        );

        let orchestrator = Orchestrator::from_config(config.orchestrator()).unwrap();
        assert_eq!(orchestrator.default_provider(), Some("primary"));

        let response = orchestrator
            .complete("anything", &CompletionOptions::new())
            .await
            .unwrap();
        assert_eq!(response.provider, "backup");
        assert_eq!(response.content, "backup answer");
        orchestrator.shutdown();
    }

    #[tokio::test]
    async fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_file(dir.path().join("absent.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Config(_)));
    }

    #[tokio::test]
    async fn test_invalid_file_is_rejected() {
        let file = write_config(
            "orchestrator:\n  default_provider: ghost\n  providers:\n    - id: real\n      kind: mock\n",
        );
        let err = Config::from_file(file.path()).await.unwrap_err();
        match err {
            OrchestratorError::Config(message) => assert!(message.contains("ghost"), "{}", message),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_yaml_is_rejected() {
        let file = write_config("orchestrator: [not, a, map");
        assert!(matches!(
            Config::from_file(file.path()).await,
            Err(OrchestratorError::Config(_))
        ));
    }
}
