//! Tests for orchestrator error classification

use super::{OrchestratorError, RateLimitReason};
use crate::core::providers::Capability;

#[test]
fn test_retryable_classification() {
    assert!(OrchestratorError::network("openai", "connection reset").is_retryable());
    assert!(OrchestratorError::timeout("openai", 1000).is_retryable());
    assert!(OrchestratorError::http("openai", 502, "bad gateway").is_retryable());
    assert!(OrchestratorError::http("openai", 500, "boom").is_retryable());

    assert!(!OrchestratorError::http("openai", 400, "bad request").is_retryable());
    assert!(!OrchestratorError::http("openai", 429, "slow down").is_retryable());
    assert!(!OrchestratorError::unsupported("local", Capability::Embeddings).is_retryable());
}

#[test]
fn test_error_class_labels() {
    let concurrency = OrchestratorError::rate_limit(
        "openai",
        RateLimitReason::ConcurrencyLimit { max_concurrent: 1 },
    );
    assert_eq!(concurrency.error_class(), "concurrency_limit");

    let queued = OrchestratorError::rate_limit(
        "openai",
        RateLimitReason::QueueTimeout { waited_ms: 30_000 },
    );
    assert_eq!(queued.error_class(), "queue_timeout");

    assert_eq!(OrchestratorError::http("a", 503, "").error_class(), "http_5xx");
    assert_eq!(OrchestratorError::http("a", 404, "").error_class(), "http_4xx");
}

#[test]
fn test_provider_attribution() {
    let err = OrchestratorError::timeout("anthropic", 500);
    assert_eq!(err.provider(), Some("anthropic"));

    let err = OrchestratorError::AllProvidersFailed {
        attempted: vec!["a".into(), "b".into()],
        last_error: "boom".into(),
    };
    assert_eq!(err.provider(), None);
    assert_eq!(err.to_string(), "All providers failed (attempted: a, b): boom");
}

#[test]
fn test_conversions() {
    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(
        OrchestratorError::from(json_err),
        OrchestratorError::Serialization(_)
    ));

    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    assert!(matches!(OrchestratorError::from(io_err), OrchestratorError::Io(_)));
}
