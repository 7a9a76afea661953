//! Tests for the metrics registry

#[cfg(test)]
mod tests {
    use super::super::types::{MAX_ERROR_MESSAGES, OTHER_ERRORS};
    use super::super::{MetricSample, MetricsRegistry};
    use crate::core::events::{EventBus, OrchestratorEvent};
    use crate::core::types::TokenUsage;
    use crate::utils::error::{OrchestratorError, RateLimitReason};
    use std::time::Duration;

    fn record_many(registry: &MetricsRegistry, provider: &str, ok: u32, failed: u32, latency_ms: u64) {
        for _ in 0..ok {
            registry.record(MetricSample::success(provider, latency_ms, None));
        }
        for _ in 0..failed {
            registry.record(MetricSample::failure(
                provider,
                latency_ms,
                &OrchestratorError::http(provider, 503, "busy"),
            ));
        }
    }

    #[test]
    fn test_success_rate_dominates_latency() {
        let registry = MetricsRegistry::default();
        record_many(&registry, "A", 10, 0, 100);
        record_many(&registry, "B", 8, 2, 50);

        let rankings = registry.provider_rankings();
        assert_eq!(rankings[0].provider, "A");
        assert_eq!(rankings[0].success_rate, 100.0);
        assert_eq!(rankings[0].avg_latency_ms, 100.0);
        assert_eq!(rankings[1].provider, "B");
        assert_eq!(rankings[1].success_rate, 80.0);
        assert_eq!(rankings[1].sample_count, 10);
    }

    #[test]
    fn test_near_equal_rates_tie_break_on_latency() {
        let registry = MetricsRegistry::default();
        // 100% vs 99.9%: inside the tie band
        record_many(&registry, "slow", 1000, 0, 300);
        record_many(&registry, "fast", 999, 1, 40);

        let rankings = registry.provider_rankings();
        assert_eq!(rankings[0].provider, "fast");
        assert_eq!(rankings[1].provider, "slow");
    }

    #[test]
    fn test_close_rates_tie_regardless_of_where_they_fall() {
        let registry = MetricsRegistry::default();
        // 99.76% vs 99.74%: straddles 99.75
        record_many(&registry, "slow", 4988, 12, 300);
        record_many(&registry, "fast", 4987, 13, 40);

        let rankings = registry.provider_rankings();
        assert_eq!(rankings[0].provider, "fast");
        assert_eq!(rankings[1].provider, "slow");
    }

    #[test]
    fn test_rates_an_epsilon_apart_do_not_tie() {
        let registry = MetricsRegistry::default();
        record_many(&registry, "reliable", 200, 0, 300);
        record_many(&registry, "quick", 198, 2, 10);
        // 100% vs 99%: outside the tolerance
        let rankings = registry.provider_rankings();
        assert_eq!(rankings[0].provider, "reliable");
        assert_eq!(rankings[1].provider, "quick");
    }

    #[test]
    fn test_rankings_skip_providers_without_samples() {
        let registry = MetricsRegistry::default();
        assert!(registry.provider_rankings().is_empty());
        assert_eq!(registry.top_provider(["a", "b"]), None);

        record_many(&registry, "b", 1, 0, 10);
        assert_eq!(registry.top_provider(["a", "b"]).as_deref(), Some("b"));
        assert_eq!(registry.top_provider(["a"]), None);
    }

    #[test]
    fn test_stats_aggregate_latency_tokens_and_errors() {
        let registry = MetricsRegistry::default();
        registry.record(MetricSample::success("p", 30, Some(TokenUsage::new(10, 5))));
        registry.record(MetricSample::success("p", 10, Some(TokenUsage::new(2, 3))));
        registry.record(MetricSample::failure(
            "p",
            50,
            &OrchestratorError::timeout("p", 50),
        ));

        let stats = registry.provider_stats("p").unwrap();
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.success_count, 2);
        assert_eq!(stats.failure_count, 1);
        assert_eq!(stats.min_latency_ms, Some(10));
        assert_eq!(stats.max_latency_ms, Some(50));
        assert_eq!(stats.avg_latency_ms(), 30.0);
        assert_eq!(stats.prompt_tokens, 12);
        assert_eq!(stats.completion_tokens, 8);
        assert_eq!(stats.total_tokens, 20);
        assert_eq!(stats.error_histogram["timeout"], 1);
        assert_eq!(stats.error_messages["Request to p timed out after 50ms"], 1);
        assert_eq!(
            stats.last_error.as_deref(),
            Some("Request to p timed out after 50ms")
        );
    }

    #[test]
    fn test_admission_rejections_stay_out_of_latency() {
        let registry = MetricsRegistry::default();
        registry.record(MetricSample::success("p", 40, None));
        registry.record(MetricSample::failure(
            "p",
            0,
            &OrchestratorError::rate_limit(
                "p",
                RateLimitReason::ConcurrencyLimit { max_concurrent: 1 },
            ),
        ));

        let stats = registry.provider_stats("p").unwrap();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.latency_samples, 1);
        assert_eq!(stats.avg_latency_ms(), 40.0);
        assert_eq!(stats.min_latency_ms, Some(40));
        assert_eq!(registry.summary().avg_latency_ms, 40.0);
        assert_eq!(registry.provider_rankings()[0].avg_latency_ms, 40.0);
    }

    #[test]
    fn test_error_messages_are_counted_and_bounded() {
        let registry = MetricsRegistry::default();
        for _ in 0..3 {
            registry.record(MetricSample::failure(
                "p",
                5,
                &OrchestratorError::http("p", 503, "busy"),
            ));
        }
        for i in 0..(MAX_ERROR_MESSAGES + 5) {
            registry.record(MetricSample::failure(
                "p",
                5,
                &OrchestratorError::http("p", 500, format!("failure {}", i)),
            ));
        }

        let stats = registry.provider_stats("p").unwrap();
        assert_eq!(stats.error_messages["HTTP 503 from p: busy"], 3);
        assert_eq!(stats.error_messages["HTTP 500 from p: failure 0"], 1);
        // One slot went to "busy", so the last six distinct messages overflow
        assert_eq!(stats.error_messages.len(), MAX_ERROR_MESSAGES + 1);
        assert_eq!(stats.error_messages[OTHER_ERRORS], 6);
        assert_eq!(
            stats.error_histogram["http_5xx"],
            3 + MAX_ERROR_MESSAGES as u64 + 5
        );
    }

    #[test]
    fn test_record_completion_classifies_outcome() {
        let registry = MetricsRegistry::default();
        registry.record_completion("p", Duration::from_millis(12), None, None);
        registry.record_completion(
            "p",
            Duration::from_millis(7),
            None,
            Some(&OrchestratorError::http("p", 401, "bad key")),
        );

        let samples = registry.recent_samples(Some("p"), 10);
        assert!(samples[0].success);
        assert_eq!(samples[0].latency_ms, 12);
        assert!(!samples[1].success);
        assert_eq!(samples[1].error_class.as_deref(), Some("http_4xx"));
    }

    #[test]
    fn test_history_is_bounded_but_stats_are_not() {
        let registry = MetricsRegistry::new(5);
        for latency in 0..8 {
            registry.record(MetricSample::success("p", latency, None));
        }

        let samples = registry.recent_samples(None, 100);
        assert_eq!(samples.len(), 5);
        assert_eq!(samples.first().unwrap().latency_ms, 3);
        assert_eq!(samples.last().unwrap().latency_ms, 7);
        assert_eq!(registry.provider_stats("p").unwrap().total_requests, 8);
    }

    #[test]
    fn test_recent_samples_filter_and_limit() {
        let registry = MetricsRegistry::default();
        record_many(&registry, "a", 3, 0, 1);
        record_many(&registry, "b", 2, 0, 2);
        record_many(&registry, "a", 1, 0, 3);

        let samples = registry.recent_samples(Some("a"), 2);
        assert_eq!(samples.len(), 2);
        assert!(samples.iter().all(|s| s.provider == "a"));
        assert_eq!(samples[1].latency_ms, 3);
    }

    #[test]
    fn test_summary_names_best_and_worst() {
        let registry = MetricsRegistry::default();
        record_many(&registry, "good", 4, 0, 10);
        record_many(&registry, "bad", 1, 3, 10);

        let summary = registry.summary();
        assert_eq!(summary.total_requests, 8);
        assert_eq!(summary.success_count, 5);
        assert_eq!(summary.failure_count, 3);
        assert_eq!(summary.success_rate, 62.5);
        assert_eq!(summary.provider_count, 2);
        assert_eq!(summary.best_provider.as_deref(), Some("good"));
        assert_eq!(summary.worst_provider.as_deref(), Some("bad"));
    }

    #[test]
    fn test_reset_clears_everything() {
        let registry = MetricsRegistry::default();
        record_many(&registry, "p", 2, 1, 5);
        registry.reset();

        assert_eq!(registry.total_requests(), 0);
        assert!(registry.provider_stats("p").is_none());
        assert!(registry.recent_samples(None, 10).is_empty());
        assert_eq!(registry.summary().best_provider, None);
    }

    #[test]
    fn test_prometheus_export() {
        let registry = MetricsRegistry::default();
        record_many(&registry, "p", 3, 1, 200);

        let output = registry.export_prometheus();
        assert!(output.contains("orchestrator_requests_total 4\n"));
        assert!(output.contains(
            "orchestrator_provider_requests_total{provider=\"p\",outcome=\"failure\"} 1\n"
        ));
        assert!(output.contains("orchestrator_provider_latency_seconds{provider=\"p\"} 0.200000\n"));
    }

    #[tokio::test]
    async fn test_emits_metric_recorded() {
        let events = EventBus::default();
        let mut rx = events.subscribe();
        let registry = MetricsRegistry::default().with_events(events);

        registry.record(MetricSample::success("p", 9, None));
        assert_eq!(
            rx.recv().await.unwrap(),
            OrchestratorEvent::MetricRecorded {
                provider: "p".into(),
                success: true,
                latency_ms: 9
            }
        );
    }
}
