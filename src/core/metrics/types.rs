//! Metric sample and aggregate types

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::core::types::TokenUsage;
use crate::utils::error::OrchestratorError;

/// Distinct messages kept per provider; further messages count under
/// [`OTHER_ERRORS`]
pub const MAX_ERROR_MESSAGES: usize = 32;
pub const OTHER_ERRORS: &str = "other";
/// Messages are cut to this many characters before counting
const MAX_ERROR_MESSAGE_LEN: usize = 200;

/// Outcome of one provider call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSample {
    pub provider: String,
    pub timestamp: DateTime<Utc>,
    pub latency_ms: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    /// Stable label from [`OrchestratorError::error_class`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MetricSample {
    pub fn success(provider: impl Into<String>, latency_ms: u64, usage: Option<TokenUsage>) -> Self {
        Self {
            provider: provider.into(),
            timestamp: Utc::now(),
            latency_ms,
            success: true,
            usage,
            error_class: None,
            error: None,
        }
    }

    pub fn failure(provider: impl Into<String>, latency_ms: u64, error: &OrchestratorError) -> Self {
        Self {
            provider: provider.into(),
            timestamp: Utc::now(),
            latency_ms,
            success: false,
            usage: None,
            error_class: Some(error.error_class().to_string()),
            error: Some(error.to_string()),
        }
    }

    /// Rejected by the rate limiter before reaching the provider
    pub fn is_admission_rejection(&self) -> bool {
        matches!(
            self.error_class.as_deref(),
            Some("concurrency_limit" | "queue_timeout")
        )
    }
}

/// Cumulative counters for one provider
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProviderStats {
    pub total_requests: u64,
    pub success_count: u64,
    pub failure_count: u64,
    /// Calls that reached the provider; latency figures cover only these
    pub latency_samples: u64,
    pub total_latency_ms: u64,
    pub min_latency_ms: Option<u64>,
    pub max_latency_ms: Option<u64>,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    /// Failures by error class
    pub error_histogram: HashMap<String, u64>,
    /// Failures by message, bounded to [`MAX_ERROR_MESSAGES`] entries
    pub error_messages: HashMap<String, u64>,
    pub last_error: Option<String>,
    pub last_request_at: Option<DateTime<Utc>>,
}

impl ProviderStats {
    pub(super) fn apply(&mut self, sample: &MetricSample) {
        self.total_requests += 1;
        if !sample.is_admission_rejection() {
            self.latency_samples += 1;
            self.total_latency_ms = self.total_latency_ms.saturating_add(sample.latency_ms);
            self.min_latency_ms = Some(
                self.min_latency_ms
                    .map_or(sample.latency_ms, |min| min.min(sample.latency_ms)),
            );
            self.max_latency_ms = Some(
                self.max_latency_ms
                    .map_or(sample.latency_ms, |max| max.max(sample.latency_ms)),
            );
        }
        self.last_request_at = Some(sample.timestamp);

        if let Some(usage) = &sample.usage {
            self.prompt_tokens += u64::from(usage.prompt_tokens);
            self.completion_tokens += u64::from(usage.completion_tokens);
            self.total_tokens += u64::from(usage.total_tokens);
        }

        if sample.success {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
            let class = sample.error_class.as_deref().unwrap_or("unknown");
            *self.error_histogram.entry(class.to_string()).or_insert(0) += 1;
            if let Some(message) = &sample.error {
                self.count_error_message(message);
            }
            self.last_error = sample.error.clone();
        }
    }

    fn count_error_message(&mut self, message: &str) {
        let message: String = message.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
        let key = if self.error_messages.contains_key(&message)
            || self.error_messages.len() < MAX_ERROR_MESSAGES
        {
            message
        } else {
            OTHER_ERRORS.to_string()
        };
        *self.error_messages.entry(key).or_insert(0) += 1;
    }

    /// Percentage in `0.0..=100.0`
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.success_count as f64 / self.total_requests as f64 * 100.0
        }
    }

    /// Mean over calls that reached the provider
    pub fn avg_latency_ms(&self) -> f64 {
        if self.latency_samples == 0 {
            0.0
        } else {
            self.total_latency_ms as f64 / self.latency_samples as f64
        }
    }
}

/// Derived ordering entry, computed on demand
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderRanking {
    pub provider: String,
    pub success_rate: f64,
    pub avg_latency_ms: f64,
    pub sample_count: u64,
}

/// Totals across every provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub total_requests: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub success_rate: f64,
    pub avg_latency_ms: f64,
    pub total_tokens: u64,
    pub provider_count: usize,
    pub best_provider: Option<String>,
    pub worst_provider: Option<String>,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
}
