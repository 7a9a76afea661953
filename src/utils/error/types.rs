//! Error types for the orchestrator
//!
//! | Variant | Raised by | Retryable at the HTTP boundary |
//! |---------|-----------|--------------------------------|
//! | ProviderUnavailable | registry lookup, health check | No |
//! | UnsupportedCapability | `embed` on a provider without embeddings | No |
//! | RateLimitExceeded | concurrency cap, queue timeout | No |
//! | Http | non-2xx backend response | Only 5xx |
//! | Network | connection failures | Yes |
//! | Timeout | per-call timeout | Yes |
//! | AllProvidersFailed | fallback exhaustion | No |

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::providers::Capability;

/// Result type alias for the orchestrator
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Why an admission request was rejected by the rate limiter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateLimitReason {
    /// The provider already has `max_concurrent` calls in flight
    ConcurrencyLimit { max_concurrent: u32 },
    /// The caller waited in the bucket queue past the deadline
    QueueTimeout { waited_ms: u64 },
}

impl fmt::Display for RateLimitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConcurrencyLimit { max_concurrent } => {
                write!(f, "concurrency limit of {} reached", max_concurrent)
            }
            Self::QueueTimeout { waited_ms } => {
                write!(f, "queued for {}ms without a token", waited_ms)
            }
        }
    }
}

/// Main error type for the orchestrator
///
/// Payloads are owned strings so the error stays `Clone` and can be recorded
/// in metrics and broadcast in events.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrchestratorError {
    /// Adapter not registered, disabled, or failing its health check
    #[error("Provider {provider} is unavailable: {message}")]
    ProviderUnavailable { provider: String, message: String },

    #[error("Provider {provider} does not support {capability}")]
    UnsupportedCapability {
        provider: String,
        capability: Capability,
    },

    #[error("Rate limit exceeded for {provider}: {reason}")]
    RateLimitExceeded {
        provider: String,
        reason: RateLimitReason,
    },

    /// Non-2xx response from a backend
    #[error("HTTP {status} from {provider}: {message}")]
    Http {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Network error for {provider}: {message}")]
    Network { provider: String, message: String },

    #[error("Request to {provider} timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    /// Fallback exhausted every eligible provider
    #[error("All providers failed (attempted: {}): {last_error}", attempted.join(", "))]
    AllProvidersFailed {
        attempted: Vec<String>,
        last_error: String,
    },

    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl OrchestratorError {
    pub fn unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn unsupported(provider: impl Into<String>, capability: Capability) -> Self {
        Self::UnsupportedCapability {
            provider: provider.into(),
            capability,
        }
    }

    pub fn rate_limit(provider: impl Into<String>, reason: RateLimitReason) -> Self {
        Self::RateLimitExceeded {
            provider: provider.into(),
            reason,
        }
    }

    pub fn http(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    pub fn network(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn timeout(provider: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            provider: provider.into(),
            timeout_ms,
        }
    }

    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether the HTTP call boundary may retry this error.
    ///
    /// Client errors (4xx) are never retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Short stable label stored on metric samples
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::ProviderUnavailable { .. } => "provider_unavailable",
            Self::UnsupportedCapability { .. } => "unsupported_capability",
            Self::RateLimitExceeded {
                reason: RateLimitReason::ConcurrencyLimit { .. },
                ..
            } => "concurrency_limit",
            Self::RateLimitExceeded {
                reason: RateLimitReason::QueueTimeout { .. },
                ..
            } => "queue_timeout",
            Self::Http { status, .. } if *status >= 500 => "http_5xx",
            Self::Http { .. } => "http_4xx",
            Self::Network { .. } => "network",
            Self::Timeout { .. } => "timeout",
            Self::AllProvidersFailed { .. } => "all_providers_failed",
            Self::InvalidResponse { .. } => "invalid_response",
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
            Self::Io(_) => "io",
        }
    }

    /// Provider the error is attributed to, if any
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::ProviderUnavailable { provider, .. }
            | Self::UnsupportedCapability { provider, .. }
            | Self::RateLimitExceeded { provider, .. }
            | Self::Http { provider, .. }
            | Self::Network { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::InvalidResponse { provider, .. } => Some(provider),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for OrchestratorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for OrchestratorError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(format!("invalid YAML: {}", err))
    }
}

impl From<std::io::Error> for OrchestratorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
