//! Rate limiting configuration

use serde::{Deserialize, Serialize};

/// Admission limits for one provider, or for all traffic when used as the
/// global limit. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub requests_per_minute: Option<u32>,
    /// Used when `requests_per_minute` is unset; requests are charged their
    /// estimated token count
    pub tokens_per_minute: Option<u32>,
    /// Simultaneous in-flight calls; excess calls are rejected, not queued
    pub max_concurrent: Option<u32>,
}

impl RateLimitConfig {
    pub fn requests_per_minute(rpm: u32) -> Self {
        Self {
            requests_per_minute: Some(rpm),
            ..Default::default()
        }
    }

    pub fn tokens_per_minute(tpm: u32) -> Self {
        Self {
            tokens_per_minute: Some(tpm),
            ..Default::default()
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: u32) -> Self {
        self.max_concurrent = Some(max_concurrent);
        self
    }

    /// True when the bucket charges estimated tokens instead of one per request
    pub fn is_token_based(&self) -> bool {
        self.requests_per_minute.is_none() && self.tokens_per_minute.is_some()
    }
}
