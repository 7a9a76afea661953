//! Orchestrator configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How `complete` recovers when the primary provider fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackStrategy {
    /// Try the remaining providers in priority order
    #[default]
    Cascade,
    /// One attempt on a uniformly chosen remaining provider
    Random,
    /// Like cascade, but the primary is the best-ranked provider
    #[serde(alias = "load_balance")]
    Loadbalance,
}

impl fmt::Display for FallbackStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackStrategy::Cascade => write!(f, "cascade"),
            FallbackStrategy::Random => write!(f, "random"),
            FallbackStrategy::Loadbalance => write!(f, "loadbalance"),
        }
    }
}

impl FromStr for FallbackStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cascade" => Ok(FallbackStrategy::Cascade),
            "random" => Ok(FallbackStrategy::Random),
            "loadbalance" | "load_balance" => Ok(FallbackStrategy::Loadbalance),
            other => Err(format!("unknown fallback strategy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Raw samples kept in the history ring buffer
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            history_size: default_history_size(),
        }
    }
}

/// Top-level orchestrator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    /// Defaults to the enabled provider with the lowest priority value
    #[serde(default)]
    pub default_provider: Option<String>,
    #[serde(default)]
    pub fallback_strategy: FallbackStrategy,
    #[serde(default = "default_true")]
    pub enable_cache: bool,
    #[serde(default, alias = "cache_config")]
    pub cache: CacheConfig,
    /// Per-provider limits keyed by provider id
    #[serde(default)]
    pub rate_limits: HashMap<String, RateLimitConfig>,
    #[serde(default)]
    pub global_rate_limit: Option<RateLimitConfig>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Periodic health probing; disabled when unset
    #[serde(default)]
    pub health_check_interval_ms: Option<u64>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            default_provider: None,
            fallback_strategy: FallbackStrategy::default(),
            enable_cache: true,
            cache: CacheConfig::default(),
            rate_limits: HashMap::new(),
            global_rate_limit: None,
            timeout_ms: default_timeout_ms(),
            retry_attempts: default_retry_attempts(),
            metrics: MetricsConfig::default(),
            health_check_interval_ms: None,
        }
    }
}

impl OrchestratorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn enabled_providers(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.providers.iter().filter(|p| p.enabled)
    }

    /// Configured default, or the first enabled provider by priority
    pub fn resolved_default_provider(&self) -> Option<String> {
        if let Some(id) = &self.default_provider {
            return Some(id.clone());
        }
        self.enabled_providers()
            .enumerate()
            .min_by_key(|(position, p)| (p.priority(), *position))
            .map(|(_, p)| p.id.clone())
    }
}
