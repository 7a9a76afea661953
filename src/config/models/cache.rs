//! Response cache configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Victim selection when the cache is full
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionStrategy {
    /// Least recently accessed first
    #[default]
    Lru,
    /// Oldest inserted first
    Fifo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl_ms")]
    pub ttl_ms: u64,
    /// Upper bound on the summed estimated size of live entries
    #[serde(default = "default_cache_max_size_bytes")]
    pub max_size_bytes: usize,
    #[serde(default)]
    pub strategy: EvictionStrategy,
    /// Period of the background expiry sweep
    #[serde(default = "default_cache_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_cache_ttl_ms(),
            max_size_bytes: default_cache_max_size_bytes(),
            strategy: EvictionStrategy::default(),
            sweep_interval_ms: default_cache_sweep_interval_ms(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}
