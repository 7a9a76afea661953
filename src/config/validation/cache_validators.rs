//! Cache and rate limit validators

use super::trait_def::Validate;
use crate::config::models::{CacheConfig, RateLimitConfig};

impl Validate for CacheConfig {
    fn validate(&self) -> Result<(), String> {
        if self.ttl_ms == 0 {
            return Err("ttl_ms must be greater than 0".to_string());
        }
        if self.max_size_bytes == 0 {
            return Err("max_size_bytes must be greater than 0".to_string());
        }
        if self.sweep_interval_ms == 0 {
            return Err("sweep_interval_ms must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Validate for RateLimitConfig {
    fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("requests_per_minute", self.requests_per_minute),
            ("tokens_per_minute", self.tokens_per_minute),
            ("max_concurrent", self.max_concurrent),
        ] {
            if value == Some(0) {
                return Err(format!("{} must be greater than 0", name));
            }
        }
        Ok(())
    }
}
