//! Orchestrator and provider validators

use super::trait_def::Validate;
use crate::config::models::{OrchestratorConfig, ProviderConfig, ProviderKind};
use std::collections::HashSet;

impl Validate for ProviderConfig {
    fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("provider id cannot be empty".to_string());
        }

        if let Some(endpoint) = &self.endpoint {
            let url = url::Url::parse(endpoint)
                .map_err(|e| format!("provider '{}': invalid endpoint '{}': {}", self.id, endpoint, e))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(format!(
                    "provider '{}': endpoint must use http or https",
                    self.id
                ));
            }
        }

        if self.kind == ProviderKind::Mock && self.endpoint.is_some() {
            return Err(format!(
                "provider '{}': mock providers do not take an endpoint",
                self.id
            ));
        }

        if let Some(status) = self.mock.as_ref().and_then(|m| m.fail_status) {
            if !(100..=599).contains(&status) {
                return Err(format!(
                    "provider '{}': fail_status {} is not an HTTP status",
                    self.id, status
                ));
            }
        }

        Ok(())
    }
}

impl Validate for OrchestratorConfig {
    fn validate(&self) -> Result<(), String> {
        let mut ids = HashSet::new();
        for provider in &self.providers {
            provider.validate()?;
            if !ids.insert(provider.id.as_str()) {
                return Err(format!("duplicate provider id '{}'", provider.id));
            }
        }

        if self.enabled_providers().next().is_none() {
            return Err("at least one enabled provider is required".to_string());
        }

        if let Some(default) = &self.default_provider {
            match self.providers.iter().find(|p| &p.id == default) {
                None => return Err(format!("default provider '{}' is not configured", default)),
                Some(p) if !p.enabled => {
                    return Err(format!("default provider '{}' is disabled", default));
                }
                Some(_) => {}
            }
        }

        if self.timeout_ms == 0 {
            return Err("timeout_ms must be greater than 0".to_string());
        }

        if self.metrics.history_size == 0 {
            return Err("metrics.history_size must be greater than 0".to_string());
        }

        if self.health_check_interval_ms == Some(0) {
            return Err("health_check_interval_ms must be greater than 0".to_string());
        }

        self.cache.validate().map_err(|e| format!("cache: {}", e))?;

        for (id, limit) in &self.rate_limits {
            if !ids.contains(id.as_str()) {
                return Err(format!("rate limit configured for unknown provider '{}'", id));
            }
            limit
                .validate()
                .map_err(|e| format!("rate_limits.{}: {}", id, e))?;
        }

        if let Some(global) = &self.global_rate_limit {
            global
                .validate()
                .map_err(|e| format!("global_rate_limit: {}", e))?;
            if global.max_concurrent.is_some() {
                return Err("global_rate_limit: max_concurrent is per provider only".to_string());
            }
        }

        Ok(())
    }
}
