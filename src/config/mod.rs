//! Configuration management for the orchestrator
//!
//! Configuration is read from YAML, optionally overridden from the
//! environment, and validated before use.

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;

use crate::utils::error::{OrchestratorError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Main configuration struct
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file, apply environment overrides and validate
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            OrchestratorError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let mut config = Self::parse_yaml(&content)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Parse and validate YAML without consulting the environment
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config = Self::parse_yaml(content)?;
        config.validate()?;
        Ok(config)
    }

    fn parse_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| OrchestratorError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Build a configuration from environment variables alone.
    ///
    /// `OPENAI_API_KEY` (with optional `OPENAI_BASE_URL` and `OPENAI_MODEL`)
    /// registers an `openai` provider; overrides then apply as usual.
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// [`Config::from_env`] with an injectable variable lookup
    pub fn from_env_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(api_key) = lookup("OPENAI_API_KEY") {
            let mut provider = ProviderConfig::new("openai");
            provider.api_key = Some(api_key);
            provider.endpoint = lookup("OPENAI_BASE_URL");
            provider.model = lookup("OPENAI_MODEL");
            config.orchestrator.providers.push(provider);
        }

        config.apply_env_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `ORCHESTRATOR_*` overrides on top of the loaded values
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup("ORCHESTRATOR_DEFAULT_PROVIDER") {
            debug!("Overriding default provider from environment");
            self.orchestrator.default_provider = Some(provider);
        }

        if let Some(strategy) = lookup("ORCHESTRATOR_FALLBACK_STRATEGY") {
            self.orchestrator.fallback_strategy = strategy
                .parse()
                .map_err(OrchestratorError::Config)?;
        }

        if let Some(timeout) = lookup("ORCHESTRATOR_TIMEOUT_MS") {
            self.orchestrator.timeout_ms = timeout.trim().parse().map_err(|_| {
                OrchestratorError::Config(format!("ORCHESTRATOR_TIMEOUT_MS '{}' is not a number", timeout))
            })?;
        }

        if let Some(enabled) = lookup("ORCHESTRATOR_ENABLE_CACHE") {
            self.orchestrator.enable_cache = parse_bool(&enabled).ok_or_else(|| {
                OrchestratorError::Config(format!(
                    "ORCHESTRATOR_ENABLE_CACHE '{}' is not a boolean",
                    enabled
                ))
            })?;
        }

        if let Some(level) = lookup("ORCHESTRATOR_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        self.orchestrator
            .validate()
            .map_err(|e| OrchestratorError::Config(format!("Orchestrator config error: {}", e)))?;

        if self.logging.level.trim().is_empty() {
            return Err(OrchestratorError::Config(
                "Logging config error: level cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn orchestrator(&self) -> &OrchestratorConfig {
        &self.orchestrator
    }

    pub fn providers(&self) -> &[ProviderConfig] {
        &self.orchestrator.providers
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
