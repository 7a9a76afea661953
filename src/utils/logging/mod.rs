//! Logging setup
//!
//! Library code only emits `tracing` events; binaries call [`init_logging`]
//! once at startup.

use tracing_subscriber::EnvFilter;

use crate::config::models::LoggingConfig;
use crate::utils::error::{OrchestratorError, Result};

/// Filter directives: `RUST_LOG` when set, else the configured level
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| {
        OrchestratorError::Config(format!("invalid log level '{}': {}", config.level, e))
    })
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| OrchestratorError::Config(format!("failed to initialize logging: {}", e)))
}
