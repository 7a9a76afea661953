//! Provider Registry
//!
//! Holds the configured adapters in fixed priority order. The order is decided
//! at construction (priority ascending, then registration order) and never
//! changes afterwards; it is the deterministic fallback order.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use super::adapter::ProviderAdapter;
use super::capabilities::ProviderCapabilities;
use crate::utils::error::{OrchestratorError, Result};

/// Default priority for providers that do not configure one
pub const DEFAULT_PRIORITY: u32 = 100;

/// Point-in-time view of a registered provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderDescriptor {
    pub id: String,
    /// Lower is tried first
    pub priority: u32,
    pub capabilities: ProviderCapabilities,
    pub enabled: bool,
    /// Result of the last health check
    pub available: bool,
}

#[derive(Debug, Clone)]
struct RegisteredProvider {
    priority: u32,
    adapter: Arc<dyn ProviderAdapter>,
}

/// Priority-ordered adapter registry
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<RegisteredProvider>,
    index: HashMap<String, usize>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter. Ids must be unique.
    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>, priority: u32) -> Result<()> {
        let id = adapter.id().to_string();
        if id.is_empty() {
            return Err(OrchestratorError::Config(
                "provider id must not be empty".to_string(),
            ));
        }
        if self.index.contains_key(&id) {
            return Err(OrchestratorError::Config(format!(
                "provider '{}' registered twice",
                id
            )));
        }

        self.providers.push(RegisteredProvider { priority, adapter });
        // Stable sort keeps registration order among equal priorities
        self.providers.sort_by_key(|p| p.priority);
        self.reindex();
        Ok(())
    }

    fn reindex(&mut self) {
        self.index = self
            .providers
            .iter()
            .enumerate()
            .map(|(i, p)| (p.adapter.id().to_string(), i))
            .collect();
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn ProviderAdapter>> {
        self.index.get(id).map(|&i| &self.providers[i].adapter)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn priority(&self, id: &str) -> Option<u32> {
        self.index.get(id).map(|&i| self.providers[i].priority)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provider ids in priority order
    pub fn ids(&self) -> Vec<String> {
        self.providers
            .iter()
            .map(|p| p.adapter.id().to_string())
            .collect()
    }

    /// Adapters in priority order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ProviderAdapter>> {
        self.providers.iter().map(|p| &p.adapter)
    }

    /// Available adapters in priority order, skipping `exclude`
    pub fn eligible(&self, exclude: &[&str]) -> Vec<Arc<dyn ProviderAdapter>> {
        self.providers
            .iter()
            .filter(|p| !exclude.contains(&p.adapter.id()))
            .filter(|p| p.adapter.is_available())
            .map(|p| p.adapter.clone())
            .collect()
    }

    pub fn descriptors(&self) -> Vec<ProviderDescriptor> {
        self.providers
            .iter()
            .map(|p| ProviderDescriptor {
                id: p.adapter.id().to_string(),
                priority: p.priority,
                capabilities: p.adapter.capabilities(),
                enabled: true,
                available: p.adapter.is_available(),
            })
            .collect()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("provider_count", &self.providers.len())
            .field("providers", &self.ids())
            .finish()
    }
}
