//! Provider capability flags
//!
//! Capabilities are a fixed set of flags checked before dispatch, so an
//! unsupported operation is rejected without touching the rate limiter or the
//! network.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single operation a provider may support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Complete,
    Chat,
    Streaming,
    Embeddings,
    FunctionCalling,
    JsonMode,
    Vision,
}

impl Capability {
    pub const ALL: [Capability; 7] = [
        Capability::Complete,
        Capability::Chat,
        Capability::Streaming,
        Capability::Embeddings,
        Capability::FunctionCalling,
        Capability::JsonMode,
        Capability::Vision,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Complete => "complete",
            Capability::Chat => "chat",
            Capability::Streaming => "streaming",
            Capability::Embeddings => "embeddings",
            Capability::FunctionCalling => "function_calling",
            Capability::JsonMode => "json_mode",
            Capability::Vision => "vision",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability set advertised by an adapter.
///
/// `complete` is mandatory for every adapter and always reported as supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    pub chat: bool,
    pub streaming: bool,
    pub embeddings: bool,
    pub function_calling: bool,
    pub json_mode: bool,
    pub vision: bool,
}

impl ProviderCapabilities {
    /// Only the mandatory `complete` operation
    pub const fn completion_only() -> Self {
        Self {
            chat: false,
            streaming: false,
            embeddings: false,
            function_calling: false,
            json_mode: false,
            vision: false,
        }
    }

    pub const fn all() -> Self {
        Self {
            chat: true,
            streaming: true,
            embeddings: true,
            function_calling: true,
            json_mode: true,
            vision: true,
        }
    }

    pub fn with(mut self, capability: Capability) -> Self {
        match capability {
            Capability::Complete => {}
            Capability::Chat => self.chat = true,
            Capability::Streaming => self.streaming = true,
            Capability::Embeddings => self.embeddings = true,
            Capability::FunctionCalling => self.function_calling = true,
            Capability::JsonMode => self.json_mode = true,
            Capability::Vision => self.vision = true,
        }
        self
    }

    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Complete => true,
            Capability::Chat => self.chat,
            Capability::Streaming => self.streaming,
            Capability::Embeddings => self.embeddings,
            Capability::FunctionCalling => self.function_calling,
            Capability::JsonMode => self.json_mode,
            Capability::Vision => self.vision,
        }
    }

    /// Supported capabilities, `complete` first
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(|c| self.supports(*c))
    }
}

impl FromIterator<Capability> for ProviderCapabilities {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::completion_only(), |caps, capability| caps.with(capability))
    }
}
