//! Provider adapters
//!
//! - `adapter`: the [`ProviderAdapter`] trait and its `complete`-based defaults
//! - `capabilities`: fixed capability flags
//! - `registry`: priority-ordered adapter registry
//! - `openai_compatible`: HTTP adapter for OpenAI-style APIs
//! - `mock`: deterministic in-process adapter
//! - `factory`: adapters from configuration

pub mod adapter;
pub mod capabilities;
pub mod factory;
pub mod mock;
pub mod openai_compatible;
pub mod registry;

pub use adapter::{ProviderAdapter, StreamSink, chat_via_complete, stream_via_complete};
pub use capabilities::{Capability, ProviderCapabilities};
pub use factory::{build_registry, create_adapter};
pub use mock::MockProvider;
pub use openai_compatible::OpenAICompatibleProvider;
pub use registry::{DEFAULT_PRIORITY, ProviderDescriptor, ProviderRegistry};
