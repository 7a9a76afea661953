//! Core type definitions
//!
//! Request and response shapes shared by providers and the orchestrator.

pub mod message;
pub mod options;
pub mod responses;

pub use message::{ChatMessage, MessageRole, format_chat_prompt};
pub use options::{CompletionOptions, ResponseFormat};
pub use responses::{CompletionResponse, EmbeddingResponse, StreamChunk, TokenUsage};
