//! Integration tests for llm-orchestrator
//!
//! These tests drive the public API only: the HTTP adapter talks to a local
//! mock server, orchestrators are built from configuration.

pub mod config_tests;
pub mod http_provider_tests;
pub mod orchestrator_tests;
