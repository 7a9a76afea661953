//! System utilities
//!
//! Background task lifecycle shared by the rate limiter, the response cache
//! and the orchestrator's health check.

pub mod ticker;

pub use ticker::Ticker;
