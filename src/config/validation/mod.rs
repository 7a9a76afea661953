//! Configuration validation
//!
//! - `trait_def`: the `Validate` trait
//! - `config_validators`: orchestrator and provider validators
//! - `cache_validators`: cache and rate limit validators

mod cache_validators;
mod config_validators;
mod trait_def;


pub use trait_def::Validate;
