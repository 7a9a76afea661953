//! Shared utilities: errors, logging setup and background tickers

pub mod error;
pub mod logging;
pub mod sys;
