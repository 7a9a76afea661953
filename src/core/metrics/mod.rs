//! Per-provider call metrics
//!
//! Every dispatch outcome is recorded as a [`MetricSample`]. Samples feed
//! cumulative [`ProviderStats`] and a bounded history; rankings derived from
//! the stats drive load-balanced provider selection.

mod registry;
mod types;

#[cfg(test)]
mod tests;

pub use registry::MetricsRegistry;
pub use types::{MetricSample, MetricsSummary, ProviderRanking, ProviderStats};
