//! Metrics registry

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::fmt::Write as _;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::types::{MetricSample, MetricsSummary, ProviderRanking, ProviderStats};
use crate::config::models::default_history_size;
use crate::core::events::{EventBus, OrchestratorEvent};
use crate::core::types::TokenUsage;
use crate::utils::error::OrchestratorError;

/// Success rates closer than this many percentage points rank as equal
const RANKING_EPSILON_PCT: f64 = 0.5;

/// Order rankings best first. Providers whose success rate is within
/// [`RANKING_EPSILON_PCT`] of their neighbour's form one tie group, ordered
/// by latency and then id.
fn sort_rankings(rankings: &mut Vec<ProviderRanking>) {
    rankings.sort_by(|a, b| b.success_rate.total_cmp(&a.success_rate));

    let mut group = 0usize;
    let mut grouped: Vec<(usize, ProviderRanking)> = Vec::with_capacity(rankings.len());
    for ranking in rankings.drain(..) {
        if let Some((_, previous)) = grouped.last() {
            if previous.success_rate - ranking.success_rate >= RANKING_EPSILON_PCT {
                group += 1;
            }
        }
        grouped.push((group, ranking));
    }

    grouped.sort_by(|(ga, a), (gb, b)| {
        ga.cmp(gb)
            .then_with(|| a.avg_latency_ms.total_cmp(&b.avg_latency_ms))
            .then_with(|| a.provider.cmp(&b.provider))
    });
    rankings.extend(grouped.into_iter().map(|(_, ranking)| ranking));
}

#[derive(Debug, Default)]
struct MetricsState {
    providers: HashMap<String, ProviderStats>,
    history: VecDeque<MetricSample>,
}

/// Records call outcomes and derives rankings.
///
/// Stats and history share one lock so a reader never sees a sample in the
/// history that its provider's counters do not include yet.
#[derive(Debug)]
pub struct MetricsRegistry {
    history_size: usize,
    state: RwLock<MetricsState>,
    started: Instant,
    started_at: DateTime<Utc>,
    events: EventBus,
}

impl MetricsRegistry {
    pub fn new(history_size: usize) -> Self {
        Self {
            history_size: history_size.max(1),
            state: RwLock::new(MetricsState::default()),
            started: Instant::now(),
            started_at: Utc::now(),
            events: EventBus::default(),
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn history_size(&self) -> usize {
        self.history_size
    }

    pub fn record(&self, sample: MetricSample) {
        debug!(
            provider = %sample.provider,
            success = sample.success,
            latency_ms = sample.latency_ms,
            error_class = sample.error_class.as_deref(),
            "recording metric sample"
        );
        let event = OrchestratorEvent::MetricRecorded {
            provider: sample.provider.clone(),
            success: sample.success,
            latency_ms: sample.latency_ms,
        };

        {
            let mut state = self.state.write();
            state
                .providers
                .entry(sample.provider.clone())
                .or_default()
                .apply(&sample);
            if state.history.len() == self.history_size {
                state.history.pop_front();
            }
            state.history.push_back(sample);
        }

        self.events.emit(event);
    }

    /// Record one call outcome. `error` is `Some` exactly when the call failed.
    pub fn record_completion(
        &self,
        provider: &str,
        latency: Duration,
        usage: Option<TokenUsage>,
        error: Option<&OrchestratorError>,
    ) {
        let latency_ms = latency.as_millis() as u64;
        let sample = match error {
            None => MetricSample::success(provider, latency_ms, usage),
            Some(err) => MetricSample::failure(provider, latency_ms, err),
        };
        self.record(sample);
    }

    /// Providers with at least one sample, best first: success rate
    /// descending (near-equal rates tie), then average latency ascending,
    /// then id
    pub fn provider_rankings(&self) -> Vec<ProviderRanking> {
        let mut rankings: Vec<ProviderRanking> = {
            let state = self.state.read();
            state
                .providers
                .iter()
                .filter(|(_, stats)| stats.total_requests > 0)
                .map(|(provider, stats)| ProviderRanking {
                    provider: provider.clone(),
                    success_rate: stats.success_rate(),
                    avg_latency_ms: stats.avg_latency_ms(),
                    sample_count: stats.total_requests,
                })
                .collect()
        };

        sort_rankings(&mut rankings);
        rankings
    }

    /// Best-ranked provider among `candidates`, if any of them has samples
    pub fn top_provider<'a, I>(&self, candidates: I) -> Option<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let candidates: Vec<&str> = candidates.into_iter().collect();
        self.provider_rankings()
            .into_iter()
            .find(|ranking| candidates.contains(&ranking.provider.as_str()))
            .map(|ranking| ranking.provider)
    }

    pub fn summary(&self) -> MetricsSummary {
        let rankings = self.provider_rankings();
        let state = self.state.read();

        let mut total_requests = 0;
        let mut success_count = 0;
        let mut failure_count = 0;
        let mut total_latency_ms = 0u64;
        let mut latency_samples = 0u64;
        let mut total_tokens = 0;
        for stats in state.providers.values() {
            total_requests += stats.total_requests;
            success_count += stats.success_count;
            failure_count += stats.failure_count;
            total_latency_ms = total_latency_ms.saturating_add(stats.total_latency_ms);
            latency_samples += stats.latency_samples;
            total_tokens += stats.total_tokens;
        }

        let (success_rate, avg_latency_ms) = if total_requests == 0 {
            (0.0, 0.0)
        } else {
            (
                success_count as f64 / total_requests as f64 * 100.0,
                if latency_samples == 0 {
                    0.0
                } else {
                    total_latency_ms as f64 / latency_samples as f64
                },
            )
        };

        MetricsSummary {
            total_requests,
            success_count,
            failure_count,
            success_rate,
            avg_latency_ms,
            total_tokens,
            provider_count: state.providers.len(),
            best_provider: rankings.first().map(|r| r.provider.clone()),
            worst_provider: rankings.last().map(|r| r.provider.clone()),
            started_at: self.started_at,
            uptime_secs: self.uptime().as_secs(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn provider_stats(&self, provider: &str) -> Option<ProviderStats> {
        self.state.read().providers.get(provider).cloned()
    }

    pub fn all_stats(&self) -> HashMap<String, ProviderStats> {
        self.state.read().providers.clone()
    }

    pub fn total_requests(&self) -> u64 {
        self.state
            .read()
            .providers
            .values()
            .map(|stats| stats.total_requests)
            .sum()
    }

    /// Up to `limit` most recent samples, oldest first, optionally for one
    /// provider
    pub fn recent_samples(&self, provider: Option<&str>, limit: usize) -> Vec<MetricSample> {
        let state = self.state.read();
        let mut samples: Vec<MetricSample> = state
            .history
            .iter()
            .rev()
            .filter(|sample| provider.is_none_or(|p| sample.provider == p))
            .take(limit)
            .cloned()
            .collect();
        samples.reverse();
        samples
    }

    pub fn reset(&self) {
        info!("Resetting orchestrator metrics");
        let mut state = self.state.write();
        state.providers.clear();
        state.history.clear();
    }

    /// Prometheus text exposition of the per-provider counters
    pub fn export_prometheus(&self) -> String {
        let summary = self.summary();
        let mut stats: Vec<(String, ProviderStats)> = self.all_stats().into_iter().collect();
        stats.sort_by(|a, b| a.0.cmp(&b.0));

        let mut output = String::new();
        let _ = writeln!(output, "# HELP orchestrator_requests_total Total provider calls");
        let _ = writeln!(output, "# TYPE orchestrator_requests_total counter");
        let _ = writeln!(output, "orchestrator_requests_total {}", summary.total_requests);
        let _ = writeln!(output, "# HELP orchestrator_requests_failed_total Failed provider calls");
        let _ = writeln!(output, "# TYPE orchestrator_requests_failed_total counter");
        let _ = writeln!(output, "orchestrator_requests_failed_total {}", summary.failure_count);
        let _ = writeln!(output, "# HELP orchestrator_uptime_seconds Seconds since the registry was created");
        let _ = writeln!(output, "# TYPE orchestrator_uptime_seconds gauge");
        let _ = writeln!(output, "orchestrator_uptime_seconds {}", summary.uptime_secs);

        let _ = writeln!(output, "# HELP orchestrator_provider_requests_total Calls per provider and outcome");
        let _ = writeln!(output, "# TYPE orchestrator_provider_requests_total counter");
        for (provider, stats) in &stats {
            let provider = escape_label(provider);
            let _ = writeln!(
                output,
                "orchestrator_provider_requests_total{{provider=\"{}\",outcome=\"success\"}} {}",
                provider, stats.success_count
            );
            let _ = writeln!(
                output,
                "orchestrator_provider_requests_total{{provider=\"{}\",outcome=\"failure\"}} {}",
                provider, stats.failure_count
            );
        }

        let _ = writeln!(output, "# HELP orchestrator_provider_latency_seconds Average call latency per provider");
        let _ = writeln!(output, "# TYPE orchestrator_provider_latency_seconds gauge");
        for (provider, stats) in &stats {
            let _ = writeln!(
                output,
                "orchestrator_provider_latency_seconds{{provider=\"{}\"}} {:.6}",
                escape_label(provider),
                stats.avg_latency_ms() / 1000.0
            );
        }

        let _ = writeln!(output, "# HELP orchestrator_provider_tokens_total Tokens reported per provider");
        let _ = writeln!(output, "# TYPE orchestrator_provider_tokens_total counter");
        for (provider, stats) in &stats {
            let _ = writeln!(
                output,
                "orchestrator_provider_tokens_total{{provider=\"{}\"}} {}",
                escape_label(provider),
                stats.total_tokens
            );
        }

        output
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new(default_history_size())
    }
}

fn escape_label(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
