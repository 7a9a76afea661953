//! Observer events
//!
//! Components publish typed notifications on a shared [`EventBus`]. Nothing
//! in the request path depends on a subscriber being attached: emission never
//! blocks and never fails, and events are dropped when nobody listens.

use serde::Serialize;
use tokio::sync::broadcast;

/// Default buffered events per subscriber before lagging
pub const DEFAULT_EVENT_CAPACITY: usize = 1000;

/// Why a cache entry left the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionReason {
    /// Freed to make room for an insert
    Capacity,
    /// Past its TTL, found on read or by the sweeper
    Expired,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrchestratorEvent {
    CacheHit {
        key: String,
    },
    CacheMiss {
        key: String,
    },
    CacheEviction {
        key: String,
        reason: EvictionReason,
        size_bytes: usize,
    },
    RateLimitAcquired {
        provider: String,
        waited_ms: u64,
    },
    ConcurrentLimitExceeded {
        provider: String,
        max_concurrent: u32,
    },
    RateLimitQueueTimeout {
        provider: String,
        waited_ms: u64,
    },
    MetricRecorded {
        provider: String,
        success: bool,
        latency_ms: u64,
    },
    ProviderFallback {
        from: String,
        to: String,
    },
}

/// Broadcast channel of [`OrchestratorEvent`]s. Clones share the channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<OrchestratorEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn emit(&self, event: OrchestratorEvent) {
        if self.sender.receiver_count() > 0 {
            // Only fails when every receiver dropped in between
            let _ = self.sender.send(event);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrchestratorEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers_is_noop() {
        let bus = EventBus::default();
        bus.emit(OrchestratorEvent::CacheMiss { key: "k".into() });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_clones_share_the_channel() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let publisher = bus.clone();

        publisher.emit(OrchestratorEvent::ProviderFallback {
            from: "a".into(),
            to: "b".into(),
        });

        assert_eq!(
            rx.recv().await.unwrap(),
            OrchestratorEvent::ProviderFallback {
                from: "a".into(),
                to: "b".into()
            }
        );
    }

    #[test]
    fn test_events_serialize_with_type_tag() {
        let event = OrchestratorEvent::MetricRecorded {
            provider: "openai".into(),
            success: true,
            latency_ms: 12,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "metric_recorded");
        assert_eq!(json["latency_ms"], 12);
    }
}
