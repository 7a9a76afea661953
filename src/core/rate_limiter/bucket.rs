//! Token bucket with a FIFO wait queue
//!
//! Tokens refill lazily on every acquire and periodically from a ticker owned
//! by the bucket. A caller that cannot be served immediately joins the queue
//! and waits for the ticker (or a later acquire) to hand it tokens, racing a
//! deadline timer. Waiters are always served in arrival order.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::debug;

use super::types::{BucketConfig, BucketSnapshot, QueueTimeout};
use crate::utils::sys::Ticker;

/// Absorbs float drift from repeated fractional refills
const TOKEN_EPSILON: f64 = 1e-9;

fn has_tokens(tokens: f64, cost: f64) -> bool {
    tokens + TOKEN_EPSILON >= cost
}

struct Waiter {
    id: u64,
    cost: f64,
    deadline: Instant,
    notify: oneshot::Sender<()>,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
    queue: VecDeque<Waiter>,
    next_waiter_id: u64,
}

struct BucketInner {
    name: String,
    config: BucketConfig,
    state: Mutex<BucketState>,
}

impl BucketInner {
    /// Add whole elapsed intervals worth of tokens, capped at capacity
    fn refill(&self, state: &mut BucketState, now: Instant) {
        let interval = self.config.interval.as_nanos().max(1);
        let elapsed = now.saturating_duration_since(state.last_refill).as_nanos();
        let intervals = elapsed / interval;
        if intervals == 0 {
            return;
        }

        state.tokens = (state.tokens + intervals as f64 * self.config.refill_amount)
            .min(self.config.capacity);
        if self.config.capacity - state.tokens < TOKEN_EPSILON {
            state.tokens = self.config.capacity;
        }
        let advanced = u64::try_from(intervals * interval).unwrap_or(u64::MAX);
        state.last_refill += Duration::from_nanos(advanced);
    }

    /// Hand tokens to queued waiters in arrival order
    fn drain(&self, state: &mut BucketState, now: Instant) {
        while let Some(front) = state.queue.front() {
            if front.notify.is_closed() || front.deadline <= now {
                // Cancelled or expired; dropping the sender wakes the waiter
                state.queue.pop_front();
                continue;
            }
            if !has_tokens(state.tokens, front.cost) {
                break;
            }

            if let Some(waiter) = state.queue.pop_front() {
                let before = state.tokens;
                state.tokens = (state.tokens - waiter.cost).max(0.0);
                if waiter.notify.send(()).is_err() {
                    state.tokens = before;
                }
            }
        }
    }

    fn tick(&self) {
        let now = Instant::now();
        let mut state = self.state.lock();
        self.refill(&mut state, now);
        self.drain(&mut state, now);
    }
}

/// Token bucket shared by every caller of one provider (or of all providers,
/// for the global limit)
pub struct TokenBucket {
    inner: Arc<BucketInner>,
    ticker: Mutex<Option<Ticker>>,
    stopped: AtomicBool,
}

impl TokenBucket {
    /// Create a full bucket. The refill ticker starts immediately when a tokio
    /// runtime is available, otherwise on the first acquire.
    pub fn new(name: impl Into<String>, config: BucketConfig) -> Self {
        let inner = Arc::new(BucketInner {
            name: name.into(),
            state: Mutex::new(BucketState {
                tokens: config.capacity,
                last_refill: Instant::now(),
                queue: VecDeque::new(),
                next_waiter_id: 0,
            }),
            config,
        });

        let bucket = Self {
            inner,
            ticker: Mutex::new(None),
            stopped: AtomicBool::new(false),
        };
        bucket.ensure_ticker();
        bucket
    }

    fn ensure_ticker(&self) {
        let mut ticker = self.ticker.lock();
        if ticker.is_some() || self.stopped.load(Ordering::Acquire) {
            return;
        }
        let weak: Weak<BucketInner> = Arc::downgrade(&self.inner);
        *ticker = Ticker::spawn("token-bucket", self.inner.config.interval, move || {
            match weak.upgrade() {
                Some(inner) => {
                    inner.tick();
                    true
                }
                None => false,
            }
        });
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn config(&self) -> &BucketConfig {
        &self.inner.config
    }

    /// Requests above capacity could never be served; they are charged the
    /// full capacity instead.
    fn effective_cost(&self, cost: f64) -> f64 {
        cost.clamp(0.0, self.inner.config.capacity)
    }

    /// Take `cost` tokens without waiting. Fails when others are queued.
    pub fn try_acquire(&self, cost: f64) -> bool {
        let cost = self.effective_cost(cost);
        let now = Instant::now();
        let mut state = self.inner.state.lock();
        self.inner.refill(&mut state, now);
        self.inner.drain(&mut state, now);

        if state.queue.is_empty() && has_tokens(state.tokens, cost) {
            state.tokens = (state.tokens - cost).max(0.0);
            true
        } else {
            false
        }
    }

    /// Take `cost` tokens, queueing behind earlier callers when the bucket is
    /// short. Returns how long the caller waited.
    pub async fn acquire(&self, cost: f64) -> Result<Duration, QueueTimeout> {
        self.ensure_ticker();

        let cost = self.effective_cost(cost);
        let started = Instant::now();
        let queue_timeout = self.inner.config.queue_timeout;

        let (id, mut rx) = {
            let mut state = self.inner.state.lock();
            self.inner.refill(&mut state, started);
            self.inner.drain(&mut state, started);

            if state.queue.is_empty() && has_tokens(state.tokens, cost) {
                state.tokens = (state.tokens - cost).max(0.0);
                return Ok(Duration::ZERO);
            }

            let (tx, rx) = oneshot::channel();
            let id = state.next_waiter_id;
            state.next_waiter_id += 1;
            state.queue.push_back(Waiter {
                id,
                cost,
                deadline: started + queue_timeout,
                notify: tx,
            });
            debug!(
                bucket = %self.inner.name,
                queued = state.queue.len(),
                tokens = state.tokens,
                "waiting for tokens"
            );
            (id, rx)
        };

        match tokio::time::timeout(queue_timeout, &mut rx).await {
            Ok(Ok(())) => Ok(started.elapsed()),
            // Sender dropped: expired by the ticker or the bucket went away
            Ok(Err(_)) => Err(QueueTimeout {
                waited: started.elapsed(),
            }),
            Err(_) => {
                let mut state = self.inner.state.lock();
                if let Some(position) = state.queue.iter().position(|w| w.id == id) {
                    state.queue.remove(position);
                    return Err(QueueTimeout {
                        waited: started.elapsed(),
                    });
                }
                drop(state);
                // Served between the deadline firing and taking the lock
                match rx.try_recv() {
                    Ok(()) => Ok(started.elapsed()),
                    Err(_) => Err(QueueTimeout {
                        waited: started.elapsed(),
                    }),
                }
            }
        }
    }

    /// Run one refill-and-drain step now
    pub fn tick(&self) {
        self.inner.tick();
    }

    pub fn snapshot(&self) -> BucketSnapshot {
        let now = Instant::now();
        let mut state = self.inner.state.lock();
        self.inner.refill(&mut state, now);
        BucketSnapshot {
            tokens: state.tokens,
            capacity: self.inner.config.capacity,
            queued: state.queue.len(),
        }
    }

    /// Stop the refill ticker for good. Acquires still refill lazily and
    /// queued callers still time out normally.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        if let Some(ticker) = self.ticker.lock().take() {
            ticker.stop();
        }
    }
}

impl std::fmt::Debug for TokenBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("TokenBucket")
            .field("name", &self.inner.name)
            .field("tokens", &snapshot.tokens)
            .field("capacity", &snapshot.capacity)
            .field("queued", &snapshot.queued)
            .finish()
    }
}
