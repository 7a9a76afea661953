//! Owned periodic background task
//!
//! A [`Ticker`] belongs to exactly one component. It is started by that
//! component's constructor and stops when the owner calls [`Ticker::stop`] or
//! drops it. There are no process-wide timers.

use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Periodic task handle
#[derive(Debug)]
pub struct Ticker {
    name: &'static str,
    period: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Ticker {
    /// Run `tick` every `period` until it returns `false` or the ticker stops.
    ///
    /// Returns `None` outside a tokio runtime. Components then fall back to
    /// lazy maintenance on their own call paths.
    pub fn spawn<F>(name: &'static str, period: Duration, mut tick: F) -> Option<Self>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        Self::spawn_async(name, period, move || std::future::ready(tick()))
    }

    /// Async variant of [`Ticker::spawn`]
    pub fn spawn_async<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> Option<Self>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().ok()?;
        let period = period.max(MIN_PERIOD);

        let handle = runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                if !tick().await {
                    debug!(ticker = name, "owner gone, ticker exiting");
                    break;
                }
            }
        });

        debug!(ticker = name, period_ms = period.as_millis() as u64, "ticker started");

        Some(Self {
            name,
            period,
            handle: Mutex::new(Some(handle)),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Stop the task. Idempotent.
    pub fn stop(&self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
            debug!(ticker = self.name, "ticker stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.get_mut().take() {
            handle.abort();
        }
    }
}
