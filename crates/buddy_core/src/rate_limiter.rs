//! Provider Rate Limiter v0.3.0
//!
//! Fixed-window throttle guarding every outbound call to the external
//! evidence provider. The limit is per provider account, so one limiter
//! instance is shared process-wide and all concurrent requests queue
//! through it in submission order.
//!
//! The window state lives in a dedicated worker task behind an mpsc queue;
//! callers receive a oneshot grant when their slot opens. The channel gives
//! FIFO ordering by construction and the worker never holds a lock across
//! an await.

use std::future::Future;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Fixed-window FIFO rate limiter.
///
/// Must be created inside a tokio runtime (the worker task is spawned on
/// construction). Dropping the limiter stops the worker once the queue
/// drains.
#[derive(Debug)]
pub struct RateLimiter {
    queue: mpsc::UnboundedSender<oneshot::Sender<()>>,
}

impl RateLimiter {
    /// Create a limiter allowing `max_calls_per_interval` dispatches per
    /// `interval`. A capacity of zero is promoted to one so the queue can
    /// always drain.
    pub fn new(max_calls_per_interval: u32, interval: Duration) -> Self {
        let max_calls = max_calls_per_interval.max(1);
        let interval = if interval.is_zero() {
            Duration::from_millis(1)
        } else {
            interval
        };
        let (queue, mut pending) = mpsc::unbounded_channel::<oneshot::Sender<()>>();

        tokio::spawn(async move {
            let mut window_start = Instant::now();
            let mut dispatched: u32 = 0;

            while let Some(grant) = pending.recv().await {
                let now = Instant::now();
                if now.duration_since(window_start) >= interval {
                    window_start = now;
                    dispatched = 0;
                }

                if dispatched >= max_calls {
                    let resume = window_start + interval;
                    debug!(
                        wait_ms = resume.saturating_duration_since(now).as_millis() as u64,
                        "rate limiter window exhausted, queueing"
                    );
                    sleep_until(resume).await;
                    window_start = Instant::now();
                    dispatched = 0;
                }

                // The slot is consumed at dispatch time: a caller that stopped
                // waiting still counts against the window.
                dispatched += 1;
                let _ = grant.send(());
            }
        });

        Self { queue }
    }

    /// Run `task` once a window slot is available.
    ///
    /// The limiter itself never fails; a failing task rejects only its own
    /// caller and never blocks the queue.
    pub async fn throttle<F>(&self, task: F) -> F::Output
    where
        F: Future,
    {
        let (grant, slot) = oneshot::channel();
        if self.queue.send(grant).is_ok() {
            // The worker always answers every queued grant.
            let _ = slot.await;
        }
        task.await
    }
}

// ============================================================================
// Tests
// ============================================================================
