//! Fixed-window rate limiter with an optional FIFO queue

use super::types::{RateLimitConfig, RateLimitError, RateLimiterStats};
use crate::recovery::instant_after;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::{Instant, sleep_until, timeout_at};

#[derive(Debug)]
struct Window {
    started_at: Instant,
    admitted: u32,
}

impl Window {
    fn roll(&mut self, now: Instant, length: Duration) {
        if now.duration_since(self.started_at) >= length {
            self.started_at = now;
            self.admitted = 0;
        }
    }

    fn resets_at(&self, length: Duration) -> Instant {
        instant_after(self.started_at, length)
    }
}

/// Keeps the queued-caller gauge right even when a waiting future is dropped
struct QueueSlot<'a>(&'a AtomicUsize);

impl<'a> QueueSlot<'a> {
    fn enter(gauge: &'a AtomicUsize) -> Self {
        gauge.fetch_add(1, Ordering::AcqRel);
        Self(gauge)
    }
}

impl Drop for QueueSlot<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Per-client request budget enforcement.
///
/// Queued callers line up on a fair async mutex: the holder is the head of the queue and
/// waits for the window to roll; everyone behind it waits in arrival order.
#[derive(Debug)]
pub struct RateLimiter {
    name: String,
    config: RateLimitConfig,
    window: Mutex<Window>,
    turnstile: tokio::sync::Mutex<()>,
    queued: AtomicUsize,
    total_admitted: AtomicU64,
    total_rejected: AtomicU64,
}

impl RateLimiter {
    pub fn new(name: impl Into<String>, config: RateLimitConfig) -> Self {
        Self {
            name: name.into(),
            config,
            window: Mutex::new(Window {
                started_at: Instant::now(),
                admitted: 0,
            }),
            turnstile: tokio::sync::Mutex::new(()),
            queued: AtomicUsize::new(0),
            total_admitted: AtomicU64::new(0),
            total_rejected: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Admit immediately if the current window has budget.
    ///
    /// On failure returns the instant the window resets.
    fn try_admit(&self) -> Result<(), Instant> {
        let now = Instant::now();
        let mut window = self.window.lock();
        window.roll(now, self.config.window);
        if window.admitted < self.config.max_requests {
            window.admitted += 1;
            self.total_admitted.fetch_add(1, Ordering::Relaxed);
            Ok(())
        } else {
            Err(window.resets_at(self.config.window))
        }
    }

    /// Admit without waiting
    pub fn try_acquire(&self) -> Result<(), RateLimitError> {
        // Do not cut in front of queued callers
        if self.queued.load(Ordering::Acquire) > 0 {
            self.total_rejected.fetch_add(1, Ordering::Relaxed);
            let retry_in = self.window.lock().resets_at(self.config.window);
            return Err(RateLimitError::Rejected {
                retry_in: retry_in.saturating_duration_since(Instant::now()),
            });
        }
        self.try_admit().map_err(|resets_at| {
            self.total_rejected.fetch_add(1, Ordering::Relaxed);
            RateLimitError::Rejected {
                retry_in: resets_at.saturating_duration_since(Instant::now()),
            }
        })
    }

    /// Admit, queueing when configured to, giving up if `deadline` would pass first
    pub async fn acquire(&self, deadline: Instant) -> Result<(), RateLimitError> {
        if !self.config.queue_requests {
            return self.try_acquire();
        }

        let start = Instant::now();
        let result = {
            let _slot = QueueSlot::enter(&self.queued);
            self.wait_in_queue(deadline).await
        };

        if result.is_err() {
            self.total_rejected.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                limiter = %self.name,
                waited_ms = start.elapsed().as_millis() as u64,
                "Gave up waiting in rate limit queue"
            );
        } else if start.elapsed() > Duration::from_millis(5) {
            tracing::debug!(
                limiter = %self.name,
                waited_ms = start.elapsed().as_millis() as u64,
                "Admitted after queueing"
            );
        }
        result.map_err(|_| RateLimitError::QueueTimeout {
            waited: start.elapsed(),
        })
    }

    async fn wait_in_queue(&self, deadline: Instant) -> Result<(), ()> {
        let _turn = timeout_at(deadline, self.turnstile.lock())
            .await
            .map_err(|_| ())?;

        loop {
            match self.try_admit() {
                Ok(()) => return Ok(()),
                Err(resets_at) => {
                    if resets_at > deadline {
                        return Err(());
                    }
                    sleep_until(resets_at).await;
                }
            }
        }
    }

    pub fn stats(&self) -> RateLimiterStats {
        let admitted_in_window = {
            let mut window = self.window.lock();
            window.roll(Instant::now(), self.config.window);
            window.admitted
        };
        RateLimiterStats {
            admitted_in_window,
            max_requests: self.config.max_requests,
            queued: self.queued.load(Ordering::Acquire),
            total_admitted: self.total_admitted.load(Ordering::Relaxed),
            total_rejected: self.total_rejected.load(Ordering::Relaxed),
        }
    }
}
