//! Circuit breaker implementation
//!
//! All state lives behind a single mutex and only the transition functions below mutate it.
//! The lock is never held across an await point.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use super::types::{BreakerRejection, CircuitBreakerConfig, CircuitBreakerStats, CircuitState};

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    consecutive_successes: u32,
    opened_at: Option<Instant>,
    half_open_in_flight: u32,
    /// Bumped on every transition; outcomes from an older generation are stale
    generation: u64,
}

impl BreakerState {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            consecutive_successes: 0,
            opened_at: None,
            half_open_in_flight: 0,
            generation: 0,
        }
    }
}

/// Circuit breaker protecting one upstream
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
    total_calls: AtomicU64,
    total_failures: AtomicU64,
    total_rejections: AtomicU64,
}

/// Admission ticket for one call.
///
/// Settle it with `success()` or `failure()`. Dropping it unsettled (e.g. the caller's
/// future was cancelled) releases a half-open probe slot without recording an outcome.
#[must_use = "settle the permit with success() or failure()"]
#[derive(Debug)]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    probe: bool,
    settled: bool,
}

impl CallPermit<'_> {
    /// Whether this call was admitted as a half-open probe
    pub fn is_probe(&self) -> bool {
        self.probe
    }

    pub fn success(mut self) {
        self.settled = true;
        self.breaker.on_success(self.generation, self.probe);
    }

    pub fn failure(mut self) {
        self.settled = true;
        self.breaker.on_failure(self.generation, self.probe);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.probe {
            self.breaker.release_probe(self.generation);
        }
    }
}

impl CircuitBreaker {
    /// Create a new circuit breaker with default config
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, CircuitBreakerConfig::default())
    }

    /// Create a new circuit breaker with custom config
    pub fn with_config(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerState::new()),
            total_calls: AtomicU64::new(0),
            total_failures: AtomicU64::new(0),
            total_rejections: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current stored state. Does not perform the open → half-open transition;
    /// that happens on the next admission attempt.
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Ask to make a call
    pub fn try_acquire(&self) -> Result<CallPermit<'_>, BreakerRejection> {
        let mut inner = self.inner.lock();

        if inner.state == CircuitState::Open {
            let elapsed = inner.opened_at.map(|at| at.elapsed());
            match elapsed {
                Some(elapsed) if elapsed < self.config.recovery_timeout => {
                    drop(inner);
                    self.total_rejections.fetch_add(1, Ordering::Relaxed);
                    return Err(BreakerRejection {
                        state: CircuitState::Open,
                        retry_in: Some(self.config.recovery_timeout - elapsed),
                    });
                }
                _ => self.transition_to_half_open(&mut inner),
            }
        }

        match inner.state {
            CircuitState::Closed => Ok(CallPermit {
                breaker: self,
                generation: inner.generation,
                probe: false,
                settled: false,
            }),
            CircuitState::HalfOpen => {
                if inner.half_open_in_flight >= self.config.half_open_max_requests {
                    drop(inner);
                    self.total_rejections.fetch_add(1, Ordering::Relaxed);
                    return Err(BreakerRejection {
                        state: CircuitState::HalfOpen,
                        retry_in: None,
                    });
                }
                inner.half_open_in_flight += 1;
                Ok(CallPermit {
                    breaker: self,
                    generation: inner.generation,
                    probe: true,
                    settled: false,
                })
            }
            CircuitState::Open => unreachable!("open state handled above"),
        }
    }

    /// Record a success outside of the permit flow
    pub fn record_success(&self) {
        let generation = self.inner.lock().generation;
        self.on_success(generation, false);
    }

    /// Record a failure outside of the permit flow
    pub fn record_failure(&self) {
        let generation = self.inner.lock().generation;
        self.on_failure(generation, false);
    }

    fn on_success(&self, generation: u64, probe: bool) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            return;
        }
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures = 0;
            }
            CircuitState::HalfOpen => {
                if probe {
                    inner.half_open_in_flight = inner.half_open_in_flight.saturating_sub(1);
                }
                inner.consecutive_successes += 1;
                if inner.consecutive_successes >= self.config.success_threshold {
                    self.transition_to_closed(&mut inner);
                }
            }
            CircuitState::Open => {}
        }
    }

    fn on_failure(&self, generation: u64, probe: bool) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        self.total_failures.fetch_add(1, Ordering::Relaxed);

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            return;
        }
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.config.failure_threshold {
                    self.transition_to_open(&mut inner);
                }
            }
            CircuitState::HalfOpen => {
                if probe {
                    inner.half_open_in_flight = inner.half_open_in_flight.saturating_sub(1);
                }
                // Any failure in half-open state opens the circuit again
                self.transition_to_open(&mut inner);
            }
            CircuitState::Open => {}
        }
    }

    fn release_probe(&self, generation: u64) {
        let mut inner = self.inner.lock();
        if inner.generation == generation && inner.state == CircuitState::HalfOpen {
            inner.half_open_in_flight = inner.half_open_in_flight.saturating_sub(1);
        }
    }

    /// Get circuit breaker statistics
    pub fn stats(&self) -> CircuitBreakerStats {
        let inner = self.inner.lock();
        CircuitBreakerStats {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            consecutive_successes: inner.consecutive_successes,
            half_open_in_flight: inner.half_open_in_flight,
            total_calls: self.total_calls.load(Ordering::Relaxed),
            total_failures: self.total_failures.load(Ordering::Relaxed),
            total_rejections: self.total_rejections.load(Ordering::Relaxed),
            opened_at: inner.opened_at,
        }
    }

    /// Manually reset the circuit breaker to closed state
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        self.transition_to_closed(&mut inner);
    }

    /// Manually open the circuit breaker
    pub fn trip(&self) {
        let mut inner = self.inner.lock();
        self.transition_to_open(&mut inner);
    }

    fn transition_to_open(&self, inner: &mut BreakerState) {
        let failures = inner.consecutive_failures;
        inner.state = CircuitState::Open;
        inner.opened_at = Some(Instant::now());
        inner.consecutive_successes = 0;
        inner.half_open_in_flight = 0;
        inner.generation += 1;

        tracing::warn!(
            circuit = %self.name,
            consecutive_failures = failures,
            "Circuit breaker opened"
        );
    }

    fn transition_to_half_open(&self, inner: &mut BreakerState) {
        inner.state = CircuitState::HalfOpen;
        inner.consecutive_successes = 0;
        inner.half_open_in_flight = 0;
        inner.generation += 1;

        tracing::info!(
            circuit = %self.name,
            "Circuit breaker transitioning to half-open"
        );
    }

    fn transition_to_closed(&self, inner: &mut BreakerState) {
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.consecutive_successes = 0;
        inner.half_open_in_flight = 0;
        inner.opened_at = None;
        inner.generation += 1;

        tracing::info!(
            circuit = %self.name,
            "Circuit breaker closed"
        );
    }
}
