//! Tests for circuit breaker functionality

use std::sync::Arc;
use std::time::Duration;

use super::breaker::CircuitBreaker;
use super::types::{CircuitBreakerConfig, CircuitState};

fn config(failure_threshold: u32, success_threshold: u32, recovery_ms: u64) -> CircuitBreakerConfig {
    CircuitBreakerConfig {
        failure_threshold,
        success_threshold,
        recovery_timeout: Duration::from_millis(recovery_ms),
        ..Default::default()
    }
}

#[test]
fn test_circuit_starts_closed() {
    let cb = CircuitBreaker::new("test");
    assert_eq!(cb.state(), CircuitState::Closed);
    assert!(cb.try_acquire().is_ok());
}

#[test]
fn test_circuit_opens_after_threshold() {
    let cb = CircuitBreaker::with_config("test", config(3, 1, 60_000));

    cb.try_acquire().unwrap().failure();
    cb.try_acquire().unwrap().failure();
    assert_eq!(cb.state(), CircuitState::Closed);

    cb.try_acquire().unwrap().failure();
    assert_eq!(cb.state(), CircuitState::Open);

    let rejection = cb.try_acquire().unwrap_err();
    assert_eq!(rejection.state, CircuitState::Open);
    assert!(rejection.retry_in.is_some());
    assert_eq!(cb.stats().total_rejections, 1);
}

#[test]
fn test_success_resets_failure_count() {
    let cb = CircuitBreaker::with_config("test", config(3, 1, 60_000));

    cb.try_acquire().unwrap().failure();
    cb.try_acquire().unwrap().failure();
    cb.try_acquire().unwrap().success();
    assert_eq!(cb.stats().consecutive_failures, 0);

    cb.try_acquire().unwrap().failure();
    cb.try_acquire().unwrap().failure();
    assert_eq!(cb.state(), CircuitState::Closed);
}

#[tokio::test]
async fn test_probe_admitted_after_recovery_timeout() {
    let cb = CircuitBreaker::with_config("test", config(1, 1, 50));

    cb.try_acquire().unwrap().failure();
    assert!(cb.try_acquire().is_err());

    tokio::time::sleep(Duration::from_millis(60)).await;

    let probe = cb.try_acquire().expect("probe should be admitted");
    assert!(probe.is_probe());
    assert_eq!(cb.state(), CircuitState::HalfOpen);

    // Only one probe at a time with the default half-open budget
    assert!(cb.try_acquire().is_err());
    probe.success();
    assert_eq!(cb.state(), CircuitState::Closed);
}

#[tokio::test]
async fn test_circuit_closes_after_successes() {
    let mut cfg = config(1, 2, 10);
    cfg.half_open_max_requests = 2;
    let cb = CircuitBreaker::with_config("test", cfg);

    cb.try_acquire().unwrap().failure();
    tokio::time::sleep(Duration::from_millis(20)).await;

    cb.try_acquire().unwrap().success();
    assert_eq!(cb.state(), CircuitState::HalfOpen);
    assert_eq!(cb.stats().consecutive_successes, 1);

    cb.try_acquire().unwrap().success();
    let stats = cb.stats();
    assert_eq!(stats.state, CircuitState::Closed);
    assert_eq!(stats.consecutive_failures, 0);
    assert_eq!(stats.consecutive_successes, 0);
}

#[tokio::test]
async fn test_half_open_failure_reopens() {
    let mut cfg = config(1, 3, 10);
    cfg.half_open_max_requests = 3;
    let cb = CircuitBreaker::with_config("test", cfg);

    cb.try_acquire().unwrap().failure();
    tokio::time::sleep(Duration::from_millis(20)).await;

    cb.try_acquire().unwrap().success();
    cb.try_acquire().unwrap().failure();

    let stats = cb.stats();
    assert_eq!(stats.state, CircuitState::Open);
    assert_eq!(stats.consecutive_successes, 0);
    assert!(cb.try_acquire().is_err());
}

#[tokio::test]
async fn test_dropped_probe_releases_slot() {
    let cb = CircuitBreaker::with_config("test", config(1, 1, 10));

    cb.try_acquire().unwrap().failure();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let probe = cb.try_acquire().unwrap();
    drop(probe);
    assert_eq!(cb.stats().half_open_in_flight, 0);
    assert!(cb.try_acquire().is_ok());
}

#[tokio::test]
async fn test_concurrent_probe_successes_close_once() {
    let mut cfg = config(1, 1, 10);
    cfg.half_open_max_requests = 2;
    let cb = CircuitBreaker::with_config("test", cfg);

    cb.try_acquire().unwrap().failure();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let first = cb.try_acquire().unwrap();
    let second = cb.try_acquire().unwrap();
    first.success();
    assert_eq!(cb.state(), CircuitState::Closed);

    // Stale probe from the previous half-open generation must not disturb the closed state
    second.failure();
    let stats = cb.stats();
    assert_eq!(stats.state, CircuitState::Closed);
    assert_eq!(stats.consecutive_failures, 0);
}

#[tokio::test]
async fn test_concurrent_failures_open_exactly_at_threshold() {
    let cb = Arc::new(CircuitBreaker::with_config("test", config(5, 1, 60_000)));

    let mut handles = Vec::new();
    for _ in 0..5 {
        let cb = cb.clone();
        handles.push(tokio::spawn(async move {
            if let Ok(permit) = cb.try_acquire() {
                permit.failure();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(cb.state(), CircuitState::Open);
    assert_eq!(cb.stats().total_failures, 5);
}

#[test]
fn test_manual_trip_and_reset() {
    let cb = CircuitBreaker::new("test");
    cb.trip();
    assert_eq!(cb.state(), CircuitState::Open);
    cb.reset();
    assert_eq!(cb.state(), CircuitState::Closed);
    assert!(cb.try_acquire().is_ok());
}

#[test]
fn test_stats() {
    let cb = CircuitBreaker::new("test");

    cb.record_success();
    cb.record_success();
    cb.record_failure();

    let stats = cb.stats();
    assert_eq!(stats.total_calls, 3);
    assert_eq!(stats.total_failures, 1);
    assert!((stats.failure_rate() - 33.33).abs() < 0.1);
}

#[test]
fn test_config_validation() {
    assert!(CircuitBreakerConfig::default().validate().is_ok());
    assert!(config(0, 1, 10).validate().is_err());
    assert!(config(1, 0, 10).validate().is_err());
}
