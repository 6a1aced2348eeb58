//! Circuit breaker pattern for fault tolerance
//!
//! Stops calling a failing upstream until it has likely recovered.

mod breaker;
#[cfg(test)]
mod tests;
mod types;

pub use breaker::{CallPermit, CircuitBreaker};
pub use types::{BreakerRejection, CircuitBreakerConfig, CircuitBreakerStats, CircuitState};
