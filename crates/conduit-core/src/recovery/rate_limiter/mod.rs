//! Rate limiting for outbound API calls
//!
//! Caps admissions per fixed window for one client, either rejecting or queueing the excess.

mod limiter;
mod types;

pub use limiter::RateLimiter;
pub use types::{RateLimitConfig, RateLimitError, RateLimiterStats};
