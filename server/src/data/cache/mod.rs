//! Cache module
//!
//! In-process counters (dashmap) and the rate limiter built on them.

mod counter;
pub mod rate_limiter;

pub use counter::{CounterSnapshot, WindowCounters};
pub use rate_limiter::{GLOBAL_IDENTIFIER, RateLimitBucket, RateLimitResult, RateLimiter};
