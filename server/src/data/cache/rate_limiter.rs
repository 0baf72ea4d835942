//! In-memory rate limiter
//!
//! Implements a fixed window counter algorithm with burst allowance.
//!
//! # Algorithm
//!
//! Uses fixed time windows (60 seconds) with atomic counters. Each window
//! starts when the first request arrives and resets after the window
//! duration expires. The total limit is `requests_per_window + burst`.
//!
//! # Known Limitations
//!
//! **Window Boundary Burst**: Fixed window algorithms allow up to 2x the limit
//! at window boundaries. With a 100 req/min limit, 100 requests at second 59
//! of one window and 100 more at second 0 of the next all pass.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::counter::WindowCounters;
use crate::core::config::RateLimitConfig;
use crate::core::constants::{DEFAULT_RATE_LIMIT_WINDOW_SECS, RATE_LIMIT_SWEEP_INTERVAL_SECS};

/// Identifier used when limits are shared by all clients
pub const GLOBAL_IDENTIFIER: &str = "global";

/// Rate limit bucket configuration
#[derive(Debug, Clone)]
pub struct RateLimitBucket {
    /// Bucket name, part of the counter key
    pub name: &'static str,
    /// Maximum requests per window
    pub requests_per_window: u32,
    /// Window duration in seconds
    pub window_secs: u64,
    /// Burst allowance (additional requests above limit)
    pub burst: u32,
}

impl RateLimitBucket {
    /// API bucket sized from configuration
    pub fn api(config: &RateLimitConfig) -> Self {
        Self {
            name: "api",
            requests_per_window: config.requests_per_minute,
            window_secs: DEFAULT_RATE_LIMIT_WINDOW_SECS,
            burst: config.burst,
        }
    }

    /// Get the total limit (requests + burst)
    pub fn total_limit(&self) -> u32 {
        self.requests_per_window.saturating_add(self.burst)
    }
}

/// Rate limit check result
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    /// Whether the request is allowed
    pub allowed: bool,
    /// Requests remaining in window
    pub remaining: u32,
    /// Total limit (rpm + burst)
    pub limit: u32,
    /// Unix timestamp when window resets
    pub reset_at: u64,
    /// Seconds until retry (only if blocked)
    pub retry_after: Option<u64>,
}

/// Rate limiter over shared window counters
#[derive(Clone, Default)]
pub struct RateLimiter {
    counters: Arc<WindowCounters>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request for `identifier` in `bucket`
    pub fn check(&self, bucket: &RateLimitBucket, identifier: &str) -> RateLimitResult {
        let key = format!("ratelimit:{}:{}", bucket.name, identifier);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "System clock is before UNIX epoch");
                0
            });

        let snapshot = self
            .counters
            .incr(&key, Duration::from_secs(bucket.window_secs));

        let limit = bucket.total_limit();
        let limit_i64 = i64::from(limit);
        let allowed = snapshot.count <= limit_i64;
        let remaining = limit_i64
            .saturating_sub(snapshot.count)
            .try_into()
            .unwrap_or(0u32);

        let ttl = snapshot
            .expires_at
            .saturating_duration_since(Instant::now())
            .as_secs();
        let reset_at = now.saturating_add(ttl);

        tracing::trace!(
            bucket = bucket.name,
            %identifier,
            count = snapshot.count,
            limit,
            allowed,
            "Rate limit check"
        );

        RateLimitResult {
            allowed,
            remaining,
            limit,
            reset_at,
            retry_after: if allowed { None } else { Some(ttl.max(1)) },
        }
    }

    /// Periodically drop expired windows
    pub fn start_sweep_task(&self, mut shutdown_rx: watch::Receiver<bool>) -> JoinHandle<()> {
        let counters = Arc::clone(&self.counters);
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(RATE_LIMIT_SWEEP_INTERVAL_SECS));
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::debug!("Rate limit sweep task shutting down");
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        let removed = counters.sweep();
                        if removed > 0 {
                            tracing::trace!(
                                removed,
                                remaining = counters.len(),
                                "Swept rate limit windows"
                            );
                        }
                    }
                }
            }
        })
    }
}
