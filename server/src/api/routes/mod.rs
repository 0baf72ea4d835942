//! API route handlers

pub mod health;
pub mod ingest;
pub mod logs;
pub mod metrics;

use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::core::constants::APP_NAME;
use crate::utils::time::format_uptime;

/// Process identity reported by health and status endpoints
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub environment: String,
    pub started_at: DateTime<Utc>,
    started: Instant,
}

impl ServiceInfo {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            name: APP_NAME,
            version: env!("CARGO_PKG_VERSION"),
            environment: environment.into(),
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    /// Time since start, e.g. `1h 2m 3s`
    pub fn uptime(&self) -> String {
        format_uptime(self.started.elapsed().as_secs())
    }
}
