//! API key store row types

use chrono::{DateTime, Utc};

/// A stored API key (the raw key is never persisted)
#[derive(Debug, Clone)]
pub struct ApiKeyRecord {
    pub id: i64,
    pub key_hash: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_count: i64,
}

impl ApiKeyRecord {
    /// Expired when an expiry exists and is not in the future
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired(now)
    }
}
