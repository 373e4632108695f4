//! Cache Entry Module
//!
//! A cached upstream response together with its expiry deadline.

use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

// == Cache Entry ==
/// A single cached response.
///
/// Deadlines use tokio's monotonic clock so a paused test runtime controls
/// expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Decoded upstream response
    pub value: Value,
    /// When the entry was stored
    pub inserted_at: Instant,
    /// Instant from which the entry is treated as absent
    pub expires_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry that expires `ttl` from now.
    pub fn new(value: Value, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            inserted_at: now,
            expires_at: now + ttl,
        }
    }

    // == Is Expired ==
    /// An entry is expired once the current time reaches its deadline.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Remaining lifetime, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    /// Time since the entry was stored.
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.inserted_at)
    }
}
