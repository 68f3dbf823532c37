//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration as StdDuration;

use chrono::Duration;
use tokio::time::Instant;

/// How far ahead "never" is when a TTL overflows the clock.
const FAR_FUTURE: StdDuration = StdDuration::from_secs(86_400 * 365 * 30);

// == Cache Entry ==
/// A stored value and the absolute instant it stops being readable.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: String,
    /// Expiration instant on the monotonic clock
    pub expires_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry expiring `ttl` from now.
    ///
    /// A zero or negative `ttl` yields an entry that is already expired.
    pub fn new(value: String, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: deadline_after(ttl),
        }
    }

    // == Refresh ==
    /// Moves the expiration to `ttl` from now, leaving the value unchanged.
    pub fn refresh(&mut self, ttl: Duration) {
        self.expires_at = deadline_after(ttl);
    }

    // == Is Expired ==
    /// An entry is expired once its expiration instant is no longer in the future.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    // == Time To Live ==
    /// Returns `expires_at - now`, negative when the entry is stale.
    pub fn ttl_remaining(&self) -> Duration {
        let now = Instant::now();
        if self.expires_at >= now {
            to_signed(self.expires_at - now)
        } else {
            -to_signed(now - self.expires_at)
        }
    }
}

// == Utility Functions ==
/// Converts a signed TTL into an absolute instant relative to now.
pub(crate) fn deadline_after(ttl: Duration) -> Instant {
    let now = Instant::now();
    match ttl.to_std() {
        Ok(ahead) => now
            .checked_add(ahead)
            .unwrap_or_else(|| now + FAR_FUTURE),
        // to_std only fails for negative durations
        Err(_) => {
            let behind = (-ttl).to_std().unwrap_or_default();
            now.checked_sub(behind).unwrap_or(now)
        }
    }
}

fn to_signed(d: StdDuration) -> Duration {
    Duration::from_std(d).unwrap_or_else(|_| Duration::max_value())
}
