//! Session idle expiry.

use chrono::{DateTime, Utc};

/// Whether a session idle since `last_turn_at` should be evicted.
pub fn idle_expired(last_turn_at: DateTime<Utc>, now: DateTime<Utc>, idle_timeout_s: u64) -> bool {
    now.signed_duration_since(last_turn_at).num_seconds() >= idle_timeout_s as i64
}
