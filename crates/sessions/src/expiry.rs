//! Expiration arithmetic shared by the driver and the store adapter.
//!
//! Two store calling conventions consume the same numbers: an absolute
//! expiry instant stamped into the payload, and a relative TTL in seconds
//! handed to the store. Both must be derived from the same `now` so the
//! payload and the store agree on when the record dies.

use chrono::{DateTime, Duration, Utc};

/// Absolute expiry instant for a record written at `now` with a TTL.
pub fn expires_at(now: DateTime<Utc>, ttl_seconds: u64) -> DateTime<Utc> {
    now + Duration::seconds(ttl_seconds as i64)
}

/// Seconds remaining before `expires_at`, clamped to zero.
///
/// A record whose expiry has passed gets a remaining TTL of 0 and is
/// treated as absent by the driver on the next read.
pub fn remaining_seconds(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    expires_at.signed_duration_since(now).num_seconds().max(0) as u64
}
