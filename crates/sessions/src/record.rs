//! In-memory representation of one session.
//!
//! A `SessionRecord` lives for a single request/response cycle: created
//! empty at `create`/`start`, replaced by `read`, pushed to the store at
//! `write`/`stop`, and discarded at `destroy`. Nothing survives in-process
//! across requests; state is rebuilt from the store's persisted bytes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Security metadata carried alongside the caller-visible data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityMetadata {
    /// Absolute instant after which the record is invalid. Stamped by the
    /// driver whenever the payload is assembled for a write.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// A single session's payload: data plus security metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Caller-visible session contents. Insertion order is irrelevant.
    #[serde(default)]
    pub data: HashMap<String, Value>,

    #[serde(default)]
    pub security: SecurityMetadata,
}

impl SessionRecord {
    /// Whether the record's expiry has passed. Records with no expiry stamp
    /// (never written) are not expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.security.expires_at, Some(at) if at <= now)
    }

    /// Stamp the expiry instant ahead of a write.
    pub fn stamp_expiry(&mut self, at: DateTime<Utc>) {
        self.security.expires_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn fresh_record_is_not_expired() {
        let record = SessionRecord::default();
        assert!(!record.is_expired(Utc::now()));
    }

    #[test]
    fn past_expiry_is_expired() {
        let mut record = SessionRecord::default();
        let now = Utc::now();
        record.stamp_expiry(now - Duration::seconds(1));
        assert!(record.is_expired(now));
    }

    #[test]
    fn expiry_at_now_counts_as_expired() {
        let mut record = SessionRecord::default();
        let now = Utc::now();
        record.stamp_expiry(now);
        assert!(record.is_expired(now));
    }
}
