use serde::Serialize;

/// Structured trace events emitted across all SessionVault crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    SessionCreated {
        session_id: String,
    },
    SessionLoaded {
        store_key: String,
    },
    SessionMiss {
        store_key: String,
        reason: String,
    },
    SessionWritten {
        store_key: String,
        ttl_seconds: u64,
    },
    SessionStopped {
        session_id: String,
    },
    SessionDestroyed {
        store_key: String,
    },
    StoreWriteFallback {
        key: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "sv_event");
    }
}
