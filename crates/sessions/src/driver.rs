//! Session driver state machine.
//!
//! Owns the lifecycle of one session within a single request/response
//! cycle: `create`/`start` bring the driver into `Started`, `read`/`write`
//! move the payload between the in-memory record and the store, `stop`
//! persists and hands the id to the cookie transport, `destroy` removes the
//! record entirely.
//!
//! No store I/O happens outside the `Started` state. Every ordinary I/O
//! failure — store down, payload malformed or foreign, record expired —
//! degrades to a `false` result and an empty session; the driver never
//! panics for those.
//!
//! One driver instance serves one request. Two processes holding the same
//! session id race on read-modify-write with no version token or lock:
//! last writer wins. Callers follow a read-once/write-once pattern per
//! request, which keeps that window narrow.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use sv_domain::config::{SessionConfig, StopReporting};
use sv_domain::error::Result;
use sv_domain::trace::TraceEvent;

use crate::codec;
use crate::cookie::CookieTransport;
use crate::expiry;
use crate::ids::IdGenerator;
use crate::record::SessionRecord;
use crate::store::KeyValueStoreAdapter;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Driver state
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Lifecycle state of a driver instance.
///
/// `Uninitialized → Started` via `create`/`start`; `Started → Stopped` via
/// `stop`; `Started`/`Stopped` `→ Destroyed` via `destroy`. The only way
/// out of `Destroyed` is a new `create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Uninitialized,
    Started,
    Stopped,
    Destroyed,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session driver
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Session driver mediating between the record, the codec, the expiry
/// arithmetic, and the store adapter.
///
/// One implementation for every backend: store-specific quirks live inside
/// the [`KeyValueStoreAdapter`], and the request layer holds and passes the
/// instance explicitly (no process-wide current-session singleton).
pub struct SessionDriver {
    config: SessionConfig,
    state: DriverState,
    session_id: Option<String>,
    record: SessionRecord,
    store: KeyValueStoreAdapter,
    cookies: Box<dyn CookieTransport>,
    ids: Arc<dyn IdGenerator>,
}

impl SessionDriver {
    /// Build a driver for one request/response cycle.
    ///
    /// Fails only on invalid configuration; per-request operations never
    /// return errors.
    pub fn new(
        config: SessionConfig,
        store: KeyValueStoreAdapter,
        cookies: Box<dyn CookieTransport>,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: DriverState::Uninitialized,
            session_id: None,
            record: SessionRecord::default(),
            store,
            cookies,
            ids,
        })
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Lifecycle
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Create a new session with a freshly minted id.
    ///
    /// Fails if a session is already started. Otherwise resets the record,
    /// begins a new lifecycle (the only way back out of `Destroyed`), and
    /// returns the internal `start()` result — `false` for a brand-new id,
    /// since there is no prior data to read back.
    pub fn create(&mut self) -> bool {
        if self.state == DriverState::Started {
            return false;
        }

        let id = self.ids.new_id();
        TraceEvent::SessionCreated {
            session_id: id.clone(),
        }
        .emit();

        self.session_id = Some(id);
        self.record = SessionRecord::default();
        self.state = DriverState::Uninitialized;
        self.start()
    }

    /// Start the session and read any existing data back.
    ///
    /// Idempotent at the state level, except from `Destroyed`: a destroyed
    /// lifecycle can only be revived through `create`.
    pub fn start(&mut self) -> bool {
        if self.state == DriverState::Destroyed {
            return false;
        }
        self.state = DriverState::Started;
        self.read()
    }

    /// Load the payload from the store, replacing the in-memory record.
    ///
    /// Absent, malformed, foreign, and expired payloads all yield `false`;
    /// the caller proceeds with a fresh, empty session.
    pub fn read(&mut self) -> bool {
        if self.state != DriverState::Started {
            return false;
        }
        let Some(session_id) = self.resolve_session_id() else {
            return false;
        };
        // Retain the resolved id so a later write addresses the same key
        // even when the payload turns out to be unusable.
        self.session_id = Some(session_id.clone());

        let key = self.store_key(&session_id);
        let Some(bytes) = self.store.get(&key) else {
            self.miss(&key, "absent");
            return false;
        };
        let record = match codec::decode(&bytes) {
            Ok(record) => record,
            Err(_) => {
                self.miss(&key, "malformed");
                return false;
            }
        };
        if record.is_expired(Utc::now()) {
            self.miss(&key, "expired");
            return false;
        }

        self.record = record;
        TraceEvent::SessionLoaded { store_key: key }.emit();
        true
    }

    /// Persist the record with a fresh TTL.
    ///
    /// Stamps the expiry into the payload and hands the same remaining TTL
    /// to the store, so both agree on when the record dies.
    pub fn write(&mut self) -> bool {
        if self.state != DriverState::Started {
            return false;
        }
        let Some(session_id) = self.session_id.clone() else {
            return false;
        };

        let now = Utc::now();
        let expires_at = expiry::expires_at(now, self.config.expiration_seconds);
        self.record.stamp_expiry(expires_at);

        let Ok(bytes) = codec::encode(&self.record) else {
            return false;
        };
        let ttl = expiry::remaining_seconds(expires_at, now);
        let key = self.store_key(&session_id);
        let stored = self.store.set_with_expiry(&key, &bytes, ttl);
        if stored {
            TraceEvent::SessionWritten {
                store_key: key,
                ttl_seconds: ttl,
            }
            .emit();
        }
        stored
    }

    /// Write the payload back and hand the session id to the cookie
    /// transport.
    ///
    /// Always leaves the driver in `Stopped`, even when the data write
    /// fails. The return value is governed by
    /// [`SessionConfig::stop_reporting`]: the cookie-write outcome alone
    /// (default), or the conjunction with the data write.
    pub fn stop(&mut self) -> bool {
        if self.state != DriverState::Started {
            return false;
        }

        let wrote = self.write();
        self.state = DriverState::Stopped;

        let Some(session_id) = self.session_id.clone() else {
            return false;
        };
        let expires_at = expiry::expires_at(Utc::now(), self.config.expiration_seconds);
        let cookie_ok = self
            .cookies
            .set_value(&self.config.cookie_name, &session_id, expires_at);
        TraceEvent::SessionStopped { session_id }.emit();

        match self.config.stop_reporting {
            StopReporting::CookieWrite => cookie_ok,
            StopReporting::Combined => wrote && cookie_ok,
        }
    }

    /// Destroy the session: wipe the record, the stored payload, and the
    /// cookie.
    ///
    /// Valid from `Started` or `Stopped`; returns the cookie-delete result.
    /// Afterwards only a new `create` begins another lifecycle.
    pub fn destroy(&mut self) -> bool {
        if !matches!(self.state, DriverState::Started | DriverState::Stopped) {
            return false;
        }

        self.state = DriverState::Destroyed;
        self.record = SessionRecord::default();

        if let Some(session_id) = self.session_id.clone() {
            let key = self.store_key(&session_id);
            self.store.delete(&key);
            TraceEvent::SessionDestroyed { store_key: key }.emit();
        }

        self.cookies.delete_value(&self.config.cookie_name)
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Data container
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Value stored under `key` in the session data.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.record.data.get(key)
    }

    /// Store a value in the session data. Takes effect in the store on the
    /// next `write`/`stop`.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.record.data.insert(key.into(), value);
    }

    /// Remove a value from the session data.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.record.data.remove(key)
    }

    /// Drop all session data, keeping the session itself alive.
    pub fn clear(&mut self) {
        self.record.data.clear();
    }

    pub fn data(&self) -> &HashMap<String, Value> {
        &self.record.data
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Internals
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Session id assigned by `create`, or carried by the inbound cookie.
    fn resolve_session_id(&self) -> Option<String> {
        self.session_id
            .clone()
            .or_else(|| self.cookies.get_value(&self.config.cookie_name))
    }

    /// The only addressing scheme into the store; must be identical between
    /// write and subsequent read/delete.
    fn store_key(&self, session_id: &str) -> String {
        format!(
            "{}{}_{}",
            self.config.key_prefix, self.config.cookie_name, session_id
        )
    }

    fn miss(&self, key: &str, reason: &str) {
        TraceEvent::SessionMiss {
            store_key: key.to_owned(),
            reason: reason.to_owned(),
        }
        .emit();
    }
}
