//! Key-value store seam.
//!
//! `StoreClient` models the raw client in whichever calling convention the
//! backend offers: an atomic set-with-expiry primitive, or separate `set`
//! and `expire` calls. `KeyValueStoreAdapter` normalizes both behind one
//! interface and absorbs transport failures — the driver sees store
//! unavailability as "no session", never as an error.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use sv_domain::error::Result;
use sv_domain::trace::TraceEvent;

use crate::expiry;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Store client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Raw key-value store client.
///
/// Timeouts and retries are the implementation's concern; the adapter
/// imposes none of its own. All calls are blocking.
pub trait StoreClient: Send + Sync {
    /// Atomic set-with-expiry, if the backend has one. Returns `None` when
    /// it does not; the adapter then falls back to `set` followed by
    /// `expire`.
    fn setex(&self, key: &str, ttl_seconds: u64, value: &[u8]) -> Option<Result<()>>;

    /// Store `value` under `key` with no expiry, replacing any previous
    /// value and TTL.
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Apply a TTL to an existing key. Returns whether the key was present.
    fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool>;

    /// Fetch the value under `key`, if present and not expired.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Remove `key`. Returns whether a value was removed.
    fn delete(&self, key: &str) -> Result<bool>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Normalizes the two store calling conventions behind one interface and
/// converts every transport failure into an absent/false result.
#[derive(Clone)]
pub struct KeyValueStoreAdapter {
    client: Arc<dyn StoreClient>,
}

impl KeyValueStoreAdapter {
    pub fn new(client: Arc<dyn StoreClient>) -> Self {
        Self { client }
    }

    /// Store `value` under `key` with a TTL.
    ///
    /// Prefers the backend's atomic primitive. The fallback path issues
    /// `set` then `expire` and returns the conjunction of both results; a
    /// crash between the two calls leaves a key with no expiry. That window
    /// is a known limitation of the two-call convention, surfaced by the
    /// `StoreWriteFallback` trace event rather than hidden.
    pub fn set_with_expiry(&self, key: &str, value: &[u8], ttl_seconds: u64) -> bool {
        match self.client.setex(key, ttl_seconds, value) {
            Some(Ok(())) => true,
            Some(Err(err)) => {
                tracing::warn!(key, %err, "store setex failed");
                false
            }
            None => {
                TraceEvent::StoreWriteFallback {
                    key: key.to_owned(),
                }
                .emit();
                if let Err(err) = self.client.set(key, value) {
                    tracing::warn!(key, %err, "store set failed");
                    return false;
                }
                match self.client.expire(key, ttl_seconds) {
                    Ok(applied) => applied,
                    Err(err) => {
                        tracing::warn!(key, %err, "store expire failed");
                        false
                    }
                }
            }
        }
    }

    /// Fetch the bytes under `key`. Transport failure reads as absent.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        match self.client.get(key) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(key, %err, "store get failed");
                None
            }
        }
    }

    /// Remove `key`. Transport failure reads as nothing-removed.
    pub fn delete(&self, key: &str) -> bool {
        match self.client.delete(key) {
            Ok(removed) => removed,
            Err(err) => {
                tracing::warn!(key, %err, "store delete failed");
                false
            }
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// In-memory store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct Entry {
    value: Vec<u8>,
    expires_at: Option<DateTime<Utc>>,
}

/// In-memory `StoreClient` honoring TTLs on read.
///
/// Suitable for tests and single-process embedding; everything is lost on
/// restart. Constructable with or without the atomic `setex` primitive so
/// both adapter paths can be exercised against the same semantics.
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
    atomic: bool,
}

impl MemoryStore {
    /// Backend advertising the atomic `setex` primitive.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            atomic: true,
        }
    }

    /// Backend without `setex`, forcing the adapter's set+expire fallback.
    pub fn without_setex() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            atomic: false,
        }
    }

    /// Remaining TTL recorded for `key`, in whole seconds. `None` if the
    /// key is absent or carries no expiry.
    pub fn ttl_seconds(&self, key: &str) -> Option<u64> {
        let entries = self.entries.lock();
        let at = entries.get(key)?.expires_at?;
        Some(expiry::remaining_seconds(at, Utc::now()))
    }

    /// Number of keys held, including ones past expiry but not yet reaped.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreClient for MemoryStore {
    fn setex(&self, key: &str, ttl_seconds: u64, value: &[u8]) -> Option<Result<()>> {
        if !self.atomic {
            return None;
        }
        self.entries.lock().insert(
            key.to_owned(),
            Entry {
                value: value.to_vec(),
                expires_at: Some(expiry::expires_at(Utc::now(), ttl_seconds)),
            },
        );
        Some(Ok(()))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries.lock().insert(
            key.to_owned(),
            Entry {
                value: value.to_vec(),
                expires_at: None,
            },
        );
        Ok(())
    }

    fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool> {
        let mut entries = self.entries.lock();
        match entries.get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(expiry::expires_at(Utc::now(), ttl_seconds));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) => {
                if let Some(at) = entry.expires_at {
                    if at <= Utc::now() {
                        return Ok(None);
                    }
                }
                Ok(Some(entry.value.clone()))
            }
            None => Ok(None),
        }
    }

    fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.lock().remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sv_domain::error::Error;

    /// Client whose every call fails at the transport level.
    struct DownStore;

    impl StoreClient for DownStore {
        fn setex(&self, _key: &str, _ttl: u64, _value: &[u8]) -> Option<Result<()>> {
            Some(Err(Error::Store("connection refused".into())))
        }
        fn set(&self, _key: &str, _value: &[u8]) -> Result<()> {
            Err(Error::Store("connection refused".into()))
        }
        fn expire(&self, _key: &str, _ttl: u64) -> Result<bool> {
            Err(Error::Store("connection refused".into()))
        }
        fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
            Err(Error::Store("connection refused".into()))
        }
        fn delete(&self, _key: &str) -> Result<bool> {
            Err(Error::Store("connection refused".into()))
        }
    }

    #[test]
    fn atomic_and_fallback_store_identical_bytes_and_ttl() {
        let atomic = Arc::new(MemoryStore::new());
        let two_step = Arc::new(MemoryStore::without_setex());

        let a = KeyValueStoreAdapter::new(atomic.clone());
        let b = KeyValueStoreAdapter::new(two_step.clone());

        assert!(a.set_with_expiry("sess_abc", b"payload", 3600));
        assert!(b.set_with_expiry("sess_abc", b"payload", 3600));

        assert_eq!(a.get("sess_abc"), b.get("sess_abc"));
        let ttl_a = atomic.ttl_seconds("sess_abc").unwrap();
        let ttl_b = two_step.ttl_seconds("sess_abc").unwrap();
        assert!(ttl_a.abs_diff(ttl_b) <= 1, "ttl_a={ttl_a} ttl_b={ttl_b}");
    }

    #[test]
    fn get_honors_expiry() {
        let store = MemoryStore::new();
        store.set("k", b"v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some(b"v".to_vec()));

        // Zero TTL expires immediately.
        store.expire("k", 0).unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn expire_on_missing_key_reports_false() {
        let store = MemoryStore::new();
        assert!(!store.expire("nope", 60).unwrap());
    }

    #[test]
    fn set_clears_previous_ttl() {
        let store = MemoryStore::new();
        store.set("k", b"v1").unwrap();
        store.expire("k", 60).unwrap();
        store.set("k", b"v2").unwrap();
        assert_eq!(store.ttl_seconds("k"), None);
    }

    #[test]
    fn adapter_absorbs_transport_failures() {
        let adapter = KeyValueStoreAdapter::new(Arc::new(DownStore));
        assert!(!adapter.set_with_expiry("k", b"v", 60));
        assert_eq!(adapter.get("k"), None);
        assert!(!adapter.delete("k"));
    }

    #[test]
    fn fallback_write_reports_conjunction() {
        let adapter = KeyValueStoreAdapter::new(Arc::new(MemoryStore::without_setex()));
        assert!(adapter.set_with_expiry("k", b"v", 60));
        assert!(adapter.delete("k"));
        assert!(!adapter.delete("k"));
    }
}
