//! Cookie transport seam.
//!
//! The driver never touches the HTTP layer. It reads the inbound session id
//! from a `CookieTransport` collaborator and hands the outbound id back to
//! it; how that maps onto `Cookie`/`Set-Cookie` headers is the embedding's
//! concern. `CookieJar` is an in-memory implementation for tests and
//! non-HTTP embeddings.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Reads and writes the session-id cookie.
pub trait CookieTransport: Send + Sync {
    /// Current value of the named cookie, if present.
    fn get_value(&self, name: &str) -> Option<String>;

    /// Persist `value` under `name`, expiring at `expires_at`. Returns
    /// whether the cookie was accepted for the response.
    fn set_value(&self, name: &str, value: &str, expires_at: DateTime<Utc>) -> bool;

    /// Remove the named cookie. Returns whether a deletion was issued.
    fn delete_value(&self, name: &str) -> bool;
}

/// In-memory cookie jar.
///
/// Holds at most one value per name; no expiry enforcement (the transport
/// layer a real embedding uses does that).
#[derive(Default)]
pub struct CookieJar {
    cookies: Mutex<HashMap<String, (String, Option<DateTime<Utc>>)>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jar pre-seeded with one inbound cookie, as a request carrying a
    /// session id would present it.
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        let jar = Self::new();
        jar.cookies
            .lock()
            .insert(name.into(), (value.into(), None));
        jar
    }

    /// Expiry recorded for the named cookie, if any.
    pub fn expires_at(&self, name: &str) -> Option<DateTime<Utc>> {
        self.cookies.lock().get(name).and_then(|(_, at)| *at)
    }
}

impl CookieTransport for CookieJar {
    fn get_value(&self, name: &str) -> Option<String> {
        self.cookies.lock().get(name).map(|(value, _)| value.clone())
    }

    fn set_value(&self, name: &str, value: &str, expires_at: DateTime<Utc>) -> bool {
        self.cookies
            .lock()
            .insert(name.to_owned(), (value.to_owned(), Some(expires_at)));
        true
    }

    fn delete_value(&self, name: &str) -> bool {
        self.cookies.lock().remove(name);
        // Deleting an absent cookie still issues an expired Set-Cookie in a
        // real transport, so the deletion itself always succeeds.
        true
    }
}
