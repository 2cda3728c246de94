use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session driver config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Session driver configuration — cookie naming, store key addressing, and
/// TTL for new or refreshed sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session id.
    #[serde(default = "d_cookie_name")]
    pub cookie_name: String,

    /// Prefix prepended to every store key. The full key is
    /// `<key_prefix><cookie_name>_<session_id>`.
    #[serde(default)]
    pub key_prefix: String,

    /// Seconds a written session stays valid before the store may reap it.
    #[serde(default = "d_7200")]
    pub expiration_seconds: u64,

    /// What `stop()` reports: the cookie-write outcome alone (default), or
    /// the conjunction of data write and cookie write.
    #[serde(default)]
    pub stop_reporting: StopReporting,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: d_cookie_name(),
            key_prefix: String::new(),
            expiration_seconds: 7200,
            stop_reporting: StopReporting::CookieWrite,
        }
    }
}

impl SessionConfig {
    /// Reject configurations that cannot address the store. Called once at
    /// driver construction; per-request operations never re-validate.
    pub fn validate(&self) -> Result<()> {
        if self.cookie_name.is_empty() {
            return Err(Error::Config("cookie_name must not be empty".into()));
        }
        if self.expiration_seconds == 0 {
            return Err(Error::Config(
                "expiration_seconds must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Which outcome `stop()` returns to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReporting {
    /// Report only the cookie-write result, discarding the data-write
    /// result.
    #[default]
    CookieWrite,
    /// Report `data_write_ok && cookie_write_ok`.
    Combined,
}

fn d_cookie_name() -> String {
    "svid".to_string()
}

fn d_7200() -> u64 {
    7200
}
