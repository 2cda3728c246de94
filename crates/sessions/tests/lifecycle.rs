//! End-to-end lifecycle: one driver writes a session, a second driver on a
//! fresh "request" reads it back through the shared store.

use std::sync::Arc;

use serde_json::json;

use sv_domain::config::SessionConfig;
use sv_sessions::{
    CookieJar, IdGenerator, KeyValueStoreAdapter, MemoryStore, SessionDriver, UuidIdGenerator,
};

struct FixedIds(&'static str);

impl IdGenerator for FixedIds {
    fn new_id(&self) -> String {
        self.0.to_string()
    }
}

fn config() -> SessionConfig {
    SessionConfig {
        cookie_name: "sess".into(),
        key_prefix: String::new(),
        expiration_seconds: 3600,
        ..Default::default()
    }
}

#[test]
fn session_written_by_one_driver_is_read_by_the_next() {
    let store = Arc::new(MemoryStore::new());

    // First request: create a session, put data in it, stop.
    let mut first = SessionDriver::new(
        config(),
        KeyValueStoreAdapter::new(store.clone()),
        Box::new(CookieJar::new()),
        Arc::new(FixedIds("abc123")),
    )
    .unwrap();
    first.create();
    first.set("user", json!("alice"));
    first.set("count", json!(7));
    assert!(first.stop());

    // The payload landed under the derived key with the configured TTL.
    let ttl = store.ttl_seconds("sess_abc123").expect("TTL recorded");
    assert!(ttl > 3590 && ttl <= 3600, "ttl={ttl}");

    // Second request: same store, session id arrives via the cookie.
    let mut second = SessionDriver::new(
        config(),
        KeyValueStoreAdapter::new(store),
        Box::new(CookieJar::with_value("sess", "abc123")),
        Arc::new(UuidIdGenerator),
    )
    .unwrap();
    assert!(second.start());
    assert_eq!(second.get("user"), Some(&json!("alice")));
    assert_eq!(second.get("count"), Some(&json!(7)));
}

#[test]
fn destroyed_session_is_gone_for_the_next_request() {
    let store = Arc::new(MemoryStore::new());

    let mut first = SessionDriver::new(
        config(),
        KeyValueStoreAdapter::new(store.clone()),
        Box::new(CookieJar::new()),
        Arc::new(FixedIds("abc123")),
    )
    .unwrap();
    first.create();
    first.set("user", json!("alice"));
    first.stop();

    let mut second = SessionDriver::new(
        config(),
        KeyValueStoreAdapter::new(store.clone()),
        Box::new(CookieJar::with_value("sess", "abc123")),
        Arc::new(UuidIdGenerator),
    )
    .unwrap();
    assert!(second.start());
    assert!(second.destroy());
    assert!(store.is_empty());

    let mut third = SessionDriver::new(
        config(),
        KeyValueStoreAdapter::new(store),
        Box::new(CookieJar::with_value("sess", "abc123")),
        Arc::new(UuidIdGenerator),
    )
    .unwrap();
    assert!(!third.start());
    assert!(third.data().is_empty());
}

#[test]
fn both_store_conventions_serve_the_same_session() {
    for store in [
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryStore::without_setex()),
    ] {
        let mut writer = SessionDriver::new(
            config(),
            KeyValueStoreAdapter::new(store.clone()),
            Box::new(CookieJar::new()),
            Arc::new(FixedIds("abc123")),
        )
        .unwrap();
        writer.create();
        writer.set("user", json!("alice"));
        writer.stop();

        let mut reader = SessionDriver::new(
            config(),
            KeyValueStoreAdapter::new(store),
            Box::new(CookieJar::with_value("sess", "abc123")),
            Arc::new(UuidIdGenerator),
        )
        .unwrap();
        assert!(reader.start());
        assert_eq!(reader.get("user"), Some(&json!("alice")));
    }
}
