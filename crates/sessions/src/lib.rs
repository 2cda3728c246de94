//! Session lifecycle management for SessionVault.
//!
//! A `SessionDriver` turns an opaque session id — carried by a cookie
//! collaborator — into a verified, expiring bundle of server-side data,
//! persisted through a pluggable TTL key-value store. Missing, corrupt, or
//! expired store data degrades to an empty session rather than an error.

pub mod codec;
pub mod cookie;
pub mod driver;
pub mod expiry;
pub mod ids;
pub mod record;
pub mod store;

pub use cookie::{CookieJar, CookieTransport};
pub use driver::{DriverState, SessionDriver};
pub use ids::{IdGenerator, UuidIdGenerator};
pub use record::{SecurityMetadata, SessionRecord};
pub use store::{KeyValueStoreAdapter, MemoryStore, StoreClient};
