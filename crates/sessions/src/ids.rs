//! Session id generation seam.

use uuid::Uuid;

/// Supplies fresh opaque session ids.
///
/// Implementations must be cryptographically unpredictable; the driver only
/// passes ids through and never inspects them.
pub trait IdGenerator: Send + Sync {
    fn new_id(&self) -> String;
}

/// Default generator minting random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn new_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
