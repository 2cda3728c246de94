//! Payload wire format.
//!
//! Every stored payload is the ASCII magic `svp1:` followed by the JSON
//! encoding of the record. The magic ties the bytes to this codec: foreign
//! writers, truncated values, and other encodings are rejected up front as
//! malformed instead of being fed to the JSON parser. The format is stable
//! across process restarts since it round-trips through an external store.

use sv_domain::error::{Error, Result};

use crate::record::SessionRecord;

/// Format marker prepended to every encoded payload.
pub const MAGIC: &[u8] = b"svp1:";

/// Encode a record into its stored byte representation. Pure transform.
pub fn encode(record: &SessionRecord) -> Result<Vec<u8>> {
    let mut out = Vec::from(MAGIC);
    out.extend_from_slice(&serde_json::to_vec(record)?);
    Ok(out)
}

/// Decode stored bytes back into a record.
///
/// Returns [`Error::MalformedPayload`] when the magic is absent or the body
/// fails structural parsing. Callers treat that as "no session data".
pub fn decode(bytes: &[u8]) -> Result<SessionRecord> {
    let body = bytes.strip_prefix(MAGIC).ok_or(Error::MalformedPayload)?;
    serde_json::from_slice(body).map_err(|_| Error::MalformedPayload)
}
