//! Batch encoding shared by the snapshot file and the request body
//!
//! Both directions are infallible from the caller's point of view: failures
//! are logged and reported as `None`. Decoding never yields partial results.

use crate::entry::Entry;

/// Serialize entries into a pretty-printed JSON array
pub fn encode(entries: &[Entry]) -> Option<Vec<u8>> {
    match serde_json::to_vec_pretty(entries) {
        Ok(data) => Some(data),
        Err(e) => {
            tracing::warn!(error = %e, count = entries.len(), "Failed to encode entries");
            None
        }
    }
}

/// Parse a JSON array of entries
pub fn decode(data: &[u8]) -> Option<Vec<Entry>> {
    match serde_json::from_slice(data) {
        Ok(entries) => Some(entries),
        Err(e) => {
            tracing::warn!(error = %e, bytes = data.len(), "Failed to decode entries");
            None
        }
    }
}
