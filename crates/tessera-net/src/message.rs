//! Protocol messages for split queries.
//!
//! All messages are serialized with postcard and framed with a 4-byte
//! big-endian length prefix.

use serde::{Deserialize, Serialize};

/// Messages exchanged between replica members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitMessage {
    /// Ask a member for its split of one document.
    ///
    /// The member answers with the `_splits` entry it holds, i.e. the
    /// document projected down to a single split slot.
    SplitRequest {
        /// Collection namespace (`db.collection`).
        namespace: String,
        /// Document identifier.
        id: String,
        /// Split index the requester expects the member to hold.
        index: u32,
    },

    /// Response to a [`SplitMessage::SplitRequest`].
    SplitResponse {
        /// The split bytes, or `None` if the member has no such split.
        data: Option<Vec<u8>>,
        /// blake3 hash of `data`. All zeros when `data` is `None`.
        checksum: [u8; 32],
    },

    /// The member failed while looking up the split.
    SplitError {
        /// Human-readable reason.
        reason: String,
    },
}

impl SplitMessage {
    /// Build a response for `data`, computing its checksum.
    pub fn response(data: Option<Vec<u8>>) -> Self {
        let checksum = data
            .as_deref()
            .map(|d| *blake3::hash(d).as_bytes())
            .unwrap_or([0u8; 32]);
        Self::SplitResponse { data, checksum }
    }
}
