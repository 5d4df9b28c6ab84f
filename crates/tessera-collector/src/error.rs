//! Error types for split collection.

use std::time::Duration;

/// Errors that can occur while collecting splits and rebuilding a document.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// Document codec error (decode of the collected splits failed).
    #[error("codec error: {0}")]
    Codec(#[from] tessera_codec::CodecError),

    /// Membership does not match the erasure configuration.
    #[error("invalid membership: {0}")]
    InvalidMembership(String),

    /// The local document does not carry this member's split.
    #[error("local document has no usable split at index {index}: {source}")]
    MissingLocalSplit {
        /// This member's index.
        index: usize,
        /// Why the split could not be read.
        source: tessera_codec::CodecError,
    },

    /// Every peer answered (or gave up) and fewer than `needed` splits arrived.
    #[error(
        "quorum unreachable: need {needed} remote splits, collected {collected} \
         ({misses} misses, {unavailable} unavailable)"
    )]
    QuorumUnreachable {
        /// Remote splits required (k - 1).
        needed: usize,
        /// Remote splits collected.
        collected: usize,
        /// Peers that had no split.
        misses: usize,
        /// Peers that could not be reached or failed.
        unavailable: usize,
    },

    /// The request deadline passed before quorum.
    #[error("timed out after {elapsed:?}: need {needed} remote splits, collected {collected}")]
    Timeout {
        /// Remote splits required (k - 1).
        needed: usize,
        /// Remote splits collected when the deadline passed.
        collected: usize,
        /// Time spent.
        elapsed: Duration,
    },
}
