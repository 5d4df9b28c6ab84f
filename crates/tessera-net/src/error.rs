//! Error types for network operations.

use std::time::Duration;

/// Errors that can occur during network operations.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// Failed to connect to a remote member.
    #[error("connection error: {0}")]
    Connect(String),

    /// Socket I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Split data integrity check failed: blake3 hash mismatch.
    #[error("integrity check failed: expected {expected}, actual {actual}")]
    IntegrityFailure {
        /// Checksum sent by the peer.
        expected: blake3::Hash,
        /// Hash of the bytes actually received.
        actual: blake3::Hash,
    },

    /// A connect or query did not complete in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The peer answered with a message of the wrong kind.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// A frame exceeded the size limit.
    #[error("message too large: {len} bytes (max {max})")]
    MessageTooLarge {
        /// Announced frame length.
        len: usize,
        /// Maximum accepted length.
        max: usize,
    },

    /// The peer failed to serve the request.
    #[error("remote error: {0}")]
    Remote(String),
}
