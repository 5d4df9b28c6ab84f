//! Error types for the document codec.

/// Errors that can occur while encoding or decoding documents.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Erasure coding error.
    #[error("erasure error: {0}")]
    Erasure(#[from] tessera_erasure::ErasureError),

    /// Fewer than `k` distinct split indices were available.
    #[error("insufficient splits: need {needed} distinct indices, got {got}")]
    InsufficientSplits {
        /// Required distinct splits (k).
        needed: usize,
        /// Distinct splits available.
        got: usize,
    },

    /// A reserved field was missing from an encoded document.
    #[error("encoded document is missing field {0}")]
    MissingField(&'static str),

    /// A reserved field had the wrong shape.
    #[error("invalid field {field}: {reason}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// The document to encode already uses a reserved field name.
    #[error("document uses reserved field name {0}")]
    ReservedField(String),

    /// A field could not be serialized into the payload.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The recovered payload did not parse back into fields.
    #[error("corrupt payload: {0}")]
    CorruptPayload(String),
}
