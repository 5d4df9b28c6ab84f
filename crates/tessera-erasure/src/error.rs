//! Error types for erasure coding operations.

/// Errors that can occur during erasure encoding or decoding.
#[derive(Debug, thiserror::Error)]
pub enum ErasureError {
    /// The `(k, m)` parameters are unusable.
    #[error("invalid erasure config: k={k}, m={m} (need 1 <= k <= m <= 256)")]
    InvalidConfig {
        /// Requested source split count.
        k: usize,
        /// Requested total split count.
        m: usize,
    },

    /// A decode sub-matrix had no inverse.
    ///
    /// Unreachable for rows drawn from a Cauchy matrix; seeing it means the
    /// split indices or the configuration are wrong.
    #[error("decode matrix is singular")]
    SingularMatrix,

    /// Decode was given a number of splits other than `k`.
    #[error("wrong split count: need exactly {expected}, got {got}")]
    WrongSplitCount {
        /// Required split count (k).
        expected: usize,
        /// Splits actually provided.
        got: usize,
    },

    /// The same split index was supplied twice.
    #[error("duplicate split index {0}")]
    DuplicateSplitIndex(usize),

    /// A split index was outside `0..m`.
    #[error("split index {index} out of range (total splits {total})")]
    SplitIndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Total split count (m).
        total: usize,
    },

    /// A split's length did not match the expected split size.
    #[error("split {index} has {got} bytes, expected {expected}")]
    SplitSizeMismatch {
        /// Index of the offending split.
        index: usize,
        /// Expected split size.
        expected: usize,
        /// Actual length.
        got: usize,
    },
}
