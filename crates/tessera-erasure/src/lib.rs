//! Cauchy Reed-Solomon erasure coding over GF(2^8).
//!
//! This crate provides:
//! - [`gf`] — field arithmetic and split-nibble multiplication tables.
//! - [`Matrix`] — dense field matrices with Cauchy generation and inversion.
//! - [`ErasureCoder`] — encodes a payload into `m` splits (`k` source plus
//!   `m - k` parity) and decodes it from any `k` of them.
//!
//! Split sizes are `ceil(len / k)`; the original payload length must be
//! kept alongside the splits so padding can be dropped after decoding.

mod coder;
mod error;
pub mod gf;
mod matrix;

pub use coder::{ErasureCoder, MAX_TOTAL_SPLITS, Split};
pub use error::ErasureError;
pub use matrix::{CodingTable, Matrix};
