//! Document codec for Tessera.
//!
//! Turns a document into its erasure-coded form and back:
//!
//! - [`IndexCatalog`] — decides which fields stay plaintext (queryable).
//! - [`DocumentCodec`] — encodes a document into indexed fields plus `_len`
//!   and `_splits`, and decodes it from the primary's document and `k - 1`
//!   remote splits.
//! - [`project_split`] — the single-split view a peer serves for a query.

mod catalog;
mod codec;
mod error;

pub use catalog::{IndexCatalog, StaticIndexCatalog};
pub use codec::{DocumentCodec, payload_length, project_split};
pub use error::CodecError;
