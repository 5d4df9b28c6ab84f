//! Document-aware erasure coding.
//!
//! Encoding partitions a document into indexed fields (kept plaintext) and
//! payload fields. Payload fields are serialized back to back, in document
//! order, and the resulting byte buffer is erasure-coded. The encoded
//! document carries the indexed fields unchanged plus two reserved fields:
//!
//! - `_len` — the payload byte count.
//! - `_splits` — an array of `m` binary split blobs, index = array position.
//!
//! Decoding takes the primary document (whose indexed fields are canonical)
//! and enough splits from other members, rebuilds the payload and appends
//! the recovered fields after the primary's indexed fields.

use std::collections::BTreeSet;
use std::sync::Arc;

use tessera_erasure::{ErasureCoder, Split};
use tessera_types::{Document, LENGTH_FIELD, SPLITS_FIELD, Value, is_reserved_field};
use tracing::debug;

use crate::catalog::IndexCatalog;
use crate::error::CodecError;

/// Encodes and decodes documents through a shared [`ErasureCoder`].
#[derive(Debug, Clone)]
pub struct DocumentCodec {
    coder: Arc<ErasureCoder>,
}

impl DocumentCodec {
    /// Create a codec around a shared coder.
    pub fn new(coder: Arc<ErasureCoder>) -> Self {
        Self { coder }
    }

    /// The underlying erasure coder.
    pub fn coder(&self) -> &Arc<ErasureCoder> {
        &self.coder
    }

    /// Encode a document.
    ///
    /// The catalog is consulted once per field. Fails with
    /// [`CodecError::ReservedField`] if the document already contains
    /// `_splits` or `_len`.
    pub fn encode_document(
        &self,
        document: &Document,
        catalog: &dyn IndexCatalog,
    ) -> Result<Document, CodecError> {
        let mut encoded = Document::new();
        let mut payload = Vec::new();
        let mut payload_fields = 0usize;

        for (name, value) in document.iter() {
            if is_reserved_field(name) {
                return Err(CodecError::ReservedField(name.to_string()));
            }
            if catalog.is_field_indexed(name) {
                encoded.push(name, value.clone());
            } else {
                let bytes = postcard::to_allocvec(&(name, value))
                    .map_err(|e| CodecError::Serialization(e.to_string()))?;
                payload.extend_from_slice(&bytes);
                payload_fields += 1;
            }
        }

        let splits = self.coder.encode(&payload);

        debug!(
            indexed = encoded.len(),
            payload_fields,
            payload_len = payload.len(),
            splits = splits.len(),
            "encoded document"
        );

        encoded.push(LENGTH_FIELD, payload.len() as i64);
        encoded.push(
            SPLITS_FIELD,
            Value::Array(
                splits
                    .into_iter()
                    .map(|s| Value::Binary(s.data.to_vec()))
                    .collect(),
            ),
        );

        Ok(encoded)
    }

    /// Decode a document from the primary party and a set of secondaries.
    ///
    /// Each party contributes the split at its own index. The primary's
    /// indexed fields and `_len` are canonical. Fails with
    /// [`CodecError::InsufficientSplits`] if fewer than `k` distinct indices
    /// are available; extra parties beyond `k` are ignored.
    pub fn decode_document(
        &self,
        primary: (&Document, usize),
        secondary: &[(Document, usize)],
    ) -> Result<Document, CodecError> {
        let (primary_doc, primary_index) = primary;
        let remote = secondary
            .iter()
            .map(|(doc, index)| self.split_of(doc, *index))
            .collect::<Result<Vec<_>, _>>()?;
        self.decode_with_splits(primary_doc, primary_index, remote)
    }

    /// Decode a document from the primary party plus raw remote splits.
    ///
    /// The primary's own split always takes part. Remote splits are
    /// considered in the given order; a repeated index is skipped.
    pub fn decode_with_splits(
        &self,
        primary: &Document,
        primary_index: usize,
        remote: Vec<Split>,
    ) -> Result<Document, CodecError> {
        let k = self.coder.source_splits();
        let length = payload_length(primary)?;
        let split_size = self.coder.split_size(length);

        let mut seen = BTreeSet::new();
        let mut splits = Vec::with_capacity(k);
        for split in std::iter::once(self.split_of(primary, primary_index)?).chain(remote) {
            if splits.len() == k {
                break;
            }
            if seen.insert(split.index) {
                splits.push(split);
            }
        }
        if splits.len() < k {
            return Err(CodecError::InsufficientSplits {
                needed: k,
                got: splits.len(),
            });
        }

        let mut payload = self.coder.decode(&splits, split_size)?;
        payload.truncate(length);
        let fields = parse_payload(&payload)?;

        let mut decoded: Document = primary
            .iter()
            .filter(|(name, _)| !is_reserved_field(name))
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        for (name, value) in fields {
            decoded.push(name, value);
        }

        debug!(
            primary_index,
            used = ?splits.iter().map(|s| s.index).collect::<Vec<_>>(),
            payload_len = length,
            fields = decoded.len(),
            "decoded document"
        );

        Ok(decoded)
    }

    /// Extract the split a party holds at `index`.
    ///
    /// A full encoded document carries all `m` splits and yields the one at
    /// `index`; a projected document carries a single split which is taken
    /// as the party's own.
    pub fn split_of(&self, document: &Document, index: usize) -> Result<Split, CodecError> {
        let splits = split_array(document)?;
        let m = self.coder.total_splits();
        let value = match splits.len() {
            1 => &splits[0],
            n if n == m => splits.get(index).ok_or_else(|| CodecError::InvalidField {
                field: SPLITS_FIELD,
                reason: format!("index {index} out of range for {m} splits"),
            })?,
            n => {
                return Err(CodecError::InvalidField {
                    field: SPLITS_FIELD,
                    reason: format!("expected 1 or {m} splits, found {n}"),
                });
            }
        };
        let data = value.as_binary().ok_or_else(|| CodecError::InvalidField {
            field: SPLITS_FIELD,
            reason: format!("split is {}, expected binary", value.type_name()),
        })?;
        Ok(Split::new(index, data.to_vec()))
    }
}

/// Read the original payload length from an encoded document.
pub fn payload_length(document: &Document) -> Result<usize, CodecError> {
    let value = document
        .get(LENGTH_FIELD)
        .ok_or(CodecError::MissingField(LENGTH_FIELD))?;
    let n = value.as_int().ok_or_else(|| CodecError::InvalidField {
        field: LENGTH_FIELD,
        reason: format!("expected int, found {}", value.type_name()),
    })?;
    usize::try_from(n).map_err(|_| CodecError::InvalidField {
        field: LENGTH_FIELD,
        reason: format!("negative length {n}"),
    })
}

/// Project an encoded document down to the single split at `index`.
///
/// Keeps every other field; `_splits` becomes a one-element array. This is
/// the shape a peer returns for a split query.
pub fn project_split(document: &Document, index: usize) -> Result<Document, CodecError> {
    let splits = split_array(document)?;
    let split = splits.get(index).cloned().ok_or_else(|| CodecError::InvalidField {
        field: SPLITS_FIELD,
        reason: format!("index {index} out of range for {} splits", splits.len()),
    })?;
    Ok(document
        .iter()
        .map(|(name, value)| {
            if name == SPLITS_FIELD {
                (name.to_string(), Value::Array(vec![split.clone()]))
            } else {
                (name.to_string(), value.clone())
            }
        })
        .collect())
}

fn split_array(document: &Document) -> Result<&[Value], CodecError> {
    let value = document
        .get(SPLITS_FIELD)
        .ok_or(CodecError::MissingField(SPLITS_FIELD))?;
    value.as_array().ok_or_else(|| CodecError::InvalidField {
        field: SPLITS_FIELD,
        reason: format!("expected array, found {}", value.type_name()),
    })
}

fn parse_payload(mut rest: &[u8]) -> Result<Vec<(String, Value)>, CodecError> {
    let mut fields = Vec::new();
    while !rest.is_empty() {
        let (field, tail) = postcard::take_from_bytes::<(String, Value)>(rest)
            .map_err(|e| CodecError::CorruptPayload(e.to_string()))?;
        fields.push(field);
        rest = tail;
    }
    Ok(fields)
}
