//! Systematic Reed-Solomon coder over a Cauchy matrix.
//!
//! [`ErasureCoder`] splits a payload into `k` source splits and computes
//! `m - k` parity splits. Any `k` of the `m` splits reconstruct the payload.

use std::collections::BTreeSet;

use bytes::Bytes;
use tessera_types::ErasureConfig;
use tracing::{debug, error};

use crate::error::ErasureError;
use crate::matrix::{CodingTable, Matrix};

/// Largest total split count addressable in GF(2^8).
pub const MAX_TOTAL_SPLITS: usize = 256;

/// One erasure-coded split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    /// Position in the coding scheme (`0..k` source, `k..m` parity).
    pub index: usize,
    /// The raw split bytes, `split_size` long.
    pub data: Bytes,
}

impl Split {
    /// Create a split from an index and its bytes.
    pub fn new(index: usize, data: impl Into<Bytes>) -> Self {
        Self {
            index,
            data: data.into(),
        }
    }
}

/// Reed-Solomon erasure coder.
///
/// Holds the `m x k` Cauchy encode matrix and the precomputed parity table.
/// Both are immutable after construction, so one coder can be shared by
/// reference across concurrent encode and decode calls; every decode builds
/// its own scratch matrices.
#[derive(Debug, Clone)]
pub struct ErasureCoder {
    /// Number of source splits.
    k: usize,
    /// Total number of splits.
    m: usize,
    encode_matrix: Matrix,
    /// Tables for the parity rows `k..m`.
    encode_table: CodingTable,
}

impl ErasureCoder {
    /// Create a coder for `k` source splits out of `m` total.
    ///
    /// Fails with [`ErasureError::InvalidConfig`] unless `1 <= k <= m <= 256`.
    pub fn new(k: usize, m: usize) -> Result<Self, ErasureError> {
        if k == 0 || m < k || m > MAX_TOTAL_SPLITS {
            return Err(ErasureError::InvalidConfig { k, m });
        }
        let encode_matrix = Matrix::cauchy(m, k);
        let parity_rows: Vec<usize> = (k..m).collect();
        let encode_table = CodingTable::new(&encode_matrix.select_rows(&parity_rows));

        debug!(k, m, table_bytes = encode_table.byte_len(), "built erasure coder");

        Ok(Self {
            k,
            m,
            encode_matrix,
            encode_table,
        })
    }

    /// Create a coder from an [`ErasureConfig`].
    pub fn from_config(config: ErasureConfig) -> Result<Self, ErasureError> {
        Self::new(config.k, config.m)
    }

    /// Number of source splits (`k`).
    pub fn source_splits(&self) -> usize {
        self.k
    }

    /// Total number of splits (`m`).
    pub fn total_splits(&self) -> usize {
        self.m
    }

    /// Split size for a payload of `len` bytes: `ceil(len / k)`.
    pub fn split_size(&self, len: usize) -> usize {
        len.div_ceil(self.k)
    }

    /// Encode a payload into `m` splits.
    ///
    /// Source split `i` holds bytes `i * split_size..(i + 1) * split_size` of
    /// the payload, zero-padded where the payload runs out. Splits are
    /// returned in index order.
    pub fn encode(&self, payload: &[u8]) -> Vec<Split> {
        let split_size = self.split_size(payload.len());

        let mut sources: Vec<Vec<u8>> = Vec::with_capacity(self.k);
        for i in 0..self.k {
            let mut buf = vec![0u8; split_size];
            let start = (i * split_size).min(payload.len());
            let end = ((i + 1) * split_size).min(payload.len());
            buf[..end - start].copy_from_slice(&payload[start..end]);
            sources.push(buf);
        }

        let mut parity = vec![vec![0u8; split_size]; self.m - self.k];
        {
            let inputs: Vec<&[u8]> = sources.iter().map(Vec::as_slice).collect();
            self.encode_table.apply(&inputs, &mut parity);
        }

        debug!(
            k = self.k,
            m = self.m,
            payload_size = payload.len(),
            split_size,
            "encoded payload into splits"
        );

        sources
            .into_iter()
            .chain(parity)
            .enumerate()
            .map(|(index, data)| Split::new(index, data))
            .collect()
    }

    /// Decode exactly `k` splits back into the padded payload.
    ///
    /// Returns `k * split_size` bytes in source order; the caller truncates
    /// to the original length. Any `k` distinct splits give identical output.
    ///
    /// # Errors
    ///
    /// [`ErasureError::WrongSplitCount`] unless exactly `k` splits are given,
    /// [`ErasureError::DuplicateSplitIndex`] or
    /// [`ErasureError::SplitIndexOutOfRange`] for bad indices, and
    /// [`ErasureError::SplitSizeMismatch`] if a split is not `split_size` long.
    pub fn decode(&self, splits: &[Split], split_size: usize) -> Result<Vec<u8>, ErasureError> {
        self.validate(splits, split_size)?;

        let mut payload = vec![0u8; self.k * split_size];
        for split in splits.iter().filter(|s| s.index < self.k) {
            let start = split.index * split_size;
            payload[start..start + split_size].copy_from_slice(&split.data);
        }

        let missing_sources: Vec<usize> = self
            .missing_indices(splits)
            .into_iter()
            .filter(|&idx| idx < self.k)
            .collect();

        if missing_sources.is_empty() {
            debug!(k = self.k, split_size, "all source splits present");
            return Ok(payload);
        }

        let recovered = self.recover(splits, split_size, &missing_sources)?;
        for (idx, data) in missing_sources.iter().zip(recovered) {
            let start = idx * split_size;
            payload[start..start + split_size].copy_from_slice(&data);
        }

        debug!(
            k = self.k,
            m = self.m,
            split_size,
            recovered = missing_sources.len(),
            "decoded payload from splits"
        );

        Ok(payload)
    }

    /// Rebuild the full set of `m` splits from exactly `k` of them.
    ///
    /// Supplied splits are returned as-is; every missing source and parity
    /// split is recomputed.
    pub fn reconstruct(
        &self,
        splits: &[Split],
        split_size: usize,
    ) -> Result<Vec<Split>, ErasureError> {
        self.validate(splits, split_size)?;

        let missing: Vec<usize> = self.missing_indices(splits).into_iter().collect();
        let recovered = self.recover(splits, split_size, &missing)?;

        let mut all: Vec<Split> = splits
            .iter()
            .cloned()
            .chain(
                missing
                    .into_iter()
                    .zip(recovered)
                    .map(|(idx, data)| Split::new(idx, data)),
            )
            .collect();
        all.sort_by_key(|s| s.index);
        Ok(all)
    }

    fn validate(&self, splits: &[Split], split_size: usize) -> Result<(), ErasureError> {
        if splits.len() != self.k {
            return Err(ErasureError::WrongSplitCount {
                expected: self.k,
                got: splits.len(),
            });
        }
        let mut seen = BTreeSet::new();
        for split in splits {
            if split.index >= self.m {
                return Err(ErasureError::SplitIndexOutOfRange {
                    index: split.index,
                    total: self.m,
                });
            }
            if !seen.insert(split.index) {
                return Err(ErasureError::DuplicateSplitIndex(split.index));
            }
            if split.data.len() != split_size {
                return Err(ErasureError::SplitSizeMismatch {
                    index: split.index,
                    expected: split_size,
                    got: split.data.len(),
                });
            }
        }
        Ok(())
    }

    /// Indices in `0..m` not covered by `splits`, ascending.
    fn missing_indices(&self, splits: &[Split]) -> BTreeSet<usize> {
        let mut missing: BTreeSet<usize> = (0..self.m).collect();
        for split in splits {
            missing.remove(&split.index);
        }
        missing
    }

    /// Recompute the splits at `wanted` from the `k` supplied splits.
    ///
    /// The rows of the encode matrix at the supplied indices (in supplied
    /// order) form the decode matrix `D`. A missing source index `i` is
    /// recovered by row `i` of `D^-1`; a missing parity index `p` by
    /// `E[p] * D^-1`. The resulting rows are applied to the supplied splits
    /// with the same table-driven combination used for encoding.
    fn recover(
        &self,
        splits: &[Split],
        split_size: usize,
        wanted: &[usize],
    ) -> Result<Vec<Vec<u8>>, ErasureError> {
        let supplied: Vec<usize> = splits.iter().map(|s| s.index).collect();
        let decode_matrix = self.encode_matrix.select_rows(&supplied);
        let inverse = decode_matrix.invert().inspect_err(|_| {
            error!(indices = ?supplied, k = self.k, m = self.m, "decode matrix is singular");
        })?;

        let mut rows = Matrix::new(wanted.len(), self.k);
        for (r, &idx) in wanted.iter().enumerate() {
            let row = if idx < self.k {
                inverse.select_rows(&[idx])
            } else {
                self.encode_matrix.select_rows(&[idx]).mul(&inverse)
            };
            for j in 0..self.k {
                rows[(r, j)] = row[(0, j)];
            }
        }

        let table = CodingTable::new(&rows);
        let inputs: Vec<&[u8]> = splits.iter().map(|s| s.data.as_ref()).collect();
        let mut outputs = vec![vec![0u8; split_size]; wanted.len()];
        table.apply(&inputs, &mut outputs);
        Ok(outputs)
    }
}
