//! Dense GF(2^8) matrices.
//!
//! Provides the Cauchy encode matrix, Gauss-Jordan inversion and the
//! split-nibble [`CodingTable`] used to apply a matrix to byte buffers.

use std::ops::{Index, IndexMut};

use crate::error::ErasureError;
use crate::gf;

/// Row-major `rows x cols` matrix of field elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<u8>,
}

impl Matrix {
    /// Create a zero matrix.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0u8; rows * cols],
        }
    }

    /// Create an `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::new(n, n);
        for i in 0..n {
            m[(i, i)] = 1;
        }
        m
    }

    /// Systematic Cauchy matrix with `m` rows and `k` columns.
    ///
    /// Rows `0..k` are the identity. Row `i >= k` holds `1 / (i ^ j)` in
    /// column `j`; since `i >= k > j` the denominator is never zero. Every
    /// `k x k` submatrix formed from any `k` rows is invertible.
    ///
    /// Requires `k <= m <= 256`.
    pub fn cauchy(m: usize, k: usize) -> Self {
        debug_assert!(k <= m && m <= 256);
        let mut matrix = Self::new(m, k);
        for i in 0..k {
            matrix[(i, i)] = 1;
        }
        for i in k..m {
            for j in 0..k {
                matrix[(i, j)] = gf::inv((i ^ j) as u8);
            }
        }
        matrix
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Borrow row `i`.
    pub fn row(&self, i: usize) -> &[u8] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    fn row_mut(&mut self, i: usize) -> &mut [u8] {
        &mut self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Build a new matrix from the given rows of `self`, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let mut out = Self::new(indices.len(), self.cols);
        for (dst, &src) in indices.iter().enumerate() {
            out.row_mut(dst).copy_from_slice(self.row(src));
        }
        out
    }

    /// Matrix product `self * rhs`.
    pub fn mul(&self, rhs: &Matrix) -> Self {
        debug_assert_eq!(self.cols, rhs.rows, "matrix dimension mismatch");
        let mut out = Self::new(self.rows, rhs.cols);
        for i in 0..self.rows {
            for j in 0..rhs.cols {
                let mut acc = 0u8;
                for l in 0..self.cols {
                    acc ^= gf::mul(self[(i, l)], rhs[(l, j)]);
                }
                out[(i, j)] = acc;
            }
        }
        out
    }

    /// Invert a square matrix by Gauss-Jordan elimination.
    ///
    /// Returns [`ErasureError::SingularMatrix`] if no inverse exists.
    pub fn invert(&self) -> Result<Self, ErasureError> {
        if self.rows != self.cols {
            return Err(ErasureError::SingularMatrix);
        }
        let n = self.rows;
        let mut work = self.clone();
        let mut inverse = Self::identity(n);

        for col in 0..n {
            // Find a pivot at or below the diagonal.
            let pivot = (col..n)
                .find(|&r| work[(r, col)] != 0)
                .ok_or(ErasureError::SingularMatrix)?;
            if pivot != col {
                work.swap_rows(pivot, col);
                inverse.swap_rows(pivot, col);
            }

            // Scale the pivot row so the pivot becomes 1.
            let scale = gf::inv(work[(col, col)]);
            if scale != 1 {
                for j in 0..n {
                    work[(col, j)] = gf::mul(work[(col, j)], scale);
                    inverse[(col, j)] = gf::mul(inverse[(col, j)], scale);
                }
            }

            // Eliminate the column from every other row.
            for r in 0..n {
                if r == col {
                    continue;
                }
                let factor = work[(r, col)];
                if factor == 0 {
                    continue;
                }
                for j in 0..n {
                    let w = gf::mul(factor, work[(col, j)]);
                    work[(r, j)] ^= w;
                    let v = gf::mul(factor, inverse[(col, j)]);
                    inverse[(r, j)] ^= v;
                }
            }
        }

        Ok(inverse)
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for j in 0..self.cols {
            self.data.swap(a * self.cols + j, b * self.cols + j);
        }
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = u8;

    fn index(&self, (i, j): (usize, usize)) -> &u8 {
        &self.data[i * self.cols + j]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut u8 {
        &mut self.data[i * self.cols + j]
    }
}

/// Precomputed multiplication tables for applying a coefficient matrix.
///
/// Holds one 32-byte [`gf::mul_table`] per coefficient of a `rows x inputs`
/// matrix, i.e. `rows * inputs * 32` bytes.
#[derive(Debug, Clone)]
pub struct CodingTable {
    rows: usize,
    inputs: usize,
    tables: Vec<[u8; 32]>,
}

impl CodingTable {
    /// Build tables for every coefficient of `matrix`.
    pub fn new(matrix: &Matrix) -> Self {
        let tables = (0..matrix.rows())
            .flat_map(|i| matrix.row(i).iter().map(|&c| gf::mul_table(c)))
            .collect();
        Self {
            rows: matrix.rows(),
            inputs: matrix.cols(),
            tables,
        }
    }

    /// Number of output rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Size of the table in bytes.
    pub fn byte_len(&self) -> usize {
        self.tables.len() * 32
    }

    /// Compute `outputs[r] = sum_j coeff[r][j] * inputs[j]` byte-wise.
    ///
    /// Every input and output must have the same length.
    pub fn apply(&self, inputs: &[&[u8]], outputs: &mut [Vec<u8>]) {
        debug_assert_eq!(inputs.len(), self.inputs);
        debug_assert_eq!(outputs.len(), self.rows);
        for (r, out) in outputs.iter_mut().enumerate() {
            out.fill(0);
            for (j, input) in inputs.iter().enumerate() {
                gf::mul_add_slice(&self.tables[r * self.inputs + j], input, out);
            }
        }
    }
}
