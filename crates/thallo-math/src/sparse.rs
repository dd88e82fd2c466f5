//! Sparse matrix representation and solver interface.
//!
//! Provides a triplet accumulator for force-Jacobian assembly, a CSR
//! (Compressed Sparse Row) matrix, and a trait for sparse direct
//! solvers. Implementations live in [`crate::faer_solver`].

use serde::{Deserialize, Serialize};

use crate::Mat3;

/// Accumulator for sparse matrix entries in (row, col, value) form.
///
/// Force-Jacobian assembly pushes overlapping 3×3 blocks per vertex
/// pair in arbitrary order; duplicates are summed when the list is
/// compressed into a [`CsrMatrix`].
#[derive(Debug, Clone)]
pub struct TripletList {
    /// Number of rows of the target matrix.
    pub rows: usize,
    /// Number of columns of the target matrix.
    pub cols: usize,
    entries: Vec<(usize, usize, f64)>,
}

impl TripletList {
    /// Creates an empty accumulator for an `rows`×`cols` matrix.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            entries: Vec::new(),
        }
    }

    /// Pushes a single scalar entry.
    #[inline]
    pub fn push(&mut self, row: usize, col: usize, value: f64) {
        debug_assert!(row < self.rows && col < self.cols);
        self.entries.push((row, col, value));
    }

    /// Pushes a 3×3 block at block coordinates (`block_row`, `block_col`),
    /// i.e. scalar rows `3·block_row..3·block_row+3`.
    pub fn push_block(&mut self, block_row: usize, block_col: usize, block: &Mat3) {
        let r0 = 3 * block_row;
        let c0 = 3 * block_col;
        for c in 0..3 {
            let col = block.col(c);
            self.push(r0, c0 + c, col.x);
            self.push(r0 + 1, c0 + c, col.y);
            self.push(r0 + 2, c0 + c, col.z);
        }
    }

    /// Pushes `value` on every diagonal entry.
    pub fn push_diagonal(&mut self, value: f64) {
        for i in 0..self.rows.min(self.cols) {
            self.entries.push((i, i, value));
        }
    }

    /// Appends every entry of `other` scaled by `factor`.
    pub fn extend_scaled(&mut self, other: &TripletList, factor: f64) {
        debug_assert_eq!(self.rows, other.rows);
        debug_assert_eq!(self.cols, other.cols);
        self.entries
            .extend(other.entries.iter().map(|&(r, c, v)| (r, c, v * factor)));
    }

    /// Number of raw (pre-compression) entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no entries have been pushed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compresses the accumulated triplets into a CSR matrix,
    /// summing duplicates.
    pub fn to_csr(&self) -> CsrMatrix {
        CsrMatrix::from_triplets(self.rows, self.cols, &self.entries)
    }
}

/// Compressed Sparse Row (CSR) matrix.
///
/// Stores a sparse matrix in row-major order. This is the assembly-side
/// format; conversion to faer's CSC happens inside the solver wrappers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrMatrix {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
    /// Row pointer array (length = rows + 1).
    /// `row_ptr[i]..row_ptr[i+1]` are the indices into `col_idx` and `values`
    /// for non-zeros in row `i`.
    pub row_ptr: Vec<usize>,
    /// Column indices of non-zero entries.
    pub col_idx: Vec<usize>,
    /// Non-zero values.
    pub values: Vec<f64>,
}

impl CsrMatrix {
    /// Creates an empty CSR matrix with the given dimensions.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            row_ptr: vec![0; rows + 1],
            col_idx: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Returns the number of non-zero entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Creates a CSR matrix from triplets (row, col, value).
    ///
    /// Duplicate entries are summed.
    pub fn from_triplets(rows: usize, cols: usize, triplets: &[(usize, usize, f64)]) -> Self {
        // Count entries per row
        let mut row_counts = vec![0usize; rows];
        for &(r, _, _) in triplets {
            row_counts[r] += 1;
        }

        // Build provisional row_ptr over the uncompressed entries
        let mut raw_ptr = vec![0usize; rows + 1];
        for i in 0..rows {
            raw_ptr[i + 1] = raw_ptr[i] + row_counts[i];
        }

        let raw_nnz = raw_ptr[rows];
        let mut raw_col = vec![0usize; raw_nnz];
        let mut raw_val = vec![0.0f64; raw_nnz];

        // Fill in, advancing a per-row write cursor
        let mut cursor = raw_ptr[..rows].to_vec();
        for &(r, c, v) in triplets {
            let pos = cursor[r];
            raw_col[pos] = c;
            raw_val[pos] = v;
            cursor[r] += 1;
        }

        // Sort each row by column index
        for i in 0..rows {
            let start = raw_ptr[i];
            let end = raw_ptr[i + 1];
            let slice = &mut raw_col[start..end];
            let val_slice = &mut raw_val[start..end];

            // Simple insertion sort (rows are typically small)
            for j in 1..slice.len() {
                let mut k = j;
                while k > 0 && slice[k - 1] > slice[k] {
                    slice.swap(k - 1, k);
                    val_slice.swap(k - 1, k);
                    k -= 1;
                }
            }
        }

        // Compress: merge runs of equal column index within each row
        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_idx = Vec::with_capacity(raw_nnz);
        let mut values = Vec::with_capacity(raw_nnz);
        for i in 0..rows {
            let start = raw_ptr[i];
            let end = raw_ptr[i + 1];
            let mut j = start;
            while j < end {
                let c = raw_col[j];
                let mut sum = raw_val[j];
                j += 1;
                while j < end && raw_col[j] == c {
                    sum += raw_val[j];
                    j += 1;
                }
                col_idx.push(c);
                values.push(sum);
            }
            row_ptr[i + 1] = col_idx.len();
        }

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Dense matrix-vector product `y = A·x` (test/diagnostic helper).
    pub fn mul_vec(&self, x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(x.len(), self.cols);
        let mut y = vec![0.0; self.rows];
        for (i, y_i) in y.iter_mut().enumerate() {
            for idx in self.row_ptr[i]..self.row_ptr[i + 1] {
                *y_i += self.values[idx] * x[self.col_idx[idx]];
            }
        }
        y
    }
}

/// Trait for sparse direct solvers over a factorize/solve split.
///
/// Implementations: [`crate::faer_solver::CholeskySolver`] for symmetric
/// positive-definite systems, [`crate::faer_solver::QrSolver`] as the
/// general fallback.
pub trait SparseSolver {
    /// Factorize the matrix. Call once per assembled system.
    fn factorize(&mut self, matrix: &CsrMatrix) -> Result<(), String>;

    /// Solve Ax = b using the pre-computed factorization.
    /// Returns x in the provided output buffer.
    fn solve(&self, rhs: &[f64], solution: &mut [f64]) -> Result<(), String>;

    /// Returns true if the solver holds a valid factorization.
    fn is_factorized(&self) -> bool;
}
