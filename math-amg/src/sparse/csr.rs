//! Compressed Sparse Row (CSR) matrix format
//!
//! CSR format stores:
//! - `values`: Non-zero entries in row-major order
//! - `col_indices`: Column index for each value
//! - `row_ptrs`: Index into values/col_indices where each row starts
//!
//! Indexing is 0-based throughout; `row_ptrs` has `num_rows + 1` entries,
//! starts at 0 and is non-decreasing.

use crate::error::CsrError;
use crate::traits::{LinearOperator, RealField};
use ndarray::{Array1, Array2, ArrayView1, ArrayViewMut1};
use std::ops::Range;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Compressed Sparse Row (CSR) matrix format
///
/// Memory-efficient storage for sparse matrices with O(nnz) space complexity.
/// Matrix-vector products are O(nnz) instead of O(n²) for dense matrices.
#[derive(Debug, Clone)]
pub struct CsrMatrix<T: RealField> {
    /// Number of rows
    pub num_rows: usize,
    /// Number of columns
    pub num_cols: usize,
    /// Non-zero values in row-major order
    pub values: Vec<T>,
    /// Column indices for each value
    pub col_indices: Vec<usize>,
    /// Row pointers: row_ptrs[i] is the start index in values/col_indices for row i
    /// row_ptrs[num_rows] = nnz (total number of non-zeros)
    pub row_ptrs: Vec<usize>,
}

impl<T: RealField> CsrMatrix<T> {
    /// Create a new empty CSR matrix
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        Self {
            num_rows,
            num_cols,
            values: Vec::new(),
            col_indices: Vec::new(),
            row_ptrs: vec![0; num_rows + 1],
        }
    }

    /// Create a CSR matrix with pre-allocated capacity
    pub fn with_capacity(num_rows: usize, num_cols: usize, nnz_estimate: usize) -> Self {
        Self {
            num_rows,
            num_cols,
            values: Vec::with_capacity(nnz_estimate),
            col_indices: Vec::with_capacity(nnz_estimate),
            row_ptrs: vec![0; num_rows + 1],
        }
    }

    /// Create a CSR matrix from raw components, validating the structure.
    ///
    /// Checks that `row_ptrs` has `num_rows + 1` entries, starts at 0 and is
    /// non-decreasing, that `col_indices` and `values` agree in length with
    /// the final offset, and that every column index lies in
    /// `[0, num_cols)`.
    pub fn try_from_raw_parts(
        num_rows: usize,
        num_cols: usize,
        row_ptrs: Vec<usize>,
        col_indices: Vec<usize>,
        values: Vec<T>,
    ) -> Result<Self, CsrError> {
        if row_ptrs.len() != num_rows + 1 {
            return Err(CsrError::RowPtrLength {
                expected: num_rows + 1,
                got: row_ptrs.len(),
            });
        }
        if col_indices.len() != values.len() {
            return Err(CsrError::EntryLengthMismatch {
                cols: col_indices.len(),
                vals: values.len(),
            });
        }
        if row_ptrs[0] != 0 {
            return Err(CsrError::NonMonotonicRowPtr { row: 0 });
        }
        for i in 0..num_rows {
            if row_ptrs[i + 1] < row_ptrs[i] {
                return Err(CsrError::NonMonotonicRowPtr { row: i + 1 });
            }
        }
        if row_ptrs[num_rows] != values.len() {
            return Err(CsrError::TrailingOffset {
                got: row_ptrs[num_rows],
                nnz: values.len(),
            });
        }
        for (entry, &col) in col_indices.iter().enumerate() {
            if col >= num_cols {
                return Err(CsrError::ColumnOutOfBounds {
                    col,
                    num_cols,
                    entry,
                });
            }
        }

        Ok(Self {
            num_rows,
            num_cols,
            row_ptrs,
            col_indices,
            values,
        })
    }

    /// Create a CSR matrix from a dense matrix
    ///
    /// Only stores entries with magnitude > threshold
    pub fn from_dense(dense: &Array2<T>, threshold: T) -> Self {
        let num_rows = dense.nrows();
        let num_cols = dense.ncols();

        let mut values = Vec::new();
        let mut col_indices = Vec::new();
        let mut row_ptrs = vec![0usize; num_rows + 1];

        for i in 0..num_rows {
            for j in 0..num_cols {
                let val = dense[[i, j]];
                if val.abs() > threshold {
                    values.push(val);
                    col_indices.push(j);
                }
            }
            row_ptrs[i + 1] = values.len();
        }

        Self {
            num_rows,
            num_cols,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Create a CSR matrix from COO (Coordinate) format triplets
    ///
    /// Triplets are (row, col, value). Duplicate entries are summed.
    pub fn from_triplets(
        num_rows: usize,
        num_cols: usize,
        mut triplets: Vec<(usize, usize, T)>,
    ) -> Self {
        if triplets.is_empty() {
            return Self::new(num_rows, num_cols);
        }

        // Sort by row, then by column
        triplets.sort_by(|a, b| {
            if a.0 != b.0 {
                a.0.cmp(&b.0)
            } else {
                a.1.cmp(&b.1)
            }
        });

        let mut values = Vec::with_capacity(triplets.len());
        let mut col_indices = Vec::with_capacity(triplets.len());
        let mut row_ptrs = vec![0usize; num_rows + 1];

        let mut prev_row = usize::MAX;
        let mut prev_col = usize::MAX;

        for (row, col, val) in triplets {
            if row == prev_row && col == prev_col {
                // Same entry, accumulate
                if let Some(last) = values.last_mut() {
                    *last += val;
                }
            } else {
                values.push(val);
                col_indices.push(col);

                // Update row pointers for any rows we skipped
                if row != prev_row {
                    let start = if prev_row == usize::MAX {
                        0
                    } else {
                        prev_row + 1
                    };
                    for item in row_ptrs.iter_mut().take(row + 1).skip(start) {
                        *item = values.len() - 1;
                    }
                }

                prev_row = row;
                prev_col = col;
            }
        }

        // Fill remaining row pointers
        let last_row = if prev_row == usize::MAX {
            0
        } else {
            prev_row + 1
        };
        for item in row_ptrs.iter_mut().take(num_rows + 1).skip(last_row) {
            *item = values.len();
        }

        Self {
            num_rows,
            num_cols,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Create identity matrix in CSR format
    pub fn identity(n: usize) -> Self {
        Self {
            num_rows: n,
            num_cols: n,
            values: vec![T::one(); n],
            col_indices: (0..n).collect(),
            row_ptrs: (0..=n).collect(),
        }
    }

    /// Number of non-zero entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Get the range of indices in values/col_indices for a given row
    pub fn row_range(&self, row: usize) -> Range<usize> {
        self.row_ptrs[row]..self.row_ptrs[row + 1]
    }

    /// Get the (col, value) pairs for a row
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        let range = self.row_range(row);
        self.col_indices[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Get element at (i, j), returns 0 if not stored
    pub fn get(&self, i: usize, j: usize) -> T {
        for idx in self.row_range(i) {
            if self.col_indices[idx] == j {
                return self.values[idx];
            }
        }
        T::zero()
    }

    /// Extract diagonal elements
    pub fn diagonal(&self) -> Array1<T> {
        let n = self.num_rows.min(self.num_cols);
        let mut diag = Array1::from_elem(n, T::zero());

        for i in 0..n {
            diag[i] = self.get(i, i);
        }

        diag
    }

    /// Scale all values by a scalar
    pub fn scale(&mut self, scalar: T) {
        for val in &mut self.values {
            *val *= scalar;
        }
    }

    /// Matrix-vector product: y = A * x
    ///
    /// Uses parallel processing when the `rayon` feature is enabled and the
    /// matrix is large enough to benefit from parallelization.
    pub fn matvec(&self, x: &Array1<T>) -> Array1<T> {
        assert_eq!(x.len(), self.num_cols, "Input vector size mismatch");

        #[cfg(feature = "rayon")]
        {
            if self.num_rows >= 246 {
                return self.matvec_parallel(x);
            }
        }

        self.matvec_sequential(x)
    }

    fn matvec_sequential(&self, x: &Array1<T>) -> Array1<T> {
        let mut y = Array1::from_elem(self.num_rows, T::zero());

        for i in 0..self.num_rows {
            let mut sum = T::zero();
            for idx in self.row_range(i) {
                let j = self.col_indices[idx];
                sum += self.values[idx] * x[j];
            }
            y[i] = sum;
        }

        y
    }

    /// Parallel matrix-vector product using rayon
    #[cfg(feature = "rayon")]
    fn matvec_parallel(&self, x: &Array1<T>) -> Array1<T> {
        let x_slice = x.as_slice().expect("Array should be contiguous");

        let results: Vec<T> = (0..self.num_rows)
            .into_par_iter()
            .map(|i| {
                let mut sum = T::zero();
                for idx in self.row_range(i) {
                    let j = self.col_indices[idx];
                    sum += self.values[idx] * x_slice[j];
                }
                sum
            })
            .collect();

        Array1::from_vec(results)
    }

    /// Matrix-vector product into a caller-provided buffer: y = A * x
    ///
    /// View-based variant of [`CsrMatrix::matvec`] for cycle code that
    /// stages products in preallocated workspace instead of allocating.
    pub fn matvec_into(&self, x: ArrayView1<T>, mut y: ArrayViewMut1<T>) {
        assert_eq!(x.len(), self.num_cols, "Input vector size mismatch");
        assert_eq!(y.len(), self.num_rows, "Output vector size mismatch");

        for i in 0..self.num_rows {
            let mut sum = T::zero();
            for idx in self.row_range(i) {
                let j = self.col_indices[idx];
                sum += self.values[idx] * x[j];
            }
            y[i] = sum;
        }
    }

    /// Transpose matrix-vector product: y = A^T * x
    pub fn matvec_transpose(&self, x: &Array1<T>) -> Array1<T> {
        assert_eq!(x.len(), self.num_rows, "Input vector size mismatch");

        let mut y = Array1::from_elem(self.num_cols, T::zero());

        for i in 0..self.num_rows {
            for idx in self.row_range(i) {
                let j = self.col_indices[idx];
                y[j] += self.values[idx] * x[i];
            }
        }

        y
    }

    /// Transpose: B = A^T
    ///
    /// Two-pass construction: count entries per column, prefix-sum into the
    /// transposed row offsets, then fill. Column indices of the result come
    /// out sorted within each row.
    pub fn transpose(&self) -> CsrMatrix<T> {
        let nnz = self.nnz();
        let mut row_ptrs = vec![0usize; self.num_cols + 1];

        for &j in &self.col_indices {
            row_ptrs[j + 1] += 1;
        }
        for j in 0..self.num_cols {
            row_ptrs[j + 1] += row_ptrs[j];
        }

        let mut col_indices = vec![0usize; nnz];
        let mut values = vec![T::zero(); nnz];
        let mut next = row_ptrs.clone();

        for i in 0..self.num_rows {
            for idx in self.row_range(i) {
                let j = self.col_indices[idx];
                let dst = next[j];
                col_indices[dst] = i;
                values[dst] = self.values[idx];
                next[j] += 1;
            }
        }

        CsrMatrix {
            num_rows: self.num_cols,
            num_cols: self.num_rows,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Sparse matrix addition: C = A + B
    ///
    /// Both operands must have the same shape and sorted column indices
    /// within each row (all constructors in this crate produce sorted rows).
    pub fn add(&self, other: &CsrMatrix<T>) -> CsrMatrix<T> {
        assert_eq!(self.num_rows, other.num_rows, "Row count mismatch");
        assert_eq!(self.num_cols, other.num_cols, "Column count mismatch");

        let mut values = Vec::with_capacity(self.nnz() + other.nnz());
        let mut col_indices = Vec::with_capacity(self.nnz() + other.nnz());
        let mut row_ptrs = vec![0usize; self.num_rows + 1];

        for i in 0..self.num_rows {
            let mut a = self.row_range(i).peekable();
            let mut b = other.row_range(i).peekable();

            loop {
                match (a.peek().copied(), b.peek().copied()) {
                    (Some(ia), Some(ib)) => {
                        let ja = self.col_indices[ia];
                        let jb = other.col_indices[ib];
                        if ja < jb {
                            col_indices.push(ja);
                            values.push(self.values[ia]);
                            a.next();
                        } else if jb < ja {
                            col_indices.push(jb);
                            values.push(other.values[ib]);
                            b.next();
                        } else {
                            col_indices.push(ja);
                            values.push(self.values[ia] + other.values[ib]);
                            a.next();
                            b.next();
                        }
                    }
                    (Some(ia), None) => {
                        col_indices.push(self.col_indices[ia]);
                        values.push(self.values[ia]);
                        a.next();
                    }
                    (None, Some(ib)) => {
                        col_indices.push(other.col_indices[ib]);
                        values.push(other.values[ib]);
                        b.next();
                    }
                    (None, None) => break,
                }
            }
            row_ptrs[i + 1] = values.len();
        }

        CsrMatrix {
            num_rows: self.num_rows,
            num_cols: self.num_cols,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Compute C = A * B using sorted accumulation
    ///
    /// Uses a sorted merge per row instead of a hash map for better cache
    /// locality in the Galerkin triple product.
    pub fn matmul(&self, other: &CsrMatrix<T>) -> CsrMatrix<T> {
        assert_eq!(
            self.num_cols, other.num_rows,
            "Matrix dimension mismatch: A.cols ({}) != B.rows ({})",
            self.num_cols, other.num_rows
        );

        let m = self.num_rows;
        let n = other.num_cols;

        if m == 0 || n == 0 || self.nnz() == 0 || other.nnz() == 0 {
            return CsrMatrix::new(m, n);
        }

        let mut values = Vec::with_capacity(self.nnz());
        let mut col_indices = Vec::with_capacity(self.nnz());
        let mut row_ptrs = vec![0usize; m + 1];

        for i in 0..m {
            let mut row_data: Vec<(usize, T)> = Vec::new();

            for (k, a_ik) in self.row_entries(i) {
                for (j, b_kj) in other.row_entries(k) {
                    row_data.push((j, a_ik * b_kj));
                }
            }

            if !row_data.is_empty() {
                row_data.sort_by_key(|&(j, _)| j);

                let mut current_j = row_data[0].0;
                let mut current_val = row_data[0].1;

                for &(j, val) in &row_data[1..] {
                    if j == current_j {
                        current_val += val;
                    } else {
                        col_indices.push(current_j);
                        values.push(current_val);
                        current_j = j;
                        current_val = val;
                    }
                }
                col_indices.push(current_j);
                values.push(current_val);
            }

            row_ptrs[i + 1] = values.len();
        }

        CsrMatrix {
            num_rows: m,
            num_cols: n,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Galerkin triple product: A_c = R * A * P
    pub fn rap(r: &CsrMatrix<T>, a: &CsrMatrix<T>, p: &CsrMatrix<T>) -> CsrMatrix<T> {
        r.matmul(&a.matmul(p))
    }

    /// Convert to dense matrix (for debugging/small matrices)
    pub fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::from_elem((self.num_rows, self.num_cols), T::zero());

        for i in 0..self.num_rows {
            for idx in self.row_range(i) {
                let j = self.col_indices[idx];
                dense[[i, j]] = self.values[idx];
            }
        }

        dense
    }
}

impl<T: RealField> LinearOperator<T> for CsrMatrix<T> {
    fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn num_cols(&self) -> usize {
        self.num_cols
    }

    fn apply(&self, x: &Array1<T>) -> Array1<T> {
        self.matvec(x)
    }

    fn apply_transpose(&self, x: &Array1<T>) -> Array1<T> {
        self.matvec_transpose(x)
    }
}
