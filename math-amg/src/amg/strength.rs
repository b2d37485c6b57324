//! Strength-of-connection analysis
//!
//! Filters a system matrix down to its strongly negatively coupled entries.
//! The resulting graph drives aggregation: a row whose only retained entry
//! is its self-loop has no strong neighbors and will be marked isolated.

use crate::sparse::CsrMatrix;
use crate::traits::RealField;

/// Build the strongly-coupled neighbor graph of `a` for threshold `theta`.
///
/// An off-diagonal entry (i,j) is retained iff it is negative and
/// `a_ij² ≥ θ²·|d_i·d_j|` where d is the diagonal of `a`. Diagonal entries
/// are always retained with their source value, marking every vertex as
/// connected to itself.
///
/// The output has the same row count as `a`; its nonzero count is
/// data-dependent and sized by a counting pass before filling. The input is
/// untouched.
pub fn strength_graph<T: RealField>(a: &CsrMatrix<T>, theta: f64) -> CsrMatrix<T> {
    let n = a.num_rows;
    let diag = a.diagonal();
    let theta_t = T::from_f64(theta).unwrap_or_else(T::zero);
    let theta2 = theta_t * theta_t;

    let keep = |i: usize, j: usize, v: T| -> bool {
        j == i || (v < T::zero() && v * v >= theta2 * (diag[i] * diag[j]).abs())
    };

    // Counting pass
    let mut row_ptrs = vec![0usize; n + 1];
    for i in 0..n {
        let mut count = 0;
        for (j, v) in a.row_entries(i) {
            if keep(i, j, v) {
                count += 1;
            }
        }
        row_ptrs[i + 1] = row_ptrs[i] + count;
    }

    // Filling pass
    let nnz = row_ptrs[n];
    let mut col_indices = vec![0usize; nnz];
    let mut values = vec![T::zero(); nnz];
    let mut index = 0;
    for i in 0..n {
        for (j, v) in a.row_entries(i) {
            if keep(i, j, v) {
                col_indices[index] = j;
                values[index] = v;
                index += 1;
            }
        }
    }

    CsrMatrix {
        num_rows: n,
        num_cols: a.num_cols,
        values,
        col_indices,
        row_ptrs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Symmetric 3x3 with diagonal [4,4,4]: the (0,1) coupling of -1.2
    /// passes θ=0.25 (1.44 ≥ 0.0625·16 = 1), the (1,2) coupling of -0.5
    /// does not (0.25 < 1), and the positive (0,2) entry is rejected on
    /// sign regardless of magnitude.
    fn sample() -> CsrMatrix<f64> {
        CsrMatrix::from_triplets(
            3,
            3,
            vec![
                (0, 0, 4.0),
                (0, 1, -1.2),
                (0, 2, 2.0),
                (1, 0, -1.2),
                (1, 1, 4.0),
                (1, 2, -0.5),
                (2, 0, 2.0),
                (2, 1, -0.5),
                (2, 2, 4.0),
            ],
        )
    }

    #[test]
    fn test_retains_expected_edges() {
        let g = strength_graph(&sample(), 0.25);

        // diagonals plus the symmetric (0,1) pair
        assert_eq!(g.nnz(), 5);
        assert_eq!(g.get(0, 1), -1.2);
        assert_eq!(g.get(1, 0), -1.2);
        assert_eq!(g.get(1, 2), 0.0);
        assert_eq!(g.get(0, 2), 0.0);
        for i in 0..3 {
            assert_eq!(g.get(i, i), 4.0);
        }
    }

    #[test]
    fn test_idempotent() {
        let a = sample();
        let g1 = strength_graph(&a, 0.25);
        let g2 = strength_graph(&a, 0.25);

        assert_eq!(g1.nnz(), g2.nnz());
        assert_eq!(g1.row_ptrs, g2.row_ptrs);
        assert_eq!(g1.col_indices, g2.col_indices);
        assert_eq!(g1.values, g2.values);
    }

    #[test]
    fn test_diagonal_matrix_keeps_only_self_loops() {
        let a = CsrMatrix::from_triplets(3, 3, vec![(0, 0, 1.0), (1, 1, 2.0), (2, 2, 3.0)]);
        let g = strength_graph(&a, 0.25);

        assert_eq!(g.nnz(), 3);
        for i in 0..3 {
            assert_eq!(g.row_range(i).len(), 1);
        }
    }

    #[test]
    fn test_input_untouched() {
        let a = sample();
        let nnz_before = a.nnz();
        let _ = strength_graph(&a, 0.25);
        assert_eq!(a.nnz(), nnz_before);
    }

    #[test]
    fn test_threshold_scales_filtering() {
        // with a loose threshold the weak pair comes back
        let g = strength_graph(&sample(), 0.1);
        assert_eq!(g.get(1, 2), -0.5);
        assert_eq!(g.get(0, 2), 0.0); // still positive, still rejected
    }
}
