//! Tentative prolongation
//!
//! Builds the piecewise-constant transfer operator P from an aggregation:
//! row i carries exactly one entry in the column of vertex i's aggregate,
//! and isolated vertices get an empty row. Restriction is P transposed and
//! the coarse operator the Galerkin product R·A·P.

use crate::amg::aggregation::{Aggregation, VertexMark};
use crate::sparse::CsrMatrix;
use crate::traits::RealField;
use ndarray::ArrayView1;

/// Entry weighting for the tentative prolongation
#[derive(Debug, Clone, Copy)]
pub enum InterpolationWeights<'a, T: RealField> {
    /// Every stored entry is 1
    Boolean,
    /// Entry in row i takes the i-th component of a near-kernel basis
    /// vector. Values are carried as given; columns are not normalized, so
    /// the coarse basis inherits the fine vector's scaling.
    NearKernel(ArrayView1<'a, T>),
}

/// Build the tentative prolongation for `aggregation`.
///
/// The result has one row per fine vertex and one column per aggregate.
/// With [`InterpolationWeights::NearKernel`] the basis view must cover all
/// fine vertices; the hierarchy driver checks this before calling.
pub fn tentative_prolongation<T: RealField>(
    aggregation: &Aggregation,
    weights: InterpolationWeights<'_, T>,
) -> CsrMatrix<T> {
    let n = aggregation.num_vertices();
    if let InterpolationWeights::NearKernel(basis) = &weights {
        assert_eq!(basis.len(), n, "near-kernel view length mismatch");
    }

    let mut row_ptrs = vec![0usize; n + 1];
    for (i, mark) in aggregation.vertices.iter().enumerate() {
        let count = match mark {
            VertexMark::Aggregate(_) => 1,
            _ => 0,
        };
        row_ptrs[i + 1] = row_ptrs[i] + count;
    }

    let nnz = row_ptrs[n];
    let mut col_indices = vec![0usize; nnz];
    let mut values = vec![T::zero(); nnz];
    let mut index = 0;
    for (i, mark) in aggregation.vertices.iter().enumerate() {
        if let VertexMark::Aggregate(id) = mark {
            col_indices[index] = *id;
            values[index] = match weights {
                InterpolationWeights::Boolean => T::one(),
                InterpolationWeights::NearKernel(basis) => basis[i],
            };
            index += 1;
        }
    }

    CsrMatrix {
        num_rows: n,
        num_cols: aggregation.num_aggregates,
        values,
        col_indices,
        row_ptrs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn sample_aggregation() -> Aggregation {
        Aggregation {
            vertices: vec![
                VertexMark::Aggregate(0),
                VertexMark::Aggregate(0),
                VertexMark::Isolated,
                VertexMark::Aggregate(1),
                VertexMark::Aggregate(1),
            ],
            num_aggregates: 2,
        }
    }

    #[test]
    fn test_boolean_prolongation() {
        let p = tentative_prolongation::<f64>(&sample_aggregation(), InterpolationWeights::Boolean);

        assert_eq!(p.num_rows, 5);
        assert_eq!(p.num_cols, 2);
        assert_eq!(p.nnz(), 4);
        assert_relative_eq!(p.get(0, 0), 1.0);
        assert_relative_eq!(p.get(1, 0), 1.0);
        assert_relative_eq!(p.get(3, 1), 1.0);
        assert_relative_eq!(p.get(4, 1), 1.0);
        // isolated vertex has an empty row
        assert_eq!(p.row_range(2).len(), 0);
    }

    #[test]
    fn test_near_kernel_prolongation() {
        let basis = array![1.0, 2.0, 3.0, 4.0, 5.0];
        let p = tentative_prolongation(
            &sample_aggregation(),
            InterpolationWeights::NearKernel(basis.view()),
        );

        assert_relative_eq!(p.get(0, 0), 1.0);
        assert_relative_eq!(p.get(1, 0), 2.0);
        assert_relative_eq!(p.get(3, 1), 4.0);
        assert_relative_eq!(p.get(4, 1), 5.0);
        // the isolated vertex contributes nothing, whatever its basis value
        assert_eq!(p.row_range(2).len(), 0);
    }

    #[test]
    fn test_restriction_dimensions() {
        let p = tentative_prolongation::<f64>(&sample_aggregation(), InterpolationWeights::Boolean);
        let r = p.transpose();

        assert_eq!(r.num_rows, 2);
        assert_eq!(r.num_cols, 5);
        assert_eq!(r.nnz(), p.nnz());
    }

    #[test]
    fn test_galerkin_coarsens_path() {
        // 1-D Laplacian on 4 nodes, pairwise aggregation
        let a = CsrMatrix::from_triplets(
            4,
            4,
            vec![
                (0, 0, 2.0),
                (0, 1, -1.0),
                (1, 0, -1.0),
                (1, 1, 2.0),
                (1, 2, -1.0),
                (2, 1, -1.0),
                (2, 2, 2.0),
                (2, 3, -1.0),
                (3, 2, -1.0),
                (3, 3, 2.0),
            ],
        );
        let aggregation = Aggregation {
            vertices: vec![
                VertexMark::Aggregate(0),
                VertexMark::Aggregate(0),
                VertexMark::Aggregate(1),
                VertexMark::Aggregate(1),
            ],
            num_aggregates: 2,
        };
        let p = tentative_prolongation(&aggregation, InterpolationWeights::Boolean);
        let r = p.transpose();
        let ac = CsrMatrix::rap(&r, &a, &p);

        // each coarse diagonal sums 2+2-1-1 = 2, coupling sums to -1
        assert_eq!(ac.num_rows, 2);
        assert_relative_eq!(ac.get(0, 0), 2.0);
        assert_relative_eq!(ac.get(1, 1), 2.0);
        assert_relative_eq!(ac.get(0, 1), -1.0);
        assert_relative_eq!(ac.get(1, 0), -1.0);
    }
}
