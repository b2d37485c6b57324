//! Additive Schwarz smoother
//!
//! Overlapping domain-decomposition smoother for the finer hierarchy
//! levels. The index set is split into contiguous subdomains, each grown by
//! a configurable number of adjacency layers, and each local block is
//! factored once with dense LU during setup. Applying the smoother solves
//! every local block on the restricted residual and scatters the solutions
//! back, weighting shared indices by the inverse of their multiplicity.

use crate::direct::{LuFactorization, lu_factorize};
use crate::error::AmgError;
use crate::sparse::CsrMatrix;
use crate::traits::{Preconditioner, RealField};
use ndarray::{Array1, Array2};

/// One overlapping subdomain with its factored local matrix
#[derive(Debug, Clone)]
struct SchwarzBlock<T: RealField> {
    /// Global indices covered by this subdomain, sorted
    indices: Vec<usize>,
    /// LU factors of the local submatrix
    factor: LuFactorization<T>,
}

/// Additive Schwarz smoother over contiguous, overlap-extended subdomains
#[derive(Debug, Clone)]
pub struct SchwarzSmoother<T: RealField> {
    blocks: Vec<SchwarzBlock<T>>,
    /// Inverse multiplicity per global index
    weights: Vec<T>,
    n: usize,
}

impl<T: RealField> SchwarzSmoother<T> {
    /// Build the smoother for `matrix` with `num_subdomains` contiguous
    /// partitions, each extended by `overlap` layers of graph adjacency.
    ///
    /// Fails when a local block is singular.
    pub fn from_csr(
        matrix: &CsrMatrix<T>,
        num_subdomains: usize,
        overlap: usize,
    ) -> Result<Self, AmgError> {
        let n = matrix.num_rows;
        let num_subdomains = num_subdomains.clamp(1, n.max(1));

        // symmetrized adjacency from the sparsity pattern
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
        for i in 0..n {
            for (j, _) in matrix.row_entries(i) {
                if j != i {
                    adjacency[i].push(j);
                    adjacency[j].push(i);
                }
            }
        }

        let base_size = n / num_subdomains;
        let remainder = n % num_subdomains;

        let mut blocks = Vec::with_capacity(num_subdomains);
        let mut multiplicity = vec![0usize; n];
        let mut start = 0;

        for s in 0..num_subdomains {
            let size = base_size + usize::from(s < remainder);
            let core = start..start + size;
            start += size;

            // grow the core by `overlap` adjacency layers
            let mut member = vec![false; n];
            let mut frontier: Vec<usize> = core.clone().collect();
            for &i in &frontier {
                member[i] = true;
            }
            for _ in 0..overlap {
                let mut next = Vec::new();
                for &i in &frontier {
                    for &j in &adjacency[i] {
                        if !member[j] {
                            member[j] = true;
                            next.push(j);
                        }
                    }
                }
                if next.is_empty() {
                    break;
                }
                frontier = next;
            }

            let indices: Vec<usize> = (0..n).filter(|&i| member[i]).collect();
            for &i in &indices {
                multiplicity[i] += 1;
            }

            // extract and factor the local dense block
            let local_n = indices.len();
            let mut local = Array2::from_elem((local_n, local_n), T::zero());
            for (li, &gi) in indices.iter().enumerate() {
                for (lj, &gj) in indices.iter().enumerate() {
                    local[[li, lj]] = matrix.get(gi, gj);
                }
            }
            let factor = lu_factorize(&local)?;

            blocks.push(SchwarzBlock { indices, factor });
        }

        let weights = multiplicity
            .into_iter()
            .map(|m| {
                if m == 0 {
                    T::zero()
                } else {
                    T::from_usize(m).unwrap_or_else(T::one).inv()
                }
            })
            .collect();

        Ok(Self { blocks, weights, n })
    }

    /// Number of subdomains
    pub fn num_subdomains(&self) -> usize {
        self.blocks.len()
    }

    /// Apply the smoother: gather the residual per subdomain, solve the
    /// local block, scatter back with multiplicity weights.
    pub fn apply(&self, r: &Array1<T>) -> Array1<T> {
        assert_eq!(r.len(), self.n, "residual length mismatch");

        let mut result = Array1::from_elem(self.n, T::zero());
        for block in &self.blocks {
            let local_r =
                Array1::from_iter(block.indices.iter().map(|&i| r[i]));
            // setup verified the block is nonsingular; dimensions match by
            // construction
            if let Ok(local_x) = block.factor.solve(&local_r) {
                for (li, &gi) in block.indices.iter().enumerate() {
                    result[gi] += self.weights[gi] * local_x[li];
                }
            }
        }
        result
    }
}

impl<T: RealField> Preconditioner<T> for SchwarzSmoother<T> {
    fn apply(&self, r: &Array1<T>) -> Array1<T> {
        SchwarzSmoother::apply(self, r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn laplacian_1d(n: usize) -> CsrMatrix<f64> {
        let mut triplets = Vec::new();
        for i in 0..n {
            triplets.push((i, i, 2.0));
            if i > 0 {
                triplets.push((i, i - 1, -1.0));
            }
            if i + 1 < n {
                triplets.push((i, i + 1, -1.0));
            }
        }
        CsrMatrix::from_triplets(n, n, triplets)
    }

    #[test]
    fn test_diagonal_matrix_exact_inverse() {
        // without coupling the subdomain solves are exact and disjoint
        let a = CsrMatrix::from_triplets(4, 4, vec![
            (0, 0, 2.0),
            (1, 1, 4.0),
            (2, 2, 5.0),
            (3, 3, 10.0),
        ]);
        let smoother = SchwarzSmoother::from_csr(&a, 2, 1).unwrap();
        let r = array![2.0, 4.0, 10.0, 5.0];
        let x = smoother.apply(&r);

        assert_relative_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[2], 2.0, epsilon = 1e-12);
        assert_relative_eq!(x[3], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_single_subdomain_is_direct_solve() {
        let a = laplacian_1d(6);
        let smoother = SchwarzSmoother::from_csr(&a, 1, 0).unwrap();
        let b = array![1.0, 0.0, 2.0, -1.0, 0.5, 1.0];
        let x = smoother.apply(&b);

        let residual = &a.matvec(&x) - &b;
        for r in residual.iter() {
            assert_relative_eq!(*r, 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_overlap_extends_subdomains() {
        let a = laplacian_1d(8);
        let s0 = SchwarzSmoother::from_csr(&a, 4, 0).unwrap();
        let s1 = SchwarzSmoother::from_csr(&a, 4, 1).unwrap();

        assert_eq!(s0.num_subdomains(), 4);
        assert_eq!(s1.num_subdomains(), 4);
        let covered0: usize = s0.blocks.iter().map(|b| b.indices.len()).sum();
        let covered1: usize = s1.blocks.iter().map(|b| b.indices.len()).sum();
        assert!(covered1 > covered0);
    }

    #[test]
    fn test_more_subdomains_than_rows_is_clamped() {
        let a = laplacian_1d(3);
        let smoother = SchwarzSmoother::from_csr(&a, 16, 0).unwrap();
        assert!(smoother.num_subdomains() <= 3);
    }
}
