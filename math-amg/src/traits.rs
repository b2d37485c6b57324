//! Core traits for linear algebra operations
//!
//! This module defines the fundamental abstractions used throughout the crate:
//! - [`RealField`]: Trait for real scalar types
//! - [`LinearOperator`]: Trait for matrix-like objects that can perform matrix-vector products
//! - [`Preconditioner`]: Trait for preconditioning operations

use ndarray::Array1;
use num_traits::{Float, FromPrimitive, NumAssign};
use std::fmt::Debug;

/// Trait for real scalar types usable in the sparse and multigrid kernels.
///
/// Algebraic-multigrid coarsening inspects the sign of matrix entries
/// (strong couplings are negative), so the scalar field is real by
/// construction.
///
/// # Implementations
///
/// Provided for:
/// - `f64` (default for FEM systems)
/// - `f32` (for memory-constrained applications)
pub trait RealField:
    Float + NumAssign + FromPrimitive + Send + Sync + Debug + 'static
{
    /// Check if this value is approximately zero
    fn is_zero_approx(&self, tol: Self) -> bool {
        self.abs() < tol
    }

    /// Multiplicative inverse (1/x)
    fn inv(&self) -> Self {
        Self::one() / *self
    }
}

impl RealField for f64 {}
impl RealField for f32 {}

/// Trait for linear operators (matrices) that can perform matrix-vector products.
///
/// This abstraction lets the solve phase treat system matrices and transfer
/// operators interchangeably.
pub trait LinearOperator<T: RealField>: Send + Sync {
    /// Number of rows in the operator
    fn num_rows(&self) -> usize;

    /// Number of columns in the operator
    fn num_cols(&self) -> usize;

    /// Apply the operator: y = A * x
    fn apply(&self, x: &Array1<T>) -> Array1<T>;

    /// Apply the transpose: y = A^T * x
    fn apply_transpose(&self, x: &Array1<T>) -> Array1<T>;

    /// Check if the operator is square
    fn is_square(&self) -> bool {
        self.num_rows() == self.num_cols()
    }
}

/// Trait for preconditioners used in iterative solvers.
///
/// A preconditioner M approximates A^(-1), so that M*A is better conditioned
/// than A alone. This accelerates convergence of iterative methods.
pub trait Preconditioner<T: RealField>: Send + Sync {
    /// Apply the preconditioner: y = M * r
    ///
    /// This should approximate solving A * y = r
    fn apply(&self, r: &Array1<T>) -> Array1<T>;
}

/// Identity preconditioner (no preconditioning)
#[derive(Clone, Debug, Default)]
pub struct IdentityPreconditioner;

impl<T: RealField> Preconditioner<T> for IdentityPreconditioner {
    fn apply(&self, r: &Array1<T>) -> Array1<T> {
        r.clone()
    }
}
