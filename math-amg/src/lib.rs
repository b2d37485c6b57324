//! Unsmoothed-aggregation algebraic multigrid setup and solve
//!
//! This crate builds AMG hierarchies for sparse symmetric systems using
//! unsmoothed (tentative) aggregation, along with the sparse and dense
//! kernels the setup needs.
//!
//! # Features
//!
//! - **Sparse Matrices**: CSR format with matrix-vector, transpose and
//!   Galerkin triple products
//! - **Coarsening**: greedy capped aggregation and heavy-edge coarsening
//!   over an adaptive strength-of-connection graph
//! - **Transfer Operators**: boolean or near-kernel tentative prolongation,
//!   restriction by transposition
//! - **Solve Phase**: V/W multigrid cycles with damped Jacobi or additive
//!   Schwarz smoothing and a dense LU coarse solve
//! - **Generic Scalar Types**: works with f64 and f32
//!
//! # Example
//!
//! ```ignore
//! use math_amg::{AmgConfig, AmgHierarchy, CsrMatrix};
//!
//! let matrix: CsrMatrix<f64> = CsrMatrix::from_triplets(n, n, triplets);
//! let mut hierarchy = AmgHierarchy::setup(&matrix, &AmgConfig::default())?;
//! let solution = hierarchy.solve(&rhs, 1e-8, 100)?;
//! ```

pub mod amg;
pub mod direct;
pub mod error;
pub mod sparse;
pub mod traits;

// Re-export main types
pub use sparse::CsrMatrix;
pub use traits::{IdentityPreconditioner, LinearOperator, Preconditioner, RealField};

// Re-export the multigrid surface
pub use amg::{
    AggregationType, AmgConfig, AmgDiagnostics, AmgHierarchy, CoarseSolverType, CycleType,
    InterpolationType, SchwarzSmoother, SetupTermination,
};

// Re-export direct solvers and errors
pub use direct::{LuError, LuFactorization, lu_factorize};
pub use error::{AmgError, CsrError, Result};
