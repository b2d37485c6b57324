//! Direct solvers
//!
//! Dense LU factorization used on the coarsest level of an AMG hierarchy
//! and for the local subdomain solves of the Schwarz smoother.

mod lu;

pub use lu::{LuError, LuFactorization, lu_factorize};
