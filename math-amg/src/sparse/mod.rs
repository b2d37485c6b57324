//! Sparse matrix formats
//!
//! Currently provides the Compressed Sparse Row (CSR) format used by the
//! AMG setup and solve phases.

mod csr;

pub use csr::CsrMatrix;
