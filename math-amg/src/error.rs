//! Error types for sparse matrix construction and AMG setup.
//!
//! Structured error handling using `thiserror` for library error types,
//! with helper methods for error categorization.

use crate::direct::LuError;
use thiserror::Error;

/// Errors raised when assembling a CSR matrix from raw arrays.
#[derive(Debug, Error)]
pub enum CsrError {
    /// The row-offset array has the wrong length (must be rows + 1).
    #[error("row_ptrs must have {expected} entries, got {got}")]
    RowPtrLength {
        /// Expected length (rows + 1)
        expected: usize,
        /// Actual length provided
        got: usize,
    },

    /// Column-index and value arrays disagree in length.
    #[error("col_indices has {cols} entries but values has {vals}")]
    EntryLengthMismatch {
        /// Length of the column-index array
        cols: usize,
        /// Length of the value array
        vals: usize,
    },

    /// Row offsets must start at zero and be non-decreasing.
    #[error("row_ptrs must start at 0 and be non-decreasing (violated at row {row})")]
    NonMonotonicRowPtr {
        /// First row at which monotonicity fails
        row: usize,
    },

    /// The final row offset must equal the number of stored entries.
    #[error("row_ptrs[rows] = {got} must equal nnz = {nnz}")]
    TrailingOffset {
        /// Value of the final row offset
        got: usize,
        /// Number of stored entries
        nnz: usize,
    },

    /// A stored column index lies outside [0, cols).
    #[error("column index {col} out of bounds for {num_cols} columns (entry {entry})")]
    ColumnOutOfBounds {
        /// The offending column index
        col: usize,
        /// Number of columns in the matrix
        num_cols: usize,
        /// Position of the offending entry in the value array
        entry: usize,
    },
}

/// Errors that can occur during AMG hierarchy setup.
#[derive(Debug, Error)]
pub enum AmgError {
    /// Aggregation formed too few aggregates to continue coarsening.
    ///
    /// The hierarchy driver absorbs this error and terminates setup early,
    /// keeping the levels built so far.
    #[error("coarsening on level {level} formed only {aggregates} aggregates")]
    CoarseningFailure {
        /// Level on which aggregation failed
        level: usize,
        /// Number of aggregates formed before the failure was detected
        aggregates: usize,
    },

    /// Maximum aggregation size must be at least 1.
    #[error("max aggregation size must be >= 1, got {got}")]
    InvalidMaxAggregation {
        /// The invalid cap
        got: usize,
    },

    /// Strength-of-connection threshold is out of range (0, 1].
    #[error("strength threshold must be in (0, 1], got {got}")]
    InvalidStrengthThreshold {
        /// The invalid threshold
        got: f64,
    },

    /// Minimum coarse dimension must be at least 1.
    #[error("minimum coarse size must be >= 1, got {got}")]
    InvalidMinCoarseSize {
        /// The invalid minimum
        got: usize,
    },

    /// Maximum hierarchy depth must be at least 1.
    #[error("maximum level count must be >= 1, got {got}")]
    InvalidMaxLevels {
        /// The invalid depth
        got: usize,
    },

    /// A near-kernel vector does not match the fine-grid dimension.
    #[error("near-kernel vector has {got} entries, expected {expected}")]
    NearKernelDimension {
        /// Expected length (fine dof count)
        expected: usize,
        /// Actual length provided
        got: usize,
    },

    /// An empty near-kernel basis was supplied.
    #[error("near-kernel basis must contain at least one vector")]
    EmptyNearKernel,

    /// A right-hand side or initial guess does not match the system size.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected length
        expected: usize,
        /// Actual length provided
        got: usize,
    },

    /// Direct factorization of a level matrix failed.
    #[error("direct factorization failed: {0}")]
    Factorization(#[from] LuError),

    /// Invalid sparse structure supplied as input.
    #[error("invalid sparse structure: {0}")]
    Sparse(#[from] CsrError),
}

/// A specialized `Result` type for AMG operations.
pub type Result<T> = std::result::Result<T, AmgError>;

impl AmgError {
    /// Returns `true` if this error is absorbed by the hierarchy driver as
    /// an early (still successful) termination rather than propagated.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AmgError::CoarseningFailure { .. })
    }

    /// Returns `true` if this is a configuration-validation error.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            AmgError::InvalidMaxAggregation { .. }
                | AmgError::InvalidStrengthThreshold { .. }
                | AmgError::InvalidMinCoarseSize { .. }
                | AmgError::InvalidMaxLevels { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AmgError::CoarseningFailure {
            level: 2,
            aggregates: 0,
        };
        assert_eq!(
            err.to_string(),
            "coarsening on level 2 formed only 0 aggregates"
        );
    }

    #[test]
    fn test_is_recoverable() {
        let coarsening = AmgError::CoarseningFailure {
            level: 0,
            aggregates: 0,
        };
        let config = AmgError::InvalidMaxAggregation { got: 0 };

        assert!(coarsening.is_recoverable());
        assert!(!config.is_recoverable());
    }

    #[test]
    fn test_is_config_error() {
        let config = AmgError::InvalidStrengthThreshold { got: 2.0 };
        let dim = AmgError::DimensionMismatch {
            expected: 4,
            got: 3,
        };

        assert!(config.is_config_error());
        assert!(!dim.is_config_error());
    }

    #[test]
    fn test_csr_error_display() {
        let err = CsrError::ColumnOutOfBounds {
            col: 7,
            num_cols: 5,
            entry: 3,
        };
        assert_eq!(
            err.to_string(),
            "column index 7 out of bounds for 5 columns (entry 3)"
        );
    }
}
