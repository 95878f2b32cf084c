//! Error type and the scalar types supported by the decomposition routines.

use ndarray_linalg::error::LinalgError;
use thiserror::Error;

pub use ndarray_linalg::{Lapack, Scalar};

#[derive(Error, Debug)]
pub enum SvdCompressionError {
    #[error("Lapack Error: {0}")]
    LinalgError(#[from] LinalgError),
    #[error("Lapack did not return the requested singular vectors")]
    MissingSingularVectors,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Requested rank {requested} is outside of [0, {available}]")]
    OutOfRange { requested: usize, available: usize },
    #[error("Shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },
}

pub type Result<T> = std::result::Result<T, SvdCompressionError>;

/// Selects how many terms of a [`TermList`](crate::term_list::TermList) are kept.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CompressionType {
    /// Adaptive compression: keep every term with `sigma_j / sigma_0 >= tol`.
    ADAPTIVE(f64),
    /// Rank based compression with specified rank
    RANK(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_singular_vectors_is_a_backend_error() {
        let err = SvdCompressionError::MissingSingularVectors;

        assert!(!matches!(err, SvdCompressionError::InvalidInput(_)));
        assert_eq!(
            err.to_string(),
            "Lapack did not return the requested singular vectors"
        );
    }
}
