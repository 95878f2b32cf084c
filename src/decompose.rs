//! Decomposition of a matrix into an ordered list of rank-1 SVD terms.
//!
//! Two strategies are available:
//!
//! * [`DecompositionStrategy::Direct`] computes $(U, \Sigma, V^T)$ with the LAPACK
//!   divide and conquer SVD and keeps every column with $\sigma_j\geq tol$.
//! * [`DecompositionStrategy::Gram`] computes the eigen decomposition of the Gram
//!   matrix $G = A^TA$. Eigenvalues $\lambda_j\leq\max(n, d)\,\epsilon\,\lambda_{max}$
//!   are rounding noise of the null space and are dropped. For the remaining
//!   eigenvectors $v_j$ the singular values are $\sigma_j = \|Av_j\|$ and the left
//!   vectors $u_j = Av_j / \sigma_j$, so every left vector has unit norm.
//!   Forming $G$ squares the condition number of $A$, so this path is less accurate
//!   for small singular values.

use crate::term_list::{SVDTerm, TermList};
use crate::types::{Result, SvdCompressionError};
use ndarray::{ArrayView2, Axis, LinalgScalar};
use ndarray_linalg::{Eigh, JobSvd, Norm, SVDDCInto, UPLO};
use num::Float;

/// Singular values below this are dropped by default.
pub const DEFAULT_TOLERANCE: f64 = 1E-6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecompositionStrategy {
    /// LAPACK singular value decomposition
    Direct,
    /// Eigen decomposition of $A^TA$
    Gram,
}

impl Default for DecompositionStrategy {
    fn default() -> Self {
        DecompositionStrategy::Direct
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecomposeOptions {
    pub tolerance: f64,
    pub strategy: DecompositionStrategy,
}

impl Default for DecomposeOptions {
    fn default() -> Self {
        DecomposeOptions {
            tolerance: DEFAULT_TOLERANCE,
            strategy: DecompositionStrategy::default(),
        }
    }
}

impl DecomposeOptions {
    pub fn new(tolerance: f64, strategy: DecompositionStrategy) -> Self {
        DecomposeOptions {
            tolerance,
            strategy,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_strategy(mut self, strategy: DecompositionStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Scalar types that can be decomposed into SVD terms.
pub trait Decompose: LinalgScalar + Send + Sync {
    /// Decompose `arr` into its SVD terms, sorted by descending singular value.
    fn decompose(arr: ArrayView2<Self>, options: &DecomposeOptions) -> Result<TermList<Self>>;
}

/// Decompose a matrix with the direct strategy and the given tolerance.
pub fn decompose<A: Decompose>(arr: ArrayView2<A>, tolerance: f64) -> Result<TermList<A>> {
    A::decompose(arr, &DecomposeOptions::default().with_tolerance(tolerance))
}

/// Decompose a matrix with explicit options.
pub fn decompose_with<A: Decompose>(
    arr: ArrayView2<A>,
    options: &DecomposeOptions,
) -> Result<TermList<A>> {
    A::decompose(arr, options)
}

/// Sort candidate terms by descending singular value.
///
/// The sort is stable, so equal singular values keep the order of their
/// original index.
fn into_sorted_terms<A: Copy + PartialOrd>(mut candidates: Vec<SVDTerm<A>>) -> Vec<SVDTerm<A>> {
    candidates.sort_by(|first, second| {
        second
            .singular_value
            .partial_cmp(&first.singular_value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates
}

fn validate_input<A: Float>(arr: &ArrayView2<A>, options: &DecomposeOptions) -> Result<()> {
    if arr.nrows() == 0 || arr.ncols() == 0 {
        return Err(SvdCompressionError::InvalidInput(format!(
            "matrix must have at least one row and one column, got {}x{}",
            arr.nrows(),
            arr.ncols()
        )));
    }
    if !arr.iter().all(|item| item.is_finite()) {
        return Err(SvdCompressionError::InvalidInput(
            "matrix contains non-finite values".to_string(),
        ));
    }
    if !(options.tolerance >= 0.0) {
        return Err(SvdCompressionError::InvalidInput(format!(
            "tolerance must be non-negative, got {}",
            options.tolerance
        )));
    }
    Ok(())
}

macro_rules! decompose_impl {
    ($scalar:ty) => {
        impl Decompose for $scalar {
            fn decompose(
                arr: ArrayView2<Self>,
                options: &DecomposeOptions,
            ) -> Result<TermList<Self>> {
                validate_input(&arr, options)?;

                let tol = options.tolerance as $scalar;
                let candidates = match options.strategy {
                    DecompositionStrategy::Direct => {
                        let (u, sigma, vt) = arr.to_owned().svddc_into(JobSvd::Some)?;
                        let (u, vt) = match (u, vt) {
                            (Some(u), Some(vt)) => (u, vt),
                            _ => return Err(SvdCompressionError::MissingSingularVectors),
                        };

                        sigma
                            .iter()
                            .enumerate()
                            .filter(|&(_, &sigma_j)| sigma_j >= tol)
                            .map(|(j, &sigma_j)| {
                                SVDTerm::new(
                                    sigma_j,
                                    u.index_axis(Axis(1), j).to_owned(),
                                    vt.index_axis(Axis(0), j).to_owned(),
                                )
                            })
                            .collect::<Vec<_>>()
                    }
                    DecompositionStrategy::Gram => {
                        let gram = arr.t().dot(&arr);
                        let (lambda, v) = gram.eigh(UPLO::Upper)?;
                        let lambda_max = lambda.iter().fold(0.0, |acc: $scalar, &item| acc.max(item));
                        let noise_floor = arr.nrows().max(arr.ncols()) as $scalar
                            * <$scalar>::EPSILON
                            * lambda_max;

                        lambda
                            .iter()
                            .enumerate()
                            .filter(|&(_, &lambda_j)| lambda_j > noise_floor)
                            .map(|(j, _)| {
                                let v_j = v.index_axis(Axis(1), j).to_owned();
                                let av_j = arr.dot(&v_j);
                                (av_j.norm_l2(), av_j, v_j)
                            })
                            .filter(|(sigma_j, _, _)| *sigma_j >= tol)
                            .map(|(sigma_j, av_j, v_j)| {
                                SVDTerm::new(sigma_j, av_j.mapv(|item| item / sigma_j), v_j)
                            })
                            .collect::<Vec<_>>()
                    }
                };

                let available = arr.nrows().min(arr.ncols());
                log::debug!(
                    "Decomposed {}x{} matrix ({:?}): kept {} of {} terms with tolerance {:e}",
                    arr.nrows(),
                    arr.ncols(),
                    options.strategy,
                    candidates.len(),
                    available,
                    options.tolerance
                );

                Ok(TermList::from_sorted(
                    into_sorted_terms(candidates),
                    arr.dim(),
                    options.tolerance,
                ))
            }
        }
    };
}

decompose_impl!(f32);
decompose_impl!(f64);
