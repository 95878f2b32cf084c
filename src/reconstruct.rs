//! Truncated reconstruction from the leading terms of a [`TermList`].
//!
//! Since the terms come sorted by descending singular value, the rank $k$
//! reconstruction $A_k = \sum_{j<k}\sigma_j u_j v_j^T$ is the best rank $k$
//! approximation of $A$ in the Frobenius norm (Eckart–Young), and the error
//! $\|A - A_k\|_F = \sqrt{\sum_{j\geq k}\sigma_j^2}$ does not increase with $k$.

use crate::helpers::RelDiff;
use crate::term_list::TermList;
use crate::types::{CompressionType, Result, SvdCompressionError};
use ndarray::{Array2, ArrayView2, Axis, LinalgScalar};

impl<A: LinalgScalar> TermList<A> {
    /// Sum the expansions of the first `k` terms.
    ///
    /// Fails with `OutOfRange` if `k` exceeds the number of terms. For `k = 0`
    /// the zero matrix of the source shape is returned.
    pub fn reconstruct(&self, k: usize) -> Result<Array2<A>> {
        if k > self.len() {
            return Err(SvdCompressionError::OutOfRange {
                requested: k,
                available: self.len(),
            });
        }

        Ok(self.sum_leading_terms(k))
    }

    /// Reconstruct from `min(k, len)` terms.
    ///
    /// A matrix of rank r < min(n, d) has only r terms, but every rank up to
    /// min(n, d) still has a well defined best approximation: the full matrix.
    pub fn reconstruct_saturating(&self, k: usize) -> Array2<A> {
        self.sum_leading_terms(k.min(self.len()))
    }

    /// Compute $U_k \operatorname{diag}(\sigma_k) V_k^T$. Requires `k <= len`.
    fn sum_leading_terms(&self, k: usize) -> Array2<A> {
        if k == 0 {
            return Array2::zeros(self.shape());
        }

        let (nrows, ncols) = self.shape();
        let mut scaled_u = Array2::<A>::zeros((nrows, k));
        let mut vt = Array2::<A>::zeros((k, ncols));

        for (index, term) in self.terms()[..k].iter().enumerate() {
            let sigma = term.singular_value;
            scaled_u
                .index_axis_mut(Axis(1), index)
                .assign(&term.left_vector.mapv(|item| item * sigma));
            vt.index_axis_mut(Axis(0), index)
                .assign(&term.right_vector);
        }

        scaled_u.dot(&vt)
    }
}

impl<A: LinalgScalar + RelDiff<A = A>> TermList<A> {
    /// Frobenius norm of `original - reconstruct(k)`.
    pub fn reconstruction_error(&self, original: ArrayView2<A>, k: usize) -> Result<A> {
        if original.dim() != self.shape() {
            return Err(SvdCompressionError::ShapeMismatch {
                expected: vec![self.nrows(), self.ncols()],
                found: original.shape().to_vec(),
            });
        }
        let approximation = self.reconstruct(k)?;
        Ok(A::diff_fro(original, approximation.view()))
    }
}

impl<A: Copy + Into<f64>> TermList<A> {
    /// Number of terms to keep for a given compression type.
    ///
    /// `RANK(k)` keeps `min(k, len)` terms. `ADAPTIVE(tol)` keeps the leading
    /// terms with `sigma_j / sigma_0 >= tol`.
    pub fn rank_for(&self, compression_type: CompressionType) -> Result<usize> {
        match compression_type {
            CompressionType::RANK(rank) => Ok(rank.min(self.len())),
            CompressionType::ADAPTIVE(tol) => {
                if !((0.0..1.0).contains(&tol)) {
                    return Err(SvdCompressionError::InvalidInput(format!(
                        "Require 0 <= tol < 1.0, got {}",
                        tol
                    )));
                }
                let sigma_max: f64 = match self.get(0) {
                    Some(term) => term.singular_value.into(),
                    None => return Ok(0),
                };
                let pos = self
                    .iter()
                    .position(|term| Into::<f64>::into(term.singular_value) / sigma_max < tol);

                Ok(pos.unwrap_or_else(|| self.len()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::decompose::{decompose_with, DecomposeOptions, DecompositionStrategy};
    use crate::helpers::{assert_all_close, RelDiff};
    use crate::random_matrix::RandomMatrix;
    use crate::types::{CompressionType, SvdCompressionError};
    use ndarray::{array, Array2};

    macro_rules! eckart_young_tests {
        ($($name:ident: $scalar:ty, $strategy:expr, $dim:expr, $sigma_min:expr, $tol:expr,)*) => {
            $(
        #[test]
        fn $name() {
            let mut rng = rand::thread_rng();
            let mat = <$scalar>::random_approximate_low_rank_matrix($dim, 1.0, $sigma_min, &mut rng)
                .unwrap();
            let options = DecomposeOptions::default().with_strategy($strategy);
            let terms = decompose_with(mat.view(), &options).unwrap();
            let sigma = terms.singular_values();

            let mut previous = <$scalar>::INFINITY;
            for k in 0..=terms.len() {
                let error = terms.reconstruction_error(mat.view(), k).unwrap();

                // The residual of the truncation is given by the discarded singular values.
                let expected = sigma
                    .iter()
                    .skip(k)
                    .map(|item| item * item)
                    .sum::<$scalar>()
                    .sqrt();
                assert!((error - expected).abs() < $tol);

                // Error is non-increasing in k.
                assert!(error <= previous + $tol);
                previous = error;
            }
        }
            )*
        };
    }

    eckart_young_tests! {
        test_eckart_young_direct_f64: f64, DecompositionStrategy::Direct, (30, 20), 1E-3, 1E-10,
        test_eckart_young_direct_f32: f32, DecompositionStrategy::Direct, (20, 30), 1E-3, 1E-4,
        test_eckart_young_gram_f64: f64, DecompositionStrategy::Gram, (30, 20), 1E-3, 1E-8,
        test_eckart_young_gram_f32: f32, DecompositionStrategy::Gram, (30, 20), 1E-1, 1E-3,
    }

    #[test]
    fn test_eckart_young_rank_deficient() {
        // A 30 x 20 matrix of rank 4 with singular values 4, 3, 2, 1.
        let mut rng = rand::thread_rng();
        let u = f64::random_orthogonal_matrix((30, 4), &mut rng).unwrap();
        let vt = f64::random_orthogonal_matrix((4, 20), &mut rng).unwrap();
        let sigma = array![4.0, 3.0, 2.0, 1.0];
        let mat = u.dot(&Array2::from_diag(&sigma).dot(&vt));

        for strategy in [DecompositionStrategy::Direct, DecompositionStrategy::Gram].iter() {
            let options = DecomposeOptions::default().with_strategy(*strategy);
            let terms = decompose_with(mat.view(), &options).unwrap();

            assert_eq!(terms.len(), 4);
            assert_all_close(&terms.singular_values(), &sigma, 1E-10);
            for term in &terms {
                let norm = term.left_vector.dot(&term.left_vector).sqrt();
                assert!((norm - 1.0).abs() < 1E-10);
            }

            for k in 0..=4 {
                let error = terms.reconstruction_error(mat.view(), k).unwrap();
                let expected = sigma.iter().skip(k).map(|item| item * item).sum::<f64>().sqrt();
                assert!((error - expected).abs() < 1E-10);
            }
        }
    }

    #[test]
    fn test_rank_zero_is_zero_matrix() {
        let mat = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let terms = decompose_with(mat.view(), &DecomposeOptions::default()).unwrap();

        assert_eq!(terms.reconstruct(0).unwrap(), Array2::<f64>::zeros((2, 3)));
    }

    #[test]
    fn test_rank_above_term_count_is_out_of_range() {
        let mat = array![[1.0, 2.0], [2.0, 4.0]];
        let terms = decompose_with(mat.view(), &DecomposeOptions::default()).unwrap();
        assert_eq!(terms.len(), 1);

        match terms.reconstruct(2) {
            Err(SvdCompressionError::OutOfRange {
                requested,
                available,
            }) => {
                assert_eq!(requested, 2);
                assert_eq!(available, 1);
            }
            other => panic!("expected OutOfRange, got {:?}", other),
        }

        assert_all_close(&terms.reconstruct_saturating(2), &mat, 1E-12);
    }

    #[test]
    fn test_reconstruction_does_not_modify_terms() {
        let mat = array![[3.0, 1.0], [1.0, 3.0], [0.0, 2.0]];
        let terms = decompose_with(mat.view(), &DecomposeOptions::default()).unwrap();
        let before = terms.singular_values();

        let first = terms.reconstruct(1).unwrap();
        let full = terms.reconstruct(2).unwrap();
        let again = terms.reconstruct(1).unwrap();

        assert_eq!(first, again);
        assert_eq!(terms.singular_values(), before);
        assert!(f64::rel_diff_fro(full.view(), mat.view()) < 1E-12);
    }

    #[test]
    fn test_sum_of_expansions_matches_reconstruction() {
        let mut rng = rand::thread_rng();
        let mat = f64::random_gaussian((6, 4), &mut rng);
        let terms = decompose_with(mat.view(), &DecomposeOptions::default()).unwrap();

        let summed = terms
            .iter()
            .take(3)
            .fold(Array2::<f64>::zeros((6, 4)), |acc, term| acc + term.expanded());

        assert_all_close(&summed, &terms.reconstruct(3).unwrap(), 1E-12);
    }

    #[test]
    fn test_reconstruction_error_checks_shape() {
        let mat = Array2::<f64>::eye(3);
        let terms = decompose_with(mat.view(), &DecomposeOptions::default()).unwrap();
        let other = Array2::<f64>::eye(2);

        assert!(matches!(
            terms.reconstruction_error(other.view(), 1),
            Err(SvdCompressionError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_rank_selection() {
        let mat = Array2::from_diag(&array![8.0, 4.0, 2.0, 1.0]);
        let terms = decompose_with(mat.view(), &DecomposeOptions::default()).unwrap();

        assert_eq!(terms.rank_for(CompressionType::RANK(2)).unwrap(), 2);
        assert_eq!(terms.rank_for(CompressionType::RANK(10)).unwrap(), 4);
        assert_eq!(terms.rank_for(CompressionType::ADAPTIVE(0.3)).unwrap(), 2);
        assert_eq!(terms.rank_for(CompressionType::ADAPTIVE(0.1)).unwrap(), 4);
        assert_eq!(terms.rank_for(CompressionType::ADAPTIVE(0.0)).unwrap(), 4);
        assert!(matches!(
            terms.rank_for(CompressionType::ADAPTIVE(1.5)),
            Err(SvdCompressionError::InvalidInput(_))
        ));
    }
}
