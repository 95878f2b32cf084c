//! Norm based comparisons of matrices.

use ndarray::ArrayView2;
use ndarray_linalg::Norm;

pub trait RelDiff {
    type A;

    /// Return the Frobenius norm of `first - second`.
    fn diff_fro(first: ArrayView2<Self::A>, second: ArrayView2<Self::A>) -> Self::A;

    /// Return the relative Frobenius norm difference of `first` and `second`.
    fn rel_diff_fro(first: ArrayView2<Self::A>, second: ArrayView2<Self::A>) -> Self::A;
}

macro_rules! rel_diff_impl {
    ($scalar:ty) => {
        impl RelDiff for $scalar {
            type A = $scalar;

            fn diff_fro(first: ArrayView2<Self::A>, second: ArrayView2<Self::A>) -> Self::A {
                let diff = first.to_owned() - &second;
                diff.norm_l2()
            }

            fn rel_diff_fro(first: ArrayView2<Self::A>, second: ArrayView2<Self::A>) -> Self::A {
                let norm = second.norm_l2();
                if norm == 0.0 {
                    return Self::diff_fro(first, second);
                }
                Self::diff_fro(first, second) / norm
            }
        }
    };
}

rel_diff_impl!(f32);
rel_diff_impl!(f64);

/// Assert that two arrays have the same shape and agree elementwise up to `eps`.
#[cfg(test)]
pub(crate) fn assert_all_close<A, S1, S2, D>(
    first: &ndarray::ArrayBase<S1, D>,
    second: &ndarray::ArrayBase<S2, D>,
    eps: f64,
) where
    A: Copy + Into<f64>,
    S1: ndarray::Data<Elem = A>,
    S2: ndarray::Data<Elem = A>,
    D: ndarray::Dimension,
{
    assert_eq!(first.shape(), second.shape());
    for (&left, &right) in first.iter().zip(second.iter()) {
        let (left, right): (f64, f64) = (left.into(), right.into());
        assert!(
            (left - right).abs() <= eps,
            "{} and {} differ by more than {}",
            left,
            right,
            eps
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_diff_fro_of_known_matrices() {
        let first = array![[1.0, 2.0], [3.0, 4.0]];
        let second = array![[1.0, 2.0], [3.0, 0.0]];

        assert_abs_diff_eq!(f64::diff_fro(first.view(), second.view()), 4.0);
        assert_abs_diff_eq!(
            f64::rel_diff_fro(first.view(), second.view()),
            4.0 / 14.0_f64.sqrt(),
            epsilon = 1E-12
        );
    }

    #[test]
    fn test_rel_diff_against_zero_matrix_is_absolute() {
        let first = array![[3.0_f32, 4.0]];
        let second = ndarray::Array2::<f32>::zeros((1, 2));

        assert_abs_diff_eq!(f32::rel_diff_fro(first.view(), second.view()), 5.0);
    }
}
