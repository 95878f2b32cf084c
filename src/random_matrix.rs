//! Generation of random matrices and images

use crate::domain::ValueDomain;
use crate::types::{Result, SvdCompressionError};
use ndarray::{Array, Array2, Array3};
use ndarray_linalg::{JobSvd, Lapack, SVDDCInto, Scalar};
use num::traits::cast::cast;
use num::Float;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal, Uniform};

pub trait RandomMatrix
where
    Self: Scalar + Lapack,
{
    /// Generate a random Gaussian matrix.
    ///
    /// # Arguments
    ///
    /// * `dimension`: Tuple (rows, cols) specifying the number of rows and columns.
    /// * `rng`: The random number generator to use.
    fn random_gaussian<R: Rng>(dimension: (usize, usize), rng: &mut R) -> Array2<Self>;

    /// Generate a random matrix with orthonormal columns (m >= n) or rows (m < n).
    fn random_orthogonal_matrix<R: Rng>(
        dimension: (usize, usize),
        rng: &mut R,
    ) -> Result<Array2<Self>> {
        let (m, n) = if dimension.1 > dimension.0 {
            (dimension.1, dimension.0)
        } else {
            dimension
        };

        let (u, _, _) = Self::random_gaussian((m, n), rng).svddc_into(JobSvd::Some)?;
        let u = u.ok_or(SvdCompressionError::MissingSingularVectors)?;

        if dimension.1 > dimension.0 {
            Ok(u.reversed_axes())
        } else {
            Ok(u)
        }
    }

    /// Generate a random matrix with prescribed singular values.
    ///
    /// The `min(rows, cols)` singular values are logarithmically distributed
    /// between `sigma_min` and `sigma_max`.
    fn random_approximate_low_rank_matrix<R: Rng>(
        dimension: (usize, usize),
        sigma_max: f64,
        sigma_min: f64,
        rng: &mut R,
    ) -> Result<Array2<Self>> {
        if !(sigma_min > 0.0 && sigma_min < sigma_max) {
            return Err(SvdCompressionError::InvalidInput(format!(
                "expected 0 < sigma_min < sigma_max, got sigma_min = {} and sigma_max = {}",
                sigma_min, sigma_max
            )));
        }

        let min_dim = std::cmp::min(dimension.0, dimension.1);

        let u = Self::random_orthogonal_matrix((dimension.0, min_dim), rng)?;
        let vt = Self::random_orthogonal_matrix((min_dim, dimension.1), rng)?;
        let singvals = Array::geomspace(sigma_min, sigma_max, min_dim)
            .ok_or_else(|| {
                SvdCompressionError::InvalidInput("invalid singular value range".to_string())
            })?
            .mapv(|item| Self::from_real(Self::real(item)));
        let sigma = Array2::from_diag(&singvals);
        Ok(u.dot(&sigma.dot(&vt)))
    }
}

impl RandomMatrix for f64 {
    fn random_gaussian<R: Rng>(dimension: (usize, usize), rng: &mut R) -> Array2<f64> {
        random_gaussian_real::<f64, R>(dimension, rng)
    }
}

impl RandomMatrix for f32 {
    fn random_gaussian<R: Rng>(dimension: (usize, usize), rng: &mut R) -> Array2<f32> {
        random_gaussian_real::<f32, R>(dimension, rng)
    }
}

fn random_gaussian_real<T: Float, R: Rng>(dimension: (usize, usize), rng: &mut R) -> Array2<T> {
    Array2::from_shape_simple_fn(dimension, || {
        cast::<f64, T>(rng.sample(StandardNormal)).unwrap_or_else(T::zero)
    })
}

/// Generate a random `(height, width, 3)` image with values uniformly
/// distributed over `domain`. Byte images hold integer values.
pub fn random_image<T: Float, R: Rng>(
    shape: (usize, usize),
    domain: ValueDomain,
    rng: &mut R,
) -> Array3<T> {
    let uniform = Uniform::new_inclusive(0.0, domain.peak());
    Array3::from_shape_simple_fn((shape.0, shape.1, 3), || {
        let value = uniform.sample(&mut *rng);
        let value = match domain {
            ValueDomain::Normalized => value,
            ValueDomain::Byte => value.round(),
        };
        cast::<f64, T>(value).unwrap_or_else(T::zero)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray_linalg::Norm;

    #[test]
    fn test_orthogonal_matrix_has_orthonormal_columns() {
        let mut rng = rand::thread_rng();
        let q = f64::random_orthogonal_matrix((20, 8), &mut rng).unwrap();

        let gram = q.t().dot(&q);
        let diff = gram - Array2::<f64>::eye(8);
        assert!(diff.norm_l2() < 1E-12);
    }

    #[test]
    fn test_orthogonal_matrix_has_orthonormal_rows() {
        let mut rng = rand::thread_rng();
        let q = f32::random_orthogonal_matrix((5, 12), &mut rng).unwrap();

        assert_eq!(q.dim(), (5, 12));
        let diff = q.dot(&q.t()) - Array2::<f32>::eye(5);
        assert!(diff.norm_l2() < 1E-5);
    }

    #[test]
    fn test_invalid_singular_value_range_is_rejected() {
        let mut rng = rand::thread_rng();

        for &(sigma_max, sigma_min) in [(1.0, 2.0), (1.0, 0.0), (1.0, -1.0), (1.0, f64::NAN)].iter() {
            assert!(matches!(
                f64::random_approximate_low_rank_matrix((6, 4), sigma_max, sigma_min, &mut rng),
                Err(SvdCompressionError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_random_image_stays_in_domain() {
        let mut rng = rand::thread_rng();

        let image: Array3<f32> = random_image((6, 4), ValueDomain::Normalized, &mut rng);
        assert_eq!(image.dim(), (6, 4, 3));
        assert!(image.iter().all(|&item| (0.0..=1.0).contains(&item)));

        let image: Array3<f64> = random_image((6, 4), ValueDomain::Byte, &mut rng);
        assert!(image
            .iter()
            .all(|&item| (0.0..=255.0).contains(&item) && item.fract() == 0.0));
    }
}
