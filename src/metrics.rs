//! Fidelity of a reconstruction: peak signal-to-noise ratio and structural similarity.
//!
//! Both metrics accept a single channel (2D array) or an image with the
//! channel axis last (3D array). SSIM of an image is the mean over its channels.
//!
//! SSIM follows the formulation of Wang et al. Over every $w\times w$ window
//! with local means $\mu_x, \mu_y$, sample variances $\sigma_x^2, \sigma_y^2$
//! and covariance $\sigma_{xy}$
//! $$
//! S = \frac{(2\mu_x\mu_y + C_1)(2\sigma_{xy} + C_2)}{(\mu_x^2 + \mu_y^2 + C_1)(\sigma_x^2 + \sigma_y^2 + C_2)}
//! $$
//! with $C_1 = (K_1 L)^2$, $C_2 = (K_2 L)^2$ and $L$ the peak value of the domain.
//! The result is the mean of $S$ over all windows.

use crate::domain::ValueDomain;
use crate::types::{Result, SvdCompressionError};
use itertools::iproduct;
use ndarray::{Array2, ArrayView, ArrayView2, Axis, Dimension, Ix2, Ix3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QualityMetrics {
    /// Peak signal-to-noise ratio in dB, infinite for identical inputs
    pub psnr: f64,
    /// Mean structural similarity in `[-1, 1]`
    pub ssim: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SsimOptions {
    /// Side length of the square sliding window
    pub window: usize,
    pub k1: f64,
    pub k2: f64,
}

impl Default for SsimOptions {
    fn default() -> Self {
        SsimOptions {
            window: 7,
            k1: 0.01,
            k2: 0.03,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricsOptions {
    pub domain: ValueDomain,
    pub ssim: SsimOptions,
    /// Relative tolerance under which inputs count as identical for PSNR
    pub rtol: f64,
    /// Absolute tolerance under which inputs count as identical for PSNR
    pub atol: f64,
}

impl Default for MetricsOptions {
    fn default() -> Self {
        MetricsOptions {
            domain: ValueDomain::default(),
            ssim: SsimOptions::default(),
            rtol: 1E-6,
            atol: 1E-8,
        }
    }
}

impl MetricsOptions {
    pub fn new(domain: ValueDomain) -> Self {
        MetricsOptions {
            domain,
            ..Default::default()
        }
    }
}

/// Compute PSNR and SSIM of `reconstructed` against `original`.
pub fn compute_metrics<A, D>(
    original: ArrayView<A, D>,
    reconstructed: ArrayView<A, D>,
    domain: ValueDomain,
) -> Result<QualityMetrics>
where
    A: Copy + Into<f64>,
    D: Dimension,
{
    compute_metrics_with(original, reconstructed, &MetricsOptions::new(domain))
}

pub fn compute_metrics_with<A, D>(
    original: ArrayView<A, D>,
    reconstructed: ArrayView<A, D>,
    options: &MetricsOptions,
) -> Result<QualityMetrics>
where
    A: Copy + Into<f64>,
    D: Dimension,
{
    let original = to_planes(original)?;
    let reconstructed = to_planes(reconstructed)?;
    check_shapes(&original, &reconstructed)?;

    Ok(QualityMetrics {
        psnr: psnr_of_planes(&original, &reconstructed, options),
        ssim: ssim_of_planes(&original, &reconstructed, options),
    })
}

/// Peak signal-to-noise ratio in dB.
pub fn psnr<A, D>(
    original: ArrayView<A, D>,
    reconstructed: ArrayView<A, D>,
    options: &MetricsOptions,
) -> Result<f64>
where
    A: Copy + Into<f64>,
    D: Dimension,
{
    let original = to_planes(original)?;
    let reconstructed = to_planes(reconstructed)?;
    check_shapes(&original, &reconstructed)?;
    Ok(psnr_of_planes(&original, &reconstructed, options))
}

/// Mean structural similarity.
pub fn ssim<A, D>(
    original: ArrayView<A, D>,
    reconstructed: ArrayView<A, D>,
    options: &MetricsOptions,
) -> Result<f64>
where
    A: Copy + Into<f64>,
    D: Dimension,
{
    let original = to_planes(original)?;
    let reconstructed = to_planes(reconstructed)?;
    check_shapes(&original, &reconstructed)?;
    Ok(ssim_of_planes(&original, &reconstructed, options))
}

/// Split a 2D channel or a 3D `(height, width, channels)` image into f64 planes.
fn to_planes<A, D>(arr: ArrayView<A, D>) -> Result<Vec<Array2<f64>>>
where
    A: Copy + Into<f64>,
    D: Dimension,
{
    let to_f64 = |item: &A| -> f64 { (*item).into() };
    match arr.ndim() {
        2 => {
            let plane = arr
                .into_dimensionality::<Ix2>()
                .map_err(|err| SvdCompressionError::InvalidInput(err.to_string()))?;
            Ok(vec![plane.map(to_f64)])
        }
        3 => {
            let image = arr
                .into_dimensionality::<Ix3>()
                .map_err(|err| SvdCompressionError::InvalidInput(err.to_string()))?;
            Ok(image
                .axis_iter(Axis(2))
                .map(|plane| plane.map(to_f64))
                .collect())
        }
        ndim => Err(SvdCompressionError::InvalidInput(format!(
            "expected a 2D channel or a 3D image, got {} dimensions",
            ndim
        ))),
    }
}

fn check_shapes(original: &[Array2<f64>], reconstructed: &[Array2<f64>]) -> Result<()> {
    let shape = |planes: &[Array2<f64>]| -> Vec<usize> {
        let mut shape = planes
            .first()
            .map(|plane| plane.shape().to_vec())
            .unwrap_or_default();
        shape.push(planes.len());
        shape
    };
    if shape(original) != shape(reconstructed) {
        return Err(SvdCompressionError::ShapeMismatch {
            expected: shape(original),
            found: shape(reconstructed),
        });
    }
    if original.iter().any(|plane| plane.is_empty()) {
        return Err(SvdCompressionError::InvalidInput(
            "cannot compare empty arrays".to_string(),
        ));
    }
    Ok(())
}

fn psnr_of_planes(
    original: &[Array2<f64>],
    reconstructed: &[Array2<f64>],
    options: &MetricsOptions,
) -> f64 {
    let pairs = || {
        original
            .iter()
            .zip(reconstructed)
            .flat_map(|(first, second)| first.iter().zip(second.iter()))
    };

    let all_close = pairs().all(|(&first, &second)| {
        (first - second).abs() <= options.atol + options.rtol * second.abs()
    });
    if all_close {
        return f64::INFINITY;
    }

    let count = original.iter().map(|plane| plane.len()).sum::<usize>() as f64;
    let mse = pairs()
        .map(|(&first, &second)| (first - second) * (first - second))
        .sum::<f64>()
        / count;
    let peak = options.domain.peak();

    10.0 * (peak * peak / mse).log10()
}

fn ssim_of_planes(
    original: &[Array2<f64>],
    reconstructed: &[Array2<f64>],
    options: &MetricsOptions,
) -> f64 {
    let total = original
        .iter()
        .zip(reconstructed)
        .map(|(first, second)| ssim_of_plane(first.view(), second.view(), options))
        .sum::<f64>();
    total / original.len() as f64
}

fn ssim_of_plane(first: ArrayView2<f64>, second: ArrayView2<f64>, options: &MetricsOptions) -> f64 {
    let (nrows, ncols) = first.dim();
    let window = options.ssim.window.max(1).min(nrows).min(ncols);
    let peak = options.domain.peak();
    let c1 = (options.ssim.k1 * peak).powi(2);
    let c2 = (options.ssim.k2 * peak).powi(2);
    let flat = f64::EPSILON * peak * peak;

    let samples = (window * window) as f64;
    // Sample covariance, as for an unbiased estimate over the window.
    let cov_norm = if window > 1 { samples / (samples - 1.0) } else { 1.0 };

    let positions = iproduct!(0..=nrows - window, 0..=ncols - window);
    let count = ((nrows - window + 1) * (ncols - window + 1)) as f64;

    let total = positions
        .map(|(row, col)| {
            let x = first.slice(ndarray::s![row..row + window, col..col + window]);
            let y = second.slice(ndarray::s![row..row + window, col..col + window]);

            let mu_x = x.sum() / samples;
            let mu_y = y.sum() / samples;

            let (mut var_x, mut var_y, mut cov_xy) = (0.0, 0.0, 0.0);
            for (&a, &b) in x.iter().zip(y.iter()) {
                let (dx, dy) = (a - mu_x, b - mu_y);
                var_x += dx * dx;
                var_y += dy * dy;
                cov_xy += dx * dy;
            }
            let var_x = var_x / samples * cov_norm;
            let var_y = var_y / samples * cov_norm;
            let cov_xy = cov_xy / samples * cov_norm;

            // A window without structure in either input counts as identical.
            if var_x <= flat && var_y <= flat {
                return 1.0;
            }

            let numerator = (2.0 * mu_x * mu_y + c1) * (2.0 * cov_xy + c2);
            let denominator = (mu_x * mu_x + mu_y * mu_y + c1) * (var_x + var_y + c2);
            (numerator / denominator).max(-1.0).min(1.0)
        })
        .sum::<f64>();

    (total / count).max(-1.0).min(1.0)
}
