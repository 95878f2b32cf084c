//! Value domains of image channels.
//!
//! A pipeline works either on normalized floats in `[0, 1]` or on 8-bit
//! intensities in `[0, 255]`. The domain fixes the peak value used by the
//! quality metrics and the range that reconstructed values are clamped to.

use crate::types::{Result, SvdCompressionError};
use ndarray::{Array3, ArrayView3};
use num::traits::cast::cast;
use num::Float;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueDomain {
    /// Floating point intensities in `[0, 1]`
    Normalized,
    /// Integer intensities in `[0, 255]`
    Byte,
}

impl Default for ValueDomain {
    fn default() -> Self {
        ValueDomain::Normalized
    }
}

impl ValueDomain {
    /// The maximum representable value.
    pub fn peak(&self) -> f64 {
        match self {
            ValueDomain::Normalized => 1.0,
            ValueDomain::Byte => 255.0,
        }
    }

    /// Clamp a value into the domain. Byte values are also rounded to the
    /// nearest integer. Non-finite values map to the lower bound.
    pub fn clamp<A: Float>(&self, value: A) -> A {
        let value = match cast::<A, f64>(value) {
            Some(value) if value.is_finite() => value,
            _ => 0.0,
        };
        let clamped = value.max(0.0).min(self.peak());
        let clamped = match self {
            ValueDomain::Normalized => clamped,
            ValueDomain::Byte => clamped.round(),
        };
        cast::<f64, A>(clamped).unwrap_or_else(A::zero)
    }
}

/// Convert an interleaved 8-bit RGB buffer into a `(height, width, 3)` image.
pub fn rgb8_to_image<A: Float>(
    data: &[u8],
    height: usize,
    width: usize,
    domain: ValueDomain,
) -> Result<Array3<A>> {
    if data.len() != height * width * 3 {
        return Err(SvdCompressionError::InvalidInput(format!(
            "expected {} bytes for a {}x{} RGB image, got {}",
            height * width * 3,
            height,
            width,
            data.len()
        )));
    }

    let scale = 255.0 / domain.peak();
    let values = data
        .iter()
        .map(|&byte| cast::<f64, A>(byte as f64 / scale).unwrap_or_else(A::zero))
        .collect::<Vec<_>>();

    Array3::from_shape_vec((height, width, 3), values)
        .map_err(|err| SvdCompressionError::InvalidInput(err.to_string()))
}

/// Convert a `(height, width, channels)` image back into interleaved bytes.
///
/// Values are clamped into the domain before conversion.
pub fn image_to_rgb8<A: Float>(image: ArrayView3<A>, domain: ValueDomain) -> Vec<u8> {
    let scale = 255.0 / domain.peak();
    image
        .iter()
        .map(|&value| {
            let value = cast::<A, f64>(domain.clamp(value)).unwrap_or(0.0);
            (value * scale).round() as u8
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_normalized() {
        let domain = ValueDomain::Normalized;

        assert_eq!(domain.clamp(-0.25_f64), 0.0);
        assert_eq!(domain.clamp(0.25_f64), 0.25);
        assert_eq!(domain.clamp(1.75_f32), 1.0);
        assert_eq!(domain.clamp(f64::NAN), 0.0);
    }

    #[test]
    fn test_clamp_byte_rounds() {
        let domain = ValueDomain::Byte;

        assert_eq!(domain.clamp(-3.0_f64), 0.0);
        assert_eq!(domain.clamp(199.6_f64), 200.0);
        assert_eq!(domain.clamp(300.0_f32), 255.0);
    }

    #[test]
    fn test_rgb8_round_trip() {
        let data: Vec<u8> = (0..24).map(|item| (item * 10) as u8).collect();

        for domain in [ValueDomain::Normalized, ValueDomain::Byte].iter() {
            let image = rgb8_to_image::<f64>(&data, 2, 4, *domain).unwrap();
            assert_eq!(image.dim(), (2, 4, 3));
            assert_eq!(image[[0, 1, 2]], 50.0 / (255.0 / domain.peak()));

            assert_eq!(image_to_rgb8(image.view(), *domain), data);
        }
    }

    #[test]
    fn test_rgb8_wrong_length_is_rejected() {
        let data = vec![0u8; 10];

        assert!(matches!(
            rgb8_to_image::<f32>(&data, 2, 2, ValueDomain::Byte),
            Err(SvdCompressionError::InvalidInput(_))
        ));
    }
}
