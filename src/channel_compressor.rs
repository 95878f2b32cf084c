//! Per-channel SVD compression of color images.
//!
//! Every channel of a `(height, width, 3)` image is decomposed and truncated
//! independently at the same rank $k$. The truncated channels are stacked
//! again and clamped into the [`ValueDomain`] of the pipeline.
//!
//! Storing a rank $k$ approximation of an $n\times d$ channel needs
//! $k(n + d + 1)$ scalars instead of $nd$.

use crate::decompose::{Decompose, DecomposeOptions};
use crate::domain::ValueDomain;
use crate::metrics::{compute_metrics, QualityMetrics};
use crate::term_list::TermList;
use crate::types::{CompressionType, Result, SvdCompressionError};
use ndarray::{Array1, Array2, Array3, ArrayView2, ArrayView3, Axis};
use num::Float;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Number of color channels of an image.
pub const NUM_CHANNELS: usize = 3;

/// Ratio of original to compressed storage for a rank `k` approximation of an
/// `nrows x ncols` channel. Rank zero stores nothing and yields infinity.
pub fn compression_ratio(nrows: usize, ncols: usize, k: usize) -> f64 {
    if k == 0 {
        return f64::INFINITY;
    }
    (nrows * ncols) as f64 / (k * (nrows + ncols + 1)) as f64
}

/// A truncated image together with the data describing the truncation.
#[derive(Clone, Debug)]
pub struct CompressedImage<A> {
    /// The reconstructed `(height, width, 3)` image, clamped into `domain`
    pub data: Array3<A>,
    /// Rank used for every channel
    pub rank: usize,
    pub domain: ValueDomain,
    pub compression_ratio: f64,
    /// Singular values of each channel, before truncation
    pub singular_values: Vec<Array1<A>>,
}

impl<A: Copy + Into<f64>> CompressedImage<A> {
    /// PSNR and SSIM of this reconstruction against `original`, measured in
    /// the domain the image was compressed in.
    pub fn metrics(&self, original: ArrayView3<A>) -> Result<QualityMetrics> {
        compute_metrics(original, self.data.view(), self.domain)
    }
}

/// The decompositions of all channels of one image.
///
/// Decomposing is the expensive step. A `DecomposedImage` can be
/// reconstructed at any number of ranks without decomposing again.
#[derive(Clone, Debug)]
pub struct DecomposedImage<A> {
    channels: Vec<TermList<A>>,
    domain: ValueDomain,
}

impl<A> DecomposedImage<A> {
    pub fn channels(&self) -> &[TermList<A>] {
        &self.channels
    }

    pub fn domain(&self) -> ValueDomain {
        self.domain
    }

    /// Shape (height, width) of every channel.
    pub fn shape(&self) -> (usize, usize) {
        self.channels[0].shape()
    }

    /// Largest rank that can be requested, `min(height, width)`.
    pub fn max_rank(&self) -> usize {
        let (nrows, ncols) = self.shape();
        nrows.min(ncols)
    }
}

impl<A: Decompose + Float> DecomposedImage<A> {
    /// Reconstruct every channel from its `k` leading terms.
    ///
    /// Channels of lower rank than `k` are reconstructed in full.
    pub fn reconstruct(&self, k: usize) -> Result<CompressedImage<A>> {
        if k > self.max_rank() {
            return Err(SvdCompressionError::OutOfRange {
                requested: k,
                available: self.max_rank(),
            });
        }

        let (nrows, ncols) = self.shape();
        let mut data = Array3::<A>::zeros((nrows, ncols, NUM_CHANNELS));
        for (index, terms) in self.channels.iter().enumerate() {
            let domain = self.domain;
            let channel = terms.reconstruct_saturating(k).mapv(|item| domain.clamp(item));
            data.index_axis_mut(Axis(2), index).assign(&channel);
        }

        Ok(CompressedImage {
            data,
            rank: k,
            domain: self.domain,
            compression_ratio: compression_ratio(nrows, ncols, k),
            singular_values: self
                .channels
                .iter()
                .map(|terms| terms.singular_values())
                .collect(),
        })
    }
}

impl<A: Decompose + Float + Into<f64>> DecomposedImage<A> {
    /// Reconstruct with a rank chosen by `compression_type`.
    ///
    /// For adaptive compression the largest rank required by any channel is
    /// used for all channels.
    pub fn reconstruct_with(&self, compression_type: CompressionType) -> Result<CompressedImage<A>> {
        let rank = match compression_type {
            CompressionType::RANK(rank) => rank,
            CompressionType::ADAPTIVE(_) => {
                let mut rank = 0;
                for terms in &self.channels {
                    rank = rank.max(terms.rank_for(compression_type)?);
                }
                rank
            }
        };
        self.reconstruct(rank)
    }
}

/// Compresses images channel by channel.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ChannelCompressor {
    options: DecomposeOptions,
    domain: ValueDomain,
}

impl ChannelCompressor {
    pub fn new(domain: ValueDomain) -> Self {
        ChannelCompressor {
            options: DecomposeOptions::default(),
            domain,
        }
    }

    pub fn with_options(mut self, options: DecomposeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &DecomposeOptions {
        &self.options
    }

    pub fn domain(&self) -> ValueDomain {
        self.domain
    }

    /// Compress a single channel to rank `k`, clamped into the domain.
    pub fn compress_channel<A: Decompose + Float>(
        &self,
        channel: ArrayView2<A>,
        k: usize,
    ) -> Result<Array2<A>> {
        check_rank(channel.dim(), k)?;
        let terms = A::decompose(channel, &self.options)?;
        let domain = self.domain;
        Ok(terms
            .reconstruct_saturating(k)
            .mapv(|item| domain.clamp(item)))
    }

    /// Decompose three separate channel planes of equal shape.
    pub fn decompose_channels<A: Decompose + Float>(
        &self,
        channels: [ArrayView2<A>; NUM_CHANNELS],
    ) -> Result<DecomposedImage<A>> {
        check_channel_shapes(&channels)?;
        let channels = decompose_all(&channels, &self.options)?;
        Ok(DecomposedImage {
            channels,
            domain: self.domain,
        })
    }

    /// Decompose the channels of a `(height, width, 3)` image.
    pub fn decompose_image<A: Decompose + Float>(
        &self,
        image: ArrayView3<A>,
    ) -> Result<DecomposedImage<A>> {
        self.decompose_channels(split_channels(&image)?)
    }

    /// Compress three separate channel planes to rank `k`.
    pub fn compress_channels<A: Decompose + Float>(
        &self,
        channels: [ArrayView2<A>; NUM_CHANNELS],
        k: usize,
    ) -> Result<CompressedImage<A>> {
        check_channel_shapes(&channels)?;
        check_rank(channels[0].dim(), k)?;
        self.decompose_channels(channels)?.reconstruct(k)
    }

    /// Compress a `(height, width, 3)` image to rank `k`.
    pub fn compress_image<A: Decompose + Float>(
        &self,
        image: ArrayView3<A>,
        k: usize,
    ) -> Result<CompressedImage<A>> {
        log::debug!(
            "Compressing {}x{} image to rank {} ({:?}, {:?})",
            image.len_of(Axis(0)),
            image.len_of(Axis(1)),
            k,
            self.options.strategy,
            self.domain
        );
        self.compress_channels(split_channels(&image)?, k)
    }
}

/// Compress a normalized `(height, width, 3)` image to rank `k` with the
/// default decomposition options.
pub fn compress_image<A: Decompose + Float>(
    image: ArrayView3<A>,
    k: usize,
) -> Result<CompressedImage<A>> {
    ChannelCompressor::new(ValueDomain::Normalized).compress_image(image, k)
}

fn split_channels<'a, A>(image: &'a ArrayView3<A>) -> Result<[ArrayView2<'a, A>; NUM_CHANNELS]> {
    if image.len_of(Axis(2)) != NUM_CHANNELS {
        return Err(SvdCompressionError::InvalidInput(format!(
            "expected an image with {} channels, got {}",
            NUM_CHANNELS,
            image.len_of(Axis(2))
        )));
    }
    Ok([
        image.index_axis(Axis(2), 0),
        image.index_axis(Axis(2), 1),
        image.index_axis(Axis(2), 2),
    ])
}

fn check_channel_shapes<A>(channels: &[ArrayView2<A>]) -> Result<()> {
    let shape = channels[0].dim();
    for channel in channels.iter().skip(1) {
        if channel.dim() != shape {
            return Err(SvdCompressionError::InvalidInput(format!(
                "channels differ in shape: {:?} and {:?}",
                shape,
                channel.dim()
            )));
        }
    }
    Ok(())
}

fn check_rank(shape: (usize, usize), k: usize) -> Result<()> {
    let available = shape.0.min(shape.1);
    if k > available {
        return Err(SvdCompressionError::OutOfRange {
            requested: k,
            available,
        });
    }
    Ok(())
}

#[cfg(feature = "rayon")]
fn decompose_all<A: Decompose>(
    channels: &[ArrayView2<A>],
    options: &DecomposeOptions,
) -> Result<Vec<TermList<A>>> {
    channels
        .par_iter()
        .map(|channel| A::decompose(channel.view(), options))
        .collect()
}

#[cfg(not(feature = "rayon"))]
fn decompose_all<A: Decompose>(
    channels: &[ArrayView2<A>],
    options: &DecomposeOptions,
) -> Result<Vec<TermList<A>>> {
    channels
        .iter()
        .map(|channel| A::decompose(channel.view(), options))
        .collect()
}
