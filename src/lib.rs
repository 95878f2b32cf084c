//! Lossy image compression with the truncated singular value decomposition.
//!
//! A channel $A\in\mathbb{R}^{n\times d}$ is decomposed into rank-1 terms
//! $\sigma_j u_j v_j^T$ ([`decompose()`]), approximated by the sum of its $k$
//! leading terms ([`TermList::reconstruct`]), and compared against the original
//! with PSNR and SSIM ([`compute_metrics`]). [`ChannelCompressor`] applies this to
//! each channel of an RGB image.

pub mod channel_compressor;
pub mod decompose;
pub mod domain;
pub mod helpers;
pub mod metrics;
pub mod prelude;
pub mod random_matrix;
pub mod reconstruct;
pub mod term_list;
pub mod types;

pub use channel_compressor::{
    compress_image, compression_ratio, ChannelCompressor, CompressedImage, DecomposedImage,
};
pub use decompose::{
    decompose, decompose_with, Decompose, DecomposeOptions, DecompositionStrategy,
    DEFAULT_TOLERANCE,
};
pub use domain::ValueDomain;
pub use helpers::RelDiff;
pub use metrics::{compute_metrics, compute_metrics_with, MetricsOptions, QualityMetrics};
pub use random_matrix::RandomMatrix;
pub use term_list::{SVDTerm, TermList};
pub use types::{CompressionType, Result, SvdCompressionError};
