//! Collect all traits and other exports here.

pub use crate::channel_compressor::*;
pub use crate::decompose::*;
pub use crate::domain::*;
pub use crate::helpers::*;
pub use crate::metrics::*;
pub use crate::random_matrix::*;
pub use crate::term_list::*;
pub use crate::types::*;
