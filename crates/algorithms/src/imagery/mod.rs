//! Raster preparation for map views
//!
//! - Mask: clip to a boundary and null the no-light sentinel
//! - Log compress: double-log transform for colour-stable display

mod log_compress;
mod mask;

pub use log_compress::{log_compress, log_compress_value, LogCompressor};
pub use mask::{boundary_mask, mask_to_boundary, MaskParams, RasterMasker};
