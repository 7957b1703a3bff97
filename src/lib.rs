//! shrink-image: orientation-aware image compression.
//!
//! Decodes a payload by magic bytes, bakes the EXIF orientation into the
//! pixel data, progressively downscales to fit a bounding box (default
//! 1600x1600), re-encodes (JPEG/PNG/WebP), and returns the original bytes
//! untouched whenever recompression would not shrink them.
//!
//! ```no_run
//! use shrink_image::{CompressionPipeline, InputPayload};
//!
//! # fn main() -> Result<(), shrink_image::ShrinkImageError> {
//! let bytes = std::fs::read("photo.jpg").map_err(|e| {
//!     shrink_image::ShrinkImageError::decode_failed(e.to_string())
//! })?;
//! let pipeline = CompressionPipeline::with_defaults();
//! let outcome = pipeline.process(&InputPayload::new(bytes, "image/jpeg"))?;
//! println!(
//!     "{} -> {} bytes ({}x{})",
//!     outcome.source.byte_len(),
//!     outcome.dist.byte_len(),
//!     outcome.dist.dimension.width,
//!     outcome.dist.dimension.height,
//! );
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;

pub use config::{
    CompressionConfig, FormatFallback, ImageFormat, DEFAULT_MAX_HEIGHT, DEFAULT_MAX_WIDTH,
    DEFAULT_QUALITY,
};
pub use engine::{
    CompressionOutcome, CompressionPipeline, Dimension, EncodedImage, InputPayload,
};
pub use error::{ErrorCategory, Result, ShrinkImageError};
