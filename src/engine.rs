// src/engine.rs
//
// The core of shrink-image: a fixed five-stage pipeline
// (decode -> orientation resolve -> progressive scale -> encode -> size guard).
// This file is a facade over the decomposed modules in engine/

// =============================================================================
// SECURITY LIMITS
// =============================================================================

/// Maximum allowed image dimension (width or height).
/// Images larger than 32768x32768 are rejected to prevent decompression bombs.
/// This is the same limit used by libvips/sharp.
pub const MAX_DIMENSION: u32 = 32768;

/// Maximum allowed total pixels (width * height).
/// 100 megapixels = 400MB uncompressed RGBA. Beyond this is likely malicious.
pub const MAX_PIXELS: u64 = 100_000_000;

// =============================================================================
// MODULE DECOMPOSITION
// =============================================================================

mod common;
mod decoder;
mod encoder;
mod guard;
mod orientation;
mod pipeline;
mod scaler;
mod surface;

// Re-export commonly used types and functions
pub use decoder::{check_dimensions, decode_image, detect_format, read_orientation_tag};
pub use encoder::encode;
pub use guard::{choose, EncodedImage};
pub use orientation::{resolve, AffineTransform, Orientation};
pub use pipeline::{CompressionOutcome, CompressionPipeline, InputPayload};
pub use scaler::{plan_steps, scale, MAX_STEPS};
pub use surface::{Dimension, FillMode, RasterSurface, Rect};
