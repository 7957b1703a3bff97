// src/config.rs
//
// Compression configuration and the closed set of encode target formats.

use crate::error::{Result, ShrinkImageError};
use std::fmt;

pub const DEFAULT_MAX_WIDTH: u32 = 1600;
pub const DEFAULT_MAX_HEIGHT: u32 = 1600;
pub const DEFAULT_QUALITY: f32 = 0.92;

/// Encode target formats. Closed set; anything else falls back to
/// [`ImageFormat::FALLBACK`] for the output (the input is still decoded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
}

impl ImageFormat {
    /// Default substitute when the declared media type has no encode target.
    pub const FALLBACK: ImageFormat = ImageFormat::Jpeg;

    /// Map a declared media type to an encode target. Matching is
    /// case-insensitive and tolerates the common legacy aliases.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        match media_type.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/png" | "image/x-png" => Some(Self::Png),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }

    /// Whether the encoded form carries an alpha channel. Drives the
    /// surface clear rule: targets without alpha must be drawn over
    /// opaque white to avoid alpha-to-black compositing artifacts.
    pub fn supports_alpha(self) -> bool {
        !matches!(self, Self::Jpeg)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-fatal notice that the declared media type had no encode target and
/// the default was substituted for the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatFallback {
    /// Media type as declared by the caller.
    pub declared: String,
    /// Encode target actually used.
    pub substituted: ImageFormat,
}

/// Bounding-box and quality settings for one pipeline instance.
/// Immutable once handed to [`crate::engine::CompressionPipeline`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionConfig {
    /// Maximum output width in pixels.
    pub max_width: u32,
    /// Maximum output height in pixels.
    pub max_height: u32,
    /// Encode quality in (0, 1]. Ignored for PNG.
    pub quality: f32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl CompressionConfig {
    pub fn new(max_width: u32, max_height: u32, quality: f32) -> Self {
        Self {
            max_width,
            max_height,
            quality,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_width == 0 {
            return Err(ShrinkImageError::invalid_argument(
                "max_width",
                self.max_width.to_string(),
                "must be a positive integer",
            ));
        }
        if self.max_height == 0 {
            return Err(ShrinkImageError::invalid_argument(
                "max_height",
                self.max_height.to_string(),
                "must be a positive integer",
            ));
        }
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(ShrinkImageError::invalid_argument(
                "quality",
                self.quality.to_string(),
                "must be in (0, 1]",
            ));
        }
        Ok(())
    }
}
