// src/engine/pipeline.rs
//
// The compression pipeline: decode, resolve orientation, progressively
// downscale to the bounding box, re-encode, then keep whichever payload
// is smaller. Stages run synchronously; each logs its transition.

use crate::config::{CompressionConfig, FormatFallback, ImageFormat};
use crate::engine::decoder::{decode_image, read_orientation_tag};
use crate::engine::encoder::encode;
use crate::engine::guard::{choose, EncodedImage};
use crate::engine::orientation::resolve;
use crate::engine::scaler;
use crate::engine::surface::{Dimension, FillMode, RasterSurface};
use crate::error::{Result, ShrinkImageError};
use tracing::{debug, warn};

/// Raw input bytes plus the media type the caller declared for them.
/// The declared type gates admission and selects the encode target;
/// decoding itself goes by magic bytes.
#[derive(Debug, Clone)]
pub struct InputPayload {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl InputPayload {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Result of one pipeline run. `source` is the untouched input payload,
/// `dist` whichever of source/recompressed the size guard kept.
#[derive(Debug, Clone)]
pub struct CompressionOutcome {
    pub source: EncodedImage,
    pub dist: EncodedImage,
    /// Set when the declared media type had no encode target and the
    /// default was substituted. Non-fatal.
    pub format_fallback: Option<FormatFallback>,
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Decoding,
    OrientationResolving,
    Scaling,
    Encoding,
    Guarding,
}

impl Stage {
    fn name(self) -> &'static str {
        match self {
            Self::Decoding => "decoding",
            Self::OrientationResolving => "orientation_resolving",
            Self::Scaling => "scaling",
            Self::Encoding => "encoding",
            Self::Guarding => "guarding",
        }
    }
}

/// One configured pipeline instance. Cheap to clone, safe to share;
/// every [`process`](Self::process) call is independent.
#[derive(Debug, Clone)]
pub struct CompressionPipeline {
    config: CompressionConfig,
}

impl CompressionPipeline {
    pub fn new(config: CompressionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn with_defaults() -> Self {
        Self {
            config: CompressionConfig::default(),
        }
    }

    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    /// Run the full pipeline on one payload.
    pub fn process(&self, input: &InputPayload) -> Result<CompressionOutcome> {
        let declared = input.media_type.trim().to_ascii_lowercase();
        if !declared.starts_with("image/") {
            return Err(ShrinkImageError::unsupported_input_type(
                input.media_type.clone(),
            ));
        }

        let (format, format_fallback) = match ImageFormat::from_media_type(&declared) {
            Some(format) => (format, None),
            None => {
                warn!(
                    declared = %input.media_type,
                    substituted = %ImageFormat::FALLBACK,
                    "declared media type has no encode target, falling back"
                );
                (
                    ImageFormat::FALLBACK,
                    Some(FormatFallback {
                        declared: input.media_type.clone(),
                        substituted: ImageFormat::FALLBACK,
                    }),
                )
            }
        };

        enter(Stage::Decoding, input.len());
        let decoded = decode_image(&input.bytes)?;
        let raw_dim = Dimension::new(decoded.width(), decoded.height());

        enter(Stage::OrientationResolving, input.len());
        let tag = read_orientation_tag(&input.bytes);
        let (canonical_dim, transform) = resolve(raw_dim, tag);

        let fill = FillMode::for_format(format);
        let source_surface = RasterSurface::from_image(&decoded);
        let mut canvas = RasterSurface::create(canonical_dim.width, canonical_dim.height);
        canvas.clear(fill);
        canvas.draw_transformed(&source_surface, &transform);

        enter(Stage::Scaling, input.len());
        let target_scale = fit_scale(canonical_dim, self.config.max_width, self.config.max_height);
        let scaled = scaler::scale(canvas, target_scale, fill)?;

        enter(Stage::Encoding, input.len());
        let encoded = encode(&scaled, format, self.config.quality)?;
        let candidate = EncodedImage::new(encoded, scaled.dimension());

        enter(Stage::Guarding, input.len());
        let source = EncodedImage::new(input.bytes.clone(), raw_dim);
        let dist = choose(source.clone(), candidate);
        debug!(
            source_bytes = source.byte_len(),
            dist_bytes = dist.byte_len(),
            width = dist.dimension.width,
            height = dist.dimension.height,
            "pipeline complete"
        );

        Ok(CompressionOutcome {
            source,
            dist,
            format_fallback,
        })
    }
}

fn enter(stage: Stage, input_len: usize) {
    debug!(stage = stage.name(), input_len, "pipeline stage");
}

/// Uniform scale factor fitting `dim` inside the bounding box, capped at
/// 1.0 so images already in bounds pass through unscaled.
fn fit_scale(dim: Dimension, max_width: u32, max_height: u32) -> f64 {
    let wr = max_width as f64 / dim.width as f64;
    let hr = max_height as f64 / dim.height as f64;
    wr.min(hr).min(1.0)
}
