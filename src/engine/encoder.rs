// src/engine/encoder.rs
//
// Encode capability: JPEG (mozjpeg), PNG (image crate), WebP (libwebp).
// Quality comes in as the pipeline's (0, 1] real and maps to the 1-100
// codec range; PNG ignores it.

use crate::config::ImageFormat;
use crate::engine::common::run_with_panic_policy;
use crate::engine::surface::RasterSurface;
use crate::error::{Result, ShrinkImageError};
use image::RgbaImage;
use mozjpeg::{ColorSpace, Compress, ScanMode};
use std::io::Cursor;

/// Serialize a surface to an encoded byte payload. Deterministic for a given
/// surface + format + quality triple (modulo the codecs' own guarantees).
pub fn encode(surface: &RasterSurface, format: ImageFormat, quality: f32) -> Result<Vec<u8>> {
    let codec_quality = quality_to_codec(quality);
    match format {
        ImageFormat::Jpeg => encode_jpeg(surface, codec_quality),
        ImageFormat::Png => encode_png(surface),
        ImageFormat::WebP => encode_webp(surface, codec_quality),
    }
}

/// Map the pipeline's (0, 1] quality to the 1-100 codec scale.
fn quality_to_codec(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Drop the alpha channel. JPEG input is drawn over an opaque white fill
/// upstream, so alpha is uniformly 255 by the time we get here.
fn rgba_to_rgb(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
    }
    rgb
}

/// Encode to JPEG using mozjpeg with web-optimized settings
/// (progressive scans, optimized coding, 4:2:0 chroma).
fn encode_jpeg(surface: &RasterSurface, quality: u8) -> Result<Vec<u8>> {
    run_with_panic_policy("encode:jpeg", || {
        let w = surface.width() as usize;
        let h = surface.height() as usize;
        let pixels = rgba_to_rgb(surface.as_rgba());
        if pixels.len() != w * h * 3 {
            return Err(ShrinkImageError::corrupted_image());
        }

        let mut comp = Compress::new(ColorSpace::JCS_RGB);
        comp.set_size(w, h);
        comp.set_color_space(ColorSpace::JCS_YCbCr);
        comp.set_quality(quality as f32);
        comp.set_chroma_sampling_pixel_sizes((2, 2), (2, 2));
        comp.set_progressive_mode();
        comp.set_optimize_coding(true);
        comp.set_optimize_scans(true);
        comp.set_scan_optimization_mode(ScanMode::AllComponentsTogether);

        let estimated_size = (w * h * 3 / 10).max(4096);
        let mut output = Vec::with_capacity(estimated_size);

        let mut writer = comp.start_compress(&mut output).map_err(|e| {
            ShrinkImageError::encode_failed("jpeg", format!("mozjpeg: failed to start compress: {e:?}"))
        })?;

        let stride = w * 3;
        for row in pixels.chunks(stride) {
            writer.write_scanlines(row).map_err(|e| {
                ShrinkImageError::encode_failed(
                    "jpeg",
                    format!("mozjpeg: failed to write scanlines: {e:?}"),
                )
            })?;
        }

        writer.finish().map_err(|e| {
            ShrinkImageError::encode_failed("jpeg", format!("mozjpeg: failed to finish: {e:?}"))
        })?;

        Ok(output)
    })
}

/// Encode to PNG using the image crate (lossless; quality not applicable).
fn encode_png(surface: &RasterSurface) -> Result<Vec<u8>> {
    run_with_panic_policy("encode:png", || {
        let rgba = RgbaImage::from_raw(
            surface.width(),
            surface.height(),
            surface.as_rgba().to_vec(),
        )
        .ok_or_else(ShrinkImageError::corrupted_image)?;

        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(rgba)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .map_err(|e| ShrinkImageError::encode_failed("png", format!("PNG encode failed: {e}")))?;
        Ok(buf)
    })
}

/// Encode to WebP with balanced libwebp settings (method 4, single pass,
/// autofilter; filter strength stepped down as quality drops).
fn encode_webp(surface: &RasterSurface, quality: u8) -> Result<Vec<u8>> {
    run_with_panic_policy("encode:webp", || {
        let encoder =
            webp::Encoder::from_rgba(surface.as_rgba(), surface.width(), surface.height());

        let mut config = webp::WebPConfig::new()
            .map_err(|_| ShrinkImageError::internal_panic("failed to create WebPConfig"))?;
        config.quality = quality as f32;
        config.method = 4;
        config.pass = 1;
        config.preprocessing = 0;
        config.autofilter = 1;
        config.filter_strength = if quality >= 80 {
            20
        } else if quality >= 60 {
            30
        } else {
            40
        };

        let mem = encoder.encode_advanced(&config).map_err(|e| {
            ShrinkImageError::encode_failed("webp", format!("WebP encode failed: {e:?}"))
        })?;
        Ok(mem.to_vec())
    })
}
