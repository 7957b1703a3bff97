// src/engine/decoder.rs
//
// Decode capability: magic-byte detection routes JPEG to mozjpeg, PNG to
// zune-png, WebP to libwebp, and everything else (BMP, GIF, TIFF, ...) to the
// image crate. The declared media type plays no part here — a mislabelled
// payload decodes if any branch can parse it.

use crate::engine::common::run_with_panic_policy;
use crate::engine::{MAX_DIMENSION, MAX_PIXELS};
use crate::error::{Result, ShrinkImageError};
use image::{DynamicImage, GrayAlphaImage, GrayImage, ImageFormat, RgbImage, RgbaImage};
use mozjpeg::Decompress;
use std::io::Cursor;
use webp::{BitstreamFeatures, Decoder as WebPDecoder};
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_png::PngDecoder;

/// Check decoded dimensions against the decompression-bomb limits.
pub fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(ShrinkImageError::dimension_exceeds_limit(
            width.max(height),
            MAX_DIMENSION,
        ));
    }
    let pixels = width as u64 * height as u64;
    if pixels > MAX_PIXELS {
        return Err(ShrinkImageError::pixel_count_exceeds_limit(pixels, MAX_PIXELS));
    }
    Ok(())
}

/// Sniff the container format from magic bytes. None if nothing matches.
pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes).ok()
}

/// Unified decode entrypoint: detect once, route to the fastest codec.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    match detect_format(bytes) {
        Some(ImageFormat::Jpeg) => decode_jpeg(bytes),
        Some(ImageFormat::Png) => decode_png(bytes),
        Some(ImageFormat::WebP) => decode_webp(bytes),
        _ => decode_with_image_crate(bytes),
    }
}

/// JPEG decode through mozjpeg's libjpeg-turbo bindings.
fn decode_jpeg(bytes: &[u8]) -> Result<DynamicImage> {
    run_with_panic_policy("decode:jpeg", || {
        // Truncated files make libjpeg fill with grey; reject them up front.
        if !bytes.windows(2).any(|pair| pair == [0xFF, 0xD9]) {
            return Err(ShrinkImageError::decode_failed(
                "jpeg: stream ends before the EOI marker",
            ));
        }

        let decompress = Decompress::new_mem(bytes).map_err(|e| {
            ShrinkImageError::decode_failed(format!("jpeg: could not open compressed stream: {e:?}"))
        })?;
        let mut decompress = decompress.rgb().map_err(|e| {
            ShrinkImageError::decode_failed(format!("jpeg: output colorspace negotiation failed: {e:?}"))
        })?;

        let width = decompress.width() as u32;
        let height = decompress.height() as u32;
        check_dimensions(width, height)?;

        let rows: Vec<[u8; 3]> = decompress.read_scanlines().map_err(|e| {
            ShrinkImageError::decode_failed(format!("jpeg: scanline read aborted: {e:?}"))
        })?;
        let flat: Vec<u8> = rows.into_iter().flatten().collect();

        RgbImage::from_raw(width, height, flat)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| ShrinkImageError::corrupted_image())
    })
}

/// Decode PNG using zune-png; 16-bit input is stripped to 8-bit.
fn decode_png(bytes: &[u8]) -> Result<DynamicImage> {
    run_with_panic_policy("decode:png", || {
        let options = DecoderOptions::default().png_set_strip_to_8bit(true);
        let mut decoder = PngDecoder::new_with_options(bytes, options);
        let pixels = decoder
            .decode()
            .map_err(|e| ShrinkImageError::decode_failed(format!("png: {e}")))?;

        let info = decoder
            .get_info()
            .ok_or_else(|| ShrinkImageError::decode_failed("png: header info absent after decode"))?;
        let width = info.width as u32;
        let height = info.height as u32;
        check_dimensions(width, height)?;

        let buf = match pixels {
            zune_core::result::DecodingResult::U8(v) => v,
            _ => {
                return Err(ShrinkImageError::decode_failed(
                    "png: 8-bit strip yielded a non-u8 buffer",
                ))
            }
        };

        let colorspace = decoder
            .get_colorspace()
            .ok_or_else(|| ShrinkImageError::decode_failed("png: colorspace unknown after decode"))?;

        let img = match colorspace {
            ColorSpace::RGB => RgbImage::from_raw(width, height, buf)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| ShrinkImageError::decode_failed("png: RGB buffer length mismatch"))?,
            ColorSpace::RGBA | ColorSpace::YCbCr | ColorSpace::BGRA | ColorSpace::ARGB => {
                RgbaImage::from_raw(width, height, buf)
                    .map(DynamicImage::ImageRgba8)
                    .ok_or_else(|| {
                        ShrinkImageError::decode_failed("png: RGBA buffer length mismatch")
                    })?
            }
            ColorSpace::Luma => GrayImage::from_raw(width, height, buf)
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(|| ShrinkImageError::decode_failed("png: Luma buffer length mismatch"))?,
            ColorSpace::LumaA => GrayAlphaImage::from_raw(width, height, buf)
                .map(DynamicImage::ImageLumaA8)
                .ok_or_else(|| {
                    ShrinkImageError::decode_failed("png: LumaA buffer length mismatch")
                })?,
            other => {
                return Err(ShrinkImageError::decode_failed(format!(
                    "png: no RGBA mapping for colorspace {other:?}"
                )))
            }
        };

        Ok(img)
    })
}

/// Decode WebP using libwebp. Animated WebP is rejected (animation support
/// is a non-goal; decoding only the first frame would silently drop data).
fn decode_webp(bytes: &[u8]) -> Result<DynamicImage> {
    run_with_panic_policy("decode:webp", || {
        // Parse the header first to avoid allocating on malformed files.
        let features = BitstreamFeatures::new(bytes).ok_or_else(|| {
            ShrinkImageError::decode_failed("webp: header probe failed")
        })?;

        if features.has_animation() {
            return Err(ShrinkImageError::decode_failed(
                "webp: animated input is not supported",
            ));
        }

        check_dimensions(features.width(), features.height())?;

        let decoded = WebPDecoder::new(bytes)
            .decode()
            .ok_or_else(|| ShrinkImageError::decode_failed("webp: decode failed"))?;

        Ok(decoded.to_image())
    })
}

/// Decode any remaining format through the image crate.
fn decode_with_image_crate(bytes: &[u8]) -> Result<DynamicImage> {
    run_with_panic_policy("decode:image", || {
        let img = image::load_from_memory(bytes)
            .map_err(|e| ShrinkImageError::decode_failed(format!("fallback decoder: {e}")))?;
        check_dimensions(img.width(), img.height())?;
        Ok(img)
    })
}

/// Extract the EXIF Orientation tag (1-8). None if missing or invalid —
/// callers treat None as upright, never as an error.
pub fn read_orientation_tag(bytes: &[u8]) -> Option<u32> {
    let mut cursor = Cursor::new(bytes);
    let exif = exif::Reader::new().read_from_container(&mut cursor).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    // The tag arrives as Short or Long depending on the writer; get_uint
    // normalizes both.
    let value = field.value.get_uint(0)?;
    if (1..=8).contains(&value) {
        Some(value)
    } else {
        None
    }
}
