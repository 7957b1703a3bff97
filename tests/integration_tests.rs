// End-to-end pipeline tests over synthesized payloads.

use image::{ImageBuffer, Rgb, Rgba};
use shrink_image::{
    CompressionConfig, CompressionPipeline, ImageFormat, InputPayload, ShrinkImageError,
};
use std::io::Cursor;

/// Smooth gradient, compresses well at every stage.
fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn gradient_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            200,
        ])
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
        .unwrap();
    buf
}

/// Deterministic per-pixel noise; near-incompressible for PNG.
fn noise_png(width: u32, height: u32) -> Vec<u8> {
    let mut state: u32 = 0x2545_F491;
    let img = ImageBuffer::from_fn(width, height, |_, _| {
        state = state.wrapping_mul(1664525).wrapping_add(1013904223);
        Rgb([
            (state >> 24) as u8,
            (state >> 16) as u8,
            (state >> 8) as u8,
        ])
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn test_oversized_image_fits_bounding_box() {
    let pipeline = CompressionPipeline::with_defaults();
    let input = InputPayload::new(gradient_png(3200, 1600), "image/png");

    let outcome = pipeline.process(&input).unwrap();
    assert!(outcome.dist.dimension.width <= 1600);
    assert!(outcome.dist.dimension.height <= 1600);
    assert!(outcome.format_fallback.is_none());
}

#[test]
fn test_in_bounds_image_keeps_dimensions() {
    let pipeline = CompressionPipeline::with_defaults();
    let input = InputPayload::new(gradient_jpeg(800, 600), "image/jpeg");

    let outcome = pipeline.process(&input).unwrap();
    assert_eq!(outcome.dist.dimension.width, 800);
    assert_eq!(outcome.dist.dimension.height, 600);
    assert_eq!(outcome.source.byte_len(), input.len());
}

#[test]
fn test_output_never_larger_than_input() {
    let pipeline = CompressionPipeline::with_defaults();
    for payload in [
        gradient_png(400, 300),
        gradient_jpeg(400, 300),
        noise_png(256, 256),
    ] {
        let media_type = if payload[..2] == [0xFF, 0xD8] {
            "image/jpeg"
        } else {
            "image/png"
        };
        let outcome = pipeline
            .process(&InputPayload::new(payload, media_type))
            .unwrap();
        assert!(outcome.dist.byte_len() <= outcome.source.byte_len());
    }
}

#[test]
fn test_unknown_image_media_type_falls_back_to_jpeg() {
    let pipeline = CompressionPipeline::with_defaults();
    // GIF declared, PNG bytes: decode goes by magic, encode target falls back.
    let input = InputPayload::new(noise_png(256, 256), "image/gif");

    let outcome = pipeline.process(&input).unwrap();
    let fallback = outcome.format_fallback.expect("fallback must be recorded");
    assert_eq!(fallback.declared, "image/gif");
    assert_eq!(fallback.substituted, ImageFormat::Jpeg);
    // Noise defeats PNG but not chroma-subsampled JPEG, so the candidate wins.
    assert_eq!(&outcome.dist.bytes[..2], &[0xFF, 0xD8]);
}

#[test]
fn test_gif_input_decodes_with_jpeg_fallback() {
    let img = ImageBuffer::from_fn(64, 48, |x, y| {
        Rgb([(x * 4) as u8, (y * 5) as u8, ((x + y) * 2) as u8])
    });
    let mut gif = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut gif), image::ImageFormat::Gif)
        .unwrap();
    assert_eq!(&gif[..6], b"GIF89a");

    let pipeline = CompressionPipeline::with_defaults();
    let outcome = pipeline
        .process(&InputPayload::new(gif, "image/gif"))
        .unwrap();
    assert_eq!(outcome.dist.dimension.width, 64);
    assert_eq!(outcome.dist.dimension.height, 48);
    let fallback = outcome.format_fallback.expect("fallback must be recorded");
    assert_eq!(fallback.declared, "image/gif");
    assert_eq!(fallback.substituted, ImageFormat::Jpeg);
}

#[test]
fn test_non_image_media_type_is_rejected() {
    let pipeline = CompressionPipeline::with_defaults();
    let input = InputPayload::new(gradient_png(16, 16), "text/plain");
    let err = pipeline.process(&input).unwrap_err();
    assert!(matches!(err, ShrinkImageError::UnsupportedInputType { .. }));
    assert!(err.is_recoverable());
}

#[test]
fn test_mislabelled_bytes_still_decode() {
    let pipeline = CompressionPipeline::with_defaults();
    // JPEG bytes declared as PNG: decoded fine, re-encoded as PNG.
    let input = InputPayload::new(gradient_jpeg(200, 150), "image/png");
    let outcome = pipeline.process(&input).unwrap();
    assert_eq!(outcome.dist.dimension.width, 200);
    assert_eq!(outcome.dist.dimension.height, 150);
    assert!(outcome.format_fallback.is_none());
}

#[test]
fn test_custom_bounding_box() {
    let pipeline = CompressionPipeline::new(CompressionConfig::new(100, 100, 0.8)).unwrap();
    let outcome = pipeline
        .process(&InputPayload::new(gradient_png(1000, 500), "image/png"))
        .unwrap();
    assert_eq!(outcome.dist.dimension.width, 100);
    assert_eq!(outcome.dist.dimension.height, 50);
}

#[test]
fn test_reprocessing_is_dimension_stable() {
    let pipeline = CompressionPipeline::with_defaults();
    let first = pipeline
        .process(&InputPayload::new(gradient_png(2400, 1800), "image/png"))
        .unwrap();
    assert!(first.dist.dimension.width <= 1600);

    let second = pipeline
        .process(&InputPayload::new(first.dist.bytes.clone(), "image/png"))
        .unwrap();
    assert_eq!(second.dist.dimension, first.dist.dimension);
}

#[test]
fn test_transparency_survives_png_path() {
    let img = ImageBuffer::from_fn(64, 64, |x, _| {
        if x < 32 {
            Rgba([255u8, 0, 0, 255])
        } else {
            Rgba([0u8, 0, 0, 0])
        }
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();

    let pipeline = CompressionPipeline::with_defaults();
    let outcome = pipeline
        .process(&InputPayload::new(buf, "image/png"))
        .unwrap();
    let decoded = image::load_from_memory(&outcome.dist.bytes).unwrap().to_rgba8();
    // Right half stays fully transparent.
    assert_eq!(decoded.get_pixel(60, 32)[3], 0);
    assert_eq!(decoded.get_pixel(4, 32)[3], 255);
}

#[test]
fn test_webp_declared_output() {
    let pipeline = CompressionPipeline::with_defaults();
    // PNG bytes with a WebP encode target.
    let input = InputPayload::new(noise_png(200, 200), "image/webp");
    let outcome = pipeline.process(&input).unwrap();
    assert!(outcome.format_fallback.is_none());
    assert!(outcome.dist.byte_len() <= outcome.source.byte_len());
    if outcome.dist.bytes != outcome.source.bytes {
        assert_eq!(&outcome.dist.bytes[..4], b"RIFF");
    }
}
