// src/engine/surface.rs
//
// RasterSurface: an owned RGBA8 pixel buffer with known dimensions,
// supporting transformed/scaled draws, read-back, and in-place resize.
// All side effects are confined to the surface's own buffer.

use crate::config::ImageFormat;
use crate::engine::orientation::AffineTransform;
use crate::error::{Result, ShrinkImageError};
use fast_image_resize::{self as fir, images::Image, PixelType, ResizeOptions};

const BYTES_PER_PIXEL: usize = 4;

/// Pixel dimensions. Both fields are always >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimension {
    pub width: u32,
    pub height: u32,
}

impl Dimension {
    /// Zero inputs are clamped up to 1 to hold the invariant.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn byte_len(self) -> usize {
        self.width as usize * self.height as usize * BYTES_PER_PIXEL
    }
}

/// Axis-aligned sub-region of a surface, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn at_origin(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    fn fits_within(&self, dim: Dimension) -> bool {
        self.width >= 1
            && self.height >= 1
            && self.x.checked_add(self.width).is_some_and(|r| r <= dim.width)
            && self.y.checked_add(self.height).is_some_and(|b| b <= dim.height)
    }
}

/// Background fill applied before a draw. OpaqueWhite is required when the
/// encode target has no alpha channel, so semi-transparent pixels composite
/// over white instead of collapsing to black at encode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    OpaqueWhite,
    Transparent,
}

impl FillMode {
    pub fn for_format(format: ImageFormat) -> Self {
        if format.supports_alpha() {
            Self::Transparent
        } else {
            Self::OpaqueWhite
        }
    }
}

/// Owned RGBA8 raster with its current dimensions.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    dimension: Dimension,
    pixels: Vec<u8>,
}

impl RasterSurface {
    /// Zero-initialized (fully transparent) surface.
    pub fn create(width: u32, height: u32) -> Self {
        let dimension = Dimension::new(width, height);
        Self {
            pixels: vec![0; dimension.byte_len()],
            dimension,
        }
    }

    /// Build a surface from a decoded image, normalizing to RGBA8.
    pub fn from_image(img: &image::DynamicImage) -> Self {
        let rgba = img.to_rgba8();
        let dimension = Dimension::new(rgba.width(), rgba.height());
        Self {
            pixels: rgba.into_raw(),
            dimension,
        }
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn width(&self) -> u32 {
        self.dimension.width
    }

    pub fn height(&self) -> u32 {
        self.dimension.height
    }

    /// Raw RGBA8 bytes, row-major.
    pub fn as_rgba(&self) -> &[u8] {
        &self.pixels
    }

    /// Fill the whole buffer per the fill mode.
    pub fn clear(&mut self, fill: FillMode) {
        let value = match fill {
            FillMode::OpaqueWhite => 0xFF,
            FillMode::Transparent => 0x00,
        };
        self.pixels.fill(value);
    }

    fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.dimension.width as usize + x as usize) * BYTES_PER_PIXEL;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    fn blend_pixel(&mut self, x: u32, y: u32, src: [u8; 4]) {
        let idx = (y as usize * self.dimension.width as usize + x as usize) * BYTES_PER_PIXEL;
        blend_over(&mut self.pixels[idx..idx + BYTES_PER_PIXEL], src);
    }

    /// Composite `src` into this surface at 1:1 scale through an affine
    /// transform (source -> destination coordinates). Each destination pixel
    /// is inverse-mapped through the transform; the orientation transforms
    /// have determinant +/-1, so this is an exact pixel permutation.
    pub fn draw_transformed(&mut self, src: &RasterSurface, transform: &AffineTransform) {
        let inverse = transform.inverse();
        for y in 0..self.dimension.height {
            for x in 0..self.dimension.width {
                // Sample at the pixel center so integral-coefficient
                // transforms land exactly on source pixel centers.
                let (sx, sy) = inverse.apply(x as f64 + 0.5, y as f64 + 0.5);
                let sx = sx.floor();
                let sy = sy.floor();
                if sx >= 0.0
                    && sy >= 0.0
                    && (sx as u32) < src.width()
                    && (sy as u32) < src.height()
                {
                    self.blend_pixel(x, y, src.pixel(sx as u32, sy as u32));
                }
            }
        }
    }

    /// Composite a scaled copy of `src_rect` from `src` into `dst_rect` of
    /// this surface (Lanczos3 convolution; alpha-aware resampling).
    pub fn draw_scaled(&mut self, src: &RasterSurface, src_rect: Rect, dst_rect: Rect) -> Result<()> {
        let source_dims = (src_rect.width, src_rect.height);
        let target_dims = (dst_rect.width, dst_rect.height);
        if !src_rect.fits_within(src.dimension) {
            return Err(ShrinkImageError::resize_failed(
                source_dims,
                target_dims,
                "source rect exceeds source surface bounds",
            ));
        }
        if !dst_rect.fits_within(self.dimension) {
            return Err(ShrinkImageError::resize_failed(
                source_dims,
                target_dims,
                "destination rect exceeds destination surface bounds",
            ));
        }

        // Copy into a fir-owned image rather than wrapping our Vec: fir
        // requires aligned buffers and this sidesteps the alignment fallback.
        let mut src_image = Image::new(src.width(), src.height(), PixelType::U8x4);
        src_image.buffer_mut().copy_from_slice(&src.pixels);
        let mut dst_image = Image::new(dst_rect.width, dst_rect.height, PixelType::U8x4);

        // Default options multiply/divide by alpha around the convolution,
        // so straight-alpha RGBA resamples correctly.
        let options = ResizeOptions::new()
            .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3))
            .crop(
                src_rect.x as f64,
                src_rect.y as f64,
                src_rect.width as f64,
                src_rect.height as f64,
            );

        let mut resizer = fir::Resizer::new();
        resizer
            .resize(&src_image, &mut dst_image, &options)
            .map_err(|e| {
                ShrinkImageError::resize_failed(source_dims, target_dims, format!("fir: {e}"))
            })?;

        let resized = dst_image.buffer();
        for row in 0..dst_rect.height {
            for col in 0..dst_rect.width {
                let idx = (row as usize * dst_rect.width as usize + col as usize) * BYTES_PER_PIXEL;
                let px = [resized[idx], resized[idx + 1], resized[idx + 2], resized[idx + 3]];
                self.blend_pixel(dst_rect.x + col, dst_rect.y + row, px);
            }
        }
        Ok(())
    }

    /// Read back a sub-region as a tightly packed RGBA8 buffer.
    /// The rect must lie within the surface.
    pub fn read_pixels(&self, rect: Rect) -> Vec<u8> {
        assert!(
            rect.fits_within(self.dimension),
            "read_pixels rect out of bounds"
        );
        let mut out = Vec::with_capacity(rect.width as usize * rect.height as usize * BYTES_PER_PIXEL);
        let stride = self.dimension.width as usize * BYTES_PER_PIXEL;
        for row in rect.y..rect.y + rect.height {
            let start = row as usize * stride + rect.x as usize * BYTES_PER_PIXEL;
            let end = start + rect.width as usize * BYTES_PER_PIXEL;
            out.extend_from_slice(&self.pixels[start..end]);
        }
        out
    }

    /// Reallocate the backing buffer for new dimensions (contents zeroed).
    /// Committing content afterwards is `write_pixels`' job.
    pub fn resize_in_place(&mut self, dimension: Dimension) {
        self.dimension = dimension;
        self.pixels = vec![0; dimension.byte_len()];
    }

    /// Replace the whole buffer. The byte count must match the current
    /// dimensions exactly.
    pub fn write_pixels(&mut self, pixels: &[u8]) -> Result<()> {
        let expected = self.dimension.byte_len();
        if pixels.len() != expected {
            return Err(ShrinkImageError::buffer_size_mismatch(expected, pixels.len()));
        }
        self.pixels.copy_from_slice(pixels);
        Ok(())
    }
}

/// Source-over blend of straight-alpha RGBA8.
fn blend_over(dst: &mut [u8], src: [u8; 4]) {
    let sa = src[3] as u32;
    if sa == 255 {
        dst.copy_from_slice(&src);
        return;
    }
    if sa == 0 {
        return;
    }
    let da = dst[3] as u32;
    // Weights in 1/255 units: src contributes sa, dst contributes da*(255-sa)/255.
    let dst_weight = da * (255 - sa) / 255;
    let out_a = sa + dst_weight;
    if out_a == 0 {
        dst.fill(0);
        return;
    }
    for ch in 0..3 {
        let s = src[ch] as u32;
        let d = dst[ch] as u32;
        dst[ch] = ((s * sa + d * dst_weight) / out_a) as u8;
    }
    dst[3] = out_a as u8;
}
