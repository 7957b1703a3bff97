// src/engine/orientation.rs
//
// EXIF Orientation (tags 1-8) as a closed affine lookup table, plus the
// canonical-dimension swap for the rotated cases.

use crate::engine::surface::Dimension;

/// 2D affine transform in the canvas convention:
/// x' = a*x + c*y + e, y' = b*x + d*y + f.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl AffineTransform {
    pub const IDENTITY: AffineTransform = AffineTransform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Exact inverse. Orientation transforms always have det = +/-1, so the
    /// division is well-defined for every transform this crate constructs.
    pub fn inverse(&self) -> AffineTransform {
        let det = self.a * self.d - self.b * self.c;
        AffineTransform {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        }
    }
}

/// The eight EXIF orientation cases, named after where the stored image's
/// row-0/column-0 corner sits visually.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// 1 — upright (identity)
    TopLeft,
    /// 2 — mirrored horizontally
    TopRight,
    /// 3 — rotated 180
    BottomRight,
    /// 4 — mirrored vertically
    BottomLeft,
    /// 5 — transposed (mirror + 90)
    LeftTop,
    /// 6 — rotated 90 CW
    RightTop,
    /// 7 — transverse (mirror + 270)
    RightBottom,
    /// 8 — rotated 270 CW
    LeftBottom,
}

impl Orientation {
    /// Absent or out-of-range tags map to the identity case; reading
    /// orientation metadata is never fatal.
    pub fn from_tag(tag: Option<u32>) -> Self {
        match tag {
            Some(2) => Self::TopRight,
            Some(3) => Self::BottomRight,
            Some(4) => Self::BottomLeft,
            Some(5) => Self::LeftTop,
            Some(6) => Self::RightTop,
            Some(7) => Self::RightBottom,
            Some(8) => Self::LeftBottom,
            _ => Self::TopLeft,
        }
    }

    pub fn tag(self) -> u32 {
        match self {
            Self::TopLeft => 1,
            Self::TopRight => 2,
            Self::BottomRight => 3,
            Self::BottomLeft => 4,
            Self::LeftTop => 5,
            Self::RightTop => 6,
            Self::RightBottom => 7,
            Self::LeftBottom => 8,
        }
    }

    /// Tags 5-8 imply a 90/270 rotation and swap width/height.
    pub fn swaps_axes(self) -> bool {
        matches!(
            self,
            Self::LeftTop | Self::RightTop | Self::RightBottom | Self::LeftBottom
        )
    }

    /// Upright dimensions for a raw decoded image in this orientation.
    pub fn canonical_dimension(self, raw: Dimension) -> Dimension {
        if self.swaps_axes() {
            Dimension::new(raw.height, raw.width)
        } else {
            raw
        }
    }

    /// Constant affine mapping raw pixel coordinates into canonical
    /// (upright) space. Closed table; nothing derived at runtime.
    pub fn transform(self, raw: Dimension) -> AffineTransform {
        let w = raw.width as f64;
        let h = raw.height as f64;
        let (a, b, c, d, e, f) = match self {
            Self::TopLeft => (1.0, 0.0, 0.0, 1.0, 0.0, 0.0),
            Self::TopRight => (-1.0, 0.0, 0.0, 1.0, w, 0.0),
            Self::BottomRight => (-1.0, 0.0, 0.0, -1.0, w, h),
            Self::BottomLeft => (1.0, 0.0, 0.0, -1.0, 0.0, h),
            Self::LeftTop => (0.0, 1.0, 1.0, 0.0, 0.0, 0.0),
            Self::RightTop => (0.0, 1.0, -1.0, 0.0, h, 0.0),
            Self::RightBottom => (0.0, -1.0, -1.0, 0.0, h, w),
            Self::LeftBottom => (0.0, -1.0, 1.0, 0.0, 0.0, w),
        };
        AffineTransform { a, b, c, d, e, f }
    }
}

/// Resolve a raw decoded image plus its orientation tag into the canonical
/// (upright) dimensions and the transform that produces them.
pub fn resolve(raw: Dimension, tag: Option<u32>) -> (Dimension, AffineTransform) {
    let orientation = Orientation::from_tag(tag);
    (
        orientation.canonical_dimension(raw),
        orientation.transform(raw),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag_defaults_to_identity() {
        assert_eq!(Orientation::from_tag(None), Orientation::TopLeft);
        assert_eq!(Orientation::from_tag(Some(0)), Orientation::TopLeft);
        assert_eq!(Orientation::from_tag(Some(9)), Orientation::TopLeft);
        assert_eq!(Orientation::from_tag(Some(1)), Orientation::TopLeft);
    }

    #[test]
    fn test_tag_round_trip() {
        for tag in 1..=8u32 {
            assert_eq!(Orientation::from_tag(Some(tag)).tag(), tag);
        }
    }

    #[test]
    fn test_axis_swap_cases() {
        let raw = Dimension::new(40, 30);
        for tag in [1, 2, 3, 4] {
            let (canonical, _) = resolve(raw, Some(tag));
            assert_eq!(canonical, raw);
        }
        for tag in [5, 6, 7, 8] {
            let (canonical, _) = resolve(raw, Some(tag));
            assert_eq!(canonical, Dimension::new(30, 40));
        }
    }

    /// Discrete mapping of a source pixel through a tag's transform,
    /// sampling at pixel centers like the surface draw does.
    fn map_pixel(tag: u32, raw: Dimension, x: u32, y: u32) -> (u32, u32) {
        let t = Orientation::from_tag(Some(tag)).transform(raw);
        let (cx, cy) = t.apply(x as f64 + 0.5, y as f64 + 0.5);
        (cx.floor() as u32, cy.floor() as u32)
    }

    #[test]
    fn test_transform_table_corner_mapping() {
        let raw = Dimension::new(4, 2);
        // Raw top-left pixel lands where each orientation name says the
        // stored origin sits visually in canonical space.
        assert_eq!(map_pixel(1, raw, 0, 0), (0, 0));
        assert_eq!(map_pixel(2, raw, 0, 0), (3, 0));
        assert_eq!(map_pixel(3, raw, 0, 0), (3, 1));
        assert_eq!(map_pixel(4, raw, 0, 0), (0, 1));
        assert_eq!(map_pixel(5, raw, 0, 0), (0, 0));
        assert_eq!(map_pixel(6, raw, 0, 0), (1, 0));
        assert_eq!(map_pixel(7, raw, 0, 0), (1, 3));
        assert_eq!(map_pixel(8, raw, 0, 0), (0, 3));
    }

    #[test]
    fn test_transform_rotate_90_matches_image_crate() {
        // Tag 6 must agree with rotate90 on every pixel.
        let raw = Dimension::new(3, 2);
        for y in 0..raw.height {
            for x in 0..raw.width {
                let expected = (raw.height - 1 - y, x);
                assert_eq!(map_pixel(6, raw, x, y), expected);
            }
        }
    }

    #[test]
    fn test_inverse_round_trips() {
        let raw = Dimension::new(7, 5);
        for tag in 1..=8u32 {
            let t = Orientation::from_tag(Some(tag)).transform(raw);
            let inv = t.inverse();
            for &(x, y) in &[(0.5, 0.5), (3.5, 2.5), (6.5, 4.5)] {
                let (fx, fy) = t.apply(x, y);
                let (bx, by) = inv.apply(fx, fy);
                assert!((bx - x).abs() < 1e-9 && (by - y).abs() < 1e-9);
            }
        }
    }
}
