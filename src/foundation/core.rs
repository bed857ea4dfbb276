pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Canvas (view box) size declared by a movie, in movie units.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// View box width.
    pub width: f64,
    /// View box height.
    pub height: f64,
}

impl Canvas {
    /// Pixel dimensions for a raster target (rounded up, at least 1x1).
    pub fn pixel_size(self) -> (u32, u32) {
        fn px(v: f64) -> u32 {
            if v.is_finite() && v > 1.0 {
                v.ceil().min(f64::from(u16::MAX)) as u32
            } else {
                1
            }
        }
        (px(self.width), px(self.height))
    }
}

/// Straight-alpha RGBA color with components in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rgba {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Rgba {
    /// Create a color from unit-range components.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from unit-range components.
    pub const fn opaque(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Quantize to straight-alpha RGBA8.
    pub fn to_rgba8(self) -> [u8; 4] {
        fn q(c: f32) -> u8 {
            (c.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}
