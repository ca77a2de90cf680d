use crate::error::{DialError, DialResult};

pub use kurbo::{Affine, Arc, BezPath, Circle, Line, Point, Vec2};

/// Drawing surface dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> DialResult<Self> {
        if width == 0 || height == 0 {
            return Err(DialError::SurfaceSize {
                width: f64::from(width),
                height: f64::from(height),
                reason: "each side needs at least one pixel",
            });
        }
        Ok(Self { width, height })
    }

    /// Geometric center of the surface.
    pub fn center(self) -> Point {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }

    /// Shorter of the two side lengths.
    pub fn min_side(self) -> f64 {
        f64::from(self.width.min(self.height))
    }
}

/// Straight-alpha RGBA8 (channels not premultiplied).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Fully opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> DialResult<Self> {
        let digits = hex.strip_prefix('#').ok_or_else(|| DialError::Color {
            input: hex.to_string(),
            reason: "missing '#' prefix",
        })?;
        let parse = |s: &str| {
            u8::from_str_radix(s, 16).map_err(|_| DialError::Color {
                input: hex.to_string(),
                reason: "non-hex digits",
            })
        };
        match digits.len() {
            6 => Ok(Self {
                r: parse(&digits[0..2])?,
                g: parse(&digits[2..4])?,
                b: parse(&digits[4..6])?,
                a: 255,
            }),
            8 => Ok(Self {
                r: parse(&digits[0..2])?,
                g: parse(&digits[2..4])?,
                b: parse(&digits[4..6])?,
                a: parse(&digits[6..8])?,
            }),
            _ => Err(DialError::Color {
                input: hex.to_string(),
                reason: "expected 6 or 8 hex digits",
            }),
        }
    }

    /// Replace the alpha channel, keeping rgb.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Per-channel linear interpolation, rounded and clamped to [0,255].
    pub fn lerp(a: Self, b: Self, t: f64) -> Self {
        fn lerp_u8(a: u8, b: u8, t: f64) -> u8 {
            let a = f64::from(a);
            let b = f64::from(b);
            (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
        }

        Self {
            r: lerp_u8(a.r, b.r, t),
            g: lerp_u8(a.g, b.g, t),
            b: lerp_u8(a.b, b.b, t),
            a: lerp_u8(a.a, b.a, t),
        }
    }

    /// Premultiplied RGBA8 bytes for raster backends.
    pub fn to_premul_bytes(self) -> [u8; 4] {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        [
            premul(self.r, self.a),
            premul(self.g, self.a),
            premul(self.b, self.a),
            self.a,
        ]
    }
}
