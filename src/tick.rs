use crate::{
    core::{Affine, Point, Rgba8, Vec2},
    error::DialResult,
    surface::{LineStyle, Surface},
};

/// One radial line segment of the dial ring.
///
/// A dumb render target: every field is driven from outside by the
/// sequencer; `draw` only reads.
#[derive(Clone, Debug)]
pub struct Tick {
    pub position: Point,
    pub width: f64,
    pub height: f64,
    pub base_color: Rgba8,
    pub fill_color: Rgba8,
    /// Rotation in radians around the tick's local origin.
    pub rotation: f64,
    pub scale: Vec2,
    /// Global alpha in [0, 1].
    pub opacity: f64,
    pub filled: bool,
}

impl Tick {
    pub fn new(
        position: Point,
        width: f64,
        height: f64,
        base_color: Rgba8,
        fill_color: Rgba8,
        rotation: f64,
    ) -> Self {
        Self {
            position,
            width,
            height,
            base_color,
            fill_color,
            rotation,
            scale: Vec2::new(1.0, 1.0),
            opacity: 1.0,
            filled: false,
        }
    }

    pub fn set_filled(&mut self, filled: bool) -> &mut Self {
        self.filled = filled;
        self
    }

    pub fn translate_by(&mut self, dx: f64, dy: f64) -> &mut Self {
        self.position += Vec2::new(dx, dy);
        self
    }

    pub fn scale_by(&mut self, sx: f64, sy: f64) -> &mut Self {
        self.scale = Vec2::new(sx, sy);
        self
    }

    /// Local-to-surface transform: translate, then rotate, then scale.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.position.to_vec2())
            * Affine::rotate(self.rotation)
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
    }

    /// Stroke the tick's local segment `(0,0) -> (0, height)`.
    pub fn draw(&self, surface: &mut dyn Surface) -> DialResult<()> {
        let color = if self.filled {
            self.fill_color
        } else {
            self.base_color
        };
        surface.stroke_line(
            self.transform(),
            Point::ORIGIN,
            Point::new(0.0, self.height),
            LineStyle {
                width: self.width,
                color,
                opacity: self.opacity.clamp(0.0, 1.0),
            },
        )
    }
}
