use std::f64::consts::TAU;

use crate::{
    core::{Point, Rgba8, Vec2},
    error::DialResult,
    surface::{ArcStyle, Surface},
};

/// Stroke color at the leading tip of the sweep arc.
const HEAD_COLOR: Rgba8 = Rgba8::new(88, 229, 255, 204);
/// Stroke color the arc fades out to at its trailing end.
const TAIL_COLOR: Rgba8 = Rgba8::new(255, 255, 255, 0);
/// Bright dot painted on the tip.
const TIP_COLOR: Rgba8 = Rgba8::rgb(88, 229, 255);
const TIP_RADIUS: f64 = 2.0;
const STROKE_WIDTH: f64 = 2.0;

/// Rotating highlight arc shown during score reveal.
#[derive(Clone, Debug)]
pub struct SweepIndicator {
    pub radius: f64,
    /// Arc extent in radians, trailing behind the rotation angle.
    pub angular_width: f64,
    /// Current rotation of the leading tip, in radians.
    pub rotation: f64,
    /// Rotations whose remainder mod 2π sits below this are visible.
    pub visibility_threshold: f64,
}

impl SweepIndicator {
    pub fn new(radius: f64, angular_width: f64, rotation: f64, visibility_threshold: f64) -> Self {
        Self {
            radius,
            angular_width,
            rotation,
            visibility_threshold,
        }
    }

    /// Visibility is recomputed from the rotation every time; it is never
    /// cached. The remainder keeps the dividend's sign, so the whole
    /// negative-rotation approach is visible and the indicator blinks only
    /// once the remainder turns positive past the threshold.
    pub fn visible(&self) -> bool {
        (self.rotation % TAU) < self.visibility_threshold
    }

    /// Surface position of the leading tip around `center`.
    pub fn tip(&self, center: Point) -> Point {
        center + Vec2::new(self.rotation.cos(), self.rotation.sin()) * self.radius
    }

    pub fn draw(&self, surface: &mut dyn Surface, center: Point) -> DialResult<()> {
        if !self.visible() {
            return Ok(());
        }

        surface.stroke_arc(
            center,
            self.radius,
            self.rotation,
            -self.angular_width,
            ArcStyle {
                width: STROKE_WIDTH,
                head: HEAD_COLOR,
                tail: TAIL_COLOR,
            },
        )?;
        surface.fill_circle(self.tip(center), TIP_RADIUS, TIP_COLOR)
    }
}
