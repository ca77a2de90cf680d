use std::f64::consts::FRAC_PI_2;

use crate::{
    color::ColorRamp,
    config::DialOptions,
    core::{Point, Rgba8, Vec2},
    error::{DialError, DialResult},
    tick::Tick,
};

/// Circular arrangement of the dial's ticks.
///
/// Produces `tick_count + 1` ticks spanning `[start_angle, start_angle +
/// angular_span]`; sequence order equals increasing angle equals the
/// score-fill order.
#[derive(Clone, Debug)]
pub struct DialLayout {
    pub center: Point,
    pub radius: f64,
    pub tick_count: u32,
    pub start_angle: f64,
    pub angular_span: f64,
    pub tick_width: f64,
    pub tick_height: f64,
    pub base_color: Rgba8,
    ramp: ColorRamp,
}

impl DialLayout {
    pub fn new(
        center: Point,
        radius: f64,
        tick_count: u32,
        start_angle: f64,
        angular_span: f64,
        tick_width: f64,
        tick_height: f64,
        base_color: Rgba8,
        anchors: Vec<Rgba8>,
    ) -> DialResult<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(DialError::InvalidOption {
                field: "radius",
                reason: "must be finite and > 0",
            });
        }
        if !angular_span.is_finite() || angular_span <= 0.0 {
            return Err(DialError::InvalidOption {
                field: "angular_span",
                reason: "must be finite and > 0",
            });
        }
        let ramp = ColorRamp::new(anchors, tick_count)?;
        Ok(Self {
            center,
            radius,
            tick_count,
            start_angle,
            angular_span,
            tick_width,
            tick_height,
            base_color,
            ramp,
        })
    }

    pub fn from_options(options: &DialOptions, center: Point) -> DialResult<Self> {
        Self::new(
            center,
            options.base_radius,
            options.tick_count,
            options.start_angle,
            options.angular_span,
            options.tick_width,
            options.tick_height,
            options.tick_base_color,
            options.color_anchors.clone(),
        )
    }

    /// Angle of tick `index`, increasing with index.
    pub fn angle_of(&self, index: u32) -> f64 {
        self.start_angle
            + f64::from(index) * self.angular_span / f64::from(self.tick_count)
    }

    /// Surface position of tick `index` placed at `radius` from the center.
    pub fn point_at(&self, index: u32, radius: f64) -> Point {
        let angle = self.angle_of(index);
        self.center + Vec2::new(angle.cos(), angle.sin()) * radius
    }

    /// Build the tick ring at the base radius, invisible (opacity 0) so the
    /// entrance phase can fade it in. Ticks point radially outward.
    pub fn build(&self) -> DialResult<Vec<Tick>> {
        let mut ticks = Vec::with_capacity(self.tick_count as usize + 1);
        for i in 0..=self.tick_count {
            let mut tick = Tick::new(
                self.point_at(i, self.radius),
                self.tick_width,
                self.tick_height,
                self.base_color,
                self.ramp.color_at(i)?,
                self.angle_of(i) + FRAC_PI_2,
            );
            tick.opacity = 0.0;
            ticks.push(tick);
        }
        Ok(ticks)
    }
}
