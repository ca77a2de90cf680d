use crate::{
    core::{Affine, Canvas, Point, Rgba8},
    error::DialResult,
};

/// Stroke style for a single line primitive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineStyle {
    /// Stroke width in pixels (square caps).
    pub width: f64,
    pub color: Rgba8,
    /// Global alpha applied on top of the color, in [0, 1].
    pub opacity: f64,
}

/// Stroke style for an arc with a head-to-tail color fade.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArcStyle {
    pub width: f64,
    /// Color at the leading end of the arc.
    pub head: Rgba8,
    /// Color at the trailing end of the arc.
    pub tail: Rgba8,
}

/// Immediate-mode drawing collaborator for the dial.
///
/// One frame is the op sequence `clear .. present`; implementations may
/// rasterize eagerly or just record. All coordinates are surface pixels.
pub trait Surface {
    fn bounds(&self) -> Canvas;

    /// Bounding box percentage-based sizing resolves against. Defaults to the
    /// surface's own bounds for hosts without a parent container.
    fn parent_bounds(&self) -> Canvas {
        self.bounds()
    }

    /// Resize the surface. Implementations that fail must leave the surface
    /// unchanged, so callers can treat a failed resize as a no-op.
    fn resize(&mut self, canvas: Canvas) -> DialResult<()>;

    /// Begin a frame by flooding the surface with `color`.
    fn clear(&mut self, color: Rgba8) -> DialResult<()>;

    /// Radial gradient from `inner` at `center` to `outer` at `radius`,
    /// covering the whole surface (pixels past `radius` take `outer`).
    fn fill_radial_gradient(
        &mut self,
        center: Point,
        radius: f64,
        inner: Rgba8,
        outer: Rgba8,
    ) -> DialResult<()>;

    /// Stroke the segment `from -> to` (local space) under `transform`.
    fn stroke_line(
        &mut self,
        transform: Affine,
        from: Point,
        to: Point,
        style: LineStyle,
    ) -> DialResult<()>;

    /// Stroke a circular arc around `center` from `start_angle` over
    /// `sweep_angle` radians (negative sweeps run clockwise-to-counter),
    /// fading from `style.head` at `start_angle` to `style.tail`.
    fn stroke_arc(
        &mut self,
        center: Point,
        radius: f64,
        start_angle: f64,
        sweep_angle: f64,
        style: ArcStyle,
    ) -> DialResult<()>;

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba8) -> DialResult<()>;

    /// Draw `text` centered on `anchor`.
    fn fill_text(&mut self, text: &str, anchor: Point, size_px: f64, color: Rgba8)
    -> DialResult<()>;

    /// End the frame, flushing any buffered paints.
    fn present(&mut self) -> DialResult<()>;
}

/// One recorded paint operation.
#[derive(Clone, Debug, PartialEq)]
pub enum PaintOp {
    Resize {
        canvas: Canvas,
    },
    Clear {
        color: Rgba8,
    },
    RadialGradient {
        center: Point,
        radius: f64,
        inner: Rgba8,
        outer: Rgba8,
    },
    Line {
        transform: Affine,
        from: Point,
        to: Point,
        style: LineStyle,
    },
    Arc {
        center: Point,
        radius: f64,
        start_angle: f64,
        sweep_angle: f64,
        style: ArcStyle,
    },
    Circle {
        center: Point,
        radius: f64,
        color: Rgba8,
    },
    Text {
        text: String,
        anchor: Point,
        size_px: f64,
        color: Rgba8,
    },
    Present,
}

/// Headless surface that records the paint stream instead of rasterizing.
///
/// Used by the test suite and usable by hosts that forward ops elsewhere.
#[derive(Debug)]
pub struct RecordingSurface {
    canvas: Canvas,
    parent: Canvas,
    ops: Vec<PaintOp>,
}

impl RecordingSurface {
    pub fn new(parent: Canvas) -> Self {
        Self {
            canvas: parent,
            parent,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[PaintOp] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Ops recorded since the most recent `Clear`, i.e. the latest frame.
    pub fn last_frame(&self) -> &[PaintOp] {
        let start = self
            .ops
            .iter()
            .rposition(|op| matches!(op, PaintOp::Clear { .. }))
            .unwrap_or(0);
        &self.ops[start..]
    }
}

impl Surface for RecordingSurface {
    fn bounds(&self) -> Canvas {
        self.canvas
    }

    fn parent_bounds(&self) -> Canvas {
        self.parent
    }

    fn resize(&mut self, canvas: Canvas) -> DialResult<()> {
        self.canvas = canvas;
        self.ops.push(PaintOp::Resize { canvas });
        Ok(())
    }

    fn clear(&mut self, color: Rgba8) -> DialResult<()> {
        self.ops.push(PaintOp::Clear { color });
        Ok(())
    }

    fn fill_radial_gradient(
        &mut self,
        center: Point,
        radius: f64,
        inner: Rgba8,
        outer: Rgba8,
    ) -> DialResult<()> {
        self.ops.push(PaintOp::RadialGradient {
            center,
            radius,
            inner,
            outer,
        });
        Ok(())
    }

    fn stroke_line(
        &mut self,
        transform: Affine,
        from: Point,
        to: Point,
        style: LineStyle,
    ) -> DialResult<()> {
        self.ops.push(PaintOp::Line {
            transform,
            from,
            to,
            style,
        });
        Ok(())
    }

    fn stroke_arc(
        &mut self,
        center: Point,
        radius: f64,
        start_angle: f64,
        sweep_angle: f64,
        style: ArcStyle,
    ) -> DialResult<()> {
        self.ops.push(PaintOp::Arc {
            center,
            radius,
            start_angle,
            sweep_angle,
            style,
        });
        Ok(())
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba8) -> DialResult<()> {
        self.ops.push(PaintOp::Circle {
            center,
            radius,
            color,
        });
        Ok(())
    }

    fn fill_text(
        &mut self,
        text: &str,
        anchor: Point,
        size_px: f64,
        color: Rgba8,
    ) -> DialResult<()> {
        self.ops.push(PaintOp::Text {
            text: text.to_string(),
            anchor,
            size_px,
            color,
        });
        Ok(())
    }

    fn present(&mut self) -> DialResult<()> {
        self.ops.push(PaintOp::Present);
        Ok(())
    }
}
