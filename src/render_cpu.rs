use std::collections::HashMap;

use crate::{
    core::{Affine, Canvas, Point, Rgba8},
    error::{DialError, DialResult},
    surface::{ArcStyle, LineStyle, Surface},
};

/// Sub-arcs the sweep stroke is split into; each gets one interpolated color
/// step of the head-to-tail fade.
const ARC_FADE_SEGMENTS: u32 = 24;

/// Flattening tolerance for arcs/circles and stroke expansion.
const PATH_TOLERANCE: f64 = 0.1;

/// RGBA8 brush color carried through Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct TextBrushRgba8 {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

struct LabelFont {
    font: vello_cpu::peniko::FontData,
    family: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct VignetteKey {
    width: u16,
    height: u16,
    center: (u64, u64),
    radius: u64,
    inner: [u8; 4],
    outer: [u8; 4],
}

/// CPU raster surface backed by `vello_cpu`.
///
/// Ops buffer into a render context between `clear` and `present`; `present`
/// flushes them onto the retained pixmap, which `pixels_rgba8` exposes as
/// premultiplied RGBA8 bytes.
pub struct CpuSurface {
    width: u16,
    height: u16,
    parent: Option<Canvas>,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    font: Option<LabelFont>,
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    vignette_cache: HashMap<VignetteKey, vello_cpu::Image>,
}

impl CpuSurface {
    pub fn new(canvas: Canvas) -> DialResult<Self> {
        let (width, height) = canvas_to_u16(canvas)?;
        Ok(Self {
            width,
            height,
            parent: None,
            ctx: vello_cpu::RenderContext::new(width, height),
            pixmap: vello_cpu::Pixmap::new(width, height),
            font: None,
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            vignette_cache: HashMap::new(),
        })
    }

    /// Set the container box that percentage sizing resolves against.
    pub fn with_parent_bounds(mut self, parent: Canvas) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Register the font used for label text.
    pub fn with_font_bytes(mut self, bytes: Vec<u8>) -> DialResult<Self> {
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| DialError::raster("no font families registered from font bytes"))?;
        let family = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| DialError::raster("registered font family has no name"))?
            .to_string();

        let font = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0);
        self.font = Some(LabelFont { font, family });
        Ok(self)
    }

    /// Rendered frame as tightly packed premultiplied RGBA8 bytes.
    pub fn pixels_rgba8(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    fn vignette_paint(
        &mut self,
        center: Point,
        radius: f64,
        inner: Rgba8,
        outer: Rgba8,
    ) -> vello_cpu::Image {
        let key = VignetteKey {
            width: self.width,
            height: self.height,
            center: (center.x.to_bits(), center.y.to_bits()),
            radius: radius.to_bits(),
            inner: [inner.r, inner.g, inner.b, inner.a],
            outer: [outer.r, outer.g, outer.b, outer.a],
        };
        if let Some(img) = self.vignette_cache.get(&key).cloned() {
            return img;
        }

        let (w, h) = (usize::from(self.width), usize::from(self.height));
        let mut bytes = vec![0u8; w * h * 4];
        for y in 0..h {
            for x in 0..w {
                let d = Point::new(x as f64 + 0.5, y as f64 + 0.5).distance(center);
                let t = if radius > 0.0 {
                    (d / radius).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                let px = Rgba8::lerp(inner, outer, t).to_premul_bytes();
                let idx = (y * w + x) * 4;
                bytes[idx..idx + 4].copy_from_slice(&px);
            }
        }

        let img = premul_bytes_to_image(&bytes, self.width, self.height);
        self.vignette_cache.insert(key, img.clone());
        img
    }
}

impl Surface for CpuSurface {
    fn bounds(&self) -> Canvas {
        Canvas {
            width: u32::from(self.width),
            height: u32::from(self.height),
        }
    }

    fn parent_bounds(&self) -> Canvas {
        self.parent.unwrap_or_else(|| self.bounds())
    }

    fn resize(&mut self, canvas: Canvas) -> DialResult<()> {
        let (width, height) = canvas_to_u16(canvas)?;
        if width == self.width && height == self.height {
            return Ok(());
        }
        self.width = width;
        self.height = height;
        self.ctx = vello_cpu::RenderContext::new(width, height);
        self.pixmap = vello_cpu::Pixmap::new(width, height);
        Ok(())
    }

    fn clear(&mut self, color: Rgba8) -> DialResult<()> {
        // Begin-frame: reset the retained pixmap to the flood color and start
        // a fresh op buffer; `present` blends the buffered ops over it.
        let premul = color.to_premul_bytes();
        for px in self.pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
            px.copy_from_slice(&premul);
        }
        self.ctx = vello_cpu::RenderContext::new(self.width, self.height);
        Ok(())
    }

    fn fill_radial_gradient(
        &mut self,
        center: Point,
        radius: f64,
        inner: Rgba8,
        outer: Rgba8,
    ) -> DialResult<()> {
        let paint = self.vignette_paint(center, radius, inner, outer);
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(paint);
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.width),
            f64::from(self.height),
        ));
        Ok(())
    }

    fn stroke_line(
        &mut self,
        transform: Affine,
        from: Point,
        to: Point,
        style: LineStyle,
    ) -> DialResult<()> {
        let mut path = kurbo::BezPath::new();
        path.move_to(from);
        path.line_to(to);
        let outline = kurbo::stroke(
            path.elements().iter().copied(),
            &kurbo::Stroke::new(style.width).with_caps(kurbo::Cap::Square),
            &kurbo::StrokeOpts::default(),
            PATH_TOLERANCE,
        );

        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_transform(affine_to_cpu(transform));
        self.ctx.set_paint(color_to_cpu(style.color));
        let opacity = style.opacity.clamp(0.0, 1.0) as f32;
        if opacity < 1.0 {
            self.ctx.push_opacity_layer(opacity);
        }
        self.ctx.fill_path(&bezpath_to_cpu(&outline));
        if opacity < 1.0 {
            self.ctx.pop_layer();
        }
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
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);

        // The head-to-tail fade is approximated by short solid sub-arcs with
        // interpolated colors.
        let step = sweep_angle / f64::from(ARC_FADE_SEGMENTS);
        for k in 0..ARC_FADE_SEGMENTS {
            let a0 = start_angle + step * f64::from(k);
            let t = (f64::from(k) + 0.5) / f64::from(ARC_FADE_SEGMENTS);
            let color = Rgba8::lerp(style.head, style.tail, t);

            let arc = kurbo::Arc::new(center, kurbo::Vec2::new(radius, radius), a0, step, 0.0);
            let mut path = kurbo::BezPath::new();
            path.extend(kurbo::Shape::path_elements(&arc, PATH_TOLERANCE));
            let outline = kurbo::stroke(
                path.elements().iter().copied(),
                &kurbo::Stroke::new(style.width),
                &kurbo::StrokeOpts::default(),
                PATH_TOLERANCE,
            );

            self.ctx.set_paint(color_to_cpu(color));
            self.ctx.fill_path(&bezpath_to_cpu(&outline));
        }
        Ok(())
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba8) -> DialResult<()> {
        let circle = kurbo::Circle::new(center, radius);
        let mut path = kurbo::BezPath::new();
        path.extend(kurbo::Shape::path_elements(&circle, PATH_TOLERANCE));

        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(color_to_cpu(color));
        self.ctx.fill_path(&bezpath_to_cpu(&path));
        Ok(())
    }

    fn fill_text(
        &mut self,
        text: &str,
        anchor: Point,
        size_px: f64,
        color: Rgba8,
    ) -> DialResult<()> {
        let Some(label_font) = self.font.as_ref() else {
            return Err(DialError::raster(
                "label font not configured (CpuSurface::with_font_bytes)",
            ));
        };
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(DialError::raster("text size must be finite and > 0"));
        }

        let brush = TextBrushRgba8 {
            r: color.r,
            g: color.g,
            b: color.b,
            a: color.a,
        };
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(label_font.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px as f32));
        builder.push_default(parley::style::StyleProperty::Brush(brush));
        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);

        let offset = kurbo::Vec2::new(
            anchor.x - f64::from(layout.width()) / 2.0,
            anchor.y - f64::from(layout.height()) / 2.0,
        );
        self.ctx
            .set_transform(affine_to_cpu(Affine::translate(offset)));

        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                self.ctx
                    .glyph_run(&label_font.font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        Ok(())
    }

    fn present(&mut self) -> DialResult<()> {
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);
        Ok(())
    }
}

fn canvas_to_u16(canvas: Canvas) -> DialResult<(u16, u16)> {
    let oversized = || DialError::SurfaceSize {
        width: f64::from(canvas.width),
        height: f64::from(canvas.height),
        reason: "exceeds the 65535px raster limit",
    };
    let width: u16 = canvas.width.try_into().map_err(|_| oversized())?;
    let height: u16 = canvas.height.try_into().map_err(|_| oversized())?;
    Ok((width, height))
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: kurbo::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &kurbo::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn premul_bytes_to_image(bytes: &[u8], width: u16, height: u16) -> vello_cpu::Image {
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        usize::from(width) * usize::from(height),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, width, height, true);
    vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(std::sync::Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas(w: u32, h: u32) -> Canvas {
        Canvas::new(w, h).unwrap()
    }

    #[test]
    fn clear_floods_with_premultiplied_color() {
        let mut s = CpuSurface::new(canvas(4, 4)).unwrap();
        s.clear(Rgba8::rgb(0x3b, 0x23, 0x69)).unwrap();
        s.present().unwrap();
        let px = &s.pixels_rgba8()[..4];
        assert_eq!(px, [0x3b, 0x23, 0x69, 0xff]);
    }

    #[test]
    fn stroked_line_marks_pixels() {
        let mut s = CpuSurface::new(canvas(32, 32)).unwrap();
        s.clear(Rgba8::rgb(0, 0, 0)).unwrap();
        s.stroke_line(
            Affine::translate((16.0, 8.0)),
            Point::ORIGIN,
            Point::new(0.0, 16.0),
            LineStyle {
                width: 3.0,
                color: Rgba8::rgb(255, 255, 255),
                opacity: 1.0,
            },
        )
        .unwrap();
        s.present().unwrap();

        let touched = s
            .pixels_rgba8()
            .chunks_exact(4)
            .filter(|px| px[0] > 0)
            .count();
        assert!(touched > 0, "line left no pixels");
    }

    #[test]
    fn vignette_darkens_edges_more_than_center() {
        let mut s = CpuSurface::new(canvas(64, 64)).unwrap();
        s.clear(Rgba8::rgb(200, 200, 200)).unwrap();
        s.fill_radial_gradient(
            Point::new(32.0, 32.0),
            20.0,
            Rgba8::new(0, 0, 0, 0),
            Rgba8::new(0, 0, 0, 128),
        )
        .unwrap();
        s.present().unwrap();

        let px = |x: usize, y: usize| s.pixels_rgba8()[(y * 64 + x) * 4];
        assert!(px(0, 0) < px(32, 32), "corner should be darker than center");
    }

    #[test]
    fn resize_reallocates_the_frame() {
        let mut s = CpuSurface::new(canvas(8, 8)).unwrap();
        s.resize(canvas(16, 4)).unwrap();
        assert_eq!(s.bounds(), canvas(16, 4));
        assert_eq!(s.pixels_rgba8().len(), 16 * 4 * 4);
        assert!(s.resize(canvas(70_000, 4)).is_err());
    }

    #[test]
    fn parent_bounds_default_to_own_bounds() {
        let s = CpuSurface::new(canvas(8, 8)).unwrap();
        assert_eq!(s.parent_bounds(), canvas(8, 8));
        let s = CpuSurface::new(canvas(8, 8))
            .unwrap()
            .with_parent_bounds(canvas(400, 300));
        assert_eq!(s.parent_bounds(), canvas(400, 300));
    }

    #[test]
    fn text_without_font_is_a_raster_error() {
        let mut s = CpuSurface::new(canvas(8, 8)).unwrap();
        let err = s
            .fill_text("78", Point::new(4.0, 4.0), 6.0, Rgba8::rgb(255, 255, 255))
            .unwrap_err();
        assert!(matches!(err, DialError::Raster(_)));
    }
}
