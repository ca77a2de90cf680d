use std::time::{Duration, Instant};

use crate::{
    config::DialOptions,
    core::{Canvas, Point, Rgba8},
    ease::Ease,
    error::{DialError, DialResult},
    layout::DialLayout,
    sequencer::{Phase, PhaseFrame, Sequencer, Tween},
    surface::Surface,
    sweep::SweepIndicator,
    tick::Tick,
};

/// Overall dial state. Transitions are strictly forward within one run;
/// only a new `start` call begins again from `LayingOut`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialPhase {
    Idle,
    LayingOut,
    EnteringView,
    RevealingScore,
    Settled,
}

/// What a tween in the active phase drives, index-aligned with the phase's
/// tween list.
#[derive(Clone, Copy, Debug)]
enum Binding {
    TickOpacity(usize),
    TickRadial(usize),
    TickFill(usize),
    LabelValue,
    SweepRotation,
}

/// The rating dial widget: owns the surface, the tick ring, the sweep
/// indicator and the phase sequencing.
///
/// Hosts call `start(score)` once, then `tick(now)` once per display refresh
/// until the phase reaches `Settled`.
pub struct RatingDial<S: Surface> {
    surface: S,
    options: DialOptions,
    layout: Option<DialLayout>,
    ticks: Vec<Tick>,
    sweep: Option<SweepIndicator>,
    bindings: Vec<Binding>,
    sequencer: Sequencer,
    phase: DialPhase,
    score: f64,
    label_value: f64,
}

impl<S: Surface> RatingDial<S> {
    pub fn new(surface: S, options: DialOptions) -> DialResult<Self> {
        options.validate()?;
        let sequencer = Sequencer::with_max_frame_step(options.max_frame_step());
        Ok(Self {
            surface,
            options,
            layout: None,
            ticks: Vec::new(),
            sweep: None,
            bindings: Vec::new(),
            sequencer,
            phase: DialPhase::Idle,
            score: 0.0,
            label_value: 0.0,
        })
    }

    pub fn phase(&self) -> DialPhase {
        self.phase
    }

    pub fn is_settled(&self) -> bool {
        self.phase == DialPhase::Settled
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    /// Label value currently shown (rounded when drawn).
    pub fn label_value(&self) -> f64 {
        self.label_value
    }

    pub fn ticks(&self) -> &[Tick] {
        &self.ticks
    }

    pub fn filled_tick_count(&self) -> usize {
        self.ticks.iter().filter(|t| t.filled).count()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Kick off the full animation for `score` (clamped into [0, 100]).
    ///
    /// Sizes the surface, lays out the tick ring and begins the entrance
    /// phase. All fallible work happens before the dial is touched: when
    /// sizing or layout fails the previous run keeps going exactly as it
    /// was, and only once everything is ready is the in-flight run
    /// cancelled and replaced.
    #[tracing::instrument(skip(self))]
    pub fn start(&mut self, score: f64) -> DialResult<()> {
        if !score.is_finite() {
            return Err(DialError::NonFiniteScore);
        }
        let score = score.clamp(0.0, 100.0);

        let canvas = self.resolve_canvas()?;
        let layout = DialLayout::from_options(&self.options, canvas.center())?;
        let ticks = layout.build()?;
        self.surface.resize(canvas)?;

        self.sequencer.cancel();
        self.phase = DialPhase::LayingOut;
        self.ticks = ticks;
        self.sweep = Some(SweepIndicator::new(
            self.options.sweep.radius.apply(layout.radius),
            self.options.sweep.angular_width,
            self.options.sweep.start_angle,
            self.options.sweep.visibility_threshold,
        ));
        self.layout = Some(layout);
        self.score = score;
        self.label_value = 0.0;

        self.begin_entrance()
    }

    /// Stop the animation where it is; visual state is left as-is.
    pub fn cancel(&mut self) {
        self.sequencer.cancel();
    }

    /// Per-frame driver. Steps the active phase, applies the tween values,
    /// repaints, and advances the dial state on phase completion.
    ///
    /// A surface failure cancels the sequencer and is returned; no further
    /// frames will run until the next `start`.
    pub fn tick(&mut self, now: Instant) -> DialResult<DialPhase> {
        let result = self.tick_inner(now);
        if result.is_err() {
            self.sequencer.cancel();
        }
        result
    }

    fn tick_inner(&mut self, now: Instant) -> DialResult<DialPhase> {
        match self.phase {
            DialPhase::Idle | DialPhase::LayingOut | DialPhase::Settled => Ok(self.phase),
            DialPhase::EnteringView => {
                if let Some(frame) = self.sequencer.step(now) {
                    self.apply_frame(&frame)?;
                    self.repaint()?;
                    if frame.completed {
                        tracing::trace!("entrance complete, beginning score reveal");
                        self.begin_reveal()?;
                    }
                }
                Ok(self.phase)
            }
            DialPhase::RevealingScore => {
                if let Some(frame) = self.sequencer.step(now) {
                    self.apply_frame(&frame)?;
                    self.repaint()?;
                    if frame.completed {
                        tracing::trace!(score = self.score, "score reveal complete");
                        self.phase = DialPhase::Settled;
                    }
                }
                Ok(self.phase)
            }
        }
    }

    /// Resolve the configured width/height against the parent box into the
    /// canvas `start` will resize to.
    fn resolve_canvas(&self) -> DialResult<Canvas> {
        let parent = self.surface.parent_bounds();
        let width = self.options.width.resolve(f64::from(parent.width));
        let height = self.options.height.resolve(f64::from(parent.height));
        if !width.is_finite() || !height.is_finite() || width < 0.0 || height < 0.0 {
            return Err(DialError::SurfaceSize {
                width,
                height,
                reason: "resolved size must be finite and non-negative",
            });
        }
        Canvas::new(width.round() as u32, height.round() as u32)
    }

    /// Entrance: every tick fades in and springs radially outward, all after
    /// the same fixed delay relative to phase start.
    fn begin_entrance(&mut self) -> DialResult<()> {
        let entrance = self.options.entrance;
        let mut tweens = Vec::with_capacity(self.ticks.len() * 2);
        let mut bindings = Vec::with_capacity(self.ticks.len() * 2);
        for i in 0..self.ticks.len() {
            tweens.push(Tween::new(
                entrance.delay(),
                entrance.duration(),
                0.0,
                1.0,
                Ease::Linear,
            ));
            bindings.push(Binding::TickOpacity(i));
            tweens.push(Tween::new(
                entrance.delay(),
                entrance.duration(),
                0.0,
                1.0,
                Ease::OutBack,
            ));
            bindings.push(Binding::TickRadial(i));
        }

        self.sequencer.begin(Phase::new(tweens)?);
        self.bindings = bindings;
        self.phase = DialPhase::EnteringView;
        Ok(())
    }

    /// Score reveal: label counts up, the sweep rotates, and the leading
    /// `round(score/100 * tick_count)` ticks fill in staggered order.
    fn begin_reveal(&mut self) -> DialResult<()> {
        let reveal = self.options.reveal;
        let sweep = self.options.sweep;

        let mut tweens = vec![
            Tween::new(
                Duration::ZERO,
                reveal.duration(),
                0.0,
                self.score,
                Ease::Linear,
            ),
            Tween::new(
                Duration::ZERO,
                reveal.sweep_duration(),
                sweep.start_angle,
                sweep.end_angle,
                Ease::Linear,
            ),
        ];
        let mut bindings = vec![Binding::LabelValue, Binding::SweepRotation];

        let fill_count =
            ((self.score / 100.0) * f64::from(self.options.tick_count)).round() as usize;
        if fill_count > 0 {
            let time_unit = reveal.duration() / fill_count as u32;
            for i in 0..fill_count {
                tweens.push(Tween::new(
                    time_unit * i as u32,
                    time_unit,
                    0.0,
                    1.0,
                    Ease::Linear,
                ));
                bindings.push(Binding::TickFill(i));
            }
        }

        self.sequencer
            .begin(Phase::new(tweens)?.with_budget(reveal.duration()));
        self.bindings = bindings;
        self.phase = DialPhase::RevealingScore;
        Ok(())
    }

    fn apply_frame(&mut self, frame: &PhaseFrame) -> DialResult<()> {
        let layout = self.layout.as_ref().ok_or(DialError::NotLaidOut)?;
        let end_radius = self.options.entrance.growth.apply(layout.radius);

        for (binding, &value) in self.bindings.iter().zip(frame.values.iter()) {
            match *binding {
                Binding::TickOpacity(i) => {
                    if let Some(tick) = self.ticks.get_mut(i) {
                        tick.opacity = value.clamp(0.0, 1.0);
                    }
                }
                Binding::TickRadial(i) => {
                    if let Some(tick) = self.ticks.get_mut(i) {
                        let radius = layout.radius + (end_radius - layout.radius) * value;
                        tick.position = layout.point_at(i as u32, radius);
                    }
                }
                Binding::TickFill(i) => {
                    if value >= 1.0
                        && let Some(tick) = self.ticks.get_mut(i)
                    {
                        tick.set_filled(true);
                    }
                }
                Binding::LabelValue => self.label_value = value,
                Binding::SweepRotation => {
                    if let Some(sweep) = self.sweep.as_mut() {
                        sweep.rotation = value;
                    }
                }
            }
        }
        Ok(())
    }

    /// One full repaint: background, ticks, then (during score reveal) the
    /// sweep indicator and the numeric label.
    fn repaint(&mut self) -> DialResult<()> {
        let canvas = self.surface.bounds();
        let center = canvas.center();
        let background = self.options.background;

        self.surface.clear(background.color)?;
        let vignette_radius = canvas.min_side() / background.vignette_radius_divisor;
        let outer = Rgba8::new(0, 0, 0, (background.vignette_alpha * 255.0).round() as u8);
        self.surface
            .fill_radial_gradient(center, vignette_radius, Rgba8::new(0, 0, 0, 0), outer)?;

        for tick in &self.ticks {
            tick.draw(&mut self.surface)?;
        }

        if self.phase == DialPhase::RevealingScore {
            if let Some(sweep) = &self.sweep {
                sweep.draw(&mut self.surface, center)?;
            }
            let label = self.options.label;
            let text = format!("{}", self.label_value.round() as i64);
            self.surface.fill_text(
                &text,
                Point::new(center.x, center.y + label.offset_y),
                label.size_px,
                label.color,
            )?;
        }

        self.surface.present()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Dimension;
    use crate::core::Affine;
    use crate::surface::{ArcStyle, LineStyle, PaintOp, RecordingSurface};
    use std::time::Duration;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    struct Clock {
        origin: Instant,
        at: Duration,
    }

    impl Clock {
        fn new() -> Self {
            Self {
                origin: Instant::now(),
                at: Duration::ZERO,
            }
        }

        fn advance(&mut self, by: Duration) -> Instant {
            self.at += by;
            self.origin + self.at
        }
    }

    fn dial(options: DialOptions) -> RatingDial<RecordingSurface> {
        let surface = RecordingSurface::new(Canvas::new(400, 500).unwrap());
        RatingDial::new(surface, options).unwrap()
    }

    /// Drive frames at the sequencer's cap until the predicate holds.
    fn drive_until(
        dial: &mut RatingDial<RecordingSurface>,
        clock: &mut Clock,
        phase: DialPhase,
    ) {
        for _ in 0..10_000 {
            if dial.tick(clock.advance(ms(40))).unwrap() == phase {
                return;
            }
        }
        panic!("never reached {phase:?}");
    }

    #[test]
    fn new_rejects_invalid_options() {
        let surface = RecordingSurface::new(Canvas::new(400, 500).unwrap());
        let options = DialOptions {
            tick_count: 0,
            ..DialOptions::default()
        };
        assert!(RatingDial::new(surface, options).is_err());
    }

    #[test]
    fn start_resolves_percent_sizing_against_parent() {
        let mut d = dial(DialOptions {
            width: Dimension::Percent(50.0),
            height: Dimension::Px(300.0),
            ..DialOptions::default()
        });
        d.start(50.0).unwrap();
        assert_eq!(
            d.surface().bounds(),
            Canvas::new(200, 300).unwrap()
        );
    }

    #[test]
    fn start_rejects_non_finite_score_before_mutating() {
        let mut d = dial(DialOptions::default());
        assert!(d.start(f64::NAN).is_err());
        assert_eq!(d.phase(), DialPhase::Idle);
    }

    #[test]
    fn scores_clamp_into_range() {
        let mut d = dial(DialOptions::default());
        d.start(250.0).unwrap();
        assert_eq!(d.score(), 100.0);
        d.start(-3.0).unwrap();
        assert_eq!(d.score(), 0.0);
    }

    #[test]
    fn phases_are_strictly_serialized() {
        let mut d = dial(DialOptions::default());
        let mut clock = Clock::new();
        d.start(100.0).unwrap();
        assert_eq!(d.phase(), DialPhase::EnteringView);

        // Entrance frames never draw the label or sweep.
        d.tick(clock.advance(ms(0))).unwrap();
        d.tick(clock.advance(ms(40))).unwrap();
        assert!(
            !d.surface()
                .ops()
                .iter()
                .any(|op| matches!(op, PaintOp::Text { .. } | PaintOp::Arc { .. }))
        );

        drive_until(&mut d, &mut clock, DialPhase::RevealingScore);
        drive_until(&mut d, &mut clock, DialPhase::Settled);
        assert!(d.is_settled());
    }

    #[test]
    fn entrance_moves_ticks_outward_and_fades_them_in() {
        let mut d = dial(DialOptions::default());
        let mut clock = Clock::new();
        d.start(50.0).unwrap();
        let center = d.surface().bounds().center();

        drive_until(&mut d, &mut clock, DialPhase::RevealingScore);
        let end_radius = 70.0 * 1.5;
        for tick in d.ticks() {
            assert_eq!(tick.opacity, 1.0);
            let r = (tick.position - center).hypot();
            assert!((r - end_radius).abs() < 1e-6, "radius {r}");
        }
    }

    #[test]
    fn reveal_fills_the_rounded_score_share_of_ticks() {
        let mut d = dial(DialOptions {
            tick_count: 99,
            ..DialOptions::default()
        });
        let mut clock = Clock::new();
        d.start(78.0).unwrap();
        drive_until(&mut d, &mut clock, DialPhase::Settled);

        assert_eq!(d.filled_tick_count(), 77);
        assert_eq!(d.label_value().round() as i64, 78);

        // Filled ticks are the leading run of the ring.
        for (i, tick) in d.ticks().iter().enumerate() {
            assert_eq!(tick.filled, i < 77, "tick {i}");
        }

        let last_text = d
            .surface()
            .ops()
            .iter()
            .rev()
            .find_map(|op| match op {
                PaintOp::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(last_text, "78");
    }

    #[test]
    fn zero_score_fills_nothing_but_still_settles() {
        let mut d = dial(DialOptions::default());
        let mut clock = Clock::new();
        d.start(0.0).unwrap();
        drive_until(&mut d, &mut clock, DialPhase::Settled);
        assert_eq!(d.filled_tick_count(), 0);
        assert_eq!(d.label_value(), 0.0);
    }

    #[test]
    fn cancel_mid_entrance_leaves_partial_state() {
        let mut d = dial(DialOptions::default());
        let mut clock = Clock::new();
        d.start(50.0).unwrap();

        // Past the shared delay, into the fade.
        d.tick(clock.advance(ms(0))).unwrap();
        for _ in 0..12 {
            d.tick(clock.advance(ms(40))).unwrap();
        }
        d.cancel();

        let opacity = d.ticks()[0].opacity;
        assert!(opacity > 0.0 && opacity < 1.0, "opacity {opacity}");
        assert_eq!(d.phase(), DialPhase::EnteringView);
        // Further ticks are inert but harmless.
        d.tick(clock.advance(ms(40))).unwrap();
        assert_eq!(d.ticks()[0].opacity, opacity);
    }

    #[test]
    fn restart_mid_run_begins_a_fresh_run() {
        let mut d = dial(DialOptions::default());
        let mut clock = Clock::new();
        d.start(50.0).unwrap();
        d.tick(clock.advance(ms(0))).unwrap();
        for _ in 0..12 {
            d.tick(clock.advance(ms(40))).unwrap();
        }

        d.start(80.0).unwrap();
        assert_eq!(d.phase(), DialPhase::EnteringView);
        assert_eq!(d.ticks()[0].opacity, 0.0);
        drive_until(&mut d, &mut clock, DialPhase::Settled);
        assert_eq!(d.score(), 80.0);
    }

    #[test]
    fn settled_ticks_are_inert() {
        let mut d = dial(DialOptions::default());
        let mut clock = Clock::new();
        d.start(50.0).unwrap();
        drive_until(&mut d, &mut clock, DialPhase::Settled);

        let ops_before = d.surface().ops().len();
        d.tick(clock.advance(ms(40))).unwrap();
        assert_eq!(d.surface().ops().len(), ops_before);
    }

    /// Surface whose paints or resizes start failing on demand.
    struct FailingSurface {
        inner: RecordingSurface,
        fail: bool,
        fail_resize: bool,
    }

    impl FailingSurface {
        fn new() -> Self {
            Self {
                inner: RecordingSurface::new(Canvas::new(400, 500).unwrap()),
                fail: false,
                fail_resize: false,
            }
        }
    }

    impl Surface for FailingSurface {
        fn bounds(&self) -> Canvas {
            self.inner.bounds()
        }

        fn resize(&mut self, canvas: Canvas) -> DialResult<()> {
            if self.fail_resize {
                return Err(DialError::raster("resize refused"));
            }
            self.inner.resize(canvas)
        }

        fn clear(&mut self, color: Rgba8) -> DialResult<()> {
            if self.fail {
                return Err(DialError::raster("surface lost"));
            }
            self.inner.clear(color)
        }

        fn fill_radial_gradient(
            &mut self,
            center: Point,
            radius: f64,
            inner: Rgba8,
            outer: Rgba8,
        ) -> DialResult<()> {
            self.inner.fill_radial_gradient(center, radius, inner, outer)
        }

        fn stroke_line(
            &mut self,
            transform: Affine,
            from: Point,
            to: Point,
            style: LineStyle,
        ) -> DialResult<()> {
            self.inner.stroke_line(transform, from, to, style)
        }

        fn stroke_arc(
            &mut self,
            center: Point,
            radius: f64,
            start_angle: f64,
            sweep_angle: f64,
            style: ArcStyle,
        ) -> DialResult<()> {
            self.inner
                .stroke_arc(center, radius, start_angle, sweep_angle, style)
        }

        fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba8) -> DialResult<()> {
            self.inner.fill_circle(center, radius, color)
        }

        fn fill_text(
            &mut self,
            text: &str,
            anchor: Point,
            size_px: f64,
            color: Rgba8,
        ) -> DialResult<()> {
            self.inner.fill_text(text, anchor, size_px, color)
        }

        fn present(&mut self) -> DialResult<()> {
            self.inner.present()
        }
    }

    #[test]
    fn failed_start_from_idle_leaves_the_dial_idle() {
        // 0.1% of a 400px parent rounds to a zero-width canvas.
        let mut d = dial(DialOptions {
            width: Dimension::Percent(0.1),
            ..DialOptions::default()
        });
        assert!(matches!(
            d.start(50.0),
            Err(DialError::SurfaceSize { .. })
        ));
        assert_eq!(d.phase(), DialPhase::Idle);
        assert!(d.ticks().is_empty());
        assert!(d.surface().ops().is_empty());
    }

    #[test]
    fn failed_restart_keeps_the_previous_run_going() {
        let mut d = RatingDial::new(FailingSurface::new(), DialOptions::default()).unwrap();
        let mut clock = Clock::new();
        d.start(50.0).unwrap();
        d.tick(clock.advance(ms(0))).unwrap();
        for _ in 0..12 {
            d.tick(clock.advance(ms(40))).unwrap();
        }
        let opacity = d.ticks()[0].opacity;
        assert!(opacity > 0.0 && opacity < 1.0);

        d.surface_mut().fail_resize = true;
        assert!(d.start(80.0).is_err());

        // The in-flight entrance was never cancelled and keeps advancing.
        assert_eq!(d.phase(), DialPhase::EnteringView);
        assert_eq!(d.score(), 50.0);
        d.tick(clock.advance(ms(40))).unwrap();
        assert!(d.ticks()[0].opacity > opacity);
    }

    #[test]
    fn frame_errors_cancel_the_sequencer() {
        let mut d = RatingDial::new(FailingSurface::new(), DialOptions::default()).unwrap();
        let mut clock = Clock::new();
        d.start(50.0).unwrap();
        d.tick(clock.advance(ms(0))).unwrap();

        d.surface_mut().fail = true;
        assert!(d.tick(clock.advance(ms(40))).is_err());

        // The failed run is cancelled; later frames no longer paint.
        d.surface_mut().fail = false;
        d.tick(clock.advance(ms(40))).unwrap();
        let clears = d
            .surface()
            .inner
            .ops()
            .iter()
            .filter(|op| matches!(op, PaintOp::Clear { .. }))
            .count();
        assert_eq!(clears, 1);
    }
}
