use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::{
    core::Rgba8,
    error::{DialError, DialResult},
};

/// Default ring geometry (start angle and span leave the lower-left quadrant
/// open).
pub const DIAL_START_ANGLE: f64 = -5.0 * PI / 4.0;
pub const DIAL_ANGULAR_SPAN: f64 = 1.5 * PI;

/// Default sweep tuning. The threshold drives the blink: the indicator shows
/// only while `rotation mod 2π` is below it.
pub const SWEEP_START_ANGLE: f64 = -5.1 * PI / 4.0;
pub const SWEEP_END_ANGLE: f64 = 3.0 * PI / 4.0;
pub const SWEEP_ANGULAR_WIDTH: f64 = PI / 4.0;
pub const SWEEP_VISIBILITY_THRESHOLD: f64 = 1.5 * PI / 4.0;

/// Frame deltas above this are treated as this, so a lagging host skips
/// animation time instead of jumping to catch up.
pub const MAX_FRAME_STEP_MS: u64 = 40;

/// Absolute pixels or a percentage of the parent container.
///
/// Exactly two textual forms are recognized: `"<number>"`/`"<number>px"` and
/// `"<number>%"`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Dimension {
    Px(f64),
    Percent(f64),
}

impl Dimension {
    /// Pixel value against the parent's extent along the same axis.
    pub fn resolve(self, parent_px: f64) -> f64 {
        match self {
            Self::Px(v) => v,
            Self::Percent(p) => parent_px * p / 100.0,
        }
    }
}

/// Non-negative decimal with at most one dot, no signs or exponents.
fn parse_plain_number(s: &str) -> Option<f64> {
    if s.is_empty() || !s.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut dots = 0;
    for b in s.bytes() {
        match b {
            b'0'..=b'9' => {}
            b'.' => dots += 1,
            _ => return None,
        }
    }
    if dots > 1 {
        return None;
    }
    s.parse::<f64>().ok()
}

impl FromStr for Dimension {
    type Err = DialError;

    fn from_str(s: &str) -> DialResult<Self> {
        let s = s.trim();
        if let Some(num) = s.strip_suffix('%') {
            return parse_plain_number(num)
                .map(Self::Percent)
                .ok_or_else(|| DialError::Dimension(s.to_string()));
        }
        let num = s.strip_suffix("px").unwrap_or(s);
        parse_plain_number(num)
            .map(Self::Px)
            .ok_or_else(|| DialError::Dimension(s.to_string()))
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(v) => write!(f, "{v}px"),
            Self::Percent(p) => write!(f, "{p}%"),
        }
    }
}

impl TryFrom<String> for Dimension {
    type Error = DialError;

    fn try_from(s: String) -> DialResult<Self> {
        s.parse()
    }
}

impl From<Dimension> for String {
    fn from(d: Dimension) -> Self {
        d.to_string()
    }
}

/// How a radius grows from the base ring radius.
///
/// Unifies the two visual variants of the dial: proportional growth
/// (`1.5·R`, `1.64·R`) and fixed offset growth (`R + 20`).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum RadiusGrowth {
    Scale(f64),
    Offset(f64),
}

impl RadiusGrowth {
    pub fn apply(self, radius: f64) -> f64 {
        match self {
            Self::Scale(s) => radius * s,
            Self::Offset(d) => radius + d,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EntranceOptions {
    /// Delay before every tick starts animating, relative to phase start.
    pub delay_ms: u64,
    pub duration_ms: u64,
    /// Where ticks land radially at full entrance.
    pub growth: RadiusGrowth,
}

impl Default for EntranceOptions {
    fn default() -> Self {
        Self {
            delay_ms: 400,
            duration_ms: 500,
            growth: RadiusGrowth::Scale(1.5),
        }
    }
}

impl EntranceOptions {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RevealOptions {
    /// Total score-reveal duration; the label count-up spans all of it.
    pub duration_ms: u64,
    /// The sweep finishes its rotation in `duration / divisor`.
    pub sweep_speed_divisor: f64,
}

impl Default for RevealOptions {
    fn default() -> Self {
        Self {
            duration_ms: 700,
            sweep_speed_divisor: 1.3,
        }
    }
}

impl RevealOptions {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn sweep_duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration().as_secs_f64() / self.sweep_speed_divisor)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SweepOptions {
    pub radius: RadiusGrowth,
    pub angular_width: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub visibility_threshold: f64,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            radius: RadiusGrowth::Scale(1.64),
            angular_width: SWEEP_ANGULAR_WIDTH,
            start_angle: SWEEP_START_ANGLE,
            end_angle: SWEEP_END_ANGLE,
            visibility_threshold: SWEEP_VISIBILITY_THRESHOLD,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BackgroundOptions {
    pub color: Rgba8,
    /// Peak darkness of the radial vignette at its outer edge.
    pub vignette_alpha: f64,
    /// Vignette radius is `min(width, height) / divisor`.
    pub vignette_radius_divisor: f64,
}

impl Default for BackgroundOptions {
    fn default() -> Self {
        Self {
            color: Rgba8::rgb(0x3b, 0x23, 0x69),
            vignette_alpha: 0.35,
            vignette_radius_divisor: 3.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LabelOptions {
    pub size_px: f64,
    pub color: Rgba8,
    /// Vertical offset of the label anchor below the dial center.
    pub offset_y: f64,
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self {
            size_px: 60.0,
            color: Rgba8::rgb(255, 255, 255),
            offset_y: 40.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DialOptions {
    pub width: Dimension,
    pub height: Dimension,
    pub tick_count: u32,
    /// Ring radius ticks are laid out on before the entrance growth.
    pub base_radius: f64,
    pub tick_width: f64,
    pub tick_height: f64,
    pub tick_base_color: Rgba8,
    /// Gradient anchors for filled tick colors, in fill order.
    pub color_anchors: Vec<Rgba8>,
    pub start_angle: f64,
    pub angular_span: f64,
    pub entrance: EntranceOptions,
    pub reveal: RevealOptions,
    pub sweep: SweepOptions,
    pub background: BackgroundOptions,
    pub label: LabelOptions,
    pub max_frame_step_ms: u64,
}

impl Default for DialOptions {
    fn default() -> Self {
        Self {
            width: Dimension::Percent(100.0),
            height: Dimension::Px(500.0),
            tick_count: 60,
            base_radius: 70.0,
            tick_width: 3.0,
            tick_height: 15.0,
            tick_base_color: Rgba8::new(255, 255, 255, 77),
            color_anchors: vec![
                Rgba8::rgb(0xff, 0x3a, 0x3a),
                Rgba8::rgb(0x00, 0x00, 0xff),
                Rgba8::rgb(0x8a, 0xff, 0x95),
            ],
            start_angle: DIAL_START_ANGLE,
            angular_span: DIAL_ANGULAR_SPAN,
            entrance: EntranceOptions::default(),
            reveal: RevealOptions::default(),
            sweep: SweepOptions::default(),
            background: BackgroundOptions::default(),
            label: LabelOptions::default(),
            max_frame_step_ms: MAX_FRAME_STEP_MS,
        }
    }
}

impl DialOptions {
    pub fn validate(&self) -> DialResult<()> {
        fn invalid(field: &'static str, reason: &'static str) -> DialError {
            DialError::InvalidOption { field, reason }
        }

        if self.tick_count == 0 {
            return Err(invalid("tick_count", "must be > 0"));
        }
        if !self.base_radius.is_finite() || self.base_radius <= 0.0 {
            return Err(invalid("base_radius", "must be finite and > 0"));
        }
        if self.tick_width <= 0.0 {
            return Err(invalid("tick_width", "must be > 0"));
        }
        if self.tick_height <= 0.0 {
            return Err(invalid("tick_height", "must be > 0"));
        }
        if self.color_anchors.len() < 2 {
            return Err(DialError::TooFewAnchors(self.color_anchors.len()));
        }
        if !self.angular_span.is_finite() || self.angular_span <= 0.0 {
            return Err(invalid("angular_span", "must be finite and > 0"));
        }
        if self.entrance.duration_ms == 0 {
            return Err(invalid("entrance.duration_ms", "must be > 0"));
        }
        if self.reveal.duration_ms == 0 {
            return Err(invalid("reveal.duration_ms", "must be > 0"));
        }
        if !self.reveal.sweep_speed_divisor.is_finite() || self.reveal.sweep_speed_divisor <= 0.0 {
            return Err(invalid("reveal.sweep_speed_divisor", "must be finite and > 0"));
        }
        if self.background.vignette_radius_divisor <= 0.0 {
            return Err(invalid("background.vignette_radius_divisor", "must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.background.vignette_alpha) {
            return Err(invalid("background.vignette_alpha", "must be within [0, 1]"));
        }
        if self.label.size_px <= 0.0 {
            return Err(invalid("label.size_px", "must be > 0"));
        }
        if self.max_frame_step_ms == 0 {
            return Err(invalid("max_frame_step_ms", "must be > 0"));
        }
        Ok(())
    }

    pub fn max_frame_step(&self) -> Duration {
        Duration::from_millis(self.max_frame_step_ms)
    }

    pub fn from_json_str(s: &str) -> DialResult<Self> {
        let opts: Self = serde_json::from_str(s)?;
        opts.validate()?;
        Ok(opts)
    }
}
