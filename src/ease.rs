/// Overshoot factor for `OutBack` (Penner's canonical value).
const BACK_OVERSHOOT: f64 = 1.70158;

/// Timing curve applied to tween progress.
///
/// The polynomial families share one construction: `In` accelerates from
/// rest as `t^p`, `Out` is its mirror into the endpoint, `InOut` glues the
/// two halves at `t = 0.5`. `OutBack` decelerates past 1.0 and springs back.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    OutBack,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => accel(t, 2),
            Self::OutQuad => decel(t, 2),
            Self::InOutQuad => accel_decel(t, 2),
            Self::InCubic => accel(t, 3),
            Self::OutCubic => decel(t, 3),
            Self::InOutCubic => accel_decel(t, 3),
            Self::OutBack => {
                let u = t - 1.0;
                1.0 + (BACK_OVERSHOOT + 1.0) * u.powi(3) + BACK_OVERSHOOT * u * u
            }
        }
    }
}

/// Polynomial acceleration from rest.
fn accel(t: f64, power: i32) -> f64 {
    t.powi(power)
}

/// Mirror of `accel` into the endpoint.
fn decel(t: f64, power: i32) -> f64 {
    1.0 - accel(1.0 - t, power)
}

/// Accelerate through the first half, mirror-decelerate through the second.
fn accel_decel(t: f64, power: i32) -> f64 {
    if t < 0.5 {
        accel(2.0 * t, power) / 2.0
    } else {
        1.0 - accel(2.0 - 2.0 * t, power) / 2.0
    }
}
