pub type DialResult<T> = Result<T, DialError>;

/// Errors from dial configuration, layout, animation driving, and
/// rasterization.
#[derive(thiserror::Error, Debug)]
pub enum DialError {
    /// A size string that is neither `"<number>[px]"` nor `"<number>%"`.
    #[error("unrecognized dimension '{0}' (expected \"<number>[px]\" or \"<number>%\")")]
    Dimension(String),

    /// A color literal that is not `#rrggbb` / `#rrggbbaa`.
    #[error("invalid color '{input}': {reason}")]
    Color {
        input: String,
        reason: &'static str,
    },

    /// An option field that failed validation.
    #[error("invalid option {field}: {reason}")]
    InvalidOption {
        field: &'static str,
        reason: &'static str,
    },

    /// Options JSON that does not deserialize.
    #[error("options JSON: {0}")]
    OptionsJson(#[from] serde_json::Error),

    /// `start` was given NaN or an infinity.
    #[error("score must be finite")]
    NonFiniteScore,

    /// Width/height resolved to something no surface can take.
    #[error("surface size {width}x{height} is unusable: {reason}")]
    SurfaceSize {
        width: f64,
        height: f64,
        reason: &'static str,
    },

    /// A color ramp needs two gradient endpoints to interpolate between.
    #[error("color ramp needs at least 2 anchor colors, got {0}")]
    TooFewAnchors(usize),

    /// A tick index outside the ramp's `[0, tick_count]` domain.
    #[error("tick index {index} outside 0..={max}")]
    TickIndex { index: u32, max: u32 },

    /// A phase with no tweens has nothing to drive.
    #[error("phase requires at least one tween")]
    EmptyPhase,

    /// An animation frame arrived before `start` built the ring.
    #[error("animation frame applied before the dial was laid out")]
    NotLaidOut,

    /// Raster backend failure (lost surface, font problems, size limits).
    #[error("raster backend: {0}")]
    Raster(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DialError {
    pub fn raster(msg: impl Into<String>) -> Self {
        Self::Raster(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_offending_values() {
        assert!(
            DialError::Dimension("5em".into())
                .to_string()
                .contains("'5em'")
        );
        assert_eq!(
            DialError::InvalidOption {
                field: "tick_count",
                reason: "must be > 0",
            }
            .to_string(),
            "invalid option tick_count: must be > 0"
        );
        assert!(
            DialError::TickIndex { index: 11, max: 10 }
                .to_string()
                .contains("0..=10")
        );
        assert!(
            DialError::SurfaceSize {
                width: 0.0,
                height: 500.0,
                reason: "each side needs at least one pixel",
            }
            .to_string()
            .contains("0x500")
        );
    }

    #[test]
    fn json_parse_failures_convert_and_keep_their_cause() {
        let parse_err = serde_json::from_str::<u32>("sixty").unwrap_err();
        let err = DialError::from(parse_err);
        assert!(matches!(err, DialError::OptionsJson(_)));
        assert!(err.to_string().starts_with("options JSON:"));
    }

    #[test]
    fn wrapped_errors_keep_their_message() {
        let err = DialError::Other(anyhow::anyhow!("host surface torn down"));
        assert!(err.to_string().contains("host surface torn down"));
    }
}
