#![forbid(unsafe_code)]

pub mod color;
pub mod config;
pub mod core;
pub mod dial;
pub mod ease;
pub mod error;
pub mod layout;
pub mod render_cpu;
pub mod sequencer;
pub mod surface;
pub mod sweep;
pub mod tick;

pub use color::ColorRamp;
pub use config::{DialOptions, Dimension, RadiusGrowth};
pub use core::{Canvas, Rgba8};
pub use dial::{DialPhase, RatingDial};
pub use ease::Ease;
pub use error::{DialError, DialResult};
pub use layout::DialLayout;
pub use render_cpu::CpuSurface;
pub use sequencer::{Phase, PhaseFrame, Sequencer, Tween};
pub use surface::{ArcStyle, LineStyle, PaintOp, RecordingSurface, Surface};
pub use sweep::SweepIndicator;
pub use tick::Tick;
