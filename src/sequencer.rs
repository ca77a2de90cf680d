use std::time::{Duration, Instant};

use crate::{
    config,
    ease::Ease,
    error::{DialError, DialResult},
};

/// One property animation inside a phase: wait `delay`, then move `from` to
/// `to` over `duration` through `ease`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
    pub delay: Duration,
    pub duration: Duration,
    pub from: f64,
    pub to: f64,
    pub ease: Ease,
}

impl Tween {
    pub fn new(delay: Duration, duration: Duration, from: f64, to: f64, ease: Ease) -> Self {
        Self {
            delay,
            duration,
            from,
            to,
            ease,
        }
    }

    /// Phase-relative time at which this tween is done.
    pub fn end(&self) -> Duration {
        self.delay + self.duration
    }

    /// Raw progress in [0, 1] at `elapsed` since phase start.
    pub fn progress_at(&self, elapsed: Duration) -> f64 {
        if elapsed <= self.delay {
            return 0.0;
        }
        if self.duration.is_zero() {
            return 1.0;
        }
        ((elapsed - self.delay).as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Eased value at `elapsed` since phase start.
    pub fn value_at(&self, elapsed: Duration) -> f64 {
        let t = self.ease.apply(self.progress_at(elapsed));
        self.from + (self.to - self.from) * t
    }
}

/// A set of concurrently-running tweens with a fixed total time budget.
///
/// The default budget is the latest tween end; `with_budget` pins an
/// independent budget, after which the phase resolves regardless of
/// unfinished tweens.
#[derive(Clone, Debug)]
pub struct Phase {
    tweens: Vec<Tween>,
    budget: Duration,
}

impl Phase {
    pub fn new(tweens: Vec<Tween>) -> DialResult<Self> {
        if tweens.is_empty() {
            return Err(DialError::EmptyPhase);
        }
        let budget = tweens.iter().map(Tween::end).max().unwrap_or(Duration::ZERO);
        Ok(Self { tweens, budget })
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn tweens(&self) -> &[Tween] {
        &self.tweens
    }
}

/// Snapshot of one frame step: per-tween values in declaration order, plus
/// overall phase progress. `completed` is reported true exactly once.
#[derive(Clone, Debug)]
pub struct PhaseFrame {
    pub values: Vec<f64>,
    pub progress: f64,
    pub completed: bool,
}

#[derive(Debug)]
struct Run {
    phase: Phase,
    elapsed: Duration,
    last_sample: Option<Instant>,
}

/// Frame-driven phase runner.
///
/// Owned per dial instance; advancing happens only through `step(now)` from
/// the host's per-frame callback, with monotonic wall-clock sampling. Frame
/// deltas are capped at `max_frame_step` so a lagging host skips animation
/// time instead of jumping.
#[derive(Debug)]
pub struct Sequencer {
    max_frame_step: Duration,
    run: Option<Run>,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequencer {
    pub fn new() -> Self {
        Self::with_max_frame_step(Duration::from_millis(config::MAX_FRAME_STEP_MS))
    }

    pub fn with_max_frame_step(max_frame_step: Duration) -> Self {
        Self {
            max_frame_step,
            run: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Start a phase run, cancelling any run already in flight.
    pub fn begin(&mut self, phase: Phase) {
        if self.run.is_some() {
            tracing::debug!("cancelling in-flight phase run before new phase");
        }
        tracing::debug!(
            tweens = phase.tweens.len(),
            budget_ms = phase.budget.as_millis() as u64,
            "phase begin"
        );
        self.run = Some(Run {
            phase,
            elapsed: Duration::ZERO,
            last_sample: None,
        });
    }

    /// Stop scheduling further frames; in-flight visual state stays as-is.
    pub fn cancel(&mut self) {
        if self.run.take().is_some() {
            tracing::debug!("phase cancelled");
        }
    }

    /// Advance by the real time elapsed since the previous step.
    ///
    /// The first step after `begin` samples at elapsed zero. Returns `None`
    /// when no run is active (including every step after the one that
    /// reported completion).
    pub fn step(&mut self, now: Instant) -> Option<PhaseFrame> {
        let run = self.run.as_mut()?;

        let dt = match run.last_sample {
            None => Duration::ZERO,
            Some(prev) => now.saturating_duration_since(prev).min(self.max_frame_step),
        };
        run.last_sample = Some(now);
        run.elapsed += dt;

        let elapsed = run.elapsed;
        let budget = run.phase.budget;
        let completed = elapsed >= budget;
        let values = run
            .phase
            .tweens
            .iter()
            .map(|t| t.value_at(elapsed))
            .collect();
        let progress = if budget.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f64() / budget.as_secs_f64()).clamp(0.0, 1.0)
        };

        if completed {
            tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "phase complete");
            self.run = None;
        }

        Some(PhaseFrame {
            values,
            progress,
            completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn linear(delay: u64, duration: u64, from: f64, to: f64) -> Tween {
        Tween::new(ms(delay), ms(duration), from, to, Ease::Linear)
    }

    /// Drives a sequencer with synthetic per-frame deltas.
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

    #[test]
    fn tween_progress_partitions_delay_and_duration() {
        let t = linear(400, 500, 0.0, 1.0);
        assert_eq!(t.progress_at(ms(0)), 0.0);
        assert_eq!(t.progress_at(ms(400)), 0.0);
        assert!((t.progress_at(ms(650)) - 0.5).abs() < 1e-9);
        assert_eq!(t.progress_at(ms(900)), 1.0);
        assert_eq!(t.progress_at(ms(5000)), 1.0);
    }

    #[test]
    fn zero_duration_tween_snaps_after_delay() {
        let t = Tween::new(ms(100), ms(0), 2.0, 7.0, Ease::Linear);
        assert_eq!(t.value_at(ms(50)), 2.0);
        assert_eq!(t.value_at(ms(100)), 2.0);
        assert_eq!(t.value_at(ms(101)), 7.0);
    }

    #[test]
    fn phase_budget_defaults_to_latest_tween_end() {
        let phase = Phase::new(vec![linear(0, 700, 0.0, 78.0), linear(400, 500, 0.0, 1.0)])
            .unwrap();
        assert_eq!(phase.budget(), ms(900));
    }

    #[test]
    fn empty_phase_is_rejected() {
        assert!(Phase::new(vec![]).is_err());
    }

    #[test]
    fn deltas_summing_past_budget_complete_exactly_once() {
        let mut seq = Sequencer::with_max_frame_step(ms(40));
        seq.begin(Phase::new(vec![linear(0, 100, 0.0, 10.0)]).unwrap());

        let mut clock = Clock::new();
        let mut completions = 0;
        let mut last = None;
        // 0 + 40*4 = 160ms of animation time, past the 100ms budget.
        for _ in 0..5 {
            if let Some(frame) = seq.step(clock.advance(ms(40))) {
                if frame.completed {
                    completions += 1;
                }
                last = Some(frame);
            }
        }

        assert_eq!(completions, 1);
        let last = last.unwrap();
        assert_eq!(last.values, vec![10.0]);
        assert_eq!(last.progress, 1.0);
        assert!(!seq.is_running());
        assert!(seq.step(clock.advance(ms(40))).is_none());
    }

    #[test]
    fn first_step_samples_at_elapsed_zero() {
        let mut seq = Sequencer::new();
        seq.begin(Phase::new(vec![linear(0, 100, 5.0, 10.0)]).unwrap());
        let frame = seq.step(Instant::now()).unwrap();
        assert_eq!(frame.values, vec![5.0]);
        assert_eq!(frame.progress, 0.0);
        assert!(!frame.completed);
    }

    #[test]
    fn oversized_frame_deltas_are_capped() {
        let mut seq = Sequencer::with_max_frame_step(ms(40));
        seq.begin(Phase::new(vec![linear(0, 1000, 0.0, 1.0)]).unwrap());

        let mut clock = Clock::new();
        seq.step(clock.advance(ms(0)));
        // A 5s stall contributes only the 40ms cap.
        let frame = seq.step(clock.advance(ms(5000))).unwrap();
        assert!((frame.values[0] - 0.04).abs() < 1e-9);
    }

    #[test]
    fn cancel_halts_scheduling_mid_phase() {
        let mut seq = Sequencer::with_max_frame_step(ms(40));
        seq.begin(Phase::new(vec![linear(0, 1000, 0.0, 1.0)]).unwrap());

        let mut clock = Clock::new();
        seq.step(clock.advance(ms(0)));
        let frame = seq.step(clock.advance(ms(40))).unwrap();
        assert!(frame.values[0] > 0.0 && frame.values[0] < 1.0);

        seq.cancel();
        assert!(!seq.is_running());
        assert!(seq.step(clock.advance(ms(40))).is_none());
    }

    #[test]
    fn begin_replaces_in_flight_run() {
        let mut seq = Sequencer::with_max_frame_step(ms(40));
        seq.begin(Phase::new(vec![linear(0, 1000, 0.0, 1.0)]).unwrap());
        let mut clock = Clock::new();
        seq.step(clock.advance(ms(0)));
        seq.step(clock.advance(ms(40)));

        seq.begin(Phase::new(vec![linear(0, 100, 0.0, 5.0)]).unwrap());
        let frame = seq.step(clock.advance(ms(40))).unwrap();
        // Fresh run starts over at elapsed zero.
        assert_eq!(frame.values, vec![0.0]);
    }

    #[test]
    fn explicit_budget_resolves_before_tweens_finish() {
        let phase = Phase::new(vec![linear(0, 1000, 0.0, 1.0)])
            .unwrap()
            .with_budget(ms(100));
        let mut seq = Sequencer::with_max_frame_step(ms(50));
        seq.begin(phase);

        let mut clock = Clock::new();
        seq.step(clock.advance(ms(0)));
        seq.step(clock.advance(ms(50)));
        let frame = seq.step(clock.advance(ms(50))).unwrap();
        assert!(frame.completed);
        assert!((frame.values[0] - 0.1).abs() < 1e-9);
    }

    #[test]
    fn staggered_tweens_finish_in_order() {
        let phase = Phase::new(vec![
            linear(0, 100, 0.0, 1.0),
            linear(100, 100, 0.0, 1.0),
            linear(200, 100, 0.0, 1.0),
        ])
        .unwrap();
        let mut seq = Sequencer::with_max_frame_step(ms(150));
        seq.begin(phase);

        let mut clock = Clock::new();
        seq.step(clock.advance(ms(0)));
        let frame = seq.step(clock.advance(ms(150))).unwrap();
        assert_eq!(frame.values[0], 1.0);
        assert!((frame.values[1] - 0.5).abs() < 1e-9);
        assert_eq!(frame.values[2], 0.0);
    }
}
