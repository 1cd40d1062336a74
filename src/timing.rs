//! Per-case timing state and the pause/resume isolation protocol.
//!
//! A case body drives its iterations with [`TimingState::keep_running`] and
//! brackets per-iteration randomized setup with
//! [`TimingState::pause_timing`] / [`TimingState::resume_timing`], so that
//! only the primitive under measurement contributes to the reported samples:
//!
//! ```
//! use hebench::timing::TimingState;
//!
//! let mut state = TimingState::new(10);
//! while state.keep_running() {
//!     state.pause_timing();
//!     // sample fresh random inputs; cost excluded from every sample
//!     state.resume_timing();
//!     // exactly one primitive call; the only code being timed
//! }
//! let outcome = state.finish();
//! assert_eq!(outcome.iterations(), 10);
//! ```

use std::time::{Duration, Instant};

/// Mutable timing handle passed to every benchmark case.
///
/// Lifecycle per case: created by the driver, driven through the iteration
/// loop, then consumed by [`TimingState::finish`] into a [`CaseOutcome`].
/// A skip requested before the first iteration ends the loop immediately;
/// the primitive is never invoked.
pub struct TimingState {
    target_iterations: u64,
    completed: u64,
    in_iteration: bool,
    timer: Option<Instant>,
    current: Duration,
    samples: Vec<Duration>,
    skip_reason: Option<String>,
}

impl TimingState {
    pub fn new(target_iterations: u64) -> Self {
        Self {
            target_iterations,
            completed: 0,
            in_iteration: false,
            timer: None,
            current: Duration::ZERO,
            samples: Vec::with_capacity(target_iterations as usize),
            skip_reason: None,
        }
    }

    /// Close the previous iteration's sample (if any) and start the next.
    /// Returns `false` once the target iteration count is reached or a skip
    /// has been requested.
    pub fn keep_running(&mut self) -> bool {
        if self.in_iteration {
            let mut elapsed = self.current;
            if let Some(started) = self.timer.take() {
                elapsed += started.elapsed();
            }
            self.samples.push(elapsed);
            self.current = Duration::ZERO;
            self.completed += 1;
            self.in_iteration = false;
        }
        if self.skip_reason.is_some() || self.completed >= self.target_iterations {
            return false;
        }
        self.in_iteration = true;
        self.timer = Some(Instant::now());
        true
    }

    /// Stop attributing wall-clock time to the current iteration. No-op when
    /// already paused.
    pub fn pause_timing(&mut self) {
        if let Some(started) = self.timer.take() {
            self.current += started.elapsed();
        }
    }

    /// Restart attribution after a pause. No-op when the timer is running or
    /// no iteration is open.
    pub fn resume_timing(&mut self) {
        if self.in_iteration && self.timer.is_none() {
            self.timer = Some(Instant::now());
        }
    }

    /// Mark the case skipped for an unsatisfied declared precondition. The
    /// first reason wins; the iteration loop terminates at its next check.
    pub fn skip_with_reason(&mut self, reason: impl Into<String>) {
        if self.skip_reason.is_none() {
            self.skip_reason = Some(reason.into());
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.skip_reason.is_some()
    }

    pub fn iterations_completed(&self) -> u64 {
        self.completed
    }

    /// Consume the state into the case's outcome.
    pub fn finish(self) -> CaseOutcome {
        match self.skip_reason {
            Some(reason) => CaseOutcome::Skipped { reason },
            None => CaseOutcome::Completed { samples: self.samples },
        }
    }
}

/// Terminal state of one executed case. Fatal conditions are
/// [`crate::error::HeBenchError`]s, not outcomes.
#[derive(Clone, Debug)]
pub enum CaseOutcome {
    /// All iterations ran; one duration sample per iteration.
    Completed { samples: Vec<Duration> },
    /// A declared precondition was unsatisfied; the primitive never ran.
    Skipped { reason: String },
}

impl CaseOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, CaseOutcome::Skipped { .. })
    }

    pub fn iterations(&self) -> u64 {
        match self {
            CaseOutcome::Completed { samples } => samples.len() as u64,
            CaseOutcome::Skipped { .. } => 0,
        }
    }

    /// Mean per-iteration latency in microseconds, `None` when skipped or
    /// when no iteration ran.
    pub fn mean_micros(&self) -> Option<f64> {
        match self {
            CaseOutcome::Completed { samples } if !samples.is_empty() => {
                let total: Duration = samples.iter().sum();
                Some(total.as_secs_f64() * 1e6 / samples.len() as f64)
            }
            _ => None,
        }
    }

    pub fn min_micros(&self) -> Option<f64> {
        self.samples().and_then(|s| s.iter().min().map(|d| d.as_secs_f64() * 1e6))
    }

    pub fn max_micros(&self) -> Option<f64> {
        self.samples().and_then(|s| s.iter().max().map(|d| d.as_secs_f64() * 1e6))
    }

    fn samples(&self) -> Option<&[Duration]> {
        match self {
            CaseOutcome::Completed { samples } => Some(samples),
            CaseOutcome::Skipped { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_runs_exact_iteration_count() {
        let mut state = TimingState::new(7);
        let mut body_runs = 0;
        while state.keep_running() {
            body_runs += 1;
        }
        assert_eq!(body_runs, 7);
        let outcome = state.finish();
        assert_eq!(outcome.iterations(), 7);
        assert!(!outcome.is_skipped());
    }

    #[test]
    fn test_pause_excludes_setup_cost() {
        let mut state = TimingState::new(3);
        while state.keep_running() {
            state.pause_timing();
            sleep(Duration::from_millis(5));
            state.resume_timing();
        }
        let mean = state.finish().mean_micros().unwrap();
        // The 5ms sleep happened while paused; samples hold only the empty
        // timed window.
        assert!(mean < 2_000.0, "setup cost leaked into samples: {mean}us");
    }

    #[test]
    fn test_unpaused_sleep_is_measured() {
        let mut state = TimingState::new(2);
        while state.keep_running() {
            sleep(Duration::from_millis(3));
        }
        let mean = state.finish().mean_micros().unwrap();
        assert!(mean >= 3_000.0, "timed window lost measured cost: {mean}us");
    }

    #[test]
    fn test_skip_before_loop_prevents_iterations() {
        let mut state = TimingState::new(10);
        state.skip_with_reason("key switching is disabled for this parameter set");
        let mut body_runs = 0;
        while state.keep_running() {
            body_runs += 1;
        }
        assert_eq!(body_runs, 0);
        match state.finish() {
            CaseOutcome::Skipped { reason } => {
                assert!(reason.contains("key switching"));
            }
            other => panic!("expected skip, got {other:?}"),
        }
    }

    #[test]
    fn test_first_skip_reason_wins() {
        let mut state = TimingState::new(1);
        state.skip_with_reason("first");
        state.skip_with_reason("second");
        match state.finish() {
            CaseOutcome::Skipped { reason } => assert_eq!(reason, "first"),
            other => panic!("expected skip, got {other:?}"),
        }
    }

    #[test]
    fn test_pause_resume_idempotent() {
        let mut state = TimingState::new(2);
        while state.keep_running() {
            state.pause_timing();
            state.pause_timing();
            state.resume_timing();
            state.resume_timing();
        }
        assert_eq!(state.finish().iterations(), 2);
    }

    #[test]
    fn test_skipped_outcome_has_no_samples() {
        let mut state = TimingState::new(4);
        state.skip_with_reason("unsatisfied precondition");
        let outcome = state.finish();
        assert_eq!(outcome.iterations(), 0);
        assert!(outcome.mean_micros().is_none());
        assert!(outcome.min_micros().is_none());
    }
}
