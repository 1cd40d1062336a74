//! Minimal benchmark driver: label-keyed case registration and execution.
//!
//! The harness core only needs `register`, `run`, and skip reporting from a
//! driver; scheduling policy, statistics and output formats beyond the
//! per-case line below are a driver concern, not the core's. Cases are bound
//! to their environment bundle once at registration time, never re-resolved
//! per iteration.

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::backend::HeBackend;
use crate::env::EnvironmentBundle;
use crate::error::{HeBenchError, Result};
use crate::registry::Category;
use crate::timing::{CaseOutcome, TimingState};

/// Unit every case reports in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeUnit {
    Microseconds,
}

/// A benchmark case body: drives the timing protocol against its bound
/// bundle. An `Err` return is a primitive failure and aborts the whole run.
pub type CaseFn<B> = fn(&mut TimingState, &EnvironmentBundle<B>) -> Result<()>;

/// Default per-case iteration count when none is configured.
pub const DEFAULT_ITERATIONS: u64 = 100;

struct RegisteredCase<B: HeBackend> {
    label: String,
    category: Category,
    unit: TimeUnit,
    bundle: Rc<EnvironmentBundle<B>>,
    run: CaseFn<B>,
}

/// Registers labeled cases and runs them in registration order.
pub struct BenchmarkDriver<B: HeBackend> {
    cases: Vec<RegisteredCase<B>>,
    labels: HashSet<String>,
    iterations: u64,
}

impl<B: HeBackend> BenchmarkDriver<B> {
    pub fn new() -> Self {
        Self::with_iterations(DEFAULT_ITERATIONS)
    }

    pub fn with_iterations(iterations: u64) -> Self {
        Self {
            cases: Vec::new(),
            labels: HashSet::new(),
            iterations,
        }
    }

    /// Register one case. A label seen twice within a run is a programmer
    /// error and fatal.
    pub fn register(
        &mut self,
        label: impl Into<String>,
        category: Category,
        unit: TimeUnit,
        bundle: Rc<EnvironmentBundle<B>>,
        run: CaseFn<B>,
    ) -> Result<()> {
        let label = label.into();
        if !self.labels.insert(label.clone()) {
            return Err(HeBenchError::DuplicateLabel(label));
        }
        self.cases.push(RegisteredCase { label, category, unit, bundle, run });
        Ok(())
    }

    /// Registered labels in registration order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.cases.iter().map(|case| case.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Run every registered case.
    pub fn run_all(&self) -> Result<Vec<CaseReport>> {
        self.run_matching("")
    }

    /// Run the cases whose label contains `filter`, in registration order.
    pub fn run_matching(&self, filter: &str) -> Result<Vec<CaseReport>> {
        let mut reports = Vec::new();
        for case in &self.cases {
            if !case.label.contains(filter) {
                continue;
            }
            let mut state = TimingState::new(self.iterations);
            (case.run)(&mut state, &case.bundle)?;
            reports.push(CaseReport {
                label: case.label.clone(),
                category: case.category,
                unit: case.unit,
                outcome: state.finish(),
            });
        }
        Ok(reports)
    }
}

impl<B: HeBackend> Default for BenchmarkDriver<B> {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one executed case.
#[derive(Clone, Debug)]
pub struct CaseReport {
    pub label: String,
    pub category: Category,
    pub unit: TimeUnit,
    pub outcome: CaseOutcome,
}

impl CaseReport {
    pub fn mean_micros(&self) -> Option<f64> {
        self.outcome.mean_micros()
    }
}

impl fmt::Display for CaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            CaseOutcome::Completed { samples } => match self.outcome.mean_micros() {
                Some(mean) => write!(
                    f,
                    "{:<56} {:>12.3} us/iter ({} iters)",
                    self.label,
                    mean,
                    samples.len()
                ),
                None => write!(f, "{:<56} {:>12} (no samples)", self.label, "-"),
            },
            CaseOutcome::Skipped { reason } => {
                write!(f, "{:<56} SKIPPED: {}", self.label, reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EnvironmentCache;
    use crate::null_backend::NullBackend;
    use crate::params::ParameterIdentity;

    fn test_bundle() -> Rc<EnvironmentBundle<NullBackend>> {
        let mut cache = EnvironmentCache::new();
        cache
            .get_or_create(&ParameterIdentity::ckks(1024, vec![(1 << 27) + 1]).unwrap())
            .unwrap()
    }

    fn noop_case(state: &mut TimingState, _env: &EnvironmentBundle<NullBackend>) -> Result<()> {
        while state.keep_running() {}
        Ok(())
    }

    #[test]
    fn test_duplicate_label_is_fatal() {
        let bundle = test_bundle();
        let mut driver: BenchmarkDriver<NullBackend> = BenchmarkDriver::with_iterations(1);
        driver
            .register("n=1024 / log_q=28 / util / ntt_fwd", Category::Util, TimeUnit::Microseconds, Rc::clone(&bundle), noop_case)
            .unwrap();
        let err = driver
            .register("n=1024 / log_q=28 / util / ntt_fwd", Category::Util, TimeUnit::Microseconds, bundle, noop_case)
            .unwrap_err();
        assert!(matches!(err, HeBenchError::DuplicateLabel(_)));
    }

    #[test]
    fn test_run_matching_filters_by_label() {
        let bundle = test_bundle();
        let mut driver: BenchmarkDriver<NullBackend> = BenchmarkDriver::with_iterations(2);
        driver
            .register("a / keygen / secret", Category::KeyGen, TimeUnit::Microseconds, Rc::clone(&bundle), noop_case)
            .unwrap();
        driver
            .register("a / util / ntt_fwd", Category::Util, TimeUnit::Microseconds, bundle, noop_case)
            .unwrap();
        let reports = driver.run_matching("keygen").unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].category, Category::KeyGen);
        assert_eq!(reports[0].outcome.iterations(), 2);
    }

    #[test]
    fn test_report_line_renders_mean_and_skip() {
        use std::time::Duration;

        let completed = CaseReport {
            label: "n=4096 / log_q=109 / bfv / mul_ct".into(),
            category: Category::Bfv,
            unit: TimeUnit::Microseconds,
            outcome: CaseOutcome::Completed {
                samples: vec![Duration::from_micros(100); 2],
            },
        };
        let line = completed.to_string();
        assert!(line.starts_with("n=4096 / log_q=109 / bfv / mul_ct"));
        assert!(line.ends_with("100.000 us/iter (2 iters)"), "{line}");

        let skipped = CaseReport {
            label: "n=1024 / log_q=28 / ckks / relin".into(),
            category: Category::Ckks,
            unit: TimeUnit::Microseconds,
            outcome: CaseOutcome::Skipped {
                reason: "key switching is disabled for this parameter set".into(),
            },
        };
        let line = skipped.to_string();
        assert!(
            line.ends_with("SKIPPED: key switching is disabled for this parameter set"),
            "{line}"
        );
    }

    #[test]
    fn test_primitive_failure_aborts_run() {
        fn failing_case(state: &mut TimingState, _env: &EnvironmentBundle<NullBackend>) -> Result<()> {
            while state.keep_running() {
                return Err(HeBenchError::Backend("invalid ciphertext state".into()));
            }
            Ok(())
        }
        let bundle = test_bundle();
        let mut driver: BenchmarkDriver<NullBackend> = BenchmarkDriver::with_iterations(3);
        driver
            .register("a / bfv / mul_ct", Category::Bfv, TimeUnit::Microseconds, bundle, failing_case)
            .unwrap();
        assert!(matches!(driver.run_all(), Err(HeBenchError::Backend(_))));
    }
}
