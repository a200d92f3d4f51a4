//! What a single executor call did

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::results::Totals;

/// How a run was bounded
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum RunMode {
    /// Dispatch until the deadline, `workers` tasks shared by all tests
    Soak { duration: Duration, workers: usize },
    /// `repeats` invocations on each of `workers` tasks per test
    Benchmark { repeats: usize, workers: usize },
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Soak { duration, workers } => write!(
                f,
                "soak for {} with {} workers",
                humantime::format_duration(*duration),
                workers
            ),
            RunMode::Benchmark { repeats, workers } => write!(
                f,
                "benchmark of {repeats} repeats with {workers} workers per test"
            ),
        }
    }
}

/// Outcome counts of one executor call
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub mode: RunMode,
    pub elapsed: Duration,
    pub tests: usize,
    pub successes: u64,
    pub failures: u64,
}

impl RunSummary {
    pub(crate) fn new(mode: RunMode, elapsed: Duration, tests: usize, totals: Totals) -> Self {
        Self {
            mode,
            elapsed,
            tests,
            successes: totals.success,
            failures: totals.failure,
        }
    }

    pub fn invocations(&self) -> u64 {
        self.successes + self.failures
    }

    /// Invocations per second over the whole call
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.invocations() as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} over {} tests: {} invocations ({} passed, {} failed) in {}ms, {:.1}/s",
            self.mode,
            self.tests,
            self.invocations(),
            self.successes,
            self.failures,
            self.elapsed.as_millis(),
            self.throughput()
        )
    }
}
