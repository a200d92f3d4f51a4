//! The latency/success/failure triple kept per test and globally

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::metrics::{Counter, Metric, Registry, Timer, TimerSnapshot};

pub const LATENCY: &str = "latency";
pub const SUCCESS: &str = "success";
pub const FAILURE: &str = "failure";

/// Latency timer plus success and failure counters, registered by name
///
/// The handles are resolved once at construction so recording an outcome
/// never goes through a registry lookup.
#[derive(Debug)]
pub struct RunMetrics {
    registry: Registry,
    latency: Arc<Timer>,
    success: Arc<Counter>,
    failure: Arc<Counter>,
}

impl RunMetrics {
    pub fn new() -> Self {
        let latency = Arc::new(Timer::new());
        let success = Arc::new(Counter::new());
        let failure = Arc::new(Counter::new());

        let registry = [
            (LATENCY, Metric::from(latency.clone())),
            (SUCCESS, Metric::from(success.clone())),
            (FAILURE, Metric::from(failure.clone())),
        ]
        .into_iter()
        .collect();

        Self {
            registry,
            latency,
            success,
            failure,
        }
    }

    pub fn record_success(&self, elapsed: Duration) {
        self.success.inc(1);
        self.latency.update(elapsed);
    }

    pub fn record_failure(&self, elapsed: Duration) {
        self.failure.inc(1);
        self.latency.update(elapsed);
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn latency(&self) -> &Timer {
        &self.latency
    }

    pub fn success(&self) -> u64 {
        self.success.count()
    }

    pub fn failure(&self) -> u64 {
        self.failure.count()
    }

    pub fn totals(&self) -> Totals {
        Totals {
            success: self.success(),
            failure: self.failure(),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            success: self.success(),
            failure: self.failure(),
            latency: self.latency.snapshot(),
        }
    }
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Success and failure counts at one instant
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub success: u64,
    pub failure: u64,
}

impl Totals {
    pub fn invocations(&self) -> u64 {
        self.success + self.failure
    }

    /// Counts accumulated since `earlier`
    pub fn since(&self, earlier: Totals) -> Totals {
        Totals {
            success: self.success.saturating_sub(earlier.success),
            failure: self.failure.saturating_sub(earlier.failure),
        }
    }
}

/// Serializable view of a [`RunMetrics`]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub success: u64,
    pub failure: u64,
    pub latency: TimerSnapshot,
}

impl MetricsSnapshot {
    pub fn invocations(&self) -> u64 {
        self.success + self.failure
    }

    /// Success rate in percent
    pub fn success_rate(&self) -> f64 {
        match self.invocations() {
            0 => 0.0,
            total => self.success as f64 / total as f64 * 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricKind;

    #[test]
    fn test_standard_metrics_are_registered() {
        let metrics = RunMetrics::new();
        assert_eq!(metrics.registry().names(), vec![FAILURE, LATENCY, SUCCESS]);
        assert_eq!(
            metrics.registry().get(LATENCY).map(|m| m.kind()),
            Some(MetricKind::Timer)
        );
    }

    #[test]
    fn test_record_outcomes() {
        let metrics = RunMetrics::new();
        metrics.record_success(Duration::from_millis(5));
        metrics.record_failure(Duration::from_millis(15));
        metrics.record_success(Duration::from_millis(10));

        assert_eq!(metrics.totals(), Totals { success: 2, failure: 1 });
        assert_eq!(metrics.latency().count(), 3);

        // registry handles point at the same counters
        assert_eq!(metrics.registry().counter(SUCCESS).unwrap().count(), 2);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.invocations(), 3);
        assert!((snapshot.success_rate() - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_totals_since() {
        let before = Totals { success: 3, failure: 1 };
        let after = Totals { success: 10, failure: 4 };
        assert_eq!(after.since(before), Totals { success: 7, failure: 3 });
        assert_eq!(after.since(before).invocations(), 10);
    }
}
