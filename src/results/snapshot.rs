//! Serializable views of a results aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::run_metrics::MetricsSnapshot;
use super::test::Test;
use crate::metrics::Metric;

/// Metrics and error causes of one test
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TestSnapshot {
    pub metrics: MetricsSnapshot,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, u64>,
}

impl TestSnapshot {
    pub fn of(test: &Test) -> Self {
        let mut errors = BTreeMap::new();
        test.errors().each(|cause, metric| {
            if let Metric::Counter(counter) = metric {
                errors.insert(cause.to_string(), counter.count());
            }
        });

        Self {
            metrics: test.metrics().snapshot(),
            errors,
        }
    }

    /// The `n` most frequent error causes, most frequent first
    pub fn top_errors(&self, n: usize) -> Vec<(&str, u64)> {
        let mut causes: Vec<(&str, u64)> = self
            .errors
            .iter()
            .map(|(cause, count)| (cause.as_str(), *count))
            .collect();
        causes.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        causes.truncate(n);
        causes
    }
}

/// Global metrics plus every test, keyed by name
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultsSnapshot {
    pub generated_at: DateTime<Utc>,
    pub global: MetricsSnapshot,
    pub tests: BTreeMap<String, TestSnapshot>,
}

impl ResultsSnapshot {
    pub fn new(global: MetricsSnapshot, tests: BTreeMap<String, TestSnapshot>) -> Self {
        Self {
            generated_at: Utc::now(),
            global,
            tests,
        }
    }

    /// Sum of per-test invocations; equals `global.invocations()` once a run
    /// has returned
    pub fn test_invocations(&self) -> u64 {
        self.tests.values().map(|t| t.metrics.invocations()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_errors_ordering() {
        let snapshot = TestSnapshot {
            errors: BTreeMap::from([
                ("refused".to_string(), 3),
                ("timeout".to_string(), 9),
                ("reset".to_string(), 3),
            ]),
            ..Default::default()
        };

        assert_eq!(
            snapshot.top_errors(2),
            vec![("timeout", 9), ("refused", 3)]
        );
        assert_eq!(snapshot.top_errors(10).len(), 3);
    }

    #[test]
    fn test_snapshot_json_skips_empty_errors() {
        let snapshot = TestSnapshot::default();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json.get("errors").is_none());
        assert_eq!(json["metrics"]["success"], 0);
    }
}
