//! Test records and the results aggregate
//!
//! Tests are registered up front, then mutated only through their metrics
//! while an executor runs.

#![allow(dead_code)]
#![allow(unused_imports)]

mod aggregate;
mod run_metrics;
mod snapshot;

pub use aggregate::{ErrorClassifier, Results};
pub use run_metrics::{MetricsSnapshot, RunMetrics, Totals, FAILURE, LATENCY, SUCCESS};
pub use snapshot::{ResultsSnapshot, TestSnapshot};
pub use test::{Test, TestFunc};
