//! Metrics registry
//!
//! Named counters and timers that many worker tasks update concurrently.
//! Each metric is safe to share on its own; the registry only guards the
//! name → metric mapping.

#![allow(dead_code)]
#![allow(unused_imports)]

mod metric;
mod registry;
mod stats;

pub use metric::{Counter, Metric, MetricKind, Timer};
pub use registry::{Registry, RegistryError};
pub use stats::{Percentiles, Reservoir, TimerSnapshot, RESERVOIR_SIZE};
