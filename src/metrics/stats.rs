//! Latency statistics
//!
//! Percentiles and a bounded uniform sample used by [`Timer`](super::Timer).

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of latency samples a timer keeps for distribution statistics
pub const RESERVOIR_SIZE: usize = 1028;

/// Latency percentiles in milliseconds (p50, p90, p95, p99, p999)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    /// 50th percentile (median)
    pub p50: f64,
    /// 90th percentile
    pub p90: f64,
    /// 95th percentile
    pub p95: f64,
    /// 99th percentile
    pub p99: f64,
    /// 99.9th percentile
    pub p999: f64,
}

impl Percentiles {
    /// Calculate percentiles from ascending samples
    pub fn from_sorted(sorted: &[f64]) -> Self {
        if sorted.is_empty() {
            return Self::default();
        }

        Self {
            p50: percentile(sorted, 50.0),
            p90: percentile(sorted, 90.0),
            p95: percentile(sorted, 95.0),
            p99: percentile(sorted, 99.0),
            p999: percentile(sorted, 99.9),
        }
    }
}

/// Linear interpolation between the two closest ranks
fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        len => {
            let idx = (p / 100.0) * (len - 1) as f64;
            let lower = idx.floor() as usize;
            let upper = (idx.ceil() as usize).min(len - 1);
            let fraction = idx - lower as f64;
            sorted[lower] * (1.0 - fraction) + sorted[upper] * fraction
        }
    }
}

/// Uniform random sample of a stream (Vitter's algorithm R)
#[derive(Clone, Debug)]
pub struct Reservoir {
    samples: Vec<f64>,
    seen: u64,
    capacity: usize,
}

impl Reservoir {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            seen: 0,
            capacity,
        }
    }

    /// Offer one value; it replaces a random slot once the sample is full
    pub fn update(&mut self, value: f64) {
        self.seen += 1;
        if self.samples.len() < self.capacity {
            self.samples.push(value);
            return;
        }

        let slot = rand::rng().random_range(0..self.seen);
        if let Ok(slot) = usize::try_from(slot) {
            if slot < self.capacity {
                self.samples[slot] = value;
            }
        }
    }

    /// Values currently held, in ascending order
    pub fn sorted(&self) -> Vec<f64> {
        let mut sorted = self.samples.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.seen = 0;
    }
}

impl Default for Reservoir {
    fn default() -> Self {
        Self::new(RESERVOIR_SIZE)
    }
}

/// Point-in-time view of a timer, durations in milliseconds
///
/// `count`, `min`, `max` and `mean` are exact. `std_dev` and the percentiles
/// are computed from the timer's reservoir sample.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub percentiles: Percentiles,
    /// Updates per second since the first recorded duration began
    pub rate: f64,
}

impl TimerSnapshot {
    /// Format as summary string
    pub fn format_summary(&self) -> String {
        format!(
            "count={} min={:.2}ms max={:.2}ms mean={:.2}ms std={:.2}ms p95={:.2}ms p99={:.2}ms",
            self.count,
            self.min,
            self.max,
            self.mean,
            self.std_dev,
            self.percentiles.p95,
            self.percentiles.p99
        )
    }
}

/// Population standard deviation of the sample around `mean`
pub(crate) fn std_dev(samples: &[f64], mean: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let variance =
        samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / samples.len() as f64;
    variance.sqrt()
}
