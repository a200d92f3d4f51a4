//! Counter and timer metrics

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use super::stats::{self, Percentiles, Reservoir, TimerSnapshot};

/// Monotonic event counter
#[derive(Debug, Default)]
pub struct Counter {
    count: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self, n: u64) {
        self.count.fetch_add(n, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        self.count.store(0, Ordering::Relaxed);
    }
}

#[derive(Debug)]
struct TimerState {
    count: u64,
    sum: Duration,
    min: Duration,
    max: Duration,
    reservoir: Reservoir,
    started: Option<Instant>,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            count: 0,
            sum: Duration::ZERO,
            min: Duration::MAX,
            max: Duration::ZERO,
            reservoir: Reservoir::default(),
            started: None,
        }
    }
}

/// Latency timer
///
/// Keeps exact count, sum, min and max plus a bounded sample for the
/// distribution. All updates go through one short critical section so a
/// snapshot never sees a half-applied update.
///
/// The rate clock starts at the beginning of the first recorded duration,
/// not at construction.
#[derive(Debug)]
pub struct Timer {
    state: Mutex<TimerState>,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TimerState::default()),
        }
    }

    /// Record one duration
    pub fn update(&self, elapsed: Duration) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.started.is_none() {
            let now = Instant::now();
            state.started = Some(now.checked_sub(elapsed).unwrap_or(now));
        }
        state.count += 1;
        state.sum += elapsed;
        state.min = state.min.min(elapsed);
        state.max = state.max.max(elapsed);
        state.reservoir.update(as_millis(elapsed));
    }

    /// Record the time elapsed since `start`
    pub fn update_since(&self, start: Instant) {
        self.update(start.elapsed());
    }

    pub fn count(&self) -> u64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .count
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.count == 0 {
            return TimerSnapshot::default();
        }

        let sorted = state.reservoir.sorted();
        let mean = as_millis(state.sum) / state.count as f64;
        let age = state
            .started
            .map_or(0.0, |started| started.elapsed().as_secs_f64());

        TimerSnapshot {
            count: state.count,
            min: as_millis(state.min),
            max: as_millis(state.max),
            mean,
            std_dev: stats::std_dev(&sorted, mean),
            percentiles: Percentiles::from_sorted(&sorted),
            rate: if age > 0.0 {
                state.count as f64 / age
            } else {
                0.0
            },
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

fn as_millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Kind of a registered metric
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Timer,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::Counter => write!(f, "counter"),
            MetricKind::Timer => write!(f, "timer"),
        }
    }
}

/// A shared handle to a registered metric
#[derive(Clone, Debug)]
pub enum Metric {
    Counter(Arc<Counter>),
    Timer(Arc<Timer>),
}

impl Metric {
    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Counter(_) => MetricKind::Counter,
            Metric::Timer(_) => MetricKind::Timer,
        }
    }
}

impl From<Arc<Counter>> for Metric {
    fn from(counter: Arc<Counter>) -> Self {
        Metric::Counter(counter)
    }
}

impl From<Arc<Timer>> for Metric {
    fn from(timer: Arc<Timer>) -> Self {
        Metric::Timer(timer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_counter() {
        let counter = Counter::new();
        counter.inc(1);
        counter.inc(4);
        assert_eq!(counter.count(), 5);

        counter.clear();
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_counter_concurrent_updates() {
        let counter = Arc::new(Counter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = counter.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        counter.inc(1);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.count(), 8000);
    }

    #[test]
    fn test_timer_snapshot() {
        let timer = Timer::new();
        for ms in [10, 20, 30] {
            timer.update(Duration::from_millis(ms));
        }

        let snapshot = timer.snapshot();
        assert_eq!(snapshot.count, 3);
        assert!((snapshot.min - 10.0).abs() < 1e-9);
        assert!((snapshot.max - 30.0).abs() < 1e-9);
        assert!((snapshot.mean - 20.0).abs() < 1e-9);
        assert!((snapshot.percentiles.p50 - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_timer_snapshot() {
        let timer = Timer::new();
        assert_eq!(timer.snapshot(), TimerSnapshot::default());
        assert_eq!(timer.count(), 0);
    }

    #[test]
    fn test_timer_rate_ignores_idle_time_before_first_update() {
        let timer = Timer::new();
        thread::sleep(Duration::from_millis(300));

        timer.update(Duration::from_millis(1));
        timer.update(Duration::from_millis(1));

        // Counting the idle 300ms would put the rate below 7/s
        assert!(timer.snapshot().rate > 20.0);
    }

    #[test]
    fn test_metric_kind() {
        let metric: Metric = Arc::new(Timer::new()).into();
        assert_eq!(metric.kind(), MetricKind::Timer);
        assert_eq!(MetricKind::Counter.to_string(), "counter");
    }
}
