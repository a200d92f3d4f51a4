//! Repeat-bounded benchmark runner
//!
//! Every test gets its own set of workers, each invoking it back to back a
//! fixed number of times with no pacing. The call returns once every worker
//! of every test has finished.

use std::time::Instant;
use tracing::info;

use super::summary::{RunMode, RunSummary};
use super::worker::{join_workers, Worker};
use crate::metrics::RegistryError;
use crate::results::Results;

impl Results {
    /// Invoke each registered test `repeats` times on each of `workers`
    /// tasks, so each test runs `repeats * workers` times in total
    pub async fn run_benchmark_tests(&self, repeats: usize, workers: usize) -> RunSummary {
        info!(
            "Running each test {} times with {} workers",
            repeats, workers
        );

        let start = Instant::now();
        let before = self.metrics().totals();
        let worker = Worker::new(self);

        let mut handles = Vec::with_capacity(self.len() * workers);
        for test in worker.tests() {
            for _ in 0..workers {
                let worker = worker.clone();
                let test = test.clone();
                handles.push(tokio::spawn(async move {
                    for _ in 0..repeats {
                        worker.run_once(&test).await?;
                    }
                    Ok::<(), RegistryError>(())
                }));
            }
        }

        join_workers(handles).await;

        let summary = RunSummary::new(
            RunMode::Benchmark { repeats, workers },
            start.elapsed(),
            self.len(),
            self.metrics().totals().since(before),
        );
        info!("Benchmark complete: {}", summary);

        summary
    }
}
