//! Duration-bounded scheduler
//!
//! A single dispatcher feeds test names into a bounded queue drained by a
//! fixed pool of workers. Every pass walks the whole test set in map order,
//! which is neither stable nor fair across runs. When the deadline fires the
//! queue is closed: names already queued are still run, nothing new is
//! queued, and the call joins every worker before returning so the caller
//! sees all metric writes.

use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::summary::{RunMode, RunSummary};
use super::worker::{join_workers, Worker};
use crate::results::Results;

/// How often a soak run logs its running totals
pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

/// Executor errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("at least one worker is required")]
    NoWorkers,
}

impl Results {
    /// Run the registered tests repeatedly on `workers` tasks until
    /// `duration` has elapsed
    pub async fn run_tests(
        &self,
        duration: Duration,
        workers: usize,
    ) -> Result<RunSummary, ExecutorError> {
        if workers == 0 {
            return Err(ExecutorError::NoWorkers);
        }

        info!("Running tests for {:?} with {} workers", duration, workers);

        let start = Instant::now();
        let before = self.metrics().totals();
        let worker = Worker::new(self);
        let names = worker.names();

        let (tx, rx) = mpsc::channel::<String>(workers);
        let queue = Arc::new(Mutex::new(rx));
        let handles: Vec<_> = (0..workers)
            .map(|_| tokio::spawn(worker.clone().drain(queue.clone())))
            .collect();
        drop(queue);

        let global = self.shared_metrics();
        let progress = tokio::spawn(async move {
            loop {
                sleep(PROGRESS_INTERVAL).await;
                let totals = global.totals();
                debug!(
                    "Progress: {:.0}s elapsed, {} passed, {} failed",
                    start.elapsed().as_secs_f64(),
                    totals.success,
                    totals.failure
                );
            }
        });

        let deadline = sleep(duration);
        tokio::pin!(deadline);

        'dispatch: loop {
            if names.is_empty() {
                (&mut deadline).await;
                break;
            }

            for name in &names {
                tokio::select! {
                    biased;
                    _ = &mut deadline => break 'dispatch,
                    sent = tx.send(name.clone()) => {
                        if sent.is_err() {
                            warn!("All workers stopped; waiting out the deadline");
                            (&mut deadline).await;
                            break 'dispatch;
                        }
                    }
                }
            }
        }

        drop(tx);
        join_workers(handles).await;
        progress.abort();

        let summary = RunSummary::new(
            RunMode::Soak { duration, workers },
            start.elapsed(),
            self.len(),
            self.metrics().totals().since(before),
        );
        info!("Run complete: {}", summary);

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn counting(
        results: &mut Results,
        name: &str,
        fail_with: Option<&'static str>,
    ) -> Arc<AtomicU64> {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = calls.clone();
        results.register_test(name, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
                match fail_with {
                    Some(message) => Err(anyhow::anyhow!(message)),
                    None => Ok(()),
                }
            }
        });
        calls
    }

    #[tokio::test]
    async fn test_zero_workers_rejected() {
        let results = Results::new();
        let err = results
            .run_tests(Duration::from_millis(10), 0)
            .await
            .unwrap_err();
        assert_eq!(err, ExecutorError::NoWorkers);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_returns_after_duration() {
        let mut results = Results::new();
        counting(&mut results, "ok", None);

        let duration = Duration::from_millis(150);
        let start = Instant::now();
        results.run_tests(duration, 4).await.unwrap();
        assert!(start.elapsed() >= duration);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_empty_suite_waits_for_deadline() {
        let results = Results::new();
        let duration = Duration::from_millis(50);
        let start = Instant::now();

        let summary = results.run_tests(duration, 2).await.unwrap();
        assert!(start.elapsed() >= duration);
        assert_eq!(summary.invocations(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_every_invocation_is_recorded() {
        let mut results = Results::new();
        let ok_calls = counting(&mut results, "ok", None);
        let bad_calls = counting(&mut results, "bad", Some("boom"));

        let summary = results
            .run_tests(Duration::from_millis(200), 3)
            .await
            .unwrap();

        let ok = results.test("ok").unwrap().metrics().totals();
        let bad = results.test("bad").unwrap().metrics().totals();

        assert!(ok_calls.load(Ordering::SeqCst) > 0);
        assert_eq!(ok.invocations(), ok_calls.load(Ordering::SeqCst));
        assert_eq!(bad.invocations(), bad_calls.load(Ordering::SeqCst));
        assert_eq!(ok.failure, 0);
        assert_eq!(bad.success, 0);

        let global = results.metrics().totals();
        assert_eq!(global.invocations(), ok.invocations() + bad.invocations());
        assert_eq!(summary.invocations(), global.invocations());
        assert_eq!(
            results.metrics().latency().count(),
            global.invocations()
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_error_cause_matches_failures() {
        let mut results = Results::new();
        counting(&mut results, "bad", Some("connection refused"));

        results
            .run_tests(Duration::from_millis(100), 2)
            .await
            .unwrap();

        let bad = results.test("bad").unwrap();
        assert!(bad.metrics().failure() > 0);
        assert_eq!(bad.error_count("connection refused"), bad.metrics().failure());
        assert_eq!(bad.errors().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_panicking_test_keeps_workers_alive() {
        let mut results = Results::new();
        let ok_calls = counting(&mut results, "ok", None);
        let boom_calls = Arc::new(AtomicU64::new(0));
        let counter = boom_calls.clone();
        results.register_test("boom", move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
                if counter.load(Ordering::SeqCst) > 0 {
                    panic!("kaboom");
                }
                Ok(())
            }
        });

        let summary = results
            .run_tests(Duration::from_millis(100), 2)
            .await
            .unwrap();

        let ok = results.test("ok").unwrap().metrics().totals();
        let boom = results.test("boom").unwrap();

        // Both workers survive many panics, so both tests keep being dispatched
        assert!(boom_calls.load(Ordering::SeqCst) > 2);
        assert!(ok_calls.load(Ordering::SeqCst) > 2);
        assert_eq!(ok.invocations(), ok_calls.load(Ordering::SeqCst));
        assert_eq!(boom.metrics().failure(), boom_calls.load(Ordering::SeqCst));
        assert_eq!(boom.error_count("panic: kaboom"), boom.metrics().failure());
        assert_eq!(summary.invocations(), results.metrics().totals().invocations());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_no_invocation_after_return() {
        let mut results = Results::new();
        let calls = counting(&mut results, "ok", None);

        results
            .run_tests(Duration::from_millis(100), 4)
            .await
            .unwrap();
        let at_return = calls.load(Ordering::SeqCst);

        sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), at_return);
    }
}
