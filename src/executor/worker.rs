//! Shared per-invocation logic for both executors

use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::metrics::RegistryError;
use crate::results::{ErrorClassifier, Results, RunMetrics, Test};

/// What a worker task needs from the aggregate, detached from its borrow
#[derive(Clone)]
pub(crate) struct Worker {
    tests: Arc<HashMap<String, Arc<Test>>>,
    global: Arc<RunMetrics>,
    classifier: ErrorClassifier,
}

impl Worker {
    pub(crate) fn new(results: &Results) -> Self {
        Self {
            tests: results.test_table(),
            global: results.shared_metrics(),
            classifier: results.classifier(),
        }
    }

    pub(crate) fn tests(&self) -> impl Iterator<Item = &Arc<Test>> {
        self.tests.values()
    }

    /// Names in map order; not stable across runs
    pub(crate) fn names(&self) -> Vec<String> {
        self.tests.keys().cloned().collect()
    }

    /// Invoke `test` once and record the outcome on the test and globally
    ///
    /// A panic inside the test function counts as a failure keyed
    /// `panic: <message>`; the worker keeps running.
    pub(crate) async fn run_once(&self, test: &Test) -> Result<(), RegistryError> {
        let start = Instant::now();
        let result = match AssertUnwindSafe(test.invoke()).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(anyhow::anyhow!("panic: {}", panic_message(&*payload))),
        };
        let elapsed = start.elapsed();

        match result {
            Ok(()) => {
                test.metrics().record_success(elapsed);
                self.global.record_success(elapsed);
                // Soak runs pass thousands of times a second; only failures are info
                debug!("--- PASS - Running {}", test.name());
            }
            Err(err) => {
                test.metrics().record_failure(elapsed);
                self.global.record_failure(elapsed);
                test.record_error(&(self.classifier)(&err))?;
                info!("--- FAIL - Running {}: {:#}", test.name(), err);
            }
        }

        Ok(())
    }

    /// Run dispatched names until the queue is closed and empty
    pub(crate) async fn drain(
        self,
        queue: Arc<Mutex<mpsc::Receiver<String>>>,
    ) -> Result<(), RegistryError> {
        loop {
            let next = queue.lock().await.recv().await;
            let Some(name) = next else {
                return Ok(());
            };

            match self.tests.get(&name) {
                Some(test) => self.run_once(test).await?,
                None => warn!("Dispatched unknown test {}", name),
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown payload"
    }
}

/// Wait for every worker task, logging the ones that faulted
pub(crate) async fn join_workers(handles: Vec<JoinHandle<Result<(), RegistryError>>>) {
    for joined in join_all(handles).await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Worker stopped: {}", e),
            Err(e) => error!("Worker task failed: {}", e),
        }
    }
}
