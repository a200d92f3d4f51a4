//! The results aggregate: every registered test plus global totals

use futures::FutureExt;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;

use super::run_metrics::RunMetrics;
use super::snapshot::{ResultsSnapshot, TestSnapshot};
use super::test::{Test, TestFunc};

/// Turns a failed invocation into its error-histogram key
///
/// Two different causes that render to the same key are counted together.
pub type ErrorClassifier = Arc<dyn Fn(&anyhow::Error) -> String + Send + Sync>;

/// Registered tests and the global metrics mirroring their totals
pub struct Results {
    metrics: Arc<RunMetrics>,
    tests: HashMap<String, Arc<Test>>,
    classifier: ErrorClassifier,
}

impl Results {
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(RunMetrics::new()),
            tests: HashMap::new(),
            classifier: Arc::new(|err| err.to_string()),
        }
    }

    /// Replace the default classifier, which keys failures by their message
    pub fn with_classifier(
        mut self,
        classifier: impl Fn(&anyhow::Error) -> String + Send + Sync + 'static,
    ) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Register `run` under `name` with zeroed metrics, replacing any test
    /// already registered under that name
    pub fn register_test<F, Fut>(&mut self, name: impl Into<String>, run: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let name = name.into();
        let run: TestFunc = Arc::new(move || run().boxed());
        self.tests
            .insert(name.clone(), Arc::new(Test::new(name, run)));
    }

    pub fn test(&self, name: &str) -> Option<&Test> {
        self.tests.get(name).map(Arc::as_ref)
    }

    /// Registered tests, in no particular order
    pub fn tests(&self) -> impl Iterator<Item = &Test> {
        self.tests.values().map(Arc::as_ref)
    }

    /// Global metrics
    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub(crate) fn shared_metrics(&self) -> Arc<RunMetrics> {
        self.metrics.clone()
    }

    /// Frozen copy of the test table handed to worker tasks
    pub(crate) fn test_table(&self) -> Arc<HashMap<String, Arc<Test>>> {
        Arc::new(self.tests.clone())
    }

    pub(crate) fn classifier(&self) -> ErrorClassifier {
        self.classifier.clone()
    }

    /// Serializable view of global and per-test metrics
    pub fn snapshot(&self) -> ResultsSnapshot {
        let tests: BTreeMap<String, TestSnapshot> = self
            .tests
            .iter()
            .map(|(name, test)| (name.clone(), TestSnapshot::of(test)))
            .collect();

        ResultsSnapshot::new(self.metrics.snapshot(), tests)
    }
}

impl Default for Results {
    fn default() -> Self {
        Self::new()
    }
}
