//! Named metric registry with get-or-create lookup

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

use super::metric::{Counter, Metric, MetricKind, Timer};

/// Registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("metric {name:?} is already registered as a {existing}, not a {requested}")]
    KindMismatch {
        name: String,
        existing: MetricKind,
        requested: MetricKind,
    },
}

/// Thread-safe mapping from metric name to metric
#[derive(Debug, Default)]
pub struct Registry {
    metrics: RwLock<HashMap<String, Metric>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the counter registered under `name`, creating it if absent
    pub fn counter(&self, name: &str) -> Result<Arc<Counter>, RegistryError> {
        match self.get_or_register(name, || Metric::Counter(Arc::new(Counter::new())))? {
            Metric::Counter(counter) => Ok(counter),
            other => Err(mismatch(name, other.kind(), MetricKind::Counter)),
        }
    }

    /// Get the timer registered under `name`, creating it if absent
    pub fn timer(&self, name: &str) -> Result<Arc<Timer>, RegistryError> {
        match self.get_or_register(name, || Metric::Timer(Arc::new(Timer::new())))? {
            Metric::Timer(timer) => Ok(timer),
            other => Err(mismatch(name, other.kind(), MetricKind::Timer)),
        }
    }

    fn get_or_register(
        &self,
        name: &str,
        create: impl FnOnce() -> Metric,
    ) -> Result<Metric, RegistryError> {
        if let Some(metric) = self.get(name) {
            return Ok(metric);
        }

        let mut metrics = self.metrics.write().unwrap_or_else(PoisonError::into_inner);
        Ok(metrics.entry(name.to_string()).or_insert_with(create).clone())
    }

    pub fn get(&self, name: &str) -> Option<Metric> {
        self.metrics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// All registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .metrics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Visit every registered metric in name order
    pub fn each(&self, mut f: impl FnMut(&str, &Metric)) {
        let metrics = self.metrics.read().unwrap_or_else(PoisonError::into_inner);
        let mut entries: Vec<_> = metrics.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        for (name, metric) in entries {
            f(name, metric);
        }
    }

    pub fn len(&self) -> usize {
        self.metrics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: Into<String>> FromIterator<(S, Metric)> for Registry {
    fn from_iter<I: IntoIterator<Item = (S, Metric)>>(iter: I) -> Self {
        Self {
            metrics: RwLock::new(iter.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }
}

fn mismatch(name: &str, existing: MetricKind, requested: MetricKind) -> RegistryError {
    RegistryError::KindMismatch {
        name: name.to_string(),
        existing,
        requested,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_returns_same_counter() {
        let registry = Registry::new();
        let first = registry.counter("hits").unwrap();
        first.inc(3);

        let second = registry.counter("hits").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.count(), 3);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_kind_mismatch() {
        let registry = Registry::new();
        registry.timer("latency").unwrap();

        let err = registry.counter("latency").unwrap_err();
        assert_eq!(
            err,
            RegistryError::KindMismatch {
                name: "latency".to_string(),
                existing: MetricKind::Timer,
                requested: MetricKind::Counter,
            }
        );
        assert!(err.to_string().contains("already registered as a timer"));
    }

    #[test]
    fn test_names_and_each_are_sorted() {
        let registry = Registry::new();
        registry.counter("zeta").unwrap();
        registry.timer("alpha").unwrap();
        registry.counter("mu").unwrap();

        assert_eq!(registry.names(), vec!["alpha", "mu", "zeta"]);

        let mut visited = Vec::new();
        registry.each(|name, metric| visited.push((name.to_string(), metric.kind())));
        assert_eq!(
            visited,
            vec![
                ("alpha".to_string(), MetricKind::Timer),
                ("mu".to_string(), MetricKind::Counter),
                ("zeta".to_string(), MetricKind::Counter),
            ]
        );
    }

    #[test]
    fn test_from_iter() {
        let counter = Arc::new(Counter::new());
        let registry: Registry = [("success", Metric::from(counter.clone()))]
            .into_iter()
            .collect();

        counter.inc(2);
        assert_eq!(registry.counter("success").unwrap().count(), 2);
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_concurrent_get_or_create() {
        let registry = Arc::new(Registry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        registry.counter("boom").unwrap().inc(1);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.counter("boom").unwrap().count(), 800);
        assert_eq!(registry.len(), 1);
    }
}
