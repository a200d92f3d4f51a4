//! Configuration module
//!
//! Loads the suite description from JSON or YAML and applies environment
//! overrides.

pub mod env;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub use env::EnvConfig;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid test length {value:?}: {source}")]
    InvalidTestLen {
        value: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error("Test length must be greater than zero")]
    ZeroTestLen,

    #[error("At least one worker is required")]
    NoWorkers,

    #[error("No targets configured")]
    NoTargets,
}

/// Description of a suite: what to probe and how long or how often
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Input {
    /// Addresses to probe (`host:port`, `tcp://host:port`, `http(s)://...`)
    #[serde(alias = "clients")]
    pub targets: Vec<String>,

    /// Key server address, probed with a TCP connect when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyserver: Option<String>,

    /// Host header for HTTP probes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Accept invalid TLS certificates on HTTPS probes
    pub insecure_skip_verify: bool,

    /// Soak run length, e.g. "30s", "5m", "1h 30m"
    pub testlen: String,

    /// Worker tasks for soak runs, and per test for benchmarks
    pub workers: usize,

    /// Invocations per worker in benchmark runs
    pub repeats: usize,

    /// Per-probe timeout in seconds
    pub timeout_secs: u64,
}

impl Default for Input {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            keyserver: None,
            domain: None,
            insecure_skip_verify: false,
            testlen: "30s".to_string(),
            workers: 4,
            repeats: 100,
            timeout_secs: 10,
        }
    }
}

impl Input {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let input: Self = if is_yaml(path) {
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?
        } else {
            serde_json::from_str(&content).context("Failed to parse JSON config")?
        };

        Ok(input)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml(path) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// A small suite used by `config init`
    pub fn example() -> Self {
        Self {
            targets: vec![
                "127.0.0.1:3407".to_string(),
                "https://localhost:8443/health".to_string(),
            ],
            keyserver: Some("127.0.0.1:3407".to_string()),
            domain: Some("localhost".to_string()),
            insecure_skip_verify: true,
            ..Default::default()
        }
    }

    /// Parsed soak run length
    pub fn test_len(&self) -> Result<Duration, ConfigError> {
        let len = humantime::parse_duration(self.testlen.trim()).map_err(|source| {
            ConfigError::InvalidTestLen {
                value: self.testlen.clone(),
                source,
            }
        })?;

        if len.is_zero() {
            return Err(ConfigError::ZeroTestLen);
        }
        Ok(len)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Overlay values set in the environment
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(testlen) = &env.testlen {
            self.testlen = testlen.clone();
        }
        if let Some(workers) = env.workers {
            self.workers = workers;
        }
        if let Some(repeats) = env.repeats {
            self.repeats = repeats;
        }
        if let Some(timeout) = env.timeout {
            self.timeout_secs = timeout;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.test_len()?;
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.targets.is_empty() && self.keyserver.is_none() {
            return Err(ConfigError::NoTargets);
        }
        Ok(())
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_input() {
        let input = Input::default();
        assert_eq!(input.workers, 4);
        assert_eq!(input.test_len().unwrap(), Duration::from_secs(30));
        assert_eq!(input.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_test_len_parsing() {
        let mut input = Input {
            testlen: "1h 30m".to_string(),
            ..Default::default()
        };
        assert_eq!(input.test_len().unwrap(), Duration::from_secs(5400));

        input.testlen = "soon".to_string();
        assert!(matches!(
            input.test_len(),
            Err(ConfigError::InvalidTestLen { .. })
        ));

        input.testlen = "0s".to_string();
        assert!(matches!(input.test_len(), Err(ConfigError::ZeroTestLen)));
    }

    #[test]
    fn test_validate() {
        assert!(Input::example().validate().is_ok());
        assert!(matches!(
            Input::default().validate(),
            Err(ConfigError::NoTargets)
        ));

        let no_workers = Input {
            workers: 0,
            ..Input::example()
        };
        assert!(matches!(no_workers.validate(), Err(ConfigError::NoWorkers)));
    }

    #[test]
    fn test_save_load_yaml_and_json() {
        let dir = tempdir().unwrap();
        let input = Input::example();

        for file in ["suite.yaml", "suite.json"] {
            let path = dir.path().join(file);
            input.save(&path).unwrap();
            assert_eq!(Input::load(&path).unwrap(), input);
        }
    }

    #[test]
    fn test_clients_alias_and_defaults() {
        let input: Input =
            serde_json::from_str(r#"{"clients": ["10.0.0.1:443"], "workers": 8}"#).unwrap();
        assert_eq!(input.targets, vec!["10.0.0.1:443"]);
        assert_eq!(input.workers, 8);
        assert_eq!(input.testlen, "30s");
    }

    #[test]
    fn test_apply_env() {
        let mut input = Input::default();
        let env = EnvConfig {
            testlen: Some("2m".to_string()),
            workers: Some(16),
            ..Default::default()
        };
        input.apply_env(&env);

        assert_eq!(input.test_len().unwrap(), Duration::from_secs(120));
        assert_eq!(input.workers, 16);
        assert_eq!(input.repeats, 100);
    }
}
