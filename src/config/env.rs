//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "SOAK_RUNNER";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvConfig {
    /// Config file from SOAK_RUNNER_CONFIG
    pub config_file: Option<String>,
    /// Soak run length from SOAK_RUNNER_TESTLEN
    pub testlen: Option<String>,
    /// Worker count from SOAK_RUNNER_WORKERS
    pub workers: Option<usize>,
    /// Benchmark repeats from SOAK_RUNNER_REPEATS
    pub repeats: Option<usize>,
    /// Probe timeout from SOAK_RUNNER_TIMEOUT
    pub timeout: Option<u64>,
    /// Log level from SOAK_RUNNER_LOG
    pub log: Option<String>,
    /// Output format from SOAK_RUNNER_FORMAT
    pub format: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            config_file: get_env("CONFIG"),
            testlen: get_env("TESTLEN"),
            workers: get_env_parse("WORKERS"),
            repeats: get_env_parse("REPEATS"),
            timeout: get_env_parse("TIMEOUT"),
            log: get_env("LOG"),
            format: get_env("FORMAT"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self != &Self::default()
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {}_CONFIG:   {:?}", ENV_PREFIX, self.config_file);
        println!("  {}_TESTLEN:  {:?}", ENV_PREFIX, self.testlen);
        println!("  {}_WORKERS:  {:?}", ENV_PREFIX, self.workers);
        println!("  {}_REPEATS:  {:?}", ENV_PREFIX, self.repeats);
        println!("  {}_TIMEOUT:  {:?}", ENV_PREFIX, self.timeout);
        println!("  {}_LOG:      {:?}", ENV_PREFIX, self.log);
        println!("  {}_FORMAT:   {:?}", ENV_PREFIX, self.format);
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}"))
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.trim().parse().ok())
}
