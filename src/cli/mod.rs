//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};

use crate::utils::LogLevel;

/// Concurrent soak-test and benchmark runner
#[derive(Parser, Debug)]
#[command(name = "soak-runner")]
#[command(version)]
#[command(about = "Run a suite of probes for a fixed duration or repeat count")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<LogLevel>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every test repeatedly until the run length elapses
    Run(RunArgs),

    /// Run every test a fixed number of times per worker
    Bench(BenchArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Options shared by run and bench
#[derive(Parser, Debug)]
pub struct SuiteArgs {
    /// Suite configuration file (JSON or YAML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output format (table, json, json-pretty, csv, summary)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Save results to file
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub suite: SuiteArgs,

    /// Run length, e.g. 30s, 5m, 1h
    #[arg(short, long)]
    pub duration: Option<String>,

    /// Number of worker tasks
    #[arg(short, long)]
    pub workers: Option<usize>,
}

/// Arguments for bench command
#[derive(Parser, Debug)]
pub struct BenchArgs {
    #[command(flatten)]
    pub suite: SuiteArgs,

    /// Invocations per worker
    #[arg(short, long)]
    pub repeats: Option<usize>,

    /// Worker tasks per test
    #[arg(short, long)]
    pub workers: Option<usize>,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write an example suite configuration
    Init {
        /// Destination path (.json, .yaml or .yml)
        #[arg(default_value = "suite.yaml")]
        path: String,
    },

    /// Show the effective configuration
    Show {
        /// Suite configuration file
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args() {
        let args = Args::parse_from([
            "soak-runner",
            "run",
            "--config",
            "suite.yaml",
            "--duration",
            "5m",
            "--workers",
            "16",
        ]);
        match args.command {
            Command::Run(run) => {
                assert_eq!(run.suite.config.as_deref(), Some("suite.yaml"));
                assert_eq!(run.duration.as_deref(), Some("5m"));
                assert_eq!(run.workers, Some(16));
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_bench_args() {
        let args = Args::parse_from([
            "soak-runner",
            "--log-level",
            "debug",
            "bench",
            "-r",
            "5",
            "-w",
            "2",
            "--format",
            "json",
        ]);
        assert_eq!(args.log_level, Some(LogLevel::Debug));
        match args.command {
            Command::Bench(bench) => {
                assert_eq!(bench.repeats, Some(5));
                assert_eq!(bench.workers, Some(2));
                assert_eq!(bench.suite.format.as_deref(), Some("json"));
            }
            _ => panic!("Expected Bench command"),
        }
    }

    #[test]
    fn test_config_init_default_path() {
        let args = Args::parse_from(["soak-runner", "config", "init"]);
        match args.command {
            Command::Config(ConfigArgs {
                action: ConfigAction::Init { path },
            }) => assert_eq!(path, "suite.yaml"),
            _ => panic!("Expected Config Init command"),
        }
    }
}
