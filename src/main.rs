//! soak-runner - concurrent soak-test and benchmark orchestration
//!
//! Registers a suite of test functions and runs them either for a fixed
//! duration on a shared worker pool or a fixed number of times per worker,
//! collecting success/failure counts, latency distributions and error causes
//! per test and globally.
//!
//! ## Usage
//!
//! ```bash
//! # Write an example suite
//! soak-runner config init suite.yaml
//!
//! # Soak for five minutes with 16 workers
//! soak-runner run --config suite.yaml --duration 5m --workers 16
//!
//! # Run every test 1000 times on each of 4 workers
//! soak-runner bench --config suite.yaml --repeats 1000 --workers 4 --format json
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

mod cli;
mod config;
mod executor;
mod metrics;
mod output;
mod probes;
mod results;
mod utils;

use cli::Args;
use config::{EnvConfig, Input};
use output::{OutputFormat, ResultFormatter};
use results::Results;
use utils::LogLevel;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let env = EnvConfig::load();

    let level = args
        .log_level
        .or_else(|| env.log.as_deref().and_then(|l| l.parse().ok()))
        .unwrap_or(if args.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Info
        });
    utils::init_logger(level);

    match args.command {
        cli::Command::Run(run_args) => run_soak(run_args, &env).await?,
        cli::Command::Bench(bench_args) => run_bench(bench_args, &env).await?,
        cli::Command::Config(config_args) => manage_config(config_args, &env)?,
    }

    Ok(())
}

/// Load the suite file (CLI path first, then SOAK_RUNNER_CONFIG) and apply
/// environment overrides
fn load_input(path: Option<&str>, env: &EnvConfig) -> Result<Input> {
    let mut input = match path.or(env.config_file.as_deref()) {
        Some(path) => Input::load(path)?,
        None => Input::default(),
    };
    input.apply_env(env);
    Ok(input)
}

fn build_results(input: &Input) -> Result<Results> {
    input.validate().context("Invalid suite configuration")?;

    let mut results = Results::new();
    let registered = probes::register_suite(&mut results, input)?;
    info!("Registered {} tests", registered);
    Ok(results)
}

fn report(results: &Results, suite: &cli::SuiteArgs, env: &EnvConfig) -> Result<()> {
    let format_name = suite
        .format
        .as_deref()
        .or(env.format.as_deref())
        .unwrap_or("table");
    let format = OutputFormat::from_str(format_name)
        .ok_or_else(|| anyhow::anyhow!("Unknown output format: {format_name}"))?;

    let snapshot = results.snapshot();
    println!("{}", ResultFormatter::new(format).format_snapshot(&snapshot)?);

    if let Some(path) = &suite.output {
        output::write_results_to_file(path, &snapshot, format)?;
        println!("Results saved to: {path}");
    }

    Ok(())
}

async fn run_soak(args: cli::RunArgs, env: &EnvConfig) -> Result<()> {
    let mut input = load_input(args.suite.config.as_deref(), env)?;
    if let Some(duration) = args.duration {
        input.testlen = duration;
    }
    if let Some(workers) = args.workers {
        input.workers = workers;
    }

    let results = build_results(&input)?;
    let summary = results.run_tests(input.test_len()?, input.workers).await?;
    println!("{summary}");

    report(&results, &args.suite, env)
}

async fn run_bench(args: cli::BenchArgs, env: &EnvConfig) -> Result<()> {
    let mut input = load_input(args.suite.config.as_deref(), env)?;
    if let Some(repeats) = args.repeats {
        input.repeats = repeats;
    }
    if let Some(workers) = args.workers {
        input.workers = workers;
    }

    let results = build_results(&input)?;
    let summary = results
        .run_benchmark_tests(input.repeats, input.workers)
        .await;
    println!("{summary}");

    report(&results, &args.suite, env)
}

fn manage_config(args: cli::ConfigArgs, env: &EnvConfig) -> Result<()> {
    match args.action {
        cli::ConfigAction::Init { path } => {
            Input::example().save(&path)?;
            println!("Example configuration written to: {path}");
        }
        cli::ConfigAction::Show { config } => {
            let input = load_input(config.as_deref(), env)?;
            println!("{}", serde_yaml::to_string(&input)?);
            if env.has_any() {
                env.print_summary();
            }
            if let Err(e) = input.validate() {
                println!("Warning: {e}");
            }
        }
    }

    Ok(())
}
