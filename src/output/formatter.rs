//! Output formatters for run results
//!
//! Provides table, JSON, CSV and summary renderings of a results snapshot.

use anyhow::{Context, Result};
use std::path::Path;

use crate::results::{MetricsSnapshot, ResultsSnapshot, TestSnapshot};

/// Error causes shown per test in table output
const TOP_ERRORS: usize = 5;

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    /// Render a whole snapshot
    pub fn format_snapshot(&self, snapshot: &ResultsSnapshot) -> Result<String> {
        match self.format {
            OutputFormat::Table => Ok(self.format_table(snapshot)),
            OutputFormat::Json => {
                serde_json::to_string(snapshot).context("Failed to serialize results")
            }
            OutputFormat::JsonPretty => {
                serde_json::to_string_pretty(snapshot).context("Failed to serialize results")
            }
            OutputFormat::Csv => format_csv(snapshot),
            OutputFormat::Summary => Ok(self.format_brief(snapshot)),
        }
    }

    fn format_table(&self, snapshot: &ResultsSnapshot) -> String {
        let mut output = String::new();

        output.push_str(
            "\n┌──────────────────────────────┬──────────┬──────────┬──────────┬──────────┬──────────┬──────────┐\n",
        );
        output.push_str(
            "│ Test                         │     Pass │     Fail │  Success │ mean(ms) │  p95(ms) │  p99(ms) │\n",
        );
        output.push_str(
            "├──────────────────────────────┼──────────┼──────────┼──────────┼──────────┼──────────┼──────────┤\n",
        );

        for (name, test) in &snapshot.tests {
            output.push_str(&self.format_row(name, &test.metrics));
        }

        output.push_str(
            "├──────────────────────────────┼──────────┼──────────┼──────────┼──────────┼──────────┼──────────┤\n",
        );
        output.push_str(&self.format_row("TOTAL", &snapshot.global));
        output.push_str(
            "└──────────────────────────────┴──────────┴──────────┴──────────┴──────────┴──────────┴──────────┘\n",
        );

        let failing: Vec<(&String, &TestSnapshot)> = snapshot
            .tests
            .iter()
            .filter(|(_, t)| !t.errors.is_empty())
            .collect();
        if !failing.is_empty() {
            output.push_str("\n Top error causes:\n");
            for (name, test) in failing {
                output.push_str(&format!(" {name}\n"));
                for (cause, count) in test.top_errors(TOP_ERRORS) {
                    output.push_str(&format!("   {count:>8}  {cause}\n"));
                }
            }
        }

        output
    }

    fn format_row(&self, name: &str, metrics: &MetricsSnapshot) -> String {
        let rate = metrics.success_rate();
        let rate_str = format!("{rate:>7.1}%");
        let rate_colored = if !self.colorize || metrics.invocations() == 0 {
            rate_str
        } else if rate >= 99.0 {
            format!("\x1b[32m{rate_str}\x1b[0m")
        } else if rate >= 90.0 {
            format!("\x1b[33m{rate_str}\x1b[0m")
        } else {
            format!("\x1b[31m{rate_str}\x1b[0m")
        };

        format!(
            "│ {:28} │ {:>8} │ {:>8} │ {} │ {:>8.2} │ {:>8.2} │ {:>8.2} │\n",
            truncate(name, 28),
            metrics.success,
            metrics.failure,
            rate_colored,
            metrics.latency.mean,
            metrics.latency.percentiles.p95,
            metrics.latency.percentiles.p99
        )
    }

    fn format_brief(&self, snapshot: &ResultsSnapshot) -> String {
        let mut output = String::new();
        for (name, test) in &snapshot.tests {
            output.push_str(&format!(
                "{}: {}/{} passed ({:.1}%) {}\n",
                name,
                test.metrics.success,
                test.metrics.invocations(),
                test.metrics.success_rate(),
                test.metrics.latency.format_summary()
            ));
        }
        output.push_str(&format!(
            "Total: {}/{} passed ({:.1}%)",
            snapshot.global.success,
            snapshot.global.invocations(),
            snapshot.global.success_rate()
        ));
        output
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Table)
    }
}

fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        name.to_string()
    } else {
        let head: String = name.chars().take(width - 1).collect();
        format!("{head}…")
    }
}

fn format_csv(snapshot: &ResultsSnapshot) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "test",
        "success",
        "failure",
        "success_rate",
        "mean_ms",
        "p50_ms",
        "p95_ms",
        "p99_ms",
        "max_ms",
        "top_error",
    ])?;

    let rows = snapshot
        .tests
        .iter()
        .map(|(name, test)| (name.as_str(), &test.metrics, test.top_errors(1).first().map(|e| e.0)))
        .chain(std::iter::once(("TOTAL", &snapshot.global, None)));

    for (name, metrics, top_error) in rows {
        writer.write_record([
            name.to_string(),
            metrics.success.to_string(),
            metrics.failure.to_string(),
            format!("{:.2}", metrics.success_rate()),
            format!("{:.3}", metrics.latency.mean),
            format!("{:.3}", metrics.latency.percentiles.p50),
            format!("{:.3}", metrics.latency.percentiles.p95),
            format!("{:.3}", metrics.latency.percentiles.p99),
            format!("{:.3}", metrics.latency.max),
            top_error.unwrap_or_default().to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {e}"))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

/// Write a rendered snapshot to a file
pub fn write_results_to_file(
    path: impl AsRef<Path>,
    snapshot: &ResultsSnapshot,
    format: OutputFormat,
) -> Result<()> {
    let path = path.as_ref();
    let content = ResultFormatter::new(format)
        .no_color()
        .format_snapshot(snapshot)?;

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write results to {}", path.display()))?;
    Ok(())
}
