// file: src/utils/logging.rs
// description: Tracing subscriber initialization and coloured console output

use crate::models::{RunReport, RunSummary};
use colored::*;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// `RUST_LOG` wins over the verbosity flag when set.
pub fn init_logger(colored_output: bool, verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose)
        .compact()
        .with_ansi(colored_output);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

pub fn format_success(msg: &str) -> String {
    format!("{} {}", "✓".green().bold(), msg.green())
}

pub fn format_error(msg: &str) -> String {
    format!("{} {}", "✗".red().bold(), msg.red())
}

pub fn format_warning(msg: &str) -> String {
    format!("{} {}", "⚠".yellow().bold(), msg.yellow())
}

pub fn format_info(msg: &str) -> String {
    format!("{} {}", "ℹ".blue().bold(), msg)
}

/// Result block shown after a run.
pub fn format_summary(report: &RunReport) -> String {
    let summary: &RunSummary = &report.summary;
    let headline = if report.is_cancelled() {
        format_warning("CANCELLED")
    } else {
        format_success("DONE!")
    };

    let missing = summary.total_missing.to_string();
    let missing = if summary.total_missing > 0 {
        missing.red().bold().to_string()
    } else {
        missing.green().to_string()
    };

    format!(
        "{}\nTime elapsed: {}\nFilepaths checked: {} ({:.1}/s)\nFiles found: {}\nMissing files: {} ({:.1}%)\nLog file: {}",
        headline,
        summary.elapsed_hms(),
        summary.total_checked,
        summary.paths_per_second(),
        summary.total_found(),
        missing,
        summary.missing_rate(),
        summary.log_location.display()
    )
}
