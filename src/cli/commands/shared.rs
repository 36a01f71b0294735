//! Shared components for CLI commands
//!
//! Logging initialisation and the human-readable rendering of run reports,
//! previews and diffs.

use crate::inspect::{DiffResult, PreviewResult};
use crate::models::RunStatus;
use crate::pipeline::RunReport;
use colored::*;
use indicatif::HumanDuration;
use std::time::Duration;
use tracing::debug;

/// Set up structured logging to stderr
///
/// `RUST_LOG` takes precedence over the level derived from `-v`/`-q`.
pub fn setup_logging(log_level: &str, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("csv_sanitizer={}", log_level)));

    let result = if quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    // A subscriber may already be installed when embedded or under test
    if result.is_ok() {
        debug!("Logging initialized at level: {}", log_level);
    }
}

fn status_label(status: RunStatus) -> ColoredString {
    let label = status.to_string();
    match status {
        RunStatus::Completed => label.bright_green().bold(),
        RunStatus::Stopped => label.bright_yellow().bold(),
        _ => label.bright_red().bold(),
    }
}

/// Print the end-of-run summary
pub fn print_run_report(report: &RunReport) {
    let duration = HumanDuration(Duration::from_millis(report.duration_ms));

    println!();
    println!("{} {}", "Sanitization".bright_cyan().bold(), status_label(report.status));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  {} {}", "Source:".bright_cyan(), report.source);
    println!("  {} {}", "Destination:".bright_cyan(), report.destination);
    println!("  {} {}", "Rules:".bright_cyan(), report.rules_applied);
    if let Some(line) = report.resumed_from_line {
        println!("  {} after row {}", "Resumed:".bright_cyan(), line);
    }
    println!("  • Rows read: {}", report.rows_read);
    println!(
        "  • Rows written: {}",
        report.rows_written.to_string().bright_white().bold()
    );
    println!("  • Fields sanitized: {}", report.fields_sanitized);
    println!(
        "  • Rows skipped: {} (read {}, process {}, write {})",
        report.rows_skipped(),
        report.skips.read,
        report.skips.process,
        report.skips.write
    );
    println!(
        "  • Processing time: {} ({:.0} rows/sec)",
        duration, report.rows_per_second
    );

    if !report.failure_messages.is_empty() && report.status != RunStatus::Completed {
        println!("\n{}", "Failures:".bright_red());
        for message in report.failure_messages.iter().rev().take(5) {
            println!("  • {}", message);
        }
    }
    println!();
}

/// Print a preview as an aligned table
pub fn print_preview(preview: &PreviewResult) {
    println!(
        "{} {} ({} bytes, {} rows)",
        "Preview of".bright_cyan(),
        preview.file_name.bold(),
        preview.file_size,
        preview.total_rows
    );
    if preview.headers.is_empty() {
        println!("  (empty file)");
        return;
    }

    let widths = column_widths(&preview.headers, &preview.rows);
    println!("{}", format_row(&preview.headers, &widths).bold());
    for row in &preview.rows {
        println!("{}", format_row(row, &widths));
    }
    if (preview.rows.len() as u64) < preview.total_rows {
        println!(
            "  ... {} more rows",
            preview.total_rows - preview.rows.len() as u64
        );
    }
}

/// Print changed cells grouped by row, then per-column totals
pub fn print_diff(diff: &DiffResult) {
    println!(
        "{} {} rows compared, {} changed cells in {} rows",
        "Diff:".bright_cyan().bold(),
        diff.rows_compared,
        diff.total_changes,
        diff.rows.len()
    );
    for row in &diff.rows {
        println!("\n  {} {}", "Row".bright_white(), row.row_number);
        for cell in row.changed_cells() {
            println!(
                "    {}: {} -> {}",
                cell.column.bold(),
                cell.original.red(),
                cell.sanitized.green()
            );
        }
    }
    if !diff.changes_by_column.is_empty() {
        println!("\n{}", "Changes by column:".bright_cyan());
        for (column, count) in &diff.changes_by_column {
            println!("  • {}: {}", column, count);
        }
    }
}

fn column_widths(headers: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (index, value) in row.iter().enumerate().take(widths.len()) {
            widths[index] = widths[index].max(value.chars().count());
        }
    }
    widths
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    widths
        .iter()
        .enumerate()
        .map(|(index, width)| {
            let value = values.get(index).map(String::as_str).unwrap_or("");
            format!("{:<width$}", value, width = *width)
        })
        .collect::<Vec<_>>()
        .join(" | ")
}
