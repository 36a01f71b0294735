//! Run, chunk and skip hooks
//!
//! Listeners observe a run without influencing it. [`LoggingListener`]
//! writes the progress and audit trail through `tracing`;
//! [`ProgressListener`] drives an interactive spinner.

use super::report::RunReport;
use crate::constants::PROGRESS_LOG_INTERVAL_ROWS;
use crate::models::{RunStatus, SkipCategory};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Announced once, after source and destination are open
#[derive(Debug, Clone, PartialEq)]
pub struct RunStart {
    pub source: String,
    pub destination: String,
    pub rule_count: usize,
    pub rules: String,
    pub chunk_size: usize,
    pub skip_limit: u64,
    pub resumed_from_line: Option<u64>,
}

/// Running totals after a committed chunk
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkProgress {
    /// 1-based chunk index within this run
    pub chunk: u64,
    pub rows_read: u64,
    pub rows_written: u64,
    pub rows_skipped: u64,
    pub elapsed: Duration,
    pub rows_per_second: f64,
}

/// A recoverable failure counted against the skip budget
#[derive(Debug, Clone, PartialEq)]
pub struct SkipEvent {
    pub category: SkipCategory,
    pub line: u64,
    pub message: String,
}

/// Observer of a pipeline run; every hook defaults to a no-op
pub trait PipelineListener: Send {
    fn on_run_start(&mut self, _start: &RunStart) {}

    fn before_chunk(&mut self, _chunk: u64) {}

    fn after_chunk(&mut self, _progress: &ChunkProgress) {}

    fn on_skip(&mut self, _event: &SkipEvent) {}

    fn on_run_end(&mut self, _report: &RunReport) {}
}

/// Structured log output for runs, chunks and skips
#[derive(Debug, Default)]
pub struct LoggingListener {
    last_logged_rows: u64,
}

impl LoggingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every chunk is logged while the run is small, then once per
    /// progress interval
    fn should_log(&self, rows: u64) -> bool {
        rows < 1000
            || rows / PROGRESS_LOG_INTERVAL_ROWS > self.last_logged_rows / PROGRESS_LOG_INTERVAL_ROWS
    }
}

impl PipelineListener for LoggingListener {
    fn on_run_start(&mut self, start: &RunStart) {
        info!(
            "Sanitization started: {} -> {} ({} rules: {})",
            start.source, start.destination, start.rule_count, start.rules
        );
        if let Some(line) = start.resumed_from_line {
            info!("Restarting after {} consumed rows", line);
        }
        debug!(
            "chunk_size={} skip_limit={}",
            start.chunk_size, start.skip_limit
        );
    }

    fn before_chunk(&mut self, chunk: u64) {
        debug!("Starting chunk {}", chunk);
    }

    fn after_chunk(&mut self, progress: &ChunkProgress) {
        if self.should_log(progress.rows_read) {
            info!(
                "Processed {} rows ({} written, {} skipped) - {:.0} rows/sec",
                progress.rows_read,
                progress.rows_written,
                progress.rows_skipped,
                progress.rows_per_second
            );
            self.last_logged_rows = progress.rows_read;
        } else {
            debug!(
                "Chunk {} committed, {} rows written",
                progress.chunk, progress.rows_written
            );
        }
    }

    fn on_skip(&mut self, event: &SkipEvent) {
        warn!(
            "Skipped {} failure at line {}: {}",
            event.category, event.line, event.message
        );
    }

    fn on_run_end(&mut self, report: &RunReport) {
        match report.status {
            RunStatus::Completed => info!(
                "Sanitization completed: {} rows written, {} skipped in {}ms ({:.1} rows/sec)",
                report.rows_written,
                report.rows_skipped(),
                report.duration_ms,
                report.rows_per_second
            ),
            RunStatus::Stopped => warn!(
                "Sanitization stopped after {} consumed rows; restart to continue",
                report.lines_consumed
            ),
            _ => error!(
                "Sanitization {}: {} rows written, {} skipped; {}",
                report.status,
                report.rows_written,
                report.rows_skipped(),
                report
                    .failure_messages
                    .last()
                    .map(String::as_str)
                    .unwrap_or("no failure message")
            ),
        }
    }
}

/// Spinner showing rows written and throughput
pub struct ProgressListener {
    progress_bar: ProgressBar,
}

impl ProgressListener {
    pub fn new() -> Self {
        let progress_bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} rows written | {msg}")
        {
            progress_bar.set_style(style);
        }
        progress_bar.enable_steady_tick(Duration::from_millis(120));
        Self { progress_bar }
    }

    /// Listener that renders nothing
    pub fn hidden() -> Self {
        Self {
            progress_bar: ProgressBar::hidden(),
        }
    }

    pub fn position(&self) -> u64 {
        self.progress_bar.position()
    }
}

impl Default for ProgressListener {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineListener for ProgressListener {
    fn on_run_start(&mut self, start: &RunStart) {
        self.progress_bar.set_message(format!("Sanitizing {}", start.source));
    }

    fn after_chunk(&mut self, progress: &ChunkProgress) {
        self.progress_bar.set_position(progress.rows_written);
        self.progress_bar.set_message(format!(
            "{} skipped | {:.0} rows/sec",
            progress.rows_skipped, progress.rows_per_second
        ));
    }

    fn on_run_end(&mut self, report: &RunReport) {
        self.progress_bar.set_position(report.rows_written);
        self.progress_bar
            .finish_with_message(format!("{} ({} skipped)", report.status, report.rows_skipped()));
    }
}
