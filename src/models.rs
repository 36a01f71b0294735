//! Core data structures for sanitization runs.
//!
//! Defines the record representation, the checkpoint exchanged between the
//! runner and its reader/writer, skip bookkeeping, and run status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One data row of the source file
///
/// Column order follows the source header exactly. The line number is the
/// 1-based position among data lines (the header row is not counted, blank
/// lines are).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    line_number: u64,
    fields: Vec<(String, String)>,
}

impl Record {
    /// Create an empty record for the given data line
    pub fn new(line_number: u64) -> Self {
        Self {
            line_number,
            fields: Vec::new(),
        }
    }

    /// Create an empty record with room for `columns` fields
    pub fn with_capacity(line_number: u64, columns: usize) -> Self {
        Self {
            line_number,
            fields: Vec::with_capacity(columns),
        }
    }

    /// Build a record from `(column, value)` pairs
    pub fn from_pairs<I, K, V>(line_number: u64, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut record = Self::new(line_number);
        for (column, value) in pairs {
            record.insert(column, value);
        }
        record
    }

    /// 1-based data line this record was read from
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Set a column value; an existing column keeps its position
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Append a column without checking for an existing one
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.push((column.into(), value.into()));
    }

    /// Values in column order
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, value)| value.as_str())
    }

    /// Value of a column, if present
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// Whether the record carries the column
    pub fn has_column(&self, column: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == column)
    }

    /// Iterate `(column, value)` pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Column names in order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Durable progress marker for a run
///
/// `lines_consumed` counts every data row the reader has consumed, including
/// rows that were skipped. `header_written` selects append mode on restart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineCheckpoint {
    pub lines_consumed: u64,
    pub header_written: bool,
}

impl PipelineCheckpoint {
    pub fn new(lines_consumed: u64, header_written: bool) -> Self {
        Self {
            lines_consumed,
            header_written,
        }
    }
}

/// Writer-side slice of the checkpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterState {
    pub header_written: bool,
}

/// Pipeline stage a skipped failure occurred in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipCategory {
    Read,
    Process,
    Write,
}

impl fmt::Display for SkipCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipCategory::Read => write!(f, "read"),
            SkipCategory::Process => write!(f, "process"),
            SkipCategory::Write => write!(f, "write"),
        }
    }
}

/// Per-run failure counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipCounters {
    pub read: u64,
    pub process: u64,
    pub write: u64,
}

impl SkipCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one failure in the given category
    pub fn increment(&mut self, category: SkipCategory) {
        match category {
            SkipCategory::Read => self.read += 1,
            SkipCategory::Process => self.process += 1,
            SkipCategory::Write => self.write += 1,
        }
    }

    pub fn get(&self, category: SkipCategory) -> u64 {
        match category {
            SkipCategory::Read => self.read,
            SkipCategory::Process => self.process,
            SkipCategory::Write => self.write,
        }
    }

    pub fn total(&self) -> u64 {
        self.read + self.process + self.write
    }
}

/// Lifecycle state of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Idle,
    Running,
    Completed,
    Failed,
    Stopped,
}

impl RunStatus {
    /// Whether the run has reached a final state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Stopped
        )
    }

    /// Whether a later run may resume from this run's checkpoint
    pub fn is_restartable(&self) -> bool {
        matches!(self, RunStatus::Failed | RunStatus::Stopped)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunStatus::Idle => "IDLE",
            RunStatus::Running => "RUNNING",
            RunStatus::Completed => "COMPLETED",
            RunStatus::Failed => "FAILED",
            RunStatus::Stopped => "STOPPED",
        };
        write!(f, "{}", label)
    }
}
