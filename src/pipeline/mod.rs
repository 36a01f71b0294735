//! Chunked read, sanitize and write pipeline with restart support.
//!
//! The runner pulls records from a [`RecordSource`], passes each through a
//! [`RecordTransform`] and hands surviving records to a [`RecordSink`] in
//! fixed-size chunks. A checkpoint is committed after every successful
//! chunk write so an interrupted run can resume where it stopped.
//!
//! - [`reader`] - CSV record source with resume-by-skipping
//! - [`stage`] - column-rule sanitization stage
//! - [`writer`] - CSV record sink with append-on-resume
//! - [`checkpoint`] - checkpoint persistence
//! - [`skip`] - bounded skip budget
//! - [`listener`] - run, chunk and skip hooks
//! - [`report`] - run audit report
//! - [`runner`] - the chunk loop and run state machine

pub mod checkpoint;
pub mod listener;
pub mod reader;
pub mod report;
pub mod runner;
pub mod skip;
pub mod stage;
pub mod writer;

pub use checkpoint::{CheckpointStore, FileCheckpointStore, MemoryCheckpointStore};
pub use listener::{
    ChunkProgress, LoggingListener, PipelineListener, ProgressListener, RunStart, SkipEvent,
};
pub use reader::CsvRecordReader;
pub use report::RunReport;
pub use runner::PipelineRunner;
pub use skip::SkipPolicy;
pub use stage::SanitizationStage;
pub use writer::CsvRecordWriter;

use crate::error::Result;
use crate::models::{PipelineCheckpoint, Record, WriterState};

/// Ordered source of records
pub trait RecordSource {
    /// Open the source and return its header; when resuming, the first
    /// `lines_consumed` data rows are discarded before anything is yielded
    fn open(&mut self, resume_from: Option<PipelineCheckpoint>) -> Result<Vec<String>>;

    /// Next record, `Ok(None)` at end of stream
    ///
    /// Recoverable errors (see [`crate::SanitizerError::is_recoverable`])
    /// consume their row; the source stays usable afterwards.
    fn next_record(&mut self) -> Result<Option<Record>>;

    /// Data rows consumed so far, including rows that failed to parse
    fn lines_consumed(&self) -> u64;

    fn close(&mut self);

    /// Human-readable location for logs and reports
    fn location(&self) -> String;
}

/// Per-record transformation applied between source and sink
pub trait RecordTransform {
    fn apply(&self, record: Record) -> Result<Record>;

    /// Number of configured column rules
    fn rule_count(&self) -> usize {
        0
    }

    /// Short description of the configured rules
    fn describe(&self) -> String {
        String::new()
    }

    /// Field values replaced so far
    fn fields_transformed(&self) -> u64 {
        0
    }
}

/// Destination for transformed records
pub trait RecordSink {
    /// Prepare the destination; a resumed run appends without rewriting the
    /// header
    fn open(&mut self, headers: &[String], resume: WriterState) -> Result<()>;

    /// Write and flush one chunk of records
    fn write_batch(&mut self, records: &[Record]) -> Result<()>;

    fn state(&self) -> WriterState;

    fn close(&mut self) -> Result<()>;

    /// Human-readable location for logs and reports
    fn location(&self) -> String;
}
