//! Chunked pipeline runner
//!
//! Drives `Idle -> Running -> {Completed | Failed | Stopped}`. Each chunk
//! reads up to `chunk_size` records, sanitizes them, writes the survivors
//! in one call and then commits a checkpoint. Recoverable failures are
//! counted against the [`SkipPolicy`]; anything else fails the run.
//! Cancellation is observed between chunks, so the in-flight chunk is always
//! written and committed before the run stops.

use super::checkpoint::{CheckpointStore, MemoryCheckpointStore};
use super::listener::{ChunkProgress, PipelineListener, RunStart, SkipEvent};
use super::reader::CsvRecordReader;
use super::report::{throughput, RunReport};
use super::skip::SkipPolicy;
use super::stage::SanitizationStage;
use super::writer::CsvRecordWriter;
use super::{RecordSink, RecordSource, RecordTransform};
use crate::config::SanitizerConfig;
use crate::constants::MAX_RETAINED_FAILURE_MESSAGES;
use crate::error::{Result, SanitizerError};
use crate::models::{PipelineCheckpoint, Record, RunStatus, SkipCounters, WriterState};
use crate::strategy::ColumnRules;
use chrono::Utc;
use std::path::Path;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Orchestrates source, transform and sink for one run
pub struct PipelineRunner<S, T, W> {
    source: S,
    transform: T,
    sink: W,
    config: SanitizerConfig,
    skip_policy: SkipPolicy,
    checkpoint_store: Box<dyn CheckpointStore>,
    listeners: Vec<Box<dyn PipelineListener>>,
    cancellation: CancellationToken,
    status: RunStatus,
    counters: SkipCounters,
    failure_messages: Vec<String>,
    rows_read: u64,
    rows_written: u64,
    last_commit: Option<PipelineCheckpoint>,
}

impl PipelineRunner<CsvRecordReader, SanitizationStage, CsvRecordWriter> {
    /// Runner over a CSV file on disk writing a sanitized CSV file
    pub fn for_files(
        input: &Path,
        output: &Path,
        rules: &ColumnRules,
        config: SanitizerConfig,
    ) -> Result<Self> {
        config.validate()?;
        if !input.exists() {
            return Err(SanitizerError::not_found(input));
        }
        let stage = SanitizationStage::new(rules, &config)?;
        let reader = CsvRecordReader::new(input, config.row_width_policy);
        let writer = CsvRecordWriter::new(output);
        Ok(Self::new(reader, stage, writer, config))
    }
}

impl<S, T, W> PipelineRunner<S, T, W>
where
    S: RecordSource,
    T: RecordTransform,
    W: RecordSink,
{
    pub fn new(source: S, transform: T, sink: W, config: SanitizerConfig) -> Self {
        let skip_policy = SkipPolicy::new(config.skip_limit);
        Self {
            source,
            transform,
            sink,
            config,
            skip_policy,
            checkpoint_store: Box::new(MemoryCheckpointStore::new()),
            listeners: Vec::new(),
            cancellation: CancellationToken::new(),
            status: RunStatus::Idle,
            counters: SkipCounters::new(),
            failure_messages: Vec::new(),
            rows_read: 0,
            rows_written: 0,
            last_commit: None,
        }
    }

    /// Persist checkpoints to `store`; a checkpoint already in the store
    /// makes the run resume from it
    pub fn with_checkpoint_store(mut self, store: impl CheckpointStore + 'static) -> Self {
        self.checkpoint_store = Box::new(store);
        self
    }

    pub fn with_listener(mut self, listener: impl PipelineListener + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    /// Token observed between chunks to request a cooperative stop
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn skip_counters(&self) -> SkipCounters {
        self.counters
    }

    /// Execute the run to a terminal state
    ///
    /// Setup failures (invalid configuration, unreadable source, unwritable
    /// destination) are returned as errors before the run starts. Once
    /// running, every outcome, including fatal failures, is reported through
    /// the returned [`RunReport`].
    pub fn run(&mut self) -> Result<RunReport> {
        if self.status != RunStatus::Idle {
            return Err(SanitizerError::configuration(format!(
                "Runner already used (status {})",
                self.status
            )));
        }
        self.config.validate()?;

        let resume = self.checkpoint_store.load()?;
        self.last_commit = resume;
        let headers = self.source.open(resume)?;
        let writer_state = WriterState {
            header_written: resume.is_some_and(|c| c.header_written),
        };
        if let Err(e) = self.sink.open(&headers, writer_state) {
            self.source.close();
            return Err(e);
        }

        let started_at = Utc::now();
        let clock = Instant::now();
        let resumed_from_line = resume
            .map(|c| c.lines_consumed)
            .filter(|lines| *lines > 0);
        self.status = RunStatus::Running;

        let start = RunStart {
            source: self.source.location(),
            destination: self.sink.location(),
            rule_count: self.transform.rule_count(),
            rules: self.transform.describe(),
            chunk_size: self.config.chunk_size,
            skip_limit: self.skip_policy.limit(),
            resumed_from_line,
        };
        for listener in &mut self.listeners {
            listener.on_run_start(&start);
        }

        self.status = match self.process_chunks(clock) {
            Ok(status) => status,
            Err(e) => {
                error!("Run aborted: {}", e);
                self.record_failure(e.to_string());
                RunStatus::Failed
            }
        };

        if let Err(e) = self.sink.close() {
            error!("Failed to close destination: {}", e);
            self.record_failure(e.to_string());
            self.status = RunStatus::Failed;
        }
        self.source.close();

        if self.status == RunStatus::Completed {
            if let Err(e) = self.checkpoint_store.clear() {
                self.record_failure(e.to_string());
                self.status = RunStatus::Failed;
            }
        }

        let duration_ms = clock.elapsed().as_millis() as u64;
        let report = RunReport {
            source: start.source,
            destination: start.destination,
            column_rule_count: start.rule_count,
            rules_applied: start.rules,
            started_at,
            finished_at: Utc::now(),
            duration_ms,
            rows_read: self.rows_read,
            rows_written: self.rows_written,
            skips: self.counters,
            rows_per_second: throughput(self.rows_written, duration_ms),
            status: self.status,
            failure_messages: self.failure_messages.clone(),
            fields_sanitized: self.transform.fields_transformed(),
            resumed_from_line,
            lines_consumed: self.source.lines_consumed(),
        };
        for listener in &mut self.listeners {
            listener.on_run_end(&report);
        }
        Ok(report)
    }

    /// The chunk loop; `Err` means a fatal failure
    fn process_chunks(&mut self, clock: Instant) -> Result<RunStatus> {
        let mut chunk = 0u64;
        loop {
            if self.cancellation.is_cancelled() {
                debug!("Stop requested after chunk {}", chunk);
                return Ok(RunStatus::Stopped);
            }

            chunk += 1;
            for listener in &mut self.listeners {
                listener.before_chunk(chunk);
            }

            let (batch, exhausted) = self.read_chunk()?;
            let batch = self.transform_chunk(batch)?;
            self.write_chunk(&batch)?;

            let elapsed = clock.elapsed();
            let progress = ChunkProgress {
                chunk,
                rows_read: self.rows_read,
                rows_written: self.rows_written,
                rows_skipped: self.counters.total(),
                elapsed,
                rows_per_second: throughput(self.rows_written, elapsed.as_millis() as u64),
            };
            for listener in &mut self.listeners {
                listener.after_chunk(&progress);
            }

            if exhausted {
                return Ok(RunStatus::Completed);
            }
        }
    }

    /// Fill a chunk; read failures are skipped and do not take a slot
    fn read_chunk(&mut self) -> Result<(Vec<Record>, bool)> {
        let mut batch = Vec::with_capacity(self.config.chunk_size);
        while batch.len() < self.config.chunk_size {
            match self.source.next_record() {
                Ok(Some(record)) => {
                    self.rows_read += 1;
                    batch.push(record);
                }
                Ok(None) => return Ok((batch, true)),
                Err(e) => self.absorb(e)?,
            }
        }
        Ok((batch, false))
    }

    fn transform_chunk(&mut self, batch: Vec<Record>) -> Result<Vec<Record>> {
        let mut sanitized = Vec::with_capacity(batch.len());
        for record in batch {
            match self.transform.apply(record) {
                Ok(record) => sanitized.push(record),
                Err(e) => self.absorb(e)?,
            }
        }
        Ok(sanitized)
    }

    /// Write the chunk and commit a checkpoint; a failed write abandons the
    /// chunk and counts one write skip
    fn write_chunk(&mut self, batch: &[Record]) -> Result<()> {
        if !batch.is_empty() {
            if let Err(e) = self.sink.write_batch(batch) {
                return self.absorb(e);
            }
            self.rows_written += batch.len() as u64;
        }

        let checkpoint = PipelineCheckpoint::new(
            self.source.lines_consumed(),
            self.sink.state().header_written,
        );
        if self.last_commit == Some(checkpoint) {
            return Ok(());
        }
        self.checkpoint_store.save(&checkpoint)?;
        self.last_commit = Some(checkpoint);
        Ok(())
    }

    /// Count a recoverable failure, or hand back a fatal one
    fn absorb(&mut self, error: SanitizerError) -> Result<()> {
        let Some(category) = error.skip_category() else {
            return Err(error);
        };
        let line = error.line().unwrap_or(0);

        self.counters.increment(category);
        let event = SkipEvent {
            category,
            line,
            message: error.to_string(),
        };
        for listener in &mut self.listeners {
            listener.on_skip(&event);
        }
        self.record_failure(event.message);

        self.skip_policy.check(&self.counters, category, line)
    }

    fn record_failure(&mut self, message: String) {
        if self.failure_messages.len() < MAX_RETAINED_FAILURE_MESSAGES {
            self.failure_messages.push(message);
        } else if let Some(last) = self.failure_messages.last_mut() {
            // Keep the most recent message, which is usually the fatal one
            *last = message;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// In-memory source yielding scripted rows and failures
    struct ScriptedSource {
        headers: Vec<String>,
        rows: Vec<std::result::Result<Vec<&'static str>, &'static str>>,
        position: usize,
    }

    impl ScriptedSource {
        fn new(rows: Vec<std::result::Result<Vec<&'static str>, &'static str>>) -> Self {
            Self {
                headers: vec!["id".to_string(), "email".to_string()],
                rows,
                position: 0,
            }
        }

        fn clean(count: usize) -> Self {
            let rows = (0..count)
                .map(|_| Ok(vec!["1", "person@example.com"]))
                .collect();
            Self::new(rows)
        }
    }

    impl RecordSource for ScriptedSource {
        fn open(&mut self, resume_from: Option<PipelineCheckpoint>) -> Result<Vec<String>> {
            self.position = resume_from.map(|c| c.lines_consumed as usize).unwrap_or(0);
            Ok(self.headers.clone())
        }

        fn next_record(&mut self) -> Result<Option<Record>> {
            let Some(row) = self.rows.get(self.position) else {
                return Ok(None);
            };
            self.position += 1;
            let line = self.position as u64;
            match row {
                Ok(values) => Ok(Some(Record::from_pairs(
                    line,
                    self.headers.iter().cloned().zip(values.iter().copied()),
                ))),
                Err(message) => Err(SanitizerError::malformed_input(line, *message, None)),
            }
        }

        fn lines_consumed(&self) -> u64 {
            self.position as u64
        }

        fn close(&mut self) {}

        fn location(&self) -> String {
            "memory://source".to_string()
        }
    }

    /// Transform failing on chosen lines
    struct FailingTransform {
        fail_lines: Vec<u64>,
    }

    impl RecordTransform for FailingTransform {
        fn apply(&self, record: Record) -> Result<Record> {
            if self.fail_lines.contains(&record.line_number()) {
                return Err(SanitizerError::sanitization(
                    record.line_number(),
                    "email",
                    "injected failure",
                ));
            }
            Ok(record)
        }
    }

    fn passthrough() -> FailingTransform {
        FailingTransform { fail_lines: vec![] }
    }

    /// Sink collecting rows, failing on chosen write attempts
    #[derive(Clone, Default)]
    struct CollectingSink {
        rows: Arc<Mutex<Vec<u64>>>,
        attempts: Arc<Mutex<u64>>,
        fail_attempts: Vec<u64>,
        fatal_on_attempt: Option<u64>,
        opened_with: Arc<Mutex<Option<WriterState>>>,
    }

    impl CollectingSink {
        fn lines(&self) -> Vec<u64> {
            self.rows.lock().unwrap().clone()
        }
    }

    impl RecordSink for CollectingSink {
        fn open(&mut self, _headers: &[String], resume: WriterState) -> Result<()> {
            *self.opened_with.lock().unwrap() = Some(resume);
            Ok(())
        }

        fn write_batch(&mut self, records: &[Record]) -> Result<()> {
            let attempt = {
                let mut attempts = self.attempts.lock().unwrap();
                *attempts += 1;
                *attempts
            };
            let last = records.last().map(Record::line_number).unwrap_or(0);
            if self.fatal_on_attempt == Some(attempt) {
                return Err(SanitizerError::io(
                    "disk vanished",
                    std::io::Error::other("gone"),
                ));
            }
            if self.fail_attempts.contains(&attempt) {
                return Err(SanitizerError::write(last, "injected write failure", None));
            }
            self.rows
                .lock()
                .unwrap()
                .extend(records.iter().map(Record::line_number));
            Ok(())
        }

        fn state(&self) -> WriterState {
            WriterState {
                header_written: self.opened_with.lock().unwrap().is_some(),
            }
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }

        fn location(&self) -> String {
            "memory://sink".to_string()
        }
    }

    /// Listener recording every hook invocation
    #[derive(Clone, Default)]
    struct RecordingListener {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingListener {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl PipelineListener for RecordingListener {
        fn on_run_start(&mut self, _start: &RunStart) {
            self.events.lock().unwrap().push("start".to_string());
        }

        fn after_chunk(&mut self, progress: &ChunkProgress) {
            self.events
                .lock()
                .unwrap()
                .push(format!("chunk{}:{}", progress.chunk, progress.rows_written));
        }

        fn on_skip(&mut self, event: &SkipEvent) {
            self.events
                .lock()
                .unwrap()
                .push(format!("skip:{}@{}", event.category, event.line));
        }

        fn on_run_end(&mut self, report: &RunReport) {
            self.events
                .lock()
                .unwrap()
                .push(format!("end:{}", report.status));
        }
    }

    fn config(chunk_size: usize, skip_limit: u64) -> SanitizerConfig {
        SanitizerConfig::default()
            .with_chunk_size(chunk_size)
            .with_skip_limit(skip_limit)
    }

    #[test]
    fn test_clean_run_completes_and_clears_checkpoint() {
        let sink = CollectingSink::default();
        let store = MemoryCheckpointStore::new();
        let listener = RecordingListener::default();

        let mut runner = PipelineRunner::new(
            ScriptedSource::clean(5),
            passthrough(),
            sink.clone(),
            config(2, 0),
        )
        .with_checkpoint_store(store.clone())
        .with_listener(listener.clone());

        let report = runner.run().unwrap();
        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(runner.status(), RunStatus::Completed);
        assert_eq!(report.rows_read, 5);
        assert_eq!(report.rows_written, 5);
        assert_eq!(sink.lines(), vec![1, 2, 3, 4, 5]);

        let commits: Vec<u64> = store.commits().iter().map(|c| c.lines_consumed).collect();
        assert_eq!(commits, vec![2, 4, 5]);
        assert_eq!(store.current(), None);

        assert_eq!(
            listener.events(),
            vec!["start", "chunk1:2", "chunk2:4", "chunk3:5", "end:COMPLETED"]
        );
    }

    #[test]
    fn test_read_failures_within_budget() {
        let sink = CollectingSink::default();
        let listener = RecordingListener::default();
        let source = ScriptedSource::new(vec![
            Ok(vec!["1", "a@b.c"]),
            Err("unterminated quote"),
            Ok(vec!["3", "c@d.e"]),
        ]);

        let mut runner = PipelineRunner::new(source, passthrough(), sink.clone(), config(10, 1))
            .with_listener(listener.clone());
        let report = runner.run().unwrap();

        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.skips.read, 1);
        assert_eq!(report.lines_consumed, 3);
        assert_eq!(sink.lines(), vec![1, 3]);
        assert!(listener.events().contains(&"skip:read@2".to_string()));
        assert!(report.failure_messages[0].contains("unterminated quote"));
    }

    #[test]
    fn test_exceeding_budget_fails_with_partial_statistics() {
        let sink = CollectingSink::default();
        let store = MemoryCheckpointStore::new();
        let transform = FailingTransform {
            fail_lines: vec![3, 4],
        };

        let mut runner =
            PipelineRunner::new(ScriptedSource::clean(6), transform, sink.clone(), config(2, 1))
                .with_checkpoint_store(store.clone());
        let report = runner.run().unwrap();

        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(report.skips.process, 2);
        assert_eq!(report.rows_written, 2);
        assert_eq!(sink.lines(), vec![1, 2]);
        assert!(report
            .failure_messages
            .last()
            .unwrap()
            .contains("Skip limit exceeded"));
        // Checkpoint stays at the last committed chunk for a restart
        assert_eq!(store.current(), Some(PipelineCheckpoint::new(2, true)));
    }

    #[test]
    fn test_write_failure_counts_once_per_batch() {
        let sink = CollectingSink {
            fail_attempts: vec![2],
            ..Default::default()
        };
        let store = MemoryCheckpointStore::new();
        let listener = RecordingListener::default();

        let mut runner = PipelineRunner::new(
            ScriptedSource::clean(6),
            passthrough(),
            sink.clone(),
            config(2, 1),
        )
        .with_checkpoint_store(store.clone())
        .with_listener(listener.clone());
        let report = runner.run().unwrap();

        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.skips.write, 1);
        assert_eq!(report.skips.total(), 1);
        assert_eq!(sink.lines(), vec![1, 2, 5, 6]);
        assert!(listener.events().contains(&"skip:write@4".to_string()));

        // No commit for the abandoned chunk
        let commits: Vec<u64> = store.commits().iter().map(|c| c.lines_consumed).collect();
        assert_eq!(commits, vec![2, 6]);
    }

    #[test]
    fn test_fatal_write_error_fails_run() {
        let sink = CollectingSink {
            fatal_on_attempt: Some(1),
            ..Default::default()
        };
        let listener = RecordingListener::default();
        let mut runner = PipelineRunner::new(
            ScriptedSource::clean(3),
            passthrough(),
            sink,
            config(10, 100),
        )
        .with_listener(listener.clone());

        let report = runner.run().unwrap();
        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(report.skips.total(), 0);
        assert!(report.failure_messages[0].contains("disk vanished"));
        assert_eq!(listener.events().last().unwrap(), "end:FAILED");
    }

    #[test]
    fn test_cancellation_completes_in_flight_chunk() {
        let sink = CollectingSink::default();
        let store = MemoryCheckpointStore::new();
        let token = CancellationToken::new();

        /// Cancels once the first chunk has been committed
        struct StopAfterFirstChunk(CancellationToken);
        impl PipelineListener for StopAfterFirstChunk {
            fn after_chunk(&mut self, _progress: &ChunkProgress) {
                self.0.cancel();
            }
        }

        let mut runner = PipelineRunner::new(
            ScriptedSource::clean(7),
            passthrough(),
            sink.clone(),
            config(3, 0),
        )
        .with_checkpoint_store(store.clone())
        .with_listener(StopAfterFirstChunk(token.clone()))
        .with_cancellation(token);

        let report = runner.run().unwrap();
        assert_eq!(report.status, RunStatus::Stopped);
        assert_eq!(sink.lines(), vec![1, 2, 3]);
        assert_eq!(store.current(), Some(PipelineCheckpoint::new(3, true)));
        assert!(report.status.is_restartable());
    }

    #[test]
    fn test_resume_skips_consumed_lines_and_appends() {
        let sink = CollectingSink::default();
        let store = MemoryCheckpointStore::with_checkpoint(PipelineCheckpoint::new(4, true));

        let mut runner = PipelineRunner::new(
            ScriptedSource::clean(7),
            passthrough(),
            sink.clone(),
            config(2, 0),
        )
        .with_checkpoint_store(store.clone());
        let report = runner.run().unwrap();

        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.resumed_from_line, Some(4));
        assert_eq!(sink.lines(), vec![5, 6, 7]);
        assert_eq!(
            *sink.opened_with.lock().unwrap(),
            Some(WriterState {
                header_written: true
            })
        );
    }

    #[test]
    fn test_runner_cannot_be_reused() {
        let mut runner = PipelineRunner::new(
            ScriptedSource::clean(1),
            passthrough(),
            CollectingSink::default(),
            config(1, 0),
        );
        runner.run().unwrap();
        assert!(matches!(
            runner.run(),
            Err(SanitizerError::Configuration { .. })
        ));
    }

    #[test]
    fn test_invalid_chunk_size_rejected_before_start() {
        let listener = RecordingListener::default();
        let mut runner = PipelineRunner::new(
            ScriptedSource::clean(1),
            passthrough(),
            CollectingSink::default(),
            config(0, 0),
        )
        .with_listener(listener.clone());
        assert!(matches!(
            runner.run(),
            Err(SanitizerError::Configuration { .. })
        ));
        assert!(listener.events().is_empty());
        assert_eq!(runner.status(), RunStatus::Idle);
    }
}
