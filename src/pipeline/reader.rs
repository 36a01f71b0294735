//! CSV record source
//!
//! Reads the header row first, then yields one [`Record`] per data line with
//! exactly one value per header column. A blank line is a data line whose
//! values are all empty. Position is tracked as the number of data lines
//! consumed so a resumed run can discard what was already handled.

use super::RecordSource;
use crate::config::RowWidthPolicy;
use crate::constants::UTF8_BOM;
use crate::error::{Result, SanitizerError};
use crate::models::{PipelineCheckpoint, Record};
use csv::{ByteRecord, Reader, ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Input wrapper that keeps the bytes the parser has not yet released
///
/// The parser reads ahead, so the raw text of a record is recovered from the
/// byte offsets reported before and after reading it.
#[derive(Debug)]
struct RawWindow<R> {
    inner: R,
    bytes: Vec<u8>,
    base: u64,
    eof: bool,
}

impl<R> RawWindow<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            bytes: Vec::new(),
            base: 0,
            eof: false,
        }
    }

    /// Offset one past the last byte read from the input
    fn end(&self) -> u64 {
        self.base + self.bytes.len() as u64
    }

    fn slice(&self, start: u64, end: u64) -> &[u8] {
        let from = start.saturating_sub(self.base) as usize;
        let to = (end.saturating_sub(self.base) as usize).min(self.bytes.len());
        self.bytes.get(from..to).unwrap_or(&[])
    }

    /// Drop everything before `offset`
    fn release(&mut self, offset: u64) {
        let count = (offset.saturating_sub(self.base) as usize).min(self.bytes.len());
        self.bytes.drain(..count);
        self.base += count as u64;
    }
}

impl<R: Read> Read for RawWindow<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 {
            self.eof = true;
        } else {
            self.bytes.extend_from_slice(&buf[..n]);
        }
        Ok(n)
    }
}

/// A parsed record waiting behind the blank lines that preceded it
#[derive(Debug)]
enum Pending {
    Row(ByteRecord),
    Invalid(String),
}

/// Streaming CSV reader over a file on disk
#[derive(Debug)]
pub struct CsvRecordReader {
    path: PathBuf,
    policy: RowWidthPolicy,
    reader: Option<Reader<RawWindow<File>>>,
    headers: Vec<String>,
    lines_consumed: u64,
    blank_lines: u64,
    held: Option<Pending>,
    after_cr: bool,
}

impl CsvRecordReader {
    pub fn new(path: impl Into<PathBuf>, policy: RowWidthPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
            reader: None,
            headers: Vec::new(),
            lines_consumed: 0,
            blank_lines: 0,
            held: None,
            after_cr: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn open_file(&self) -> Result<File> {
        File::open(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SanitizerError::not_found(&self.path),
            _ => SanitizerError::io(format!("Failed to open {}", self.path.display()), e),
        })
    }

    fn read_headers(&mut self, reader: &mut Reader<RawWindow<File>>) -> Result<Vec<String>> {
        let mut header_row = StringRecord::new();
        let has_header = reader.read_record(&mut header_row).map_err(|e| {
            SanitizerError::malformed_input(0, "Unreadable header row", Some(e))
        })?;
        if !has_header {
            return Err(SanitizerError::malformed_input(
                0,
                format!("{} is empty", self.path.display()),
                None,
            ));
        }

        let end = reader.position().byte();
        self.after_cr = reader.get_ref().slice(0, end).last() == Some(&b'\r');
        reader.get_mut().release(end);

        let headers: Vec<String> = header_row
            .iter()
            .enumerate()
            .map(|(index, name)| match index {
                0 => name.trim_start_matches(UTF8_BOM).to_string(),
                _ => name.to_string(),
            })
            .collect();
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(SanitizerError::malformed_input(0, "Header row is empty", None));
        }
        Ok(headers)
    }

    /// Discard already-processed data lines
    fn skip_consumed(&mut self, count: u64) -> Result<()> {
        while self.lines_consumed < count {
            match self.next_record() {
                Ok(Some(_)) => {}
                Ok(None) => break,
                // Lines that failed on the first pass were already counted
                Err(e) if e.is_recoverable() => {}
                Err(e) => return Err(e),
            }
        }
        if self.lines_consumed < count {
            debug!(
                "Checkpoint covers {} lines but {} holds only {}",
                count,
                self.path.display(),
                self.lines_consumed
            );
        }
        Ok(())
    }

    /// Pull the next record from the parser along with the blank lines the
    /// parser passed over to reach it; `false` at end of input
    fn fetch(&mut self) -> Result<bool> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(false);
        };

        let start = reader.position().byte();
        let mut raw = ByteRecord::new();
        let outcome = reader.read_byte_record(&mut raw);
        let end = reader.position().byte();

        let window = reader.get_ref();
        let span = window.slice(start, end);
        let (blank_lines, body) = split_blank_lines(span, self.after_cr);
        let at_eof = window.eof && end == window.end();
        let unterminated = at_eof && ends_inside_quotes(body);
        self.after_cr = span.last() == Some(&b'\r');
        reader.get_mut().release(end);

        let pending = match outcome {
            // Blank lines trailing the last record are not data
            Ok(false) => return Ok(false),
            Ok(true) if unterminated => Pending::Invalid("unterminated quoted field".to_string()),
            Ok(true) => Pending::Row(raw),
            Err(e) if e.is_io_error() => {
                return Err(SanitizerError::parse(
                    self.path.display().to_string(),
                    format!("I/O failure after line {}", self.lines_consumed),
                    Some(e),
                ));
            }
            Err(e) => Pending::Invalid(e.to_string()),
        };
        self.blank_lines = blank_lines;
        self.held = Some(pending);
        Ok(true)
    }

    fn build_record(&self, line: u64, raw: ByteRecord) -> Result<Record> {
        let row = StringRecord::from_byte_record(raw)
            .map_err(|e| SanitizerError::malformed_input(line, e.to_string(), None))?;

        let expected = self.headers.len();
        let found = row.len();
        if self.policy == RowWidthPolicy::Strict && found != expected {
            return Err(SanitizerError::malformed_input(
                line,
                format!("expected {} fields, found {}", expected, found),
                None,
            ));
        }

        let mut record = Record::with_capacity(line, expected);
        for (index, column) in self.headers.iter().enumerate() {
            record.push(column.as_str(), row.get(index).unwrap_or(""));
        }
        Ok(record)
    }

    fn blank_record(&self, line: u64) -> Result<Record> {
        if self.policy == RowWidthPolicy::Strict && self.headers.len() != 1 {
            return Err(SanitizerError::malformed_input(line, "blank line", None));
        }
        let mut record = Record::with_capacity(line, self.headers.len());
        for column in &self.headers {
            record.push(column.as_str(), "");
        }
        Ok(record)
    }
}

/// Count the blank lines at the front of a raw span; returns the count and
/// the remaining bytes
///
/// `after_cr` marks a span whose leading `\n` completes the previous
/// record's `\r\n` terminator.
fn split_blank_lines(span: &[u8], after_cr: bool) -> (u64, &[u8]) {
    let mut index = usize::from(after_cr && span.first() == Some(&b'\n'));
    let mut blank = 0;
    while let Some(&byte) = span.get(index) {
        match byte {
            b'\n' => index += 1,
            b'\r' => {
                index += 1;
                if span.get(index) == Some(&b'\n') {
                    index += 1;
                }
            }
            _ => break,
        }
        blank += 1;
    }
    (blank, &span[index..])
}

/// Whether raw CSV text ends inside a quoted field
///
/// Quoting opens only at the start of a field; inside quotes `""` is an
/// escaped quote.
fn ends_inside_quotes(raw: &[u8]) -> bool {
    let mut in_quotes = false;
    let mut field_start = true;
    let mut bytes = raw.iter().peekable();
    while let Some(&byte) = bytes.next() {
        if in_quotes {
            if byte == b'"' {
                if bytes.peek() == Some(&&b'"') {
                    bytes.next();
                } else {
                    in_quotes = false;
                }
            }
            continue;
        }
        match byte {
            b'"' if field_start => {
                in_quotes = true;
                field_start = false;
            }
            b',' | b'\n' | b'\r' => field_start = true,
            _ => field_start = false,
        }
    }
    in_quotes
}

impl RecordSource for CsvRecordReader {
    fn open(&mut self, resume_from: Option<PipelineCheckpoint>) -> Result<Vec<String>> {
        let file = self.open_file()?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(RawWindow::new(file));

        self.headers = self.read_headers(&mut reader)?;
        self.lines_consumed = 0;
        self.blank_lines = 0;
        self.held = None;
        self.reader = Some(reader);

        if let Some(checkpoint) = resume_from {
            if checkpoint.lines_consumed > 0 {
                info!(
                    "Resuming {} after {} consumed lines",
                    self.path.display(),
                    checkpoint.lines_consumed
                );
                self.skip_consumed(checkpoint.lines_consumed)?;
            }
        }

        debug!(
            "Opened {} with {} columns",
            self.path.display(),
            self.headers.len()
        );
        Ok(self.headers.clone())
    }

    fn next_record(&mut self) -> Result<Option<Record>> {
        loop {
            if self.blank_lines > 0 {
                self.blank_lines -= 1;
                self.lines_consumed += 1;
                return self.blank_record(self.lines_consumed).map(Some);
            }
            if let Some(pending) = self.held.take() {
                self.lines_consumed += 1;
                let line = self.lines_consumed;
                return match pending {
                    Pending::Row(raw) => self.build_record(line, raw).map(Some),
                    Pending::Invalid(message) => {
                        Err(SanitizerError::malformed_input(line, message, None))
                    }
                };
            }
            if !self.fetch()? {
                return Ok(None);
            }
        }
    }

    fn lines_consumed(&self) -> u64 {
        self.lines_consumed
    }

    fn close(&mut self) {
        self.reader = None;
        self.blank_lines = 0;
        self.held = None;
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
