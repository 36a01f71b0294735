//! CSV record sink
//!
//! Writes the header on a fresh run and appends on a resumed run. Each batch
//! is encoded in memory and handed to the file in one write, then flushed
//! before the runner commits a checkpoint for it. A batch that fails to land
//! is cut back out of the file, so an abandoned batch leaves no rows behind.

use super::RecordSink;
use crate::error::{Result, SanitizerError};
use crate::models::{Record, WriterState};
use csv::{Terminator, WriterBuilder};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Byte destination that can drop a partially written tail
pub trait BatchOutput: Write + Send {
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
}

impl BatchOutput for File {
    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)?;
        self.seek(SeekFrom::Start(len))?;
        Ok(())
    }
}

/// Encode rows as CSV text with `\n` terminators
fn encode_rows<'a, I, R>(rows: I) -> std::result::Result<Vec<u8>, csv::Error>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = &'a str>,
{
    let mut encoder = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for row in rows {
        encoder.write_record(row)?;
    }
    encoder
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Values of `record` in header order, missing columns as `""`
fn row_values<'a>(
    headers: &'a [String],
    record: &'a Record,
) -> Box<dyn Iterator<Item = &'a str> + 'a> {
    // Records from the reader already follow header order
    if record.columns().eq(headers.iter().map(String::as_str)) {
        Box::new(record.values())
    } else {
        Box::new(
            headers
                .iter()
                .map(move |column| record.get(column).unwrap_or("")),
        )
    }
}

/// CSV writer targeting a file on disk
#[derive(Debug)]
pub struct CsvRecordWriter<W = File> {
    path: PathBuf,
    headers: Vec<String>,
    out: Option<W>,
    committed_len: u64,
    header_written: bool,
}

impl CsvRecordWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            headers: Vec::new(),
            out: None,
            committed_len: 0,
            header_written: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(|e| {
                    SanitizerError::io(
                        format!("Failed to create output directory {}", parent.display()),
                        e,
                    )
                })
            }
            _ => Ok(()),
        }
    }
}

impl<W: BatchOutput> CsvRecordWriter<W> {
    /// Write `bytes` in full or not at all
    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        let Some(out) = self.out.as_mut() else {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "writer is not open"));
        };
        let written = out.write_all(bytes).and_then(|()| out.flush());
        match written {
            Ok(()) => {
                self.committed_len += bytes.len() as u64;
                Ok(())
            }
            Err(e) => {
                if let Err(cut) = out.truncate_to(self.committed_len) {
                    warn!(
                        "Failed to remove partial batch from {}: {}",
                        self.path.display(),
                        cut
                    );
                }
                Err(e)
            }
        }
    }

    fn write_rows(&mut self, records: &[Record]) -> Result<()> {
        let last_line = records.last().map(Record::line_number).unwrap_or(0);
        if self.out.is_none() {
            return Err(SanitizerError::write(last_line, "Writer is not open", None));
        }

        let headers = &self.headers;
        let rows = records.iter().map(|record| row_values(headers, record));
        let bytes = encode_rows(rows)
            .map_err(|e| SanitizerError::write(last_line, "Failed to encode batch", Some(e)))?;

        self.append(&bytes).map_err(|e| {
            SanitizerError::write(last_line, "Failed to write batch", Some(e.into()))
        })?;

        debug!("Wrote {} rows through line {}", records.len(), last_line);
        Ok(())
    }
}

impl RecordSink for CsvRecordWriter {
    fn open(&mut self, headers: &[String], resume: WriterState) -> Result<()> {
        self.ensure_parent_dir()?;
        self.headers = headers.to_vec();

        let append = resume.header_written && self.path.exists();
        let file = if append {
            OpenOptions::new().append(true).open(&self.path)
        } else {
            File::create(&self.path)
        }
        .map_err(|e| SanitizerError::io(format!("Failed to open {}", self.path.display()), e))?;

        self.committed_len = if append {
            file.metadata()
                .map_err(|e| {
                    SanitizerError::io(format!("Failed to inspect {}", self.path.display()), e)
                })?
                .len()
        } else {
            0
        };
        self.out = Some(file);

        if append {
            info!("Appending to {}", self.path.display());
        } else {
            let header = encode_rows([self.headers.iter().map(String::as_str)])
                .map_err(|e| SanitizerError::write(0, "Failed to encode header row", Some(e)))?;
            self.append(&header).map_err(|e| {
                SanitizerError::io(format!("Failed to write header to {}", self.path.display()), e)
            })?;
            info!(
                "Writing {} columns to {}",
                self.headers.len(),
                self.path.display()
            );
        }

        self.header_written = true;
        Ok(())
    }

    fn write_batch(&mut self, records: &[Record]) -> Result<()> {
        self.write_rows(records)
    }

    fn state(&self) -> WriterState {
        WriterState {
            header_written: self.header_written,
        }
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut file) = self.out.take() {
            file.flush().map_err(|e| {
                SanitizerError::io(format!("Failed to flush {}", self.path.display()), e)
            })?;
        }
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
