//! Bounded previews and before/after diffs of CSV files.
//!
//! Reporting path only: failures are returned to the caller, nothing is
//! skipped.
//!
//! - [`preview`] - header, leading rows and total row count of one file
//! - [`diff`] - cell-level comparison of an original and its sanitized copy

pub mod diff;
pub mod preview;

pub use diff::{diff, DiffCell, DiffResult, DiffRow};
pub use preview::{preview, PreviewResult};

use crate::constants::UTF8_BOM;
use crate::error::{Result, SanitizerError};
use csv::{Reader, ReaderBuilder, StringRecord};
use std::fs::File;
use std::io;
use std::path::Path;

/// Row count to return: `default` when nothing was requested, else the
/// request capped at `max`
pub fn effective_rows(requested: usize, default: usize, max: usize) -> usize {
    if requested == 0 {
        default
    } else {
        requested.min(max)
    }
}

/// Open a CSV file for inspection; the header row is read as a data row
fn open_csv(path: &Path) -> Result<Reader<File>> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SanitizerError::not_found(path),
        _ => SanitizerError::io(format!("Failed to open {}", path.display()), e),
    })?;
    Ok(ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file))
}

/// Next row as owned strings, `None` at end of file
fn next_row(reader: &mut Reader<File>, path: &Path) -> Result<Option<Vec<String>>> {
    let mut row = StringRecord::new();
    let more = reader.read_record(&mut row).map_err(|e| {
        SanitizerError::parse(path.display().to_string(), "CSV parsing error", Some(e))
    })?;
    Ok(more.then(|| row.iter().map(str::to_string).collect()))
}

/// Header row with any byte order mark removed, `None` for an empty file
fn header_row(reader: &mut Reader<File>, path: &Path) -> Result<Option<Vec<String>>> {
    let mut headers = next_row(reader, path)?;
    if let Some(first) = headers.as_mut().and_then(|h| h.first_mut()) {
        if let Some(stripped) = first.strip_prefix(UTF8_BOM) {
            *first = stripped.to_string();
        }
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_row_strips_bom() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bom.csv");
        std::fs::write(&path, "\u{feff}name,email\nAnn,a@x.io\n").unwrap();

        let mut reader = open_csv(&path).unwrap();
        let headers = header_row(&mut reader, &path).unwrap().unwrap();
        assert_eq!(headers, vec!["name", "email"]);
        let row = next_row(&mut reader, &path).unwrap().unwrap();
        assert_eq!(row, vec!["Ann", "a@x.io"]);
    }

    #[test]
    fn test_effective_rows() {
        assert_eq!(effective_rows(0, 20, 100), 20);
        assert_eq!(effective_rows(5, 20, 100), 5);
        assert_eq!(effective_rows(500, 20, 100), 100);
        assert_eq!(effective_rows(75, 20, 50), 50);
    }
}
