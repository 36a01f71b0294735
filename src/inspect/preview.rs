use super::{effective_rows, header_row, next_row, open_csv};
use crate::constants::MAX_PREVIEW_ROWS;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Leading rows of a file plus its size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewResult {
    pub file_name: String,
    pub file_size: u64,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Data rows in the whole file, from a full scan
    pub total_rows: u64,
}

impl PreviewResult {
    pub fn preview_rows(&self) -> usize {
        self.rows.len()
    }
}

/// Preview `path`; `max_rows == 0` selects `default_rows`, anything else is
/// capped at 100
pub fn preview(path: &Path, max_rows: usize, default_rows: usize) -> Result<PreviewResult> {
    let limit = effective_rows(max_rows, default_rows, MAX_PREVIEW_ROWS);
    let mut reader = open_csv(path)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    let Some(headers) = header_row(&mut reader, path)? else {
        return Ok(PreviewResult {
            file_name,
            file_size,
            headers: Vec::new(),
            rows: Vec::new(),
            total_rows: 0,
        });
    };

    let mut rows = Vec::with_capacity(limit);
    let mut total_rows = 0u64;
    while let Some(row) = next_row(&mut reader, path)? {
        total_rows += 1;
        if rows.len() < limit {
            rows.push(row);
        }
    }

    Ok(PreviewResult {
        file_name,
        file_size,
        headers,
        rows,
        total_rows,
    })
}
