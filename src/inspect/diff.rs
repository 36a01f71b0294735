//! Cell-level diff of an original file against its sanitized copy
//!
//! Rows are compared in lock step and columns by position, using the
//! original header. Cells missing on either side compare as empty strings.

use super::{effective_rows, header_row, next_row, open_csv};
use crate::constants::{DEFAULT_DIFF_ROWS, MAX_DIFF_ROWS};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffCell {
    pub column: String,
    pub original: String,
    pub sanitized: String,
    pub changed: bool,
}

/// A compared row holding at least one changed cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRow {
    /// 1-based data row number
    pub row_number: u64,
    pub cells: Vec<DiffCell>,
}

impl DiffRow {
    pub fn changed_cells(&self) -> impl Iterator<Item = &DiffCell> {
        self.cells.iter().filter(|cell| cell.changed)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    pub headers: Vec<String>,
    pub rows: Vec<DiffRow>,
    pub rows_compared: u64,
    pub total_changes: u64,
    pub changes_by_column: BTreeMap<String, u64>,
}

/// Compare up to `max_rows` rows (`0` selects 20, anything else is capped
/// at 50)
pub fn diff(original: &Path, sanitized: &Path, max_rows: usize) -> Result<DiffResult> {
    let limit = effective_rows(max_rows, DEFAULT_DIFF_ROWS, MAX_DIFF_ROWS) as u64;
    let mut original_reader = open_csv(original)?;
    let mut sanitized_reader = open_csv(sanitized)?;

    let original_headers = header_row(&mut original_reader, original)?;
    let sanitized_headers = header_row(&mut sanitized_reader, sanitized)?;
    let (Some(headers), Some(_)) = (original_headers, sanitized_headers) else {
        return Ok(DiffResult::default());
    };

    let mut result = DiffResult {
        headers,
        ..Default::default()
    };

    while result.rows_compared < limit {
        let Some(before) = next_row(&mut original_reader, original)? else {
            break;
        };
        let Some(after) = next_row(&mut sanitized_reader, sanitized)? else {
            break;
        };
        result.rows_compared += 1;

        let cells: Vec<DiffCell> = result
            .headers
            .iter()
            .enumerate()
            .map(|(index, column)| {
                let original = before.get(index).cloned().unwrap_or_default();
                let sanitized = after.get(index).cloned().unwrap_or_default();
                DiffCell {
                    column: column.clone(),
                    changed: original != sanitized,
                    original,
                    sanitized,
                }
            })
            .collect();

        let mut row_changed = false;
        for cell in cells.iter().filter(|cell| cell.changed) {
            row_changed = true;
            result.total_changes += 1;
            *result
                .changes_by_column
                .entry(cell.column.clone())
                .or_insert(0) += 1;
        }

        if row_changed {
            result.rows.push(DiffRow {
                row_number: result.rows_compared,
                cells,
            });
        }
    }

    Ok(result)
}
