//! Integration tests for previewing and diffing CSV files on disk

use csv_sanitizer::{diff, preview};
use std::fs;
use tempfile::TempDir;

/// Test a single differing cell
///
/// Purpose: Validate that exactly one row, cell and column are reported
/// Benefit: Unchanged rows and cells stay out of the change counts
#[test]
fn test_single_cell_difference() {
    let dir = TempDir::new().unwrap();
    let original = dir.path().join("original.csv");
    let sanitized = dir.path().join("sanitized.csv");
    fs::write(
        &original,
        "id,name,email\n1,Ann,ann@example.com\n2,Bob,bob@example.com\n3,Cy,cy@example.com\n",
    )
    .unwrap();
    fs::write(
        &sanitized,
        "id,name,email\n1,Ann,ann@example.com\n2,Bob,bo*@*******.com\n3,Cy,cy@example.com\n",
    )
    .unwrap();

    let result = diff(&original, &sanitized, 0).unwrap();

    assert_eq!(result.headers, vec!["id", "name", "email"]);
    assert_eq!(result.rows_compared, 3);
    assert_eq!(result.total_changes, 1);
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].row_number, 2);

    let changed: Vec<_> = result.rows[0].changed_cells().collect();
    assert_eq!(changed.len(), 1);
    assert_eq!(changed[0].column, "email");
    assert_eq!(changed[0].original, "bob@example.com");
    assert_eq!(changed[0].sanitized, "bo*@*******.com");

    assert_eq!(result.changes_by_column.len(), 1);
    assert_eq!(result.changes_by_column["email"], 1);
}

/// Test that identical files report no changes
#[test]
fn test_identical_files() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("same.csv");
    fs::write(&path, "a,b\n1,2\n3,4\n").unwrap();

    let result = diff(&path, &path, 10).unwrap();
    assert_eq!(result.rows_compared, 2);
    assert_eq!(result.total_changes, 0);
    assert!(result.rows.is_empty());
    assert!(result.changes_by_column.is_empty());
}

/// Test the row cap when many rows differ
#[test]
fn test_diff_row_cap() {
    let dir = TempDir::new().unwrap();
    let original = dir.path().join("original.csv");
    let sanitized = dir.path().join("sanitized.csv");

    let mut before = String::from("value\n");
    let mut after = String::from("value\n");
    for i in 0..80 {
        before.push_str(&format!("{}\n", i));
        after.push_str(&format!("x{}\n", i));
    }
    fs::write(&original, before).unwrap();
    fs::write(&sanitized, after).unwrap();

    let capped = diff(&original, &sanitized, 500).unwrap();
    assert_eq!(capped.rows_compared, 50);
    assert_eq!(capped.total_changes, 50);

    let defaulted = diff(&original, &sanitized, 0).unwrap();
    assert_eq!(defaulted.rows_compared, 20);
}

/// Test preview and diff agree on a quoted file
#[test]
fn test_preview_of_quoted_fields() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("quoted.csv");
    fs::write(&path, "name,notes\n\"Doe, Jane\",\"said \"\"hi\"\"\"\nSam,plain\n").unwrap();

    let result = preview(&path, 5, 20).unwrap();
    assert_eq!(result.headers, vec!["name", "notes"]);
    assert_eq!(result.total_rows, 2);
    assert_eq!(result.rows[0], vec!["Doe, Jane", "said \"hi\""]);
    assert_eq!(result.file_name, "quoted.csv");
}
