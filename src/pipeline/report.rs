//! Run audit report
//!
//! Mirrors what the audit sink receives at the end of every run: volumes,
//! timing, terminal status and the failures that were absorbed or fatal.

use crate::error::{Result, SanitizerError};
use crate::models::{RunStatus, SkipCounters};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Statistics and outcome of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub source: String,
    pub destination: String,
    pub column_rule_count: usize,
    pub rules_applied: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Records parsed successfully during this run
    pub rows_read: u64,
    pub rows_written: u64,
    pub skips: SkipCounters,
    pub rows_per_second: f64,
    pub status: RunStatus,
    /// Skip and fatal failure messages, oldest first, capped
    pub failure_messages: Vec<String>,
    pub fields_sanitized: u64,
    /// Data rows already consumed when this run resumed, if it did
    pub resumed_from_line: Option<u64>,
    /// Data rows consumed in total when the run ended
    pub lines_consumed: u64,
}

impl RunReport {
    pub fn rows_skipped(&self) -> u64 {
        self.skips.total()
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Write the report as pretty JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                SanitizerError::io(format!("Failed to create {}", parent.display()), e)
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| {
            SanitizerError::io(format!("Failed to write report {}", path.display()), e)
        })
    }
}

/// Rows per second over `duration_ms`, zero for an instantaneous run
pub fn throughput(rows: u64, duration_ms: u64) -> f64 {
    if duration_ms == 0 {
        return 0.0;
    }
    rows as f64 * 1000.0 / duration_ms as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_report() -> RunReport {
        let now = Utc::now();
        RunReport {
            source: "in.csv".to_string(),
            destination: "out.csv".to_string(),
            column_rule_count: 1,
            rules_applied: "email=MASK".to_string(),
            started_at: now,
            finished_at: now,
            duration_ms: 2000,
            rows_read: 100,
            rows_written: 99,
            skips: SkipCounters {
                read: 1,
                process: 0,
                write: 0,
            },
            rows_per_second: throughput(99, 2000),
            status: RunStatus::Completed,
            failure_messages: vec!["Malformed input at line 7: bad".to_string()],
            fields_sanitized: 99,
            resumed_from_line: None,
            lines_consumed: 101,
        }
    }

    #[test]
    fn test_throughput() {
        assert_eq!(throughput(500, 1000), 500.0);
        assert_eq!(throughput(99, 2000), 49.5);
        assert_eq!(throughput(10, 0), 0.0);
    }

    #[test]
    fn test_report_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reports").join("run.json");
        let report = sample_report();
        report.write_json(&path).unwrap();

        let json = std::fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"status\": \"COMPLETED\""));
        assert!(json.contains("\"read\": 1"));
        let restored: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, report);
        assert_eq!(restored.rows_skipped(), 1);
        assert!(restored.is_success());
    }
}
