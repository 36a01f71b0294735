//! CSV Sanitizer Library
//!
//! A Rust library for producing privacy-safe copies of CSV files by applying
//! a sanitization operation to selected columns.
//!
//! This library provides tools for:
//! - Masking, hashing, nullifying and randomizing field values
//! - Chunked read, sanitize and write runs with bounded skip tolerance
//! - Checkpointing and resuming interrupted runs
//! - Run audit reports with per-stage skip counts and throughput
//! - Bounded previews and cell-level diffs of original and sanitized files

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod inspect;
pub mod models;
pub mod pipeline;
pub mod strategy;

// Re-export commonly used types
pub use config::{RowWidthPolicy, SanitizerConfig};
pub use error::{Result, SanitizerError};
pub use inspect::{DiffResult, PreviewResult, diff, preview};
pub use models::{PipelineCheckpoint, Record, RunStatus, SkipCategory, SkipCounters};
pub use pipeline::{PipelineRunner, RunReport};
pub use strategy::{ColumnRules, HashAlgorithm, Operation, Strategy};
