//! Configuration management and validation.
//!
//! Provides the run configuration for the chunked pipeline and the
//! strategy settings shared by every column rule.

use crate::constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_MASK_CHAR, DEFAULT_MASK_VISIBLE_CHARS, DEFAULT_NULL_REPLACEMENT,
    DEFAULT_PREVIEW_ROWS, DEFAULT_SKIP_LIMIT,
};
use crate::error::{Result, SanitizerError};
use crate::strategy::HashAlgorithm;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Handling of data rows whose width differs from the header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowWidthPolicy {
    /// Pad short rows with empty values and drop extra values
    #[default]
    Lenient,
    /// Treat any width mismatch as a malformed row
    Strict,
}

/// Global configuration for a sanitization run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizerConfig {
    /// Records read, sanitized and written per chunk
    pub chunk_size: usize,

    /// Total read/process/write failures tolerated before the run fails
    pub skip_limit: u64,

    /// Character substituted for masked characters
    pub mask_char: char,

    /// Characters (or trailing phone digits) left visible by masking
    pub mask_visible_chars: usize,

    /// Digest used by the hash strategy
    pub hash_algorithm: HashAlgorithm,

    /// Value emitted by the nullify strategy
    pub null_replacement: String,

    /// Preview rows returned when a request asks for zero
    pub preview_max_rows: usize,

    /// Behaviour for short or long data rows
    pub row_width_policy: RowWidthPolicy,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            skip_limit: DEFAULT_SKIP_LIMIT,
            mask_char: DEFAULT_MASK_CHAR,
            mask_visible_chars: DEFAULT_MASK_VISIBLE_CHARS,
            hash_algorithm: HashAlgorithm::default(),
            null_replacement: DEFAULT_NULL_REPLACEMENT.to_string(),
            preview_max_rows: DEFAULT_PREVIEW_ROWS,
            row_width_policy: RowWidthPolicy::default(),
        }
    }
}

impl SanitizerConfig {
    /// Load configuration from a JSON file; absent keys take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SanitizerError::not_found(path));
        }
        let json = std::fs::read_to_string(path).map_err(|e| {
            SanitizerError::io(format!("Failed to read config file {}", path.display()), e)
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| {
            SanitizerError::configuration(format!("Invalid config file {}: {}", path.display(), e))
        })?;
        debug!("Loaded configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    /// Set records per chunk
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the skip budget
    pub fn with_skip_limit(mut self, skip_limit: u64) -> Self {
        self.skip_limit = skip_limit;
        self
    }

    /// Set the mask character
    pub fn with_mask_char(mut self, mask_char: char) -> Self {
        self.mask_char = mask_char;
        self
    }

    /// Set how many characters masking leaves visible
    pub fn with_mask_visible_chars(mut self, visible: usize) -> Self {
        self.mask_visible_chars = visible;
        self
    }

    /// Set the hash digest
    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    /// Set the nullify replacement value
    pub fn with_null_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.null_replacement = replacement.into();
        self
    }

    /// Set the default preview row count
    pub fn with_preview_max_rows(mut self, rows: usize) -> Self {
        self.preview_max_rows = rows;
        self
    }

    /// Set the row width policy
    pub fn with_row_width_policy(mut self, policy: RowWidthPolicy) -> Self {
        self.row_width_policy = policy;
        self
    }

    /// Reject settings the runner cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(SanitizerError::configuration(
                "chunk_size must be greater than zero",
            ));
        }
        if self.mask_char.is_control() {
            return Err(SanitizerError::configuration(format!(
                "mask_char must be a printable character, got {:?}",
                self.mask_char
            )));
        }
        Ok(())
    }
}
