//! Error handling for sanitization runs.
//!
//! Distinguishes fatal setup failures (configuration, missing files) from
//! per-record failures the pipeline runner may absorb into its skip budget.

use crate::models::SkipCategory;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SanitizerError {
    /// Bad or empty rule set, unknown operation, invalid runner settings
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Source or destination path does not exist
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    /// I/O failure outside the per-batch write path
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Unparseable input row or unusable header row
    #[error("Malformed input at line {line}: {message}")]
    MalformedInput {
        line: u64,
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    /// A strategy failed to transform a field
    #[error("Sanitization failed at line {line}, column '{column}': {message}")]
    Sanitization {
        line: u64,
        column: String,
        message: String,
    },

    /// Destination write or flush failed for a batch
    #[error("Write failed for batch ending at line {line}: {message}")]
    Write {
        line: u64,
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    /// Unrecoverable CSV failure (I/O beneath the parser, preview or diff input)
    #[error("CSV parsing error in '{file}': {message}")]
    Parse {
        file: String,
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    /// Recoverable failures exceeded the configured budget
    #[error(
        "Skip limit exceeded: {total} skips (limit {limit}), last {category} failure at line {line}"
    )]
    SkipLimitExceeded {
        category: SkipCategory,
        total: u64,
        limit: u64,
        line: u64,
    },

    /// Checkpoint could not be loaded or persisted
    #[error("Checkpoint error: {message}")]
    Checkpoint { message: String },

    /// Serialization of reports or checkpoints failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SanitizerError>;

impl SanitizerError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a malformed input error for a data line
    pub fn malformed_input(
        line: u64,
        message: impl Into<String>,
        source: Option<csv::Error>,
    ) -> Self {
        Self::MalformedInput {
            line,
            message: message.into(),
            source,
        }
    }

    /// Create a sanitization error for a single field
    pub fn sanitization(line: u64, column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Sanitization {
            line,
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a batch write error
    pub fn write(line: u64, message: impl Into<String>, source: Option<csv::Error>) -> Self {
        Self::Write {
            line,
            message: message.into(),
            source,
        }
    }

    /// Create a parse error for the reporting path
    pub fn parse(
        file: impl Into<String>,
        message: impl Into<String>,
        source: Option<csv::Error>,
    ) -> Self {
        Self::Parse {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a checkpoint error
    pub fn checkpoint(message: impl Into<String>) -> Self {
        Self::Checkpoint {
            message: message.into(),
        }
    }

    /// Whether the runner may count this error against the skip budget
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MalformedInput { .. } | Self::Sanitization { .. } | Self::Write { .. }
        )
    }

    /// Skip category this error is counted under, if recoverable
    pub fn skip_category(&self) -> Option<SkipCategory> {
        match self {
            Self::MalformedInput { .. } => Some(SkipCategory::Read),
            Self::Sanitization { .. } => Some(SkipCategory::Process),
            Self::Write { .. } => Some(SkipCategory::Write),
            _ => None,
        }
    }

    /// Source line the error is attributed to, if any
    pub fn line(&self) -> Option<u64> {
        match self {
            Self::MalformedInput { line, .. }
            | Self::Sanitization { line, .. }
            | Self::Write { line, .. }
            | Self::SkipLimitExceeded { line, .. } => Some(*line),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SanitizerError {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<csv::Error> for SanitizerError {
    fn from(error: csv::Error) -> Self {
        Self::Parse {
            file: "unknown".to_string(),
            message: "CSV parsing failed".to_string(),
            source: Some(error),
        }
    }
}
