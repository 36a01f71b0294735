//! Command-line argument definitions for the CSV sanitizer
//!
//! This module defines the CLI interface using the clap derive API. Flags
//! given on the command line take precedence over values from a `--config`
//! file, which in turn override the built-in defaults.

use crate::config::{RowWidthPolicy, SanitizerConfig};
use crate::strategy::HashAlgorithm;
use crate::{Result, SanitizerError};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the CSV sanitizer
///
/// Applies per-column privacy transformations to a CSV file in restartable
/// chunks, and previews or diffs the results.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "csv-sanitizer",
    version,
    about = "Mask, hash, nullify or randomize sensitive CSV columns",
    long_about = "Produces a sanitized copy of a CSV file by applying a per-column rule \
                  (MASK, HASH, NULLIFY or RANDOMIZE). Runs in fixed-size chunks, tolerates \
                  a bounded number of bad rows, and can resume an interrupted run from its \
                  last committed checkpoint."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Sanitize a CSV file according to column rules
    Sanitize(SanitizeArgs),
    /// Show the header, first rows and row count of a CSV file
    Preview(PreviewArgs),
    /// Compare an original CSV file with its sanitized copy
    Diff(DiffArgs),
}

/// Arguments for the sanitize command
#[derive(Debug, Clone, Parser)]
pub struct SanitizeArgs {
    #[arg(short = 'i', long = "input", value_name = "FILE", help = "CSV file to sanitize")]
    pub input: PathBuf,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help = "Destination for the sanitized CSV"
    )]
    pub output: PathBuf,

    /// Column rules as JSON, e.g. {"columns": {"email": "MASK", "ssn": "HASH"}}
    #[arg(
        short = 'r',
        long = "rules",
        value_name = "FILE",
        help = "JSON file mapping columns to MASK, HASH, NULLIFY or RANDOMIZE"
    )]
    pub rules: PathBuf,

    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "JSON configuration file"
    )]
    pub config_file: Option<PathBuf>,

    #[arg(long = "chunk-size", value_name = "ROWS", help = "Records per chunk [default: 1000]")]
    pub chunk_size: Option<usize>,

    #[arg(
        long = "skip-limit",
        value_name = "COUNT",
        help = "Bad rows and failed chunks tolerated before failing [default: 100]"
    )]
    pub skip_limit: Option<u64>,

    /// Checkpoint file
    ///
    /// If the file exists, the run resumes from it. It is removed when the
    /// run completes and left in place when the run fails or is stopped.
    #[arg(
        long = "checkpoint",
        value_name = "FILE",
        help = "Checkpoint file used to resume interrupted runs"
    )]
    pub checkpoint: Option<PathBuf>,

    #[arg(long = "report", value_name = "FILE", help = "Write the JSON run report here")]
    pub report: Option<PathBuf>,

    #[arg(long = "strict", help = "Treat rows whose width differs from the header as malformed")]
    pub strict: bool,

    #[arg(long = "mask-char", value_name = "CHAR", help = "Mask character [default: *]")]
    pub mask_char: Option<char>,

    #[arg(
        long = "visible-chars",
        value_name = "COUNT",
        help = "Characters left visible by MASK [default: 4]"
    )]
    pub visible_chars: Option<usize>,

    #[arg(
        long = "hash-algorithm",
        value_name = "NAME",
        help = "SHA-224, SHA-256, SHA-384 or SHA-512 [default: SHA-256]"
    )]
    pub hash_algorithm: Option<HashAlgorithm>,

    #[arg(
        long = "null-replacement",
        value_name = "VALUE",
        help = "Value written by NULLIFY [default: empty]"
    )]
    pub null_replacement: Option<String>,

    #[arg(long = "no-progress", help = "Disable the progress spinner")]
    pub no_progress: bool,

    #[arg(
        long = "output-format",
        value_enum,
        default_value = "human",
        help = "Output format for the run summary"
    )]
    pub output_format: OutputFormat,
}

/// Arguments for the preview command
#[derive(Debug, Clone, Parser)]
pub struct PreviewArgs {
    #[arg(short = 'i', long = "input", value_name = "FILE", help = "CSV file to preview")]
    pub input: PathBuf,

    #[arg(
        short = 'n',
        long = "rows",
        value_name = "ROWS",
        default_value_t = 0,
        help = "Rows to show (0 = default of 20, max 100)"
    )]
    pub rows: usize,

    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "JSON configuration file"
    )]
    pub config_file: Option<PathBuf>,

    #[arg(long = "format", value_enum, default_value = "human", help = "Output format")]
    pub output_format: OutputFormat,
}

/// Arguments for the diff command
#[derive(Debug, Clone, Parser)]
pub struct DiffArgs {
    #[arg(long = "original", value_name = "FILE", help = "Original CSV file")]
    pub original: PathBuf,

    #[arg(long = "sanitized", value_name = "FILE", help = "Sanitized CSV file")]
    pub sanitized: PathBuf,

    #[arg(
        short = 'n',
        long = "rows",
        value_name = "ROWS",
        default_value_t = 0,
        help = "Rows to compare (0 = default of 20, max 50)"
    )]
    pub rows: usize,

    #[arg(long = "format", value_enum, default_value = "human", help = "Output format")]
    pub output_format: OutputFormat,
}

/// Output format options for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
}

impl Args {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

impl SanitizeArgs {
    /// Validate the sanitize command arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if !self.input.exists() {
            return Err(SanitizerError::not_found(&self.input));
        }
        if !self.rules.exists() {
            return Err(SanitizerError::not_found(&self.rules));
        }
        if self.input == self.output {
            return Err(SanitizerError::configuration(
                "Input and output must be different files",
            ));
        }
        if let Some(config_file) = &self.config_file {
            if !config_file.exists() {
                return Err(SanitizerError::configuration(format!(
                    "Config file does not exist: {}",
                    config_file.display()
                )));
            }
        }
        Ok(())
    }

    /// Layer command-line flags over the config file and defaults
    pub fn build_config(&self) -> Result<SanitizerConfig> {
        let mut config = match &self.config_file {
            Some(path) => SanitizerConfig::from_file(path)?,
            None => SanitizerConfig::default(),
        };

        if let Some(chunk_size) = self.chunk_size {
            config = config.with_chunk_size(chunk_size);
        }
        if let Some(skip_limit) = self.skip_limit {
            config = config.with_skip_limit(skip_limit);
        }
        if let Some(mask_char) = self.mask_char {
            config = config.with_mask_char(mask_char);
        }
        if let Some(visible) = self.visible_chars {
            config = config.with_mask_visible_chars(visible);
        }
        if let Some(algorithm) = self.hash_algorithm {
            config = config.with_hash_algorithm(algorithm);
        }
        if let Some(replacement) = &self.null_replacement {
            config = config.with_null_replacement(replacement.clone());
        }
        if self.strict {
            config = config.with_row_width_policy(RowWidthPolicy::Strict);
        }

        config.validate()?;
        Ok(config)
    }
}

impl PreviewArgs {
    /// Default preview size, from the config file when one is given
    pub fn default_rows(&self) -> Result<usize> {
        let config = match &self.config_file {
            Some(path) => SanitizerConfig::from_file(path)?,
            None => SanitizerConfig::default(),
        };
        Ok(config.preview_max_rows)
    }
}
