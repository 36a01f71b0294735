//! Preview and diff commands

use super::shared::{print_diff, print_preview};
use crate::cli::args::{DiffArgs, OutputFormat, PreviewArgs};
use crate::inspect;
use crate::models::RunStatus;
use anyhow::{Context, Result};

pub fn run_preview(args: PreviewArgs) -> Result<RunStatus> {
    let default_rows = args.default_rows()?;
    let preview = inspect::preview(&args.input, args.rows, default_rows)
        .with_context(|| format!("Failed to preview {}", args.input.display()))?;

    match args.output_format {
        OutputFormat::Human => print_preview(&preview),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&preview)?),
    }
    Ok(RunStatus::Completed)
}

pub fn run_diff(args: DiffArgs) -> Result<RunStatus> {
    let diff = inspect::diff(&args.original, &args.sanitized, args.rows).with_context(|| {
        format!(
            "Failed to diff {} against {}",
            args.original.display(),
            args.sanitized.display()
        )
    })?;

    match args.output_format {
        OutputFormat::Human => print_diff(&diff),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&diff)?),
    }
    Ok(RunStatus::Completed)
}
