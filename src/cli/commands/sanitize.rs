//! Sanitize command: run the chunked pipeline over a file

use super::shared::print_run_report;
use crate::cli::args::{OutputFormat, SanitizeArgs};
use crate::models::RunStatus;
use crate::pipeline::{
    CheckpointStore, FileCheckpointStore, LoggingListener, PipelineRunner, ProgressListener,
};
use crate::strategy::ColumnRules;
use anyhow::{Context, Result};
use colored::*;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Run the sanitization pipeline and report its outcome
pub async fn run_sanitize(
    args: SanitizeArgs,
    show_progress: bool,
    cancellation: CancellationToken,
) -> Result<RunStatus> {
    args.validate()?;
    let config = args.build_config()?;
    debug!("Loaded configuration: {:?}", config);

    let rules = ColumnRules::from_file(&args.rules)
        .with_context(|| format!("Failed to load column rules from {}", args.rules.display()))?;
    info!("Loaded {} column rules: {}", rules.len(), rules.describe());

    let mut runner = PipelineRunner::for_files(&args.input, &args.output, &rules, config)?
        .with_listener(LoggingListener::new())
        .with_cancellation(cancellation);

    if show_progress && args.output_format == OutputFormat::Human && !args.no_progress {
        runner = runner.with_listener(ProgressListener::new());
    }

    if let Some(path) = &args.checkpoint {
        let store = FileCheckpointStore::new(path);
        if let Some(checkpoint) = store
            .load()
            .with_context(|| format!("Failed to read checkpoint {}", path.display()))?
        {
            info!(
                "Restarting from checkpoint {} ({} rows consumed)",
                path.display(),
                checkpoint.lines_consumed
            );
        }
        runner = runner.with_checkpoint_store(store);
    }

    let report = tokio::task::spawn_blocking(move || runner.run())
        .await
        .context("Sanitization task panicked")??;

    if let Some(path) = &args.report {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        info!("Run report written to {}", path.display());
    }

    match args.output_format {
        OutputFormat::Human => {
            print_run_report(&report);
            if report.status.is_restartable() {
                match &args.checkpoint {
                    Some(path) => println!(
                        "{} rerun with --checkpoint {} to resume",
                        "Hint:".bright_yellow(),
                        path.display()
                    ),
                    None => println!(
                        "{} pass --checkpoint FILE to make runs resumable",
                        "Hint:".bright_yellow()
                    ),
                }
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(report.status)
}
