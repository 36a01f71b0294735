//! Command implementations for the CSV sanitizer CLI
//!
//! Each command is implemented in its own module:
//! - `sanitize`: chunked sanitization run with checkpoint and report
//! - `inspect`: file preview and before/after diff
//! - `shared`: logging setup and report formatting helpers

pub mod inspect;
pub mod sanitize;
pub mod shared;

use crate::cli::args::{Args, Commands};
use crate::models::RunStatus;
use anyhow::Result;
use tokio_util::sync::CancellationToken;

/// Exit code for a run that was stopped on request
pub const EXIT_STOPPED: i32 = 130;

/// Main command runner
///
/// Dispatches to the subcommand handler and returns the terminal status of
/// the work it performed. Inspection commands always report `Completed`.
pub async fn run(args: Args, cancellation: CancellationToken) -> Result<RunStatus> {
    shared::setup_logging(args.get_log_level(), args.quiet);
    let show_progress = args.show_progress();

    match args.command {
        Some(Commands::Sanitize(sanitize_args)) => {
            sanitize::run_sanitize(sanitize_args, show_progress, cancellation).await
        }
        Some(Commands::Preview(preview_args)) => inspect::run_preview(preview_args),
        Some(Commands::Diff(diff_args)) => inspect::run_diff(diff_args),
        None => Ok(RunStatus::Completed),
    }
}

/// Process exit code for a terminal status
pub fn exit_code(status: RunStatus) -> i32 {
    match status {
        RunStatus::Completed => 0,
        RunStatus::Stopped => EXIT_STOPPED,
        _ => 1,
    }
}
