use clap::{CommandFactory, Parser};
use csv_sanitizer::cli::{args::Args, commands};
use std::process;
use tokio_util::sync::CancellationToken;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // Without a subcommand, show help and exit
    if args.command.is_none() {
        let _ = Args::command().print_help();
        println!();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        let cancellation_token = CancellationToken::new();
        let command = commands::run(args, cancellation_token.clone());
        tokio::pin!(command);

        // Ctrl-C requests a cooperative stop; the command still runs to the
        // end of its current chunk and reports
        tokio::select! {
            result = &mut command => result,
            Ok(()) = tokio::signal::ctrl_c() => {
                eprintln!("\nReceived CTRL+C, stopping after the current chunk...");
                cancellation_token.cancel();
                command.await
            }
        }
    });

    match result {
        Ok(status) => process::exit(commands::exit_code(status)),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}
