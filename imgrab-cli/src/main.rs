mod cli;
mod commands;
mod error;
mod output;

use crate::{
    cli::{Args, Commands},
    commands::{CommandExecutor, run_worker},
    error::Result,
    output::OutputManager,
};
use clap::Parser;
use imgrab_engine::WORKER_LOG_ENV;
use std::process;
use tracing::{Level, error, info};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

fn main() {
    let args = Args::parse();

    if let Some(Commands::Worker(worker)) = &args.command {
        init_worker_logging();
        match run_worker(worker) {
            Ok(true) => process::exit(0),
            Ok(false) => process::exit(1),
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    }

    init_logging(args.verbose, args.quiet);

    let colored = cfg!(feature = "colored-output");
    let output = OutputManager::new(colored);
    let error_prefix = output.error_prefix();
    let worker_log = worker_log_filter(args.verbose, args.quiet);

    if let Err(e) = run(args, output, worker_log) {
        error!("Application error: {}", e);
        eprintln!("{error_prefix} {e}");
        process::exit(1);
    }
}

fn run(args: Args, output: OutputManager, worker_log: String) -> Result<()> {
    let config = args.fetch_config();
    info!(
        strategy = ?args.strategy,
        urls = args.urls.len(),
        "Starting imgrab"
    );

    CommandExecutor::new(config, output)
        .with_worker_log(worker_log)
        .download(&args.urls, args.strategy)
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(verbose),
        )
        .init();
}

/// Filter handed to worker processes so they log at the parent's level.
fn worker_log_filter(verbose: bool, quiet: bool) -> String {
    if quiet {
        "error".to_string()
    } else if verbose {
        "debug".to_string()
    } else {
        std::env::var("RUST_LOG")
            .ok()
            .filter(|filter| !filter.trim().is_empty())
            .unwrap_or_else(|| "info".to_string())
    }
}

/// Workers share the parent's stderr; without a forwarded filter they stay quiet.
fn init_worker_logging() {
    let filter = EnvFilter::try_from_env(WORKER_LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
