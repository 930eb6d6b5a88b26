//! # BPL-Extract
//!
//! Fetches a configured list of news sources one at a time, retrying each
//! failed request a bounded number of times with a fixed delay, and saves one
//! outcome record per source to a timestamped JSON file (plus an optional
//! backup copy).
//!
//! ## Usage
//!
//! ```sh
//! bpl_extract --config config.json
//! ```
//!
//! ## Architecture
//!
//! 1. **Config**: load and validate the configuration (fatal on error)
//! 2. **Extraction**: fetch every source in order with retries; failures are
//!    recorded, never fatal
//! 3. **Persistence**: write the batch to `save_path` and `save_path/backup`
//!
//! Exit status is 0 when a non-empty batch was saved, even if some sources
//! failed.

use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, info};

mod cli;
mod config;
mod exit_codes;
mod extract;
mod fetcher;
mod models;
mod outputs;
mod pipeline;
mod summary;
mod telemetry;
mod utils;

use cli::{Cli, Command};
use pipeline::{Extractor, StartupError};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();

    // --- Tracing init ---
    let subscriber = match telemetry::subscriber(args.log_file()) {
        Ok(subscriber) => subscriber,
        Err(e) => {
            eprintln!("❌ Cannot open log file {}: {e}", args.log_file.display());
            return ExitCode::from(exit_codes::RUNTIME_ERROR);
        }
    };
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("❌ Failed to install logger: {e}");
        return ExitCode::from(exit_codes::RUNTIME_ERROR);
    }

    let start_time = std::time::Instant::now();
    debug!(?args, "Parsed CLI arguments");

    let code = match args.command() {
        Command::Run => run(&args).await,
        Command::Check => check(&args),
        Command::Fetch { url, max_retries } => fetch(&args, &url, max_retries).await,
    };

    let elapsed = start_time.elapsed();
    info!(?elapsed, exit_code = code, "Execution complete");
    ExitCode::from(code)
}

async fn run(args: &Cli) -> u8 {
    let extractor = match load(args) {
        Ok(extractor) => extractor,
        Err(code) => return code,
    };

    info!(
        sources = extractor.config().targets.news_sources.len(),
        save_path = %extractor.config().output.save_path.display(),
        "Pipeline ready"
    );
    let report = extractor.run().await;
    info!(
        state = ?report.state,
        succeeded = report.succeeded(),
        failed = report.failed(),
        "Run finished"
    );
    if report.is_done() {
        print!("{}", summary::run_summary(&report));
        exit_codes::SUCCESS
    } else {
        eprint!("{}", summary::run_summary(&report));
        exit_codes::RUN_FAILED
    }
}

fn check(args: &Cli) -> u8 {
    match config::load_config(&args.config) {
        Ok(config) => {
            println!("✅ Configuration loaded from {}\n", args.config.display());
            print!("{}", summary::config_summary(&config));
            exit_codes::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Critical error: {e}");
            exit_codes::CONFIG_ERROR
        }
    }
}

async fn fetch(args: &Cli, url: &str, max_retries: Option<u32>) -> u8 {
    let extractor = match load(args) {
        Ok(extractor) => extractor,
        Err(code) => return code,
    };

    let result = extractor.fetcher().fetch(url, max_retries).await;
    info!(%url, attempts = result.attempts(), "Single fetch finished");
    print!("{}", summary::fetch_summary(url, &result));
    match result.page() {
        Some(_) => exit_codes::SUCCESS,
        None => exit_codes::RUN_FAILED,
    }
}

fn load(args: &Cli) -> Result<Extractor, u8> {
    Extractor::load(&args.config).map_err(|e| {
        error!(error = %e, "Critical error during startup");
        eprintln!("❌ Critical error: {e}");
        match e {
            StartupError::Config(_) => exit_codes::CONFIG_ERROR,
            StartupError::Client(_) => exit_codes::RUNTIME_ERROR,
        }
    })
}
