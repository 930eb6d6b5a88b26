//! Command-line interface definitions.
//!
//! Running without a subcommand is the same as `run`.

use crate::telemetry::DEFAULT_LOG_FILE;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Fetch configured news sources with bounded retries and save the outcomes.
///
/// # Examples
///
/// ```sh
/// # Full run with ./config.json
/// bpl_extract
///
/// # Validate and print a config without touching the network
/// bpl_extract --config prod.yaml check
///
/// # Try one URL with a one-off retry budget
/// bpl_extract fetch https://example.com --max-retries 5
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the configuration file (YAML when it ends in .yaml/.yml, JSON otherwise)
    #[arg(short, long, env = "BPL_EXTRACT_CONFIG", default_value = "config.json")]
    pub config: PathBuf,

    /// File that log lines are appended to, in addition to stderr
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Log to stderr only
    #[arg(long, conflicts_with = "log_file")]
    pub no_log_file: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fetch every configured source and save the outcome records (default)
    Run,
    /// Load and validate the configuration, then print it
    Check,
    /// Fetch a single URL with the configured retry policy
    Fetch {
        url: String,

        /// Override scraping.max_retries for this call
        #[arg(long)]
        max_retries: Option<u32>,
    },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }

    pub fn log_file(&self) -> Option<&Path> {
        (!self.no_log_file).then_some(self.log_file.as_path())
    }
}
