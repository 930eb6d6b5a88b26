//! Tracing subscriber construction.
//!
//! Pipeline code only emits `tracing` events. Which sinks receive them is
//! decided here and installed by `main`; tests install their own subscriber
//! with [`tracing::subscriber::set_default`].
//!
//! The default setup writes to stderr and, unless disabled, appends plain
//! text to a log file. Level comes from `RUST_LOG`, falling back to `info`.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry, fmt as tfmt};

pub const DEFAULT_LOG_FILE: &str = "bpl_extract.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Build the process subscriber: stderr plus an optional append-only log file.
///
/// # Errors
///
/// Fails if the log file cannot be opened for appending.
pub fn subscriber(log_file: Option<&Path>) -> io::Result<impl Subscriber + Send + Sync + use<>> {
    let file_layer = match log_file {
        Some(path) => {
            let file: File = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tfmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true)
                    .with_timer(UtcTime::rfc_3339()),
            )
        }
        None => None,
    };

    let stderr_layer = tfmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(UtcTime::rfc_3339());

    Ok(Registry::default()
        .with(env_filter())
        .with(stderr_layer)
        .with(file_layer))
}
