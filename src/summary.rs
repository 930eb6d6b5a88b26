//! Human-readable text printed by the command line.

use crate::config::Config;
use crate::fetcher::FetchResult;
use crate::pipeline::{RunReport, RunState};
use std::fmt::Write;

/// Every setting plus the numbered source list.
pub fn config_summary(config: &Config) -> String {
    let s = &config.scraping;
    let o = &config.output;
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "📋 Configuration");
    let _ = writeln!(out, "   • Max Retries: {}", s.max_retries);
    let _ = writeln!(out, "   • Retry Delay: {} seconds", s.retry_delay);
    let _ = writeln!(out, "   • Timeout: {} seconds", s.timeout);
    let _ = writeln!(out, "   • User Agent: {}", s.user_agent);
    let _ = writeln!(out, "   • Output Format: {}", o.format.as_deref().unwrap_or("json"));
    let _ = writeln!(out, "   • Save Path: {}", o.save_path.display());
    let _ = writeln!(out, "   • Backup Enabled: {}", o.backup_enabled);
    let _ = writeln!(out);
    let _ = writeln!(out, "📊 Target Sources ({})", config.targets.news_sources.len());
    for (i, source) in config.targets.news_sources.iter().enumerate() {
        let _ = writeln!(out, "   {}. {}", i + 1, source);
    }
    out
}

/// Final banner for `run`.
///
/// # Returns
///
/// The success banner with per-source counts and saved paths when the run is
/// `Done`, otherwise the failure banner naming the [`RunFailure`].
///
/// [`RunFailure`]: crate::pipeline::RunFailure
pub fn run_summary(report: &RunReport) -> String {
    match (&report.state, &report.saved) {
        (RunState::Done, Some(saved)) => {
            let mut out = format!(
                "✅ BPL-Extract completed successfully!\n📊 {} of {} sources fetched; results in {}\n",
                report.succeeded(),
                report.records.len(),
                saved.primary.display()
            );
            if let Some(backup) = &saved.backup {
                let _ = writeln!(out, "🗂  Backup at {}", backup.display());
            }
            out
        }
        (RunState::Failed(reason), _) => {
            format!("❌ BPL-Extract failed: {reason}. Check logs for details.\n")
        }
        (state, _) => format!("❌ BPL-Extract stopped in state {state:?}.\n"),
    }
}

/// One line describing a single `fetch`: status and size on success, attempt
/// count and last error on exhaustion.
pub fn fetch_summary(url: &str, result: &FetchResult) -> String {
    match result {
        FetchResult::Fetched { page, attempts } => format!(
            "✅ {url}: HTTP {} ({} bytes) after {attempts} attempt(s)\n",
            page.status_code, page.content_length
        ),
        FetchResult::Exhausted {
            attempts,
            last_error,
        } => format!("❌ {url}: all {attempts} attempt(s) failed (last error: {last_error})\n"),
    }
}
