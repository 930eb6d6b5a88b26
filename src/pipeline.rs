//! Run orchestration.
//!
//! ```text
//! Idle -> Extracting -> Persisting -> Done
//!            |              |
//!            +-> Failed <---+
//! ```
//!
//! Configuration is loaded when the [`Extractor`] is built, before the state
//! machine starts; a bad config never reaches `Idle`. An empty batch fails the
//! run without touching the disk. A saved batch is `Done` even if every
//! source in it failed.

use crate::config::{self, Config, ConfigError};
use crate::extract::extract_all;
use crate::fetcher::{HttpGet, Pause, ReqwestGet, RetryFetcher, TokioPause};
use crate::models::OutcomeRecord;
use crate::outputs::json::{SavedBatch, persist};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// Failures that stop the pipeline before a run starts.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Why a run ended in [`RunState::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RunFailure {
    #[error("no data extracted")]
    EmptyBatch,
    #[error("failed to save data")]
    Persistence,
}

/// Lifecycle of one run.
///
/// ```text
/// Idle -> Extracting -> Persisting -> Done
///              |             |
///              +-------------+--> Failed
/// ```
///
/// `Extracting` fails only when there were no sources; `Persisting` fails
/// when the batch could not be saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Extracting,
    Persisting,
    Done,
    Failed(RunFailure),
}

/// What a finished run produced.
#[derive(Debug)]
pub struct RunReport {
    /// Always `Done` or `Failed`.
    pub state: RunState,
    pub records: Vec<OutcomeRecord>,
    pub saved: Option<SavedBatch>,
}

impl RunReport {
    pub fn is_done(&self) -> bool {
        self.state == RunState::Done
    }

    pub fn succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.records.len() - self.succeeded()
    }
}

/// Owns the configuration and the retrying fetcher for one run.
pub struct Extractor<C = ReqwestGet, P = TokioPause> {
    config: Config,
    fetcher: RetryFetcher<C, P>,
}

impl Extractor {
    /// Load the configuration at `path` and build the shared HTTP client.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StartupError> {
        let config = config::load_config(path)?;
        let client = ReqwestGet::new(&config.scraping)?;
        Ok(Self::with_parts(config, client, TokioPause))
    }
}

impl<C, P> Extractor<C, P>
where
    C: HttpGet,
    P: Pause,
{
    /// Assemble an extractor from an already loaded config.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration; its `scraping` section sets the
    ///   retry count and delay
    /// * `client` - The single-GET implementation, reused for every attempt
    /// * `pause` - The wait between attempts
    pub fn with_parts(config: Config, client: C, pause: P) -> Self {
        let fetcher = RetryFetcher::from_config(client, pause, &config.scraping);
        Self { config, fetcher }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn fetcher(&self) -> &RetryFetcher<C, P> {
        &self.fetcher
    }

    /// Extract every configured source, then persist the batch.
    #[instrument(level = "info", skip_all)]
    pub async fn run(&self) -> RunReport {
        info!("BPL-Extract starting");
        let mut state = RunState::Idle;

        transition(&mut state, RunState::Extracting);
        let records = extract_all(&self.fetcher, &self.config.targets.news_sources).await;

        if records.is_empty() {
            warn!("No data extracted");
            transition(&mut state, RunState::Failed(RunFailure::EmptyBatch));
            return RunReport {
                state,
                records,
                saved: None,
            };
        }

        transition(&mut state, RunState::Persisting);
        let saved = persist(&records, &self.config.output).await;

        if saved.is_some() {
            info!("BPL-Extract completed successfully");
            transition(&mut state, RunState::Done);
        } else {
            error!("BPL-Extract failed to save data");
            transition(&mut state, RunState::Failed(RunFailure::Persistence));
        }

        RunReport {
            state,
            records,
            saved,
        }
    }
}

fn transition(state: &mut RunState, next: RunState) {
    debug!(from = ?state, to = ?next, "Run state change");
    *state = next;
}
