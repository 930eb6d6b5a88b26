//! HTTP fetching with a bounded, fixed-delay retry loop.
//!
//! # Architecture
//!
//! - [`HttpGet`]: one GET, no retries. [`ReqwestGet`] is the production
//!   implementation over a shared `reqwest::Client`.
//! - [`Pause`]: the wait between attempts. [`TokioPause`] sleeps on the tokio
//!   timer.
//! - [`RetryFetcher`]: drives an [`HttpGet`] up to `max_retries + 1` times,
//!   pausing exactly once between consecutive attempts and never after the
//!   last one.
//!
//! Network failures never escape [`RetryFetcher::fetch`]; the caller gets a
//! [`FetchResult`] that is either a response descriptor or an exhaustion
//! signal.

use crate::config::ScrapingConfig;
use crate::models::FetchedPage;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};
use url::Url;

/// Why a single attempt failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("request timed out")]
    Timeout,
    #[error("server responded with HTTP {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

/// A single HTTP GET.
///
/// Implementations report non-2xx responses as [`FetchError::Status`].
pub trait HttpGet {
    async fn get(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// The wait between two attempts.
pub trait Pause {
    async fn pause(&self, delay: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPause;

impl Pause for TokioPause {
    async fn pause(&self, delay: Duration) {
        sleep(delay).await;
    }
}

/// [`HttpGet`] over one `reqwest::Client`, reused for every attempt.
#[derive(Debug, Clone)]
pub struct ReqwestGet {
    client: reqwest::Client,
}

impl ReqwestGet {
    /// Build a client that sends the configured user agent and enforces the
    /// per-request timeout.
    pub fn new(scraping: &ScrapingConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(scraping.user_agent.clone())
            .timeout(scraping.timeout())
            .build()?;
        Ok(Self { client })
    }
}

impl HttpGet for ReqwestGet {
    async fn get(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let response = self.client.get(parsed).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        Ok(FetchedPage {
            status_code: status.as_u16(),
            content_length: body.len(),
        })
    }
}

/// Terminal outcome of [`RetryFetcher::fetch`].
#[derive(Debug)]
pub enum FetchResult {
    Fetched { page: FetchedPage, attempts: u64 },
    /// Every allowed attempt failed. `last_error` is kept for diagnostics only.
    Exhausted { attempts: u64, last_error: FetchError },
}

impl FetchResult {
    pub fn attempts(&self) -> u64 {
        match self {
            FetchResult::Fetched { attempts, .. } | FetchResult::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn page(&self) -> Option<FetchedPage> {
        match self {
            FetchResult::Fetched { page, .. } => Some(*page),
            FetchResult::Exhausted { .. } => None,
        }
    }
}

/// Retry wrapper with a fixed delay between attempts.
///
/// ```text
/// attempt 1 -> fail -> pause(retry_delay) -> attempt 2 -> ... -> attempt max_retries + 1
/// ```
pub struct RetryFetcher<C, P = TokioPause> {
    inner: C,
    pause: P,
    /// Default number of additional attempts after the first.
    max_retries: u32,
    retry_delay: Duration,
}

impl<C, P> RetryFetcher<C, P>
where
    C: HttpGet,
    P: Pause,
{
    pub fn new(inner: C, pause: P, max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            inner,
            pause,
            max_retries,
            retry_delay,
        }
    }

    pub fn from_config(inner: C, pause: P, scraping: &ScrapingConfig) -> Self {
        Self::new(inner, pause, scraping.max_retries, scraping.retry_delay())
    }

    /// Fetch `url`, retrying on any transport error, timeout or non-2xx status.
    ///
    /// `max_retries` overrides the configured default for this call only.
    #[instrument(level = "info", skip_all, fields(%url, ?max_retries))]
    pub async fn fetch(&self, url: &str, max_retries: Option<u32>) -> FetchResult {
        let max_attempts = max_attempts(max_retries.unwrap_or(self.max_retries));
        let total_t0 = Instant::now();
        let mut attempt = 0u64;

        loop {
            attempt += 1;
            info!(attempt, max_attempts, "Attempting fetch");
            let attempt_t0 = Instant::now();

            match self.inner.get(url).await {
                Ok(page) => {
                    info!(
                        attempt,
                        status_code = page.status_code,
                        bytes = page.content_length,
                        elapsed_ms = attempt_t0.elapsed().as_millis() as u64,
                        "Fetched"
                    );
                    return FetchResult::Fetched {
                        page,
                        attempts: attempt,
                    };
                }
                Err(e) => {
                    warn!(
                        attempt,
                        max_attempts,
                        elapsed_ms = attempt_t0.elapsed().as_millis() as u64,
                        error = %e,
                        "Attempt failed"
                    );

                    if attempt >= max_attempts {
                        error!(
                            attempts = attempt,
                            elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                            error = %e,
                            "All retry attempts failed"
                        );
                        return FetchResult::Exhausted {
                            attempts: attempt,
                            last_error: e,
                        };
                    }

                    info!(delay = ?self.retry_delay, "Retrying after delay");
                    self.pause.pause(self.retry_delay).await;
                }
            }
        }
    }
}

/// `max_retries + 1`, counted wide so `u32::MAX` retries still means one more attempt.
fn max_attempts(max_retries: u32) -> u64 {
    u64::from(max_retries) + 1
}

impl<C, P> fmt::Debug for RetryFetcher<C, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetcher")
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .finish()
    }
}
