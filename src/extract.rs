//! Source extraction loop.
//!
//! Walks the configured sources in order, one at a time, and turns every
//! fetch into exactly one [`OutcomeRecord`]. A failing source is recorded and
//! the loop moves on; nothing here aborts the batch.

use crate::fetcher::{FetchResult, HttpGet, Pause, RetryFetcher};
use crate::models::OutcomeRecord;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

/// Fetch every source and collect one record per source, in input order.
///
/// # Arguments
///
/// * `fetcher` - Retrying fetcher shared by every source
/// * `sources` - URLs to fetch, strictly one after another
///
/// # Returns
///
/// Exactly `sources.len()` records. Sources that exhausted their retries
/// come back as failed records rather than errors.
#[instrument(level = "info", skip_all, fields(sources = sources.len()))]
pub async fn extract_all<C, P>(fetcher: &RetryFetcher<C, P>, sources: &[String]) -> Vec<OutcomeRecord>
where
    C: HttpGet,
    P: Pause,
{
    info!("Starting news data extraction");

    // `then` polls one future at a time, which keeps fetches strictly sequential.
    let records: Vec<OutcomeRecord> = stream::iter(sources)
        .then(|source| async move {
            match fetcher.fetch(source, None).await {
                FetchResult::Fetched { page, attempts } => {
                    debug!(%source, attempts, "Extracted data");
                    OutcomeRecord::success(source.as_str(), page)
                }
                FetchResult::Exhausted {
                    attempts,
                    last_error,
                } => {
                    warn!(%source, attempts, error = %last_error, "Source failed; continuing with the rest");
                    OutcomeRecord::failed(source.as_str())
                }
            }
        })
        .collect()
        .await;

    let succeeded = records.iter().filter(|r| r.is_success()).count();
    info!(
        total = records.len(),
        succeeded,
        failed = records.len() - succeeded,
        "Finished news data extraction"
    );
    records
}
