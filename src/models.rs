//! Data models for fetch outcomes.
//!
//! - [`FetchedPage`]: what a single successful GET tells us about a source
//! - [`OutcomeRecord`]: the per-source result written to the run output file
//!
//! An [`OutcomeRecord`] serializes flat, with `status` as the discriminator:
//!
//! ```json
//! {"source":"https://a.example","timestamp":"2025-05-06T20:30:00.123456+02:00","status":"success","content_length":5120,"status_code":200}
//! {"source":"https://b.example","timestamp":"2025-05-06T20:30:07.654321+02:00","status":"failed","error":"All retry attempts failed"}
//! ```

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Error text stored on every failed record. The underlying cause is only logged.
pub const EXHAUSTED_ERROR: &str = "All retry attempts failed";

/// Response descriptor for a successful GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchedPage {
    /// HTTP status code (always 2xx).
    pub status_code: u16,
    /// Body length in bytes.
    pub content_length: usize,
}

/// Result of processing one source. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OutcomeRecord {
    /// The URL that was attempted.
    pub source: String,
    /// When the record was created.
    pub timestamp: DateTime<Local>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Success {
        content_length: usize,
        status_code: u16,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success,
    Failed,
}

impl OutcomeRecord {
    pub fn success(source: impl Into<String>, page: FetchedPage) -> Self {
        Self {
            source: source.into(),
            timestamp: Local::now(),
            outcome: Outcome::Success {
                content_length: page.content_length,
                status_code: page.status_code,
            },
        }
    }

    pub fn failed(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            timestamp: Local::now(),
            outcome: Outcome::Failed {
                error: EXHAUSTED_ERROR.to_string(),
            },
        }
    }

    pub fn status(&self) -> OutcomeStatus {
        match self.outcome {
            Outcome::Success { .. } => OutcomeStatus::Success,
            Outcome::Failed { .. } => OutcomeStatus::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == OutcomeStatus::Success
    }
}
