//! Small helpers shared across the pipeline.

use chrono::{DateTime, Local, TimeZone};

/// `strftime` pattern for run stamps used in output file names.
pub const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Current local time as a run stamp, e.g. `20250506_203000`.
pub fn run_stamp() -> String {
    format_stamp(&Local::now())
}

/// Format any timestamp as a run stamp. Second granularity.
pub fn format_stamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(STAMP_FORMAT).to_string()
}
