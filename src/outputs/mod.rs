//! Output generation.
//!
//! - [`json`]: writes a run's outcome records to timestamped JSON files,
//!   with an optional backup copy

pub mod json;
