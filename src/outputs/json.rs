//! JSON output for a run's outcome records.
//!
//! # Output Structure
//!
//! ```text
//! save_path/
//! ├── bpl_extract_20250506_203000.json
//! ├── bpl_extract_20250506_203000_1.json   # second run within the same second
//! └── backup/
//!     ├── bpl_extract_20250506_203000.json
//!     └── bpl_extract_20250506_203000_1.json
//! ```
//!
//! Both files are opened with create-new semantics, so an existing batch is
//! never overwritten. The suffix picked is the first one free in both
//! directories, so primary and backup always share a name.

use crate::config::OutputConfig;
use crate::models::OutcomeRecord;
use crate::utils::run_stamp;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, instrument, warn};

/// Upper bound on `_N` suffixes tried for one timestamp.
const MAX_NAME_SUFFIX: u32 = 1000;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Files written for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedBatch {
    pub primary: PathBuf,
    pub backup: Option<PathBuf>,
}

/// `bpl_extract_<stamp>.json`, or `bpl_extract_<stamp>_<n>.json` for `n > 0`.
pub fn batch_file_name(stamp: &str, n: u32) -> String {
    if n == 0 {
        format!("bpl_extract_{stamp}.json")
    } else {
        format!("bpl_extract_{stamp}_{n}.json")
    }
}

/// Write `records` as a JSON array under `output.save_path`, plus a backup
/// copy when enabled.
///
/// # Arguments
///
/// * `records` - The batch, serialized in order
/// * `output` - Target directory and backup switch
/// * `stamp` - Run stamp embedded in the file name (see [`batch_file_name`])
///
/// # Returns
///
/// The paths actually written. The primary and backup share one file name,
/// the first one free in both directories.
///
/// # Errors
///
/// Any directory creation, serialization or write failure. A file that was
/// created but could not be fully written is removed again.
#[instrument(level = "info", skip_all, fields(save_path = %output.save_path.display(), %stamp, records = records.len()))]
pub async fn write_batch(
    records: &[OutcomeRecord],
    output: &OutputConfig,
    stamp: &str,
) -> Result<SavedBatch, PersistError> {
    let json = serde_json::to_vec_pretty(records)?;

    create_dir(&output.save_path).await?;
    let backup_dir = if output.backup_enabled {
        let dir = output.backup_dir();
        create_dir(&dir).await?;
        Some(dir)
    } else {
        None
    };

    let claimed = claim_names(&output.save_path, backup_dir.as_deref(), stamp).await?;
    let (primary, primary_file) = claimed.primary;

    if let Err(e) = write_contents(primary_file, &primary, &json).await {
        if let Some((path, file)) = claimed.backup {
            drop(file);
            discard(&path).await;
        }
        return Err(e);
    }
    info!(path = %primary.display(), "Data saved");

    let backup = match claimed.backup {
        Some((path, file)) => {
            write_contents(file, &path, &json).await?;
            info!(path = %path.display(), "Backup created");
            Some(path)
        }
        None => None,
    };

    Ok(SavedBatch { primary, backup })
}

/// Persist a batch, stamped with the current local time.
///
/// Returns `None` after logging the cause if anything fails; the caller
/// decides whether that sinks the run.
pub async fn persist(records: &[OutcomeRecord], output: &OutputConfig) -> Option<SavedBatch> {
    match write_batch(records, output, &run_stamp()).await {
        Ok(saved) => Some(saved),
        Err(e) => {
            error!(error = %e, "Failed to save data");
            None
        }
    }
}

async fn create_dir(path: &Path) -> Result<(), PersistError> {
    fs::create_dir_all(path)
        .await
        .map_err(|source| PersistError::CreateDir {
            path: path.to_path_buf(),
            source,
        })
}

/// Empty files created for one batch, not yet written.
struct Claimed {
    primary: (PathBuf, File),
    backup: Option<(PathBuf, File)>,
}

/// Create the first `bpl_extract_<stamp>[_n].json` that exists in neither
/// `dir` nor `backup_dir`.
async fn claim_names(
    dir: &Path,
    backup_dir: Option<&Path>,
    stamp: &str,
) -> Result<Claimed, PersistError> {
    let mut last_path = dir.join(batch_file_name(stamp, 0));

    for n in 0..=MAX_NAME_SUFFIX {
        let file_name = batch_file_name(stamp, n);
        let path = dir.join(&file_name);
        let Some(file) = create_new(&path).await? else {
            last_path = path;
            continue;
        };

        let Some(backup_dir) = backup_dir else {
            return Ok(Claimed {
                primary: (path, file),
                backup: None,
            });
        };

        let backup_path = backup_dir.join(&file_name);
        match create_new(&backup_path).await {
            Ok(Some(backup_file)) => {
                return Ok(Claimed {
                    primary: (path, file),
                    backup: Some((backup_path, backup_file)),
                });
            }
            Ok(None) => {
                debug!(path = %backup_path.display(), "Backup name taken, trying next suffix");
                drop(file);
                discard(&path).await;
                last_path = backup_path;
            }
            Err(e) => {
                drop(file);
                discard(&path).await;
                return Err(e);
            }
        }
    }

    Err(PersistError::Write {
        path: last_path,
        source: io::Error::new(
            io::ErrorKind::AlreadyExists,
            "no free file name left for this timestamp",
        ),
    })
}

/// `Ok(None)` if something already exists at `path`.
async fn create_new(path: &Path) -> Result<Option<File>, PersistError> {
    let opened = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await;
    match opened {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(None),
        Err(source) => Err(PersistError::Write {
            path: path.to_path_buf(),
            source,
        }),
    }
}

async fn write_contents(mut file: File, path: &Path, bytes: &[u8]) -> Result<(), PersistError> {
    let written = async {
        file.write_all(bytes).await?;
        file.flush().await
    }
    .await;
    drop(file);

    if let Err(source) = written {
        // A truncated batch file is worse than none.
        discard(path).await;
        return Err(PersistError::Write {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        warn!(path = %path.display(), error = %e, "Failed to remove unused file");
    }
}
