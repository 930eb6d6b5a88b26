//! Configuration loading and validation.
//!
//! The configuration is read once, before any network activity, and handed to
//! the rest of the pipeline as a fully validated [`Config`]. Every key is
//! required: a missing key is a parse error, never a silently substituted
//! default.
//!
//! # Shape
//!
//! ```json
//! {
//!   "scraping": {
//!     "max_retries": 3,
//!     "retry_delay": 2.0,
//!     "timeout": 30,
//!     "user_agent": "BPL-Extract/1.0"
//!   },
//!   "targets": { "news_sources": ["https://example.com/politics"] },
//!   "output": { "format": "json", "save_path": "./data", "backup_enabled": true }
//! }
//! ```
//!
//! Files ending in `.yaml` or `.yml` are read as YAML; everything else as JSON.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, instrument};

/// Errors raised while loading the configuration. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file {} not found", .path.display())]
    NotFound { path: PathBuf },
    #[error("configuration file {} could not be read: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration document {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    #[error("configuration {} rejected: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse as JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// The full run configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub scraping: ScrapingConfig,
    pub targets: TargetsConfig,
    pub output: OutputConfig,
}

/// Request behaviour shared by every fetch in a run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScrapingConfig {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    /// Seconds to wait between two attempts.
    pub retry_delay: f64,
    /// Per-request timeout in seconds.
    pub timeout: f64,
    pub user_agent: String,
}

impl ScrapingConfig {
    /// The wait between attempts.
    ///
    /// Out-of-range values are rejected by [`load_config`]; on a hand-built
    /// config they saturate to [`Duration::MAX`].
    pub fn retry_delay(&self) -> Duration {
        seconds(self.retry_delay).unwrap_or(Duration::MAX)
    }

    /// The per-request timeout. Saturates like [`Self::retry_delay`].
    pub fn timeout(&self) -> Duration {
        seconds(self.timeout).unwrap_or(Duration::MAX)
    }
}

fn seconds(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value).ok()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetsConfig {
    /// Fetched in this order.
    pub news_sources: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Only `json` is supported; the key may be omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub save_path: PathBuf,
    /// When set, every batch is also written under `save_path/backup`.
    pub backup_enabled: bool,
}

impl OutputConfig {
    pub fn backup_dir(&self) -> PathBuf {
        self.save_path.join("backup")
    }
}

/// Read, parse and validate the configuration at `path`.
///
/// # Errors
///
/// - [`ConfigError::NotFound`] if nothing exists at `path`
/// - [`ConfigError::Unreadable`] for any other I/O failure
/// - [`ConfigError::Parse`] if the document is malformed or a key is missing
/// - [`ConfigError::Invalid`] if a value is out of range
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            error!("Configuration file not found");
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            error!(error = %e, "Configuration file could not be read");
            return Err(ConfigError::Unreadable {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let config = parse_config(path, &raw).map_err(|source| {
        error!(error = %source, "Configuration document is malformed");
        ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        }
    })?;

    if let Err(reason) = config.validate() {
        error!(%reason, "Configuration rejected");
        return Err(ConfigError::Invalid {
            path: path.to_path_buf(),
            reason,
        });
    }

    info!(
        sources = config.targets.news_sources.len(),
        max_retries = config.scraping.max_retries,
        "Configuration loaded"
    );
    Ok(config)
}

fn parse_config(path: &Path, raw: &str) -> Result<Config, ParseError> {
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        Ok(serde_yaml::from_str(raw)?)
    } else {
        Ok(serde_json::from_str(raw)?)
    }
}

impl Config {
    fn validate(&self) -> Result<(), String> {
        let s = &self.scraping;
        if seconds(s.timeout).is_none_or(|t| t.is_zero()) {
            return Err(format!(
                "scraping.timeout must be a positive number of seconds, got {}",
                s.timeout
            ));
        }
        if seconds(s.retry_delay).is_none() {
            return Err(format!(
                "scraping.retry_delay must be a non-negative number of seconds, got {}",
                s.retry_delay
            ));
        }
        if s.user_agent.trim().is_empty() {
            return Err("scraping.user_agent must not be empty".to_string());
        }
        if let Some(i) = self
            .targets
            .news_sources
            .iter()
            .position(|u| u.trim().is_empty())
        {
            return Err(format!("targets.news_sources[{i}] is empty"));
        }
        if self.output.save_path.as_os_str().is_empty() {
            return Err("output.save_path must not be empty".to_string());
        }
        match self.output.format.as_deref() {
            None | Some("json") => Ok(()),
            Some(other) => Err(format!("output.format {other:?} is not supported (only \"json\")")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const VALID: &str = r#"{
        "scraping": {
            "max_retries": 2,
            "retry_delay": 0.1,
            "timeout": 5,
            "user_agent": "Test-BPL-Extract/1.0"
        },
        "targets": { "news_sources": ["https://ok.example", "https://down.example"] },
        "output": { "format": "json", "save_path": "data", "backup_enabled": true }
    }"#;

    fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_valid_json() {
        let dir = TempDir::new().unwrap();
        let cfg = load_config(write(&dir, "config.json", VALID)).unwrap();

        assert_eq!(cfg.scraping.max_retries, 2);
        assert_eq!(cfg.scraping.user_agent, "Test-BPL-Extract/1.0");
        assert_eq!(cfg.scraping.retry_delay(), Duration::from_millis(100));
        assert_eq!(cfg.scraping.timeout(), Duration::from_secs(5));
        assert_eq!(
            cfg.targets.news_sources,
            vec!["https://ok.example", "https://down.example"]
        );
        assert!(cfg.output.backup_enabled);
        assert_eq!(cfg.output.backup_dir(), PathBuf::from("data").join("backup"));
    }

    #[test]
    fn test_load_valid_yaml() {
        let dir = TempDir::new().unwrap();
        let yaml = r#"
scraping:
  max_retries: 0
  retry_delay: 1.5
  timeout: 10
  user_agent: yaml-agent
targets:
  news_sources:
    - https://a.example
output:
  save_path: ./out
  backup_enabled: false
"#;
        let cfg = load_config(write(&dir, "config.yaml", yaml)).unwrap();
        assert_eq!(cfg.scraping.max_retries, 0);
        assert_eq!(cfg.output.format, None);
        assert!(!cfg.output.backup_enabled);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = load_config(dir.path().join("nonexistent_config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let err = load_config(write(&dir, "config.json", "{ \"scraping\": ")).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Parse {
                source: ParseError::Json(_),
                ..
            }
        ));
    }

    #[test]
    fn test_missing_key_has_no_default() {
        let dir = TempDir::new().unwrap();
        let body = VALID.replace("\"backup_enabled\": true", "\"unused\": 1");
        let err = load_config(write(&dir, "config.json", &body)).unwrap_err();
        match err {
            ConfigError::Parse { source, .. } => {
                assert!(source.to_string().contains("backup_enabled"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_timeout_is_invalid() {
        let dir = TempDir::new().unwrap();
        let body = VALID.replace("\"timeout\": 5", "\"timeout\": 0");
        let err = load_config(write(&dir, "config.json", &body)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_negative_retry_delay_is_invalid() {
        let dir = TempDir::new().unwrap();
        let body = VALID.replace("\"retry_delay\": 0.1", "\"retry_delay\": -1");
        let err = load_config(write(&dir, "config.json", &body)).unwrap_err();
        assert!(err.to_string().contains("retry_delay"));
    }

    #[test]
    fn test_unrepresentable_durations_are_invalid() {
        let dir = TempDir::new().unwrap();
        for (from, to) in [
            ("\"retry_delay\": 0.1", "\"retry_delay\": 1e30"),
            ("\"timeout\": 5", "\"timeout\": 1e30"),
        ] {
            let body = VALID.replace(from, to);
            let err = load_config(write(&dir, "config.json", &body)).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { .. }), "{to}: {err:?}");
        }
    }

    #[test]
    fn test_duration_accessors_saturate() {
        let scraping = ScrapingConfig {
            max_retries: 0,
            retry_delay: 1e30,
            timeout: f64::INFINITY,
            user_agent: "agent".to_string(),
        };
        assert_eq!(scraping.retry_delay(), Duration::MAX);
        assert_eq!(scraping.timeout(), Duration::MAX);
    }

    #[test]
    fn test_negative_max_retries_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let body = VALID.replace("\"max_retries\": 2", "\"max_retries\": -1");
        let err = load_config(write(&dir, "config.json", &body)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_blank_source_is_invalid() {
        let dir = TempDir::new().unwrap();
        let body = VALID.replace("\"https://down.example\"", "\"  \"");
        let err = load_config(write(&dir, "config.json", &body)).unwrap_err();
        assert!(err.to_string().contains("news_sources[1]"));
    }

    #[test]
    fn test_unsupported_format_is_invalid() {
        let dir = TempDir::new().unwrap();
        let body = VALID.replace("\"format\": \"json\"", "\"format\": \"csv\"");
        let err = load_config(write(&dir, "config.json", &body)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_empty_source_list_is_valid_config() {
        let dir = TempDir::new().unwrap();
        let body = VALID.replace(
            "[\"https://ok.example\", \"https://down.example\"]",
            "[]",
        );
        let cfg = load_config(write(&dir, "config.json", &body)).unwrap();
        assert!(cfg.targets.news_sources.is_empty());
    }
}
