use assert_cmd::Command;
use std::fs;
use tempfile::TempDir;

fn write_config(dir: &TempDir, sources: &[&str]) -> std::path::PathBuf {
    let config = serde_json::json!({
        "scraping": {
            "max_retries": 1,
            "retry_delay": 0,
            "timeout": 5,
            "user_agent": "Test-BPL-Extract/1.0"
        },
        "targets": { "news_sources": sources },
        "output": {
            "format": "json",
            "save_path": dir.path().join("data"),
            "backup_enabled": true
        }
    });
    let path = dir.path().join("config.json");
    fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    path
}

fn bpl_extract(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bpl_extract").unwrap();
    cmd.current_dir(dir.path()).env_remove("BPL_EXTRACT_CONFIG").arg("--no-log-file");
    cmd
}

#[test]
fn test_missing_config_exits_with_config_error() {
    let dir = TempDir::new().unwrap();

    let output = bpl_extract(&dir)
        .args(["--config", "nonexistent_config.json"])
        .assert()
        .failure()
        .code(2)
        .get_output()
        .clone();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not found"));
    assert!(!dir.path().join("data").exists());
}

#[test]
fn test_malformed_config_exits_with_config_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("config.json"), "{ not json").unwrap();

    bpl_extract(&dir).assert().failure().code(2);
}

#[test]
fn test_empty_source_list_fails_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &[]);

    bpl_extract(&dir)
        .arg("--config")
        .arg(&config)
        .arg("run")
        .assert()
        .failure()
        .code(3);

    assert!(!dir.path().join("data").exists());
}

#[test]
fn test_check_prints_configuration() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &["https://a.example", "https://b.example"]);

    let output = bpl_extract(&dir)
        .arg("--config")
        .arg(&config)
        .arg("check")
        .assert()
        .success()
        .get_output()
        .clone();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Max Retries: 1"));
    assert!(stdout.contains("1. https://a.example"));
    assert!(stdout.contains("2. https://b.example"));
}

#[test]
fn test_fetch_reports_exhaustion() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &["https://a.example"]);

    let output = bpl_extract(&dir)
        .arg("--config")
        .arg(&config)
        .args(["fetch", "not a url", "--max-retries", "2"])
        .assert()
        .failure()
        .code(3)
        .get_output()
        .clone();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("all 3 attempt(s) failed"));
}

#[test]
fn test_run_with_unreachable_source_still_saves_batch() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &["not a url"]);

    bpl_extract(&dir)
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    let saved: Vec<_> = fs::read_dir(dir.path().join("data"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.is_file())
        .collect();
    assert_eq!(saved.len(), 1);
    let records: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&saved[0]).unwrap()).unwrap();
    assert_eq!(records[0]["status"], "failed");
    assert_eq!(records[0]["error"], "All retry attempts failed");
    assert!(dir.path().join("data").join("backup").is_dir());
}
