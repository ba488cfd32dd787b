//! Configuration Loading Tests
//!
//! - Valid files load and drive construction
//! - Missing fields fall back to defaults
//! - Out-of-range values are rejected, never silently clamped

use catalog_index::index::{IndexErrorCode, ProbingConfig, ProbingIndex};
use std::fs;
use tempfile::TempDir;

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("probing.json");
    fs::write(&path, body).unwrap();
    path
}

/// Full config file is honored.
#[test]
fn test_load_full_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, r#"{"initial_capacity": 64, "load_factor_threshold": 0.5}"#);

    let config = ProbingConfig::load(&path).unwrap();
    assert_eq!(config.initial_capacity, 64);
    assert_eq!(config.load_factor_threshold, 0.5);

    let table: ProbingIndex<u32, u32> = ProbingIndex::with_config(config).unwrap();
    assert_eq!(table.capacity(), 64);
}

/// Empty object means defaults.
#[test]
fn test_load_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "{}");

    assert_eq!(ProbingConfig::load(&path).unwrap(), ProbingConfig::default());
}

/// Threshold of 1.0 is rejected.
#[test]
fn test_load_rejects_threshold() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, r#"{"load_factor_threshold": 1.0}"#);

    let err = ProbingConfig::load(&path).unwrap_err();
    assert_eq!(err.code(), IndexErrorCode::InvalidConfig);
}

/// Malformed JSON and missing files are load failures.
#[test]
fn test_load_failures() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "{not json");
    assert_eq!(
        ProbingConfig::load(&path).unwrap_err().code(),
        IndexErrorCode::ConfigLoadFailed
    );

    let missing = dir.path().join("absent.json");
    assert_eq!(
        ProbingConfig::load(&missing).unwrap_err().code(),
        IndexErrorCode::ConfigLoadFailed
    );
}
