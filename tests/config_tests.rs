//! Tests for the configuration system and its file round trip

use golomb_engine::config::{CheckpointConfig, EngineConfig};
use golomb_engine::error::{ConfigError, GolombError};
use golomb_engine::simd::ProbeBackend;
use std::path::PathBuf;

#[test]
fn test_default_config_is_valid() {
    let config = EngineConfig::default();
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_thread_count_rejected() {
    let mut config = EngineConfig::default();
    config.search.threads = 0;
    match config.validate() {
        Err(GolombError::Config(ConfigError::InvalidValue { field, .. })) => {
            assert_eq!(field, "search.threads");
        }
        other => panic!("expected InvalidValue, got {:?}", other.err()),
    }
}

#[test]
fn test_invalid_checkpoint_interval_rejected() {
    let mut config = EngineConfig::default();
    config.checkpoint = CheckpointConfig { path: Some(PathBuf::from("cp.bin")), interval_secs: 0 };
    assert!(config.validate().is_err());
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.json");

    let mut config = EngineConfig::default();
    config.search.threads = 3;
    config.search.use_reference_hints = false;
    config.simd.forced_backend = Some(ProbeBackend::Avx2Gather);
    config.checkpoint.path = Some(PathBuf::from("search.grcp"));
    config.checkpoint.interval_secs = 5;

    config.to_file(&path).expect("save");
    let loaded = EngineConfig::from_file(&path).expect("load");
    assert_eq!(loaded, config);
}

#[test]
fn test_missing_file_reports_not_found() {
    match EngineConfig::from_file("/nonexistent/golomb-config.json") {
        Err(GolombError::Config(ConfigError::FileNotFound { .. })) => {}
        other => panic!("expected FileNotFound, got {:?}", other.err()),
    }
}

#[test]
fn test_malformed_file_reports_parse_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").expect("write");

    match EngineConfig::from_file(&path) {
        Err(GolombError::Config(ConfigError::ParseError { .. })) => {}
        other => panic!("expected ParseError, got {:?}", other.err()),
    }
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("partial.json");
    std::fs::write(&path, r#"{"search": {"threads": 2, "use_reference_hints": true, "heuristic_start": false, "debug_logging": false}}"#)
        .expect("write");

    let loaded = EngineConfig::from_file(&path).expect("load");
    assert_eq!(loaded.search.threads, 2);
    assert_eq!(loaded.checkpoint, CheckpointConfig::default());
}
