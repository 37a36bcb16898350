//! Config file round-trips.

use std::io::Write;

use stage_engine::{EngineConfig, EngineError};

#[test]
fn partial_file_fills_in_defaults() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "frame_rate = 144").expect("write config");
    writeln!(file, "gravity = [0.0, -20.0]").expect("write config");

    let config = EngineConfig::load(file.path()).expect("config loads");
    assert_eq!(config.frame_rate, 144);
    assert!((config.gravity_vec().y + 20.0).abs() < 1e-6);
    // Untouched fields keep their defaults.
    assert_eq!(config.worker_threads, 0);
    assert!(!config.debug);
}

#[test]
fn missing_file_reports_the_path() {
    let result = EngineConfig::load("/nonexistent/stage-engine.toml");
    match result {
        Err(EngineError::ConfigIo { path, .. }) => {
            assert!(path.ends_with("stage-engine.toml"));
        }
        other => panic!("expected ConfigIo error, got {other:?}"),
    }
}

#[test]
fn malformed_file_is_a_parse_error() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "frame_rate = \"fast\"").expect("write config");
    assert!(matches!(
        EngineConfig::load(file.path()),
        Err(EngineError::ConfigParse { .. })
    ));
}
