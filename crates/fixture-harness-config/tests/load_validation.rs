//! Config loading tests for fixture-harness-config.
// crates/fixture-harness-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Tests
// Description: Validate file resolution, size limits, and source tracking.
// Purpose: Ensure config files are read safely from explicit paths.
// =============================================================================

use std::fs;

use fixture_harness_config::ConfigError;
use fixture_harness_config::HarnessConfig;

mod common;

use common::TestResult;

#[test]
fn explicit_path_is_loaded_and_recorded() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("fixture-harness.toml");
    fs::write(&path, "[runner]\nconcurrency = 2\n").map_err(|err| err.to_string())?;

    let config = HarnessConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    if config.runner.concurrency != Some(2) {
        return Err("concurrency not loaded".to_string());
    }
    if config.source.as_deref() != Some(path.as_path()) {
        return Err("source path not recorded".to_string());
    }
    Ok(())
}

#[test]
fn missing_explicit_path_is_an_io_error() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    match HarnessConfig::load(Some(&dir.path().join("absent.toml"))) {
        Err(ConfigError::Io(_)) => Ok(()),
        Err(err) => Err(format!("unexpected error {err}")),
        Ok(_) => Err("missing config should fail".to_string()),
    }
}

#[test]
fn oversized_config_is_rejected() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("big.toml");
    let padding = format!("# {}\n", "x".repeat(1024 * 1024));
    fs::write(&path, padding).map_err(|err| err.to_string())?;
    common::assert_invalid(HarnessConfig::load(Some(&path)).map(|_| ()), "size limit")
}

#[test]
fn invalid_values_fail_on_load() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("fixture-harness.toml");
    fs::write(&path, "[runner]\ntimeout_ms = 5\n").map_err(|err| err.to_string())?;
    common::assert_invalid(HarnessConfig::load(Some(&path)).map(|_| ()), "runner.timeout_ms")
}
