// crates/fixture-harness-core/src/interfaces/mod.rs
// ============================================================================
// Module: Fixture Harness Interfaces
// Description: Executor contract between the runner and the monitored runtime.
// Purpose: Keep fixture execution pluggable and testable without a real runtime.
// Dependencies: crate::core, async-trait, thiserror
// ============================================================================

//! ## Overview
//! The harness never runs fixtures itself. An [`Executor`] receives the
//! fixture path with its configuration overrides and request headers, and
//! returns everything it captured as a [`CapturedResult`]. Guard scripts
//! (`SKIPIF`) go through the same executor so they see the same runtime.
//!
//! Security posture: executors run untrusted fixture code; the runner always
//! bounds them with a timeout and drops in-flight executions on cancellation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::capture::CapturedResult;
use crate::core::fixture::Fixture;

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Request to execute one fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    /// Fixture file path.
    pub fixture_path: PathBuf,
    /// Configuration overrides in declaration order.
    pub ini: Vec<(String, String)>,
    /// Request headers in declaration order.
    pub headers: Vec<(String, String)>,
}

impl ExecutionRequest {
    /// Builds the request for a parsed fixture.
    #[must_use]
    pub fn for_fixture(fixture: &Fixture) -> Self {
        Self {
            fixture_path: fixture.path().to_path_buf(),
            ini: fixture.ini().to_vec(),
            headers: fixture.headers().to_vec(),
        }
    }
}

/// Request to evaluate a fixture's guard script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardRequest {
    /// Fixture whose guard is evaluated.
    pub fixture_path: PathBuf,
    /// Guard script source.
    pub script: String,
    /// Configuration overrides in declaration order.
    pub ini: Vec<(String, String)>,
}

impl GuardRequest {
    /// Builds the guard request for a fixture, if it declares a guard.
    #[must_use]
    pub fn for_fixture(fixture: &Fixture) -> Option<Self> {
        fixture.skip_guard().map(|script| Self {
            fixture_path: fixture.path().to_path_buf(),
            script: script.to_string(),
            ini: fixture.ini().to_vec(),
        })
    }
}

// ============================================================================
// SECTION: Executor
// ============================================================================

/// Executor errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    /// The runtime process could not be started.
    #[error("failed to start runtime: {0}")]
    Spawn(String),
    /// Reading process output or scratch files failed.
    #[error("executor i/o error: {0}")]
    Io(String),
    /// The runtime terminated abnormally.
    #[error("runtime crashed: {0}")]
    Crashed(String),
    /// A reported telemetry payload could not be decoded.
    #[error("invalid telemetry payload: {0}")]
    Telemetry(String),
}

/// Runs fixtures under the monitored runtime.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Executes a fixture and returns everything captured.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError`] when no result could be produced.
    async fn execute(&self, request: &ExecutionRequest) -> Result<CapturedResult, ExecutorError>;

    /// Runs a guard script and returns its standard output.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError`] when the guard could not be run.
    async fn run_guard(&self, request: &GuardRequest) -> Result<String, ExecutorError>;
}
