// crates/fixture-harness-core/src/core/capture.rs
// ============================================================================
// Module: Captured Execution Results
// Description: Output captured from one fixture execution.
// Purpose: Carry stdout, response headers, and telemetry payloads to the comparator.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`CapturedResult`] is produced by an executor and consumed by the
//! comparator. Response headers keep their order and duplicates; telemetry
//! payloads are keyed by [`PayloadKind`] and absent kinds are simply missing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::directive::PayloadKind;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A single response header as emitted by the fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHeader {
    /// Header name.
    pub name: String,
    /// Header value.
    pub value: String,
}

impl ResponseHeader {
    /// Creates a response header.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Renders the header in the `Name=Value` form used by expectation blocks.
    #[must_use]
    pub fn render(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// Everything an executor captured for one fixture run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapturedResult {
    /// Standard output of the fixture.
    pub stdout: String,
    /// Standard error of the fixture, kept for diagnostics only.
    #[serde(default)]
    pub stderr: String,
    /// Response headers in emission order.
    #[serde(default)]
    pub headers: Vec<ResponseHeader>,
    /// Telemetry payload documents keyed by kind.
    #[serde(default)]
    pub payloads: BTreeMap<PayloadKind, Value>,
    /// Process exit code when the process exited normally.
    #[serde(default)]
    pub exit_code: Option<i32>,
    /// Wall-clock execution time.
    #[serde(default)]
    pub duration: Duration,
}

impl CapturedResult {
    /// Creates a capture holding only stdout.
    #[must_use]
    pub fn new(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Self::default()
        }
    }

    /// Appends a response header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(ResponseHeader::new(name, value));
        self
    }

    /// Attaches a telemetry payload document.
    #[must_use]
    pub fn with_payload(mut self, kind: PayloadKind, payload: Value) -> Self {
        self.payloads.insert(kind, payload);
        self
    }

    /// Returns the payload captured for `kind`, if any.
    #[must_use]
    pub fn payload(&self, kind: PayloadKind) -> Option<&Value> {
        self.payloads.get(&kind)
    }
}
