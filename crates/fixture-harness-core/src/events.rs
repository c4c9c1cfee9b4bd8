// crates/fixture-harness-core/src/events.rs
// ============================================================================
// Module: Harness Events
// Description: Structured JSON-lines events emitted during a run.
// Purpose: Log run progress without hard dependencies on a logging pipeline.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The runner reports progress through a [`HarnessEventSink`]. Each event is a
//! flat record serialized as one JSON line. Sinks never fail the run: write
//! errors are dropped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::verdict::Verdict;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Harness progress event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarnessEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Fixture path when the event concerns one fixture.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixture: Option<String>,
    /// Verdict outcome label for finished fixtures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<&'static str>,
    /// Failure reason label for failed fixtures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    /// Elapsed time in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
    /// Fixture count for run-level events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// Free-form detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HarnessEvent {
    /// Creates an event with a consistent timestamp and no optional fields.
    #[must_use]
    pub fn new(event: &'static str) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event,
            timestamp_ms,
            fixture: None,
            outcome: None,
            reason: None,
            duration_ms: None,
            count: None,
            message: None,
        }
    }

    /// Event emitted before the first fixture is scheduled.
    #[must_use]
    pub fn run_started(fixtures: usize, concurrency: usize) -> Self {
        Self {
            count: Some(fixtures),
            message: Some(format!("concurrency={concurrency}")),
            ..Self::new("run_started")
        }
    }

    /// Event emitted when a fixture verdict reaches the aggregator.
    #[must_use]
    pub fn fixture_finished(verdict: &Verdict) -> Self {
        Self {
            fixture: Some(verdict.identity.path.display().to_string()),
            outcome: Some(verdict.outcome.as_str()),
            reason: verdict.reason.map(|reason| reason.as_str()),
            duration_ms: Some(verdict.duration.as_millis()),
            message: verdict.detail.clone(),
            ..Self::new("fixture_finished")
        }
    }

    /// Event emitted before a retry pass re-runs fixtures.
    #[must_use]
    pub fn retry_started(attempt: u32, fixtures: usize) -> Self {
        Self {
            count: Some(fixtures),
            message: Some(format!("attempt={attempt}")),
            ..Self::new("retry_started")
        }
    }

    /// Event emitted when cancellation is observed.
    #[must_use]
    pub fn run_cancelled(pending: usize) -> Self {
        Self {
            count: Some(pending),
            ..Self::new("run_cancelled")
        }
    }

    /// Event emitted after the summary is finalized.
    #[must_use]
    pub fn run_finished(total: usize, failed: usize, duration_ms: u128) -> Self {
        Self {
            count: Some(total),
            duration_ms: Some(duration_ms),
            message: Some(format!("failed={failed}")),
            ..Self::new("run_finished")
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Sink for harness progress events.
pub trait HarnessEventSink: Send + Sync {
    /// Record an event.
    fn record(&self, event: &HarnessEvent);
}

/// Event sink that logs JSON lines to stderr.
pub struct StderrEventSink;

impl HarnessEventSink for StderrEventSink {
    fn record(&self, event: &HarnessEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Event sink that logs JSON lines to a file.
pub struct FileEventSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileEventSink {
    /// Opens the event log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl HarnessEventSink for FileEventSink {
    fn record(&self, event: &HarnessEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op event sink.
pub struct NoopEventSink;

impl HarnessEventSink for NoopEventSink {
    fn record(&self, _event: &HarnessEvent) {}
}

/// Event sink that keeps events in memory, for tests and embedding callers.
#[derive(Default)]
pub struct MemoryEventSink {
    /// Recorded events in arrival order.
    events: Mutex<Vec<HarnessEvent>>,
}

impl MemoryEventSink {
    /// Creates an empty in-memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HarnessEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl HarnessEventSink for MemoryEventSink {
    fn record(&self, event: &HarnessEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use std::time::Duration;

    use super::FileEventSink;
    use super::HarnessEvent;
    use super::HarnessEventSink;
    use super::MemoryEventSink;
    use crate::core::verdict::FailureReason;
    use crate::core::verdict::FixtureIdentity;
    use crate::core::verdict::Verdict;

    #[test]
    fn fixture_event_serializes_as_flat_json() {
        let verdict = Verdict::failed(
            FixtureIdentity::from_path("tests/test_a.php"),
            FailureReason::ExecutionTimeout,
            "no result after 10000 ms",
            Duration::from_millis(10_000),
        );
        let payload = serde_json::to_value(HarnessEvent::fixture_finished(&verdict)).unwrap();
        assert_eq!(payload["event"], "fixture_finished");
        assert_eq!(payload["outcome"], "failed");
        assert_eq!(payload["reason"], "ExecutionTimeout");
        assert_eq!(payload["duration_ms"], 10_000);
        assert!(payload.get("count").is_none());
    }

    #[test]
    fn file_sink_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let sink = FileEventSink::new(&path).unwrap();
        sink.record(&HarnessEvent::run_started(3, 2));
        sink.record(&HarnessEvent::run_finished(3, 0, 12));
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.lines().next().unwrap().contains("\"run_started\""));
    }

    #[test]
    fn memory_sink_keeps_order() {
        let sink = MemoryEventSink::new();
        sink.record(&HarnessEvent::run_started(1, 1));
        sink.record(&HarnessEvent::run_cancelled(1));
        let names: Vec<_> = sink.events().iter().map(|event| event.event).collect();
        assert_eq!(names, vec!["run_started", "run_cancelled"]);
    }
}
