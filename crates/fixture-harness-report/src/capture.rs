// crates/fixture-harness-report/src/capture.rs
// ============================================================================
// Module: Capture Scanner
// Description: Line scanner for `.out` captures of native unit-test binaries.
// Purpose: Reduce one capture file to a single classified report case.
// Dependencies: regex
// ============================================================================

//! ## Overview
//! A capture file is the console output of one unit-test binary. Three line
//! shapes matter, each matched after trimming:
//! - `FAIL [<path>:<line>]: <message>` failure lines, collected verbatim;
//! - `<name>: all <N> tests passed`;
//! - `<name>: <P> of <T> tests passed, <F> failed and <A> acceptably failed`.
//!
//! The last summary line wins. A file with failures is failed, a file with
//! only acceptable failures is skipped, anything else passes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regex::Captures;
use regex::Regex;

use crate::error::ReportError;
use crate::junit::CaseStatus;

// ============================================================================
// SECTION: Grammar
// ============================================================================

/// Compiled line patterns for capture files.
#[derive(Debug, Clone)]
pub struct CaptureGrammar {
    /// `FAIL [file:line]: message`.
    failure: Regex,
    /// `name: all N tests passed`.
    all_passed: Regex,
    /// `name: P of T tests passed, F failed and A acceptably failed`.
    partial: Regex,
}

impl CaptureGrammar {
    /// Compiles the capture line patterns.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Pattern`] if a pattern fails to compile.
    pub fn new() -> Result<Self, ReportError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|err| ReportError::Pattern(err.to_string()))
        };
        Ok(Self {
            failure: compile(r"^\s*FAIL\s+\[.*:\d+\]:.*")?,
            all_passed: compile(r"^\s*([^:]+): all *(\d+) tests passed")?,
            partial: compile(
                r"^\s*([^:]+): *(\d+) of *(\d+) tests passed, *(\d+) failed and *(\d+) acceptably failed",
            )?,
        })
    }

    /// Scans a whole capture text; `fallback_handle` names files without a summary line.
    #[must_use]
    pub fn scan(&self, text: &str, fallback_handle: &str) -> CaptureReport {
        let mut scanner = CaptureScanner::new(self);
        for line in text.lines() {
            scanner.feed(line);
        }
        scanner.finish(fallback_handle)
    }
}

// ============================================================================
// SECTION: Scanner
// ============================================================================

/// Scanner position within a capture file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Nothing significant seen yet.
    Scanning,
    /// The most recent significant line was a failure line.
    SawFailureLines,
    /// The most recent significant line was a summary line.
    SawSummaryLine,
}

/// Counts taken from the winning summary line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SummaryLine {
    /// Test binary name.
    handle: String,
    /// Passed assertions.
    pass_count: u64,
    /// Total assertions.
    total_count: u64,
    /// Failed assertions.
    fail_count: u64,
    /// Acceptably failed assertions.
    ok_fail_count: u64,
}

/// Incremental scanner over the lines of one capture file.
#[derive(Debug)]
pub struct CaptureScanner<'a> {
    /// Line patterns.
    grammar: &'a CaptureGrammar,
    /// Current state.
    state: ScanState,
    /// Collected failure lines.
    failure_lines: Vec<String>,
    /// Last summary line seen.
    summary: Option<SummaryLine>,
}

impl<'a> CaptureScanner<'a> {
    /// Creates a scanner in the [`ScanState::Scanning`] state.
    #[must_use]
    pub const fn new(grammar: &'a CaptureGrammar) -> Self {
        Self {
            grammar,
            state: ScanState::Scanning,
            failure_lines: Vec::new(),
            summary: None,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> ScanState {
        self.state
    }

    /// Consumes one line and returns the new state.
    pub fn feed(&mut self, line: &str) -> ScanState {
        let line = line.trim();
        if self.grammar.failure.is_match(line) {
            self.failure_lines.push(line.to_string());
            self.state = ScanState::SawFailureLines;
        }
        if let Some(caps) = self.grammar.partial.captures(line) {
            self.summary = Some(SummaryLine {
                handle: group_text(&caps, 1),
                pass_count: group_count(&caps, 2),
                total_count: group_count(&caps, 3),
                fail_count: group_count(&caps, 4),
                ok_fail_count: group_count(&caps, 5),
            });
            self.state = ScanState::SawSummaryLine;
        } else if let Some(caps) = self.grammar.all_passed.captures(line) {
            let count = group_count(&caps, 2);
            self.summary = Some(SummaryLine {
                handle: group_text(&caps, 1),
                pass_count: count,
                total_count: count,
                fail_count: 0,
                ok_fail_count: 0,
            });
            self.state = ScanState::SawSummaryLine;
        }
        self.state
    }

    /// Finalizes the report.
    #[must_use]
    pub fn finish(self, fallback_handle: &str) -> CaptureReport {
        let summary = self.summary.unwrap_or_else(|| SummaryLine {
            handle: fallback_handle.to_string(),
            pass_count: 0,
            total_count: 0,
            fail_count: 0,
            ok_fail_count: 0,
        });
        CaptureReport {
            handle: summary.handle,
            pass_count: summary.pass_count,
            total_count: summary.total_count,
            fail_count: summary.fail_count,
            ok_fail_count: summary.ok_fail_count,
            failure_lines: self.failure_lines,
        }
    }
}

/// Returns a capture group as trimmed text.
fn group_text(caps: &Captures<'_>, index: usize) -> String {
    caps.get(index).map_or_else(String::new, |m| m.as_str().trim().to_string())
}

/// Returns a capture group as a count, saturating on overflow.
fn group_count(caps: &Captures<'_>, index: usize) -> u64 {
    caps.get(index).and_then(|m| m.as_str().parse().ok()).unwrap_or(u64::MAX)
}

// ============================================================================
// SECTION: Report
// ============================================================================

/// Result of scanning one capture file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureReport {
    /// Test handle from the summary line, or the file stem.
    pub handle: String,
    /// Passed assertions.
    pub pass_count: u64,
    /// Total assertions.
    pub total_count: u64,
    /// Failed assertions.
    pub fail_count: u64,
    /// Acceptably failed assertions.
    pub ok_fail_count: u64,
    /// Failure lines in file order.
    pub failure_lines: Vec<String>,
}

impl CaptureReport {
    /// Classifies the capture.
    #[must_use]
    pub const fn status(&self) -> CaseStatus {
        if self.fail_count > 0 {
            CaseStatus::Failed
        } else if self.ok_fail_count > 0 {
            CaseStatus::Skipped
        } else {
            CaseStatus::Passed
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use super::CaptureGrammar;
    use super::CaptureScanner;
    use super::ScanState;
    use crate::junit::CaseStatus;

    #[test]
    fn state_machine_tracks_last_significant_line() {
        let grammar = CaptureGrammar::new().unwrap();
        let mut scanner = CaptureScanner::new(&grammar);
        assert_eq!(scanner.feed("running..."), ScanState::Scanning);
        assert_eq!(
            scanner.feed("FAIL [axiom/tests/test_base64.c:56]: TRUE check: valid character"),
            ScanState::SawFailureLines
        );
        assert_eq!(
            scanner.feed("test_base64:  10 of  11 tests passed,     1 failed and     0 acceptably failed"),
            ScanState::SawSummaryLine
        );
        assert_eq!(scanner.feed("trailing noise"), ScanState::SawSummaryLine);
        let report = scanner.finish("fallback");
        assert_eq!(report.handle, "test_base64");
        assert_eq!((report.pass_count, report.total_count), (10, 11));
        assert_eq!(report.failure_lines.len(), 1);
        assert_eq!(report.status(), CaseStatus::Failed);
    }

    #[test]
    fn acceptable_failures_classify_as_skipped() {
        let grammar = CaptureGrammar::new().unwrap();
        let report = grammar.scan(
            "test_rpm:   312 of   314 tests passed,     0 failed and     2 acceptably failed  agent/Darwin/gcc/x86_64/axiom/tests/test_rpm\n",
            "x",
        );
        assert_eq!(report.handle, "test_rpm");
        assert_eq!(report.pass_count, 312);
        assert_eq!(report.ok_fail_count, 2);
        assert_eq!(report.status(), CaseStatus::Skipped);
    }

    #[test]
    fn all_passed_line_and_fallback_handle() {
        let grammar = CaptureGrammar::new().unwrap();
        let report = grammar.scan(
            "test_analytics_events: all  2229 tests passed  agent/Darwin/gcc/x86_64/axiom/tests/test_analytics_events",
            "x",
        );
        assert_eq!(report.handle, "test_analytics_events");
        assert_eq!(report.total_count, 2229);
        assert_eq!(report.status(), CaseStatus::Passed);

        let empty = grammar.scan("segfault\n", "test_crash");
        assert_eq!(empty.handle, "test_crash");
        assert_eq!(empty.status(), CaseStatus::Passed);
    }
}
