// crates/fixture-harness-report/src/junit.rs
// ============================================================================
// Module: JUnit Rendering
// Description: JUnit XML model and renderer.
// Purpose: Emit one `<testsuite>` document consumable by standard JUnit readers.
// Dependencies: fixture-harness-core, time
// ============================================================================

//! ## Overview
//! The rendered document has a fixed shape: an XML declaration, one
//! `<testsuite errors="0" failures skipped tests time timestamp>` element, and
//! one `<testcase classname name time>` per case. Failed cases nest
//! `<failure message="failed <name>" type="failed">` with a CDATA body,
//! skipped cases nest an empty `<skipped/>`, and passed cases are empty.
//!
//! Attribute values are escaped and characters XML 1.0 forbids are dropped.
//! CDATA terminators inside failure text are split across sections.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::time::Duration;

use fixture_harness_core::Summary;
use fixture_harness_core::Verdict;
use fixture_harness_core::VerdictOutcome;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::capture::CaptureReport;
use crate::error::ReportError;

// ============================================================================
// SECTION: Model
// ============================================================================

/// Status of one JUnit test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseStatus {
    /// No child element.
    Passed,
    /// Nested `<failure>` element.
    Failed,
    /// Nested `<skipped/>` element.
    Skipped,
}

/// One `<testcase>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JunitCase {
    /// Grouping chain.
    pub classname: String,
    /// Case name.
    pub name: String,
    /// Reported run time.
    pub time: Duration,
    /// Case status.
    pub status: CaseStatus,
    /// Failure detail text for failed cases.
    pub detail: String,
}

impl JunitCase {
    /// Builds a case from a fixture verdict.
    #[must_use]
    pub fn from_verdict(verdict: &Verdict) -> Self {
        let status = match verdict.outcome {
            VerdictOutcome::Passed => CaseStatus::Passed,
            VerdictOutcome::Failed => CaseStatus::Failed,
            VerdictOutcome::Skipped => CaseStatus::Skipped,
        };
        let mut detail = verdict.failure_text();
        if let Some(note) = &verdict.xfail {
            detail = format!("{note}\n{detail}");
        }
        Self {
            classname: verdict.identity.classname.clone(),
            name: verdict.identity.name.clone(),
            time: verdict.duration,
            status,
            detail,
        }
    }

    /// Builds a case from a scanned capture file.
    #[must_use]
    pub fn from_capture(report: &CaptureReport) -> Self {
        Self {
            classname: report.handle.clone(),
            name: report.handle.clone(),
            time: Duration::ZERO,
            status: report.status(),
            detail: report.failure_lines.join("\n"),
        }
    }
}

/// One `<testsuite>` document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JunitSuite {
    /// Cases in report order.
    pub cases: Vec<JunitCase>,
    /// Suite run time.
    pub time: Duration,
    /// Suite timestamp.
    pub timestamp: OffsetDateTime,
}

impl JunitSuite {
    /// Builds a suite from a run summary, one case per verdict.
    #[must_use]
    pub fn from_summary(summary: &Summary, timestamp: OffsetDateTime) -> Self {
        Self {
            cases: summary.verdicts.iter().map(JunitCase::from_verdict).collect(),
            time: summary.duration,
            timestamp,
        }
    }

    /// Builds a suite from scanned capture files, one case per file.
    #[must_use]
    pub fn from_captures(
        reports: &[CaptureReport],
        time: Duration,
        timestamp: OffsetDateTime,
    ) -> Self {
        Self {
            cases: reports.iter().map(JunitCase::from_capture).collect(),
            time,
            timestamp,
        }
    }

    /// Returns the number of cases.
    #[must_use]
    pub const fn tests(&self) -> usize {
        self.cases.len()
    }

    /// Returns the number of failed cases.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.count(CaseStatus::Failed)
    }

    /// Returns the number of skipped cases.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(CaseStatus::Skipped)
    }

    /// Counts cases with the given status.
    fn count(&self, status: CaseStatus) -> usize {
        self.cases.iter().filter(|case| case.status == status).count()
    }
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders the suite as a JUnit XML document.
///
/// # Errors
///
/// Returns [`ReportError::Format`] when the timestamp cannot be formatted.
pub fn render_junit(suite: &JunitSuite) -> Result<String, ReportError> {
    let timestamp = suite.timestamp.replace_nanosecond(0).unwrap_or(suite.timestamp);
    let timestamp =
        timestamp.format(&Rfc3339).map_err(|err| ReportError::Format(err.to_string()))?;

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        out,
        "<testsuite errors=\"0\" failures=\"{}\" skipped=\"{}\" tests=\"{}\" time=\"{}\" \
         timestamp=\"{}\">",
        suite.failures(),
        suite.skipped(),
        suite.tests(),
        seconds(suite.time),
        xml_escape(&timestamp)
    );
    for case in &suite.cases {
        let open = format!(
            "  <testcase classname=\"{}\" name=\"{}\" time=\"{}\"",
            xml_escape(&case.classname),
            xml_escape(&case.name),
            seconds(case.time)
        );
        match case.status {
            CaseStatus::Passed => {
                let _ = writeln!(out, "{open}/>");
            }
            CaseStatus::Skipped => {
                let _ = writeln!(out, "{open}>");
                out.push_str("    <skipped/>\n");
                out.push_str("  </testcase>\n");
            }
            CaseStatus::Failed => {
                let _ = writeln!(out, "{open}>");
                let _ = writeln!(
                    out,
                    "    <failure message=\"{}\" type=\"failed\">{}</failure>",
                    xml_escape(&format!("failed {}", case.name)),
                    cdata(&case.detail)
                );
                out.push_str("  </testcase>\n");
            }
        }
    }
    out.push_str("</testsuite>\n");
    Ok(out)
}

/// Formats a duration as fractional seconds.
fn seconds(duration: Duration) -> String {
    format!("{:.3}", duration.as_secs_f64())
}

/// Escapes text for use in an attribute value.
fn xml_escape(input: &str) -> String {
    strip_invalid_chars(input)
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Wraps text in CDATA, splitting any embedded terminator.
fn cdata(input: &str) -> String {
    let body = strip_invalid_chars(input).replace("]]>", "]]]]><![CDATA[>");
    format!("<![CDATA[{body}]]>")
}

/// Drops characters outside the XML 1.0 character range.
fn strip_invalid_chars(input: &str) -> String {
    input
        .chars()
        .filter(|ch| {
            matches!(*ch, '\t' | '\n' | '\r')
                || matches!(*ch, '\u{20}' ..= '\u{D7FF}' | '\u{E000}' ..= '\u{FFFD}' | '\u{10000}' ..)
        })
        .collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
