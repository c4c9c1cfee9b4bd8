// crates/fixture-harness-report/src/tap.rs
// ============================================================================
// Module: TAP Rendering
// Description: Test Anything Protocol output for run summaries.
// Purpose: Provide a line-oriented report for terminals and TAP consumers.
// Dependencies: fixture-harness-core
// ============================================================================

//! ## Overview
//! One `ok`/`not ok` line per verdict in discovery order, preceded by the
//! `1..N` plan. Skips carry a `# SKIP` directive, expected failures a
//! `# TODO` directive, and failure details follow as `#` diagnostic lines.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;

use fixture_harness_core::Summary;
use fixture_harness_core::VerdictOutcome;

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders a summary as TAP version 13 text.
#[must_use]
pub fn render_tap(summary: &Summary) -> String {
    let mut out = String::from("TAP version 13\n");
    let _ = writeln!(out, "1..{}", summary.total());
    for (index, verdict) in summary.verdicts.iter().enumerate() {
        let number = index + 1;
        let label = format!("{}.{}", verdict.identity.classname, verdict.identity.name);
        match verdict.outcome {
            VerdictOutcome::Passed => {
                let _ = writeln!(out, "ok {number} - {label}");
            }
            VerdictOutcome::Skipped => {
                let reason = verdict.detail.as_deref().unwrap_or_default();
                let _ = writeln!(out, "ok {number} - {label} # SKIP {reason}");
            }
            VerdictOutcome::Failed => {
                match &verdict.xfail {
                    Some(note) => {
                        let _ = writeln!(out, "not ok {number} - {label} # TODO {note}");
                    }
                    None => {
                        let _ = writeln!(out, "not ok {number} - {label}");
                    }
                }
                for line in verdict.failure_text().lines() {
                    let _ = writeln!(out, "# {line}");
                }
            }
        }
    }
    let _ = writeln!(
        out,
        "# passed {} failed {} skipped {} xfail {}",
        summary.passed, summary.failed, summary.skipped, summary.expected_failures
    );
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================
