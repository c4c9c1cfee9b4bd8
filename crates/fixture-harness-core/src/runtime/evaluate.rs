// crates/fixture-harness-core/src/runtime/evaluate.rs
// ============================================================================
// Module: Expectation Evaluation
// Description: Applies every expectation block of a fixture to a capture.
// Purpose: Produce the complete, ordered mismatch list for one fixture.
// Dependencies: crate::core, crate::runtime::comparator
// ============================================================================

//! ## Overview
//! Blocks are evaluated in a fixed order: `EXPECT`, `EXPECT_REGEX`,
//! `EXPECT_RESPONSE_HEADERS`, then payload blocks in [`PayloadKind::ALL`]
//! order. A block the fixture does not declare is not checked.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::capture::CapturedResult;
use crate::core::directive::PayloadKind;
use crate::core::fixture::Fixture;
use crate::core::verdict::Mismatch;
use crate::runtime::comparator::compare_output;
use crate::runtime::comparator::compare_payload;
use crate::runtime::comparator::compare_regex;
use crate::runtime::comparator::compare_response_headers;
use crate::runtime::pattern::FileSubstitution;

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Compares a captured result against every expectation the fixture declares.
#[must_use]
pub fn evaluate_expectations(fixture: &Fixture, captured: &CapturedResult) -> Vec<Mismatch> {
    let files = FileSubstitution::for_path(fixture.path());
    let mut mismatches = Vec::new();
    if let Some(expected) = fixture.expected_output() {
        mismatches.extend(compare_output(expected, &captured.stdout, &files));
    }
    if let Some(pattern) = fixture.expected_regex() {
        mismatches.extend(compare_regex(pattern, &captured.stdout));
    }
    if let Some(expected) = fixture.expected_response_headers() {
        mismatches.extend(compare_response_headers(&expected, &captured.headers, &files));
    }
    for kind in PayloadKind::ALL {
        if let Some(expected) = fixture.payload_expectation(kind) {
            mismatches.extend(compare_payload(kind, expected, captured.payload(kind), &files));
        }
    }
    mismatches
}
