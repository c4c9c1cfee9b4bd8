// crates/fixture-harness-core/src/core/summary.rs
// ============================================================================
// Module: Run Summary
// Description: Aggregate counts and ordered verdicts for one run.
// Purpose: Provide the finalized input consumed by report emitters.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Summary`] is built once per run. Counts always agree with the verdict
//! list because [`Summary::record`] is the only way to add a verdict.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::core::verdict::Verdict;
use crate::core::verdict::VerdictOutcome;

// ============================================================================
// SECTION: Summary
// ============================================================================

/// Aggregate outcome of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of passed fixtures.
    pub passed: usize,
    /// Number of failed fixtures, announced expected failures included.
    pub failed: usize,
    /// Number of skipped fixtures, cancelled fixtures included.
    pub skipped: usize,
    /// Number of failed fixtures that announced an expected failure.
    pub expected_failures: usize,
    /// Verdicts in discovery order.
    pub verdicts: Vec<Verdict>,
    /// Wall-clock run time.
    pub duration: Duration,
}

impl Summary {
    /// Creates an empty summary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a verdict and updates the counts.
    pub fn record(&mut self, verdict: Verdict) {
        match verdict.outcome {
            VerdictOutcome::Passed => self.passed += 1,
            VerdictOutcome::Failed => {
                self.failed += 1;
                if verdict.xfail.is_some() {
                    self.expected_failures += 1;
                }
            }
            VerdictOutcome::Skipped => self.skipped += 1,
        }
        self.verdicts.push(verdict);
    }

    /// Returns the total number of fixtures.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    /// Returns the number of failures that were not announced as expected.
    #[must_use]
    pub const fn unexpected_failures(&self) -> usize {
        self.failed - self.expected_failures
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
