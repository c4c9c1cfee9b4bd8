// crates/fixture-harness-core/src/runtime/aggregate.rs
// ============================================================================
// Module: Result Aggregator
// Description: Collects verdicts from workers into a run summary.
// Purpose: Serialize verdicts in discovery order regardless of finish order.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The aggregator is the single owner of run results. Workers send
//! `(index, verdict)` pairs; the aggregator places each verdict in the slot of
//! its discovery index. A slot that never receives a verdict is finalized as
//! an `ExecutionCrash` failure, so the summary always covers every fixture.
//! Retry passes overwrite a slot with [`Aggregator::replace`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use crate::core::summary::Summary;
use crate::core::verdict::FailureReason;
use crate::core::verdict::FixtureIdentity;
use crate::core::verdict::Verdict;

// ============================================================================
// SECTION: Aggregator
// ============================================================================

/// Orders worker verdicts by discovery index.
#[derive(Debug)]
pub struct Aggregator {
    /// Identities in discovery order.
    identities: Vec<FixtureIdentity>,
    /// Received verdicts by discovery index.
    slots: Vec<Option<Verdict>>,
}

impl Aggregator {
    /// Creates an aggregator for the given fixtures.
    #[must_use]
    pub fn new(identities: Vec<FixtureIdentity>) -> Self {
        let slots = vec![None; identities.len()];
        Self { identities, slots }
    }

    /// Stores a verdict. Out-of-range indices and repeated indices are ignored;
    /// the first verdict for a slot wins.
    pub fn record(&mut self, index: usize, verdict: Verdict) {
        if let Some(slot) = self.slots.get_mut(index)
            && slot.is_none()
        {
            *slot = Some(verdict);
        }
    }

    /// Replaces the verdict in a slot with a retry result. Out-of-range
    /// indices are ignored; the last verdict for a slot wins.
    pub fn replace(&mut self, index: usize, verdict: Verdict) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Some(verdict);
        }
    }

    /// Returns the recorded fixtures whose verdicts may change on a rerun,
    /// in discovery order.
    #[must_use]
    pub fn retryable(&self) -> Vec<(usize, FixtureIdentity)> {
        self.identities
            .iter()
            .zip(&self.slots)
            .enumerate()
            .filter(|(_, (_, slot))| slot.as_ref().is_some_and(Verdict::is_retryable))
            .map(|(index, (identity, _))| (index, identity.clone()))
            .collect()
    }

    /// Returns the number of slots still waiting for a verdict.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_none()).count()
    }

    /// Records every still-empty slot as cancelled and returns how many were filled.
    pub fn cancel_pending(&mut self) -> usize {
        let mut filled = 0;
        for (identity, slot) in self.identities.iter().zip(self.slots.iter_mut()) {
            if slot.is_none() {
                *slot = Some(Verdict::cancelled(identity.clone()));
                filled += 1;
            }
        }
        filled
    }

    /// Finalizes the summary in discovery order.
    #[must_use]
    pub fn finish(self, duration: Duration) -> Summary {
        let mut summary = Summary::new();
        for (identity, slot) in self.identities.into_iter().zip(self.slots) {
            summary.record(slot.unwrap_or_else(|| {
                Verdict::failed(
                    identity,
                    FailureReason::ExecutionCrash,
                    "worker ended without a verdict",
                    Duration::ZERO,
                )
            }));
        }
        summary.duration = duration;
        summary
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
