// crates/fixture-harness-core/src/core/mod.rs
// ============================================================================
// Module: Fixture Harness Core Types
// Description: Canonical fixture, capture, verdict, and summary structures.
// Purpose: Provide stable, serializable types shared by the runtime and reports.
// Dependencies: serde, serde_json, regex
// ============================================================================

//! ## Overview
//! Core types describe a parsed fixture, the result captured by an executor,
//! and the verdict produced by comparing the two. These types are immutable
//! once built and are the only data exchanged between the parser, the
//! comparator, the aggregator, and the report emitters.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod capture;
pub mod directive;
pub mod fixture;
pub mod summary;
pub mod verdict;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use capture::CapturedResult;
pub use capture::ResponseHeader;
pub use directive::DirectiveBlock;
pub use directive::DirectiveKind;
pub use directive::PayloadKind;
pub use fixture::Fixture;
pub use fixture::FixtureError;
pub use fixture::MAX_FIXTURE_BYTES;
pub use summary::Summary;
pub use verdict::FailureReason;
pub use verdict::FixtureIdentity;
pub use verdict::Mismatch;
pub use verdict::MismatchKind;
pub use verdict::Verdict;
pub use verdict::VerdictOutcome;
