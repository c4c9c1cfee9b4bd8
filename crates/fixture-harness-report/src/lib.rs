// crates/fixture-harness-report/src/lib.rs
// ============================================================================
// Module: Fixture Harness Report Library
// Description: Report emitters and capture-file scanning.
// Purpose: Render run summaries and `.out` captures for CI consumers.
// Dependencies: fixture-harness-core, regex, thiserror, time
// ============================================================================

//! ## Overview
//! Two inputs feed one JUnit model: a fixture run [`Summary`] and a set of
//! `.out` capture files produced by unit-test binaries. [`JunitSuite`] is
//! built from either and rendered by [`render_junit`]. [`render_tap`] renders
//! a summary as TAP for console use.
//!
//! [`Summary`]: fixture_harness_core::Summary

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod capture;
pub mod crawl;
pub mod error;
pub mod junit;
pub mod tap;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use capture::CaptureGrammar;
pub use capture::CaptureReport;
pub use capture::CaptureScanner;
pub use capture::ScanState;
pub use crawl::CrawlOptions;
pub use crawl::crawl_captures;
pub use error::ReportError;
pub use junit::CaseStatus;
pub use junit::JunitCase;
pub use junit::JunitSuite;
pub use junit::render_junit;
pub use tap::render_tap;
