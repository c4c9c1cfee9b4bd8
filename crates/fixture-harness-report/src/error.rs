// crates/fixture-harness-report/src/error.rs
// ============================================================================
// Module: Report Errors
// Description: Error type shared by report emitters and the capture crawler.
// Purpose: Surface I/O and formatting failures with stable variants.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Report errors are the only failures that abort report generation; test
//! failures inside the reports are data, never errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Report generation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// Reading captures or writing the report failed.
    #[error("report i/o error: {0}")]
    Io(String),
    /// A timestamp could not be formatted.
    #[error("report formatting error: {0}")]
    Format(String),
    /// A capture grammar pattern failed to compile.
    #[error("invalid capture pattern: {0}")]
    Pattern(String),
}
