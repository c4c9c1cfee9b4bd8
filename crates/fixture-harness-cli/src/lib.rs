// crates/fixture-harness-cli/src/lib.rs
// ============================================================================
// Module: Fixture Harness CLI Library
// Description: Shared helpers for the fixture-harness binary.
// Purpose: Expose the message catalog to the binary and its tests.
// Dependencies: Standard library
// ============================================================================

//! ## Overview
//! The binary routes every user-facing string through [`t!`], backed by the
//! catalog in [`i18n`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod i18n;
