// crates/fixture-harness-cli/tests/i18n.rs
// ============================================================================
// Module: CLI Message Catalog Tests
// Description: Exercises the message catalog and placeholder substitution.
// Purpose: Ensure CLI user-facing strings route through stable catalog helpers.
// Dependencies: fixture-harness-cli i18n module and the `t!` macro.
// ============================================================================

//! ## Overview
//! Validates the fixture harness CLI catalog behavior:
//! - Translation falls back to keys on misses.
//! - The [`t!`](fixture_harness_cli::t) macro formats placeholders correctly.
//! - Catalog keys are unique.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use fixture_harness_cli::i18n::MessageArg;
use fixture_harness_cli::i18n::catalog_entries;
use fixture_harness_cli::i18n::translate;
use fixture_harness_cli::t;

// ============================================================================
// SECTION: Tests
// ============================================================================

/// Confirms the macro substitutes named placeholders.
#[test]
fn macro_substitutes_placeholders() {
    let message = t!("check.summary", valid = 3, total = 4);
    assert_eq!(message, "3 of 4 fixtures parsed cleanly");
}

/// Confirms unknown keys fall back to the key itself.
#[test]
fn unknown_key_falls_back_to_key() {
    assert_eq!(translate("missing.key", Vec::new()), "missing.key");
}

/// Confirms explicit message args are applied in order.
#[test]
fn explicit_args_are_applied() {
    let message = translate(
        "report.write_failed",
        vec![MessageArg::new("path", "out.xml"), MessageArg::new("error", "denied")],
    );
    assert_eq!(message, "Failed to write report to out.xml: denied");
}

/// Confirms catalog keys are unique.
#[test]
fn catalog_keys_are_unique() {
    let mut seen = BTreeSet::new();
    for (key, _) in catalog_entries() {
        assert!(seen.insert(*key), "duplicate key {key}");
    }
}
