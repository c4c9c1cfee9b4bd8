// crates/fixture-harness-cli/src/i18n.rs
// ============================================================================
// Module: CLI Message Catalog
// Description: Message catalog and placeholder substitution for the CLI.
// Purpose: Centralize user-facing strings behind stable keys.
// Dependencies: Standard library collections
// ============================================================================

//! ## Overview
//! User-facing strings live in one catalog keyed by stable identifiers. All
//! runtime output should be routed through the [`t!`](crate::t) macro.
//!
//! ## Invariants
//! - The catalog is initialized once and read-only thereafter.
//! - Missing keys fall back to the key itself.
//! - Placeholder substitutions are applied in argument order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A formatted message argument captured by the [`macro@crate::t`] macro.
#[derive(Clone)]
pub struct MessageArg {
    /// The placeholder name used in message templates (e.g., `"path"`).
    pub key: &'static str,
    /// The formatted string value to substitute for this placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and displayable value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// English message catalog.
const CATALOG_EN: &[(&str, &str)] = &[
    ("main.version", "fixture-harness {version}"),
    ("config.load_failed", "Failed to load config: {error}"),
    ("config.override_invalid", "Invalid command-line override: {error}"),
    ("config.validate.ok", "Config OK ({source})"),
    ("config.source.defaults", "built-in defaults"),
    ("discovery.failed", "Fixture discovery failed: {error}"),
    ("discovery.empty", "No fixtures found."),
    ("logging.open_failed", "Failed to open event log: {error}"),
    ("run.cancel_requested", "Interrupt received; cancelling remaining fixtures."),
    (
        "run.summary",
        "{total} fixtures: {passed} passed, {failed} failed ({xfail} expected), {skipped} skipped \
         in {seconds}s",
    ),
    ("check.malformed", "{path}: {error}"),
    ("check.no_expectations", "{path}: warning: no expectation blocks"),
    ("check.summary", "{valid} of {total} fixtures parsed cleanly"),
    ("report.grammar_failed", "Failed to prepare capture grammar: {error}"),
    ("report.crawl_failed", "Failed to read capture files: {error}"),
    ("report.render_failed", "Failed to render report: {error}"),
    ("report.write_failed", "Failed to write report to {path}: {error}"),
    ("report.summary", "{total} captures: {failures} failed, {skipped} skipped"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output stream"),
];

/// Returns the message catalog.
pub(crate) fn catalog() -> &'static HashMap<&'static str, &'static str> {
    static CATALOG_EN_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    CATALOG_EN_MAP.get_or_init(|| CATALOG_EN.iter().copied().collect())
}

/// Returns every catalog entry in declaration order.
#[must_use]
pub const fn catalog_entries() -> &'static [(&'static str, &'static str)] {
    CATALOG_EN
}

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Looks up `key` and substitutes `args` into its placeholders.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog().get(key).copied().unwrap_or(key);
    if args.is_empty() {
        return template.to_string();
    }

    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a catalog message from a key and named arguments.
///
/// # Arguments
///
/// - `$key` must match a catalog entry.
/// - Named arguments are substituted into `{placeholder}` positions.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}
