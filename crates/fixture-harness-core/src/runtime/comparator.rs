// crates/fixture-harness-core/src/runtime/comparator.rs
// ============================================================================
// Module: Expectation Comparator
// Description: Wildcard-tolerant structural and textual comparison.
// Purpose: Turn expected/actual pairs into complete, ordered mismatch lists.
// Dependencies: crate::core, bigdecimal, regex, serde_json
// ============================================================================

//! ## Overview
//! JSON comparison is recursive and type-directed:
//! - a wildcard expected value matches anything, including an absent key;
//! - objects require the exact key set;
//! - arrays require the exact length and are compared by position, except
//!   metric rows which are matched without regard to order;
//! - numbers compare by decimal value, so `1` equals `1.0`;
//! - strings honor `??` globs and the `__FILE__` placeholder.
//!
//! Text blocks compare line by line, ignoring trailing whitespace on each line
//! and trailing blank lines. Comparison never stops early: every mismatch in
//! a block is collected.
//!
//! Security posture: captured payloads are untrusted; comparison is
//! allocation-bounded by the payload size and never panics.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;

use bigdecimal::BigDecimal;
use regex::Regex;
use serde_json::Number;
use serde_json::Value;

use crate::core::capture::ResponseHeader;
use crate::core::directive::DirectiveKind;
use crate::core::directive::PayloadKind;
use crate::core::verdict::Mismatch;
use crate::core::verdict::MismatchKind;
use crate::runtime::pattern::FileSubstitution;
use crate::runtime::pattern::is_wildcard;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Position of the metric rows inside a metrics payload.
const METRIC_ROWS_INDEX: usize = 3;

/// Longest value rendering included in a mismatch reason.
const MAX_RENDERED_VALUE: usize = 160;

// ============================================================================
// SECTION: Payload Comparison
// ============================================================================

/// Compares one telemetry payload against its expectation.
///
/// An expected `null` body requires the payload to be absent or empty. Any
/// other expectation requires the payload to be present.
#[must_use]
pub fn compare_payload(
    kind: PayloadKind,
    expected: &Value,
    actual: Option<&Value>,
    files: &FileSubstitution,
) -> Vec<Mismatch> {
    let block = kind.directive();
    let path = kind.key();
    let mut out = Vec::new();
    if is_wildcard(expected) {
        return out;
    }
    if expected.is_null() {
        if let Some(actual) = actual.filter(|value| !is_empty_payload(value)) {
            out.push(Mismatch::new(
                block,
                path,
                MismatchKind::UnexpectedPayloadPresent,
                format!("expected no {path} payload, found {}", render(actual)),
            ));
        }
        return out;
    }
    let Some(actual) = actual.filter(|value| !value.is_null()) else {
        out.push(Mismatch::new(
            block,
            path,
            MismatchKind::ExpectedPayloadMissing,
            format!("expected a {path} payload, none was reported"),
        ));
        return out;
    };
    let comparison = Comparison {
        block,
        files,
        unordered_rows: kind == PayloadKind::Metrics,
    };
    comparison.compare_root(expected, actual, path, &mut out);
    out
}

/// Compares two JSON values under wildcard rules, reporting mismatches
/// against `block` with paths rooted at `root`.
#[must_use]
pub fn compare_json(
    block: DirectiveKind,
    root: &str,
    expected: &Value,
    actual: &Value,
    files: &FileSubstitution,
) -> Vec<Mismatch> {
    let mut out = Vec::new();
    let comparison = Comparison {
        block,
        files,
        unordered_rows: false,
    };
    comparison.compare_value(expected, actual, root, &mut out);
    out
}

/// Computes a maximum matching of expected rows onto actual rows.
///
/// `compatible[e][a]` is true when expected row `e` accepts actual row `a`.
/// Returns the expected row paired with each actual row.
fn match_rows(compatible: &[Vec<bool>], actual_len: usize) -> Vec<Option<usize>> {
    let mut owners = vec![None; actual_len];
    for expected in 0 .. compatible.len() {
        let mut visited = vec![false; actual_len];
        augment_row(compatible, expected, &mut visited, &mut owners);
    }
    owners
}

/// Searches for an augmenting path starting at `expected`.
fn augment_row(
    compatible: &[Vec<bool>],
    expected: usize,
    visited: &mut [bool],
    owners: &mut [Option<usize>],
) -> bool {
    let Some(candidates) = compatible.get(expected) else {
        return false;
    };
    for (candidate, fits) in candidates.iter().enumerate() {
        if !*fits || visited[candidate] {
            continue;
        }
        visited[candidate] = true;
        let free = match owners[candidate] {
            None => true,
            Some(current) => augment_row(compatible, current, visited, owners),
        };
        if free {
            owners[candidate] = Some(expected);
            return true;
        }
    }
    false
}

/// Returns true for payloads that count as "nothing reported".
fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Recursive comparison state shared across one block.
struct Comparison<'a> {
    /// Block the mismatches are attributed to.
    block: DirectiveKind,
    /// `__FILE__` spellings for string comparison.
    files: &'a FileSubstitution,
    /// Whether the root carries metric rows matched without order.
    unordered_rows: bool,
}

impl Comparison<'_> {
    /// Compares a payload root, applying metric row matching when enabled.
    fn compare_root(&self, expected: &Value, actual: &Value, path: &str, out: &mut Vec<Mismatch>) {
        let rows = match (expected, actual) {
            (Value::Array(expected_items), Value::Array(actual_items))
                if self.unordered_rows
                    && expected_items.len() == actual_items.len()
                    && expected_items.len() > METRIC_ROWS_INDEX =>
            {
                match (&expected_items[METRIC_ROWS_INDEX], &actual_items[METRIC_ROWS_INDEX]) {
                    (Value::Array(expected_rows), Value::Array(actual_rows)) => {
                        Some((expected_items, actual_items, expected_rows, actual_rows))
                    }
                    _ => None,
                }
            }
            _ => None,
        };
        let Some((expected_items, actual_items, expected_rows, actual_rows)) = rows else {
            self.compare_value(expected, actual, path, out);
            return;
        };
        for (index, (expected_item, actual_item)) in
            expected_items.iter().zip(actual_items).enumerate()
        {
            if index != METRIC_ROWS_INDEX {
                self.compare_value(expected_item, actual_item, &index_path(path, index), out);
            }
        }
        self.compare_unordered(
            expected_rows,
            actual_rows,
            &index_path(path, METRIC_ROWS_INDEX),
            out,
        );
    }

    /// Pairs each expected row with a distinct actual row, in any order.
    ///
    /// Pairing is a maximum bipartite matching, so a wildcard row never takes
    /// a row a more specific expectation needs.
    fn compare_unordered(
        &self,
        expected: &[Value],
        actual: &[Value],
        path: &str,
        out: &mut Vec<Mismatch>,
    ) {
        let compatible: Vec<Vec<bool>> = expected
            .iter()
            .map(|expected_row| {
                actual
                    .iter()
                    .map(|actual_row| self.matches(expected_row, actual_row, path))
                    .collect()
            })
            .collect();
        let owners = match_rows(&compatible, actual.len());
        let mut paired = vec![false; expected.len()];
        for owner in owners.iter().flatten() {
            paired[*owner] = true;
        }
        for (index, expected_row) in expected.iter().enumerate() {
            if !paired[index] {
                out.push(Mismatch::new(
                    self.block,
                    index_path(path, index),
                    MismatchKind::UnmatchedElement,
                    format!("no reported row matches {}", describe_row(expected_row)),
                ));
            }
        }
        for (index, actual_row) in actual.iter().enumerate() {
            if owners[index].is_none() {
                out.push(Mismatch::new(
                    self.block,
                    path,
                    MismatchKind::UnmatchedElement,
                    format!("unexpected reported row {}", describe_row(actual_row)),
                ));
            }
        }
    }

    /// Returns true when two values match with no mismatches.
    fn matches(&self, expected: &Value, actual: &Value, path: &str) -> bool {
        let mut scratch = Vec::new();
        self.compare_value(expected, actual, path, &mut scratch);
        scratch.is_empty()
    }

    /// Compares two values recursively, appending every mismatch.
    fn compare_value(&self, expected: &Value, actual: &Value, path: &str, out: &mut Vec<Mismatch>) {
        if is_wildcard(expected) {
            return;
        }
        match (expected, actual) {
            (Value::Object(expected_map), Value::Object(actual_map)) => {
                for (key, expected_value) in expected_map {
                    let child = key_path(path, key);
                    match actual_map.get(key) {
                        Some(actual_value) => {
                            self.compare_value(expected_value, actual_value, &child, out);
                        }
                        None if is_wildcard(expected_value) => {}
                        None => out.push(Mismatch::new(
                            self.block,
                            child,
                            MismatchKind::MissingField,
                            format!("expected key {key:?} is missing"),
                        )),
                    }
                }
                for key in actual_map.keys().filter(|key| !expected_map.contains_key(*key)) {
                    out.push(Mismatch::new(
                        self.block,
                        key_path(path, key),
                        MismatchKind::UnexpectedField,
                        format!("unexpected key {key:?}"),
                    ));
                }
            }
            (Value::Array(expected_items), Value::Array(actual_items)) => {
                if expected_items.len() != actual_items.len() {
                    out.push(Mismatch::new(
                        self.block,
                        path,
                        MismatchKind::ArrayLengthMismatch,
                        format!(
                            "expected {} elements, found {}",
                            expected_items.len(),
                            actual_items.len()
                        ),
                    ));
                    return;
                }
                for (index, (expected_item, actual_item)) in
                    expected_items.iter().zip(actual_items).enumerate()
                {
                    self.compare_value(expected_item, actual_item, &index_path(path, index), out);
                }
            }
            (Value::Number(expected_number), Value::Number(actual_number)) => {
                if !numbers_equal(expected_number, actual_number) {
                    out.push(self.value_mismatch(path, expected, actual));
                }
            }
            (Value::String(expected_text), Value::String(actual_text)) => {
                if !self.files.matches(expected_text, actual_text) {
                    out.push(self.value_mismatch(path, expected, actual));
                }
            }
            (Value::Bool(_), Value::Bool(_)) | (Value::Null, Value::Null) => {
                if expected != actual {
                    out.push(self.value_mismatch(path, expected, actual));
                }
            }
            _ => out.push(Mismatch::new(
                self.block,
                path,
                MismatchKind::TypeMismatch,
                format!(
                    "expected {} {}, found {} {}",
                    type_name(expected),
                    render(expected),
                    type_name(actual),
                    render(actual)
                ),
            )),
        }
    }

    /// Builds a scalar value mismatch.
    fn value_mismatch(&self, path: &str, expected: &Value, actual: &Value) -> Mismatch {
        Mismatch::new(
            self.block,
            path,
            MismatchKind::ValueMismatch,
            format!("expected {}, found {}", render(expected), render(actual)),
        )
    }
}

/// Compares JSON numbers by decimal value.
fn numbers_equal(left: &Number, right: &Number) -> bool {
    match (decimal_from_number(left), decimal_from_number(right)) {
        (Some(left), Some(right)) => left == right,
        _ => left == right,
    }
}

/// Parses a JSON number into `BigDecimal` with a stable string representation.
fn decimal_from_number(number: &Number) -> Option<BigDecimal> {
    BigDecimal::from_str(&number.to_string()).ok()
}

/// Appends an object key to a path.
fn key_path(path: &str, key: &str) -> String {
    format!("{path}.{key}")
}

/// Appends an array index to a path.
fn index_path(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}

/// Names the JSON type of a value.
const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Renders a value compactly, truncated for readability.
fn render(value: &Value) -> String {
    let rendered = value.to_string();
    if rendered.chars().count() <= MAX_RENDERED_VALUE {
        return rendered;
    }
    let mut truncated: String = rendered.chars().take(MAX_RENDERED_VALUE).collect();
    truncated.push_str("...");
    truncated
}

/// Describes a metric row by its name and scope when it has them.
fn describe_row(row: &Value) -> String {
    let header = row.get(0);
    let name = header.and_then(|header| header.get("name")).and_then(Value::as_str);
    let scope = header.and_then(|header| header.get("scope")).and_then(Value::as_str);
    match (name, scope) {
        (Some(name), Some(scope)) => format!("{name:?} (scope {scope:?})"),
        (Some(name), None) => format!("{name:?}"),
        _ => render(row),
    }
}

// ============================================================================
// SECTION: Text Comparison
// ============================================================================

/// Compares literal expected output with captured stdout, line by line.
#[must_use]
pub fn compare_output(expected: &str, actual: &str, files: &FileSubstitution) -> Vec<Mismatch> {
    let expected_lines = significant_lines(expected.lines());
    let actual_lines = significant_lines(actual.lines());
    compare_lines(
        DirectiveKind::Expect,
        MismatchKind::OutputMismatch,
        &expected_lines,
        &actual_lines,
        files,
    )
}

/// Compares expected response header lines with the captured headers in order.
#[must_use]
pub fn compare_response_headers(
    expected: &[&str],
    actual: &[ResponseHeader],
    files: &FileSubstitution,
) -> Vec<Mismatch> {
    let rendered: Vec<String> = actual.iter().map(ResponseHeader::render).collect();
    let actual_lines = significant_lines(rendered.iter().map(String::as_str));
    let expected_lines = significant_lines(expected.iter().copied());
    compare_lines(
        DirectiveKind::ExpectResponseHeaders,
        MismatchKind::HeaderMismatch,
        &expected_lines,
        &actual_lines,
        files,
    )
}

/// Checks captured stdout against the expected pattern.
#[must_use]
pub fn compare_regex(pattern: &Regex, actual: &str) -> Vec<Mismatch> {
    if pattern.is_match(actual) {
        return Vec::new();
    }
    vec![Mismatch::new(
        DirectiveKind::ExpectRegex,
        "output",
        MismatchKind::RegexMismatch,
        format!("output does not match /{}/", pattern.as_str()),
    )]
}

/// Trims trailing whitespace per line and drops trailing blank lines.
fn significant_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut out: Vec<&str> = lines.map(str::trim_end).collect();
    while out.last().is_some_and(|line| line.is_empty()) {
        out.pop();
    }
    out
}

/// Compares two line lists positionally.
fn compare_lines(
    block: DirectiveKind,
    kind: MismatchKind,
    expected: &[&str],
    actual: &[&str],
    files: &FileSubstitution,
) -> Vec<Mismatch> {
    let mut out = Vec::new();
    if expected.len() != actual.len() {
        out.push(Mismatch::new(
            block,
            "lines",
            kind,
            format!("expected {} lines, found {}", expected.len(), actual.len()),
        ));
    }
    for index in 0 .. expected.len().max(actual.len()) {
        let expected_line = expected.get(index).copied();
        let actual_line = actual.get(index).copied();
        let matched = match (expected_line, actual_line) {
            (Some(expected_line), Some(actual_line)) => files.matches(expected_line, actual_line),
            _ => false,
        };
        if !matched {
            out.push(Mismatch::new(
                block,
                format!("line {}", index + 1),
                kind,
                format!(
                    "expected {:?}, found {:?}",
                    expected_line.unwrap_or("<end of output>"),
                    actual_line.unwrap_or("<end of output>")
                ),
            ));
        }
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::path::Path;

    use serde_json::json;

    use super::compare_output;
    use super::compare_payload;
    use crate::core::directive::PayloadKind;
    use crate::core::verdict::MismatchKind;
    use crate::runtime::pattern::FileSubstitution;

    fn files() -> FileSubstitution {
        FileSubstitution::for_path(Path::new("tests/test_fixture.php"))
    }

    #[test]
    fn nested_paths_name_the_mismatch() {
        let expected = json!([[{"priority": 1, "name": "a"}], [{"priority": 2}]]);
        let actual = json!([[{"priority": 1, "name": "b"}], [{"priority": 3}]]);
        let out = compare_payload(PayloadKind::SpanEvents, &expected, Some(&actual), &files());
        let paths: Vec<_> = out.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, vec!["span_events[0][0].name", "span_events[1][0].priority"]);
    }

    #[test]
    fn integer_and_float_spellings_are_equal() {
        let out = compare_payload(PayloadKind::CustomEvents, &json!([1.0, 2]), Some(&json!([1, 2.0])), &files());
        assert!(out.is_empty());
    }

    #[test]
    fn missing_wildcard_key_is_accepted() {
        let expected = json!({"a": 1, "b": "??"});
        let out = compare_payload(PayloadKind::ErrorEvents, &expected, Some(&json!({"a": 1})), &files());
        assert!(out.is_empty());
    }

    #[test]
    fn exact_key_set_is_required() {
        let expected = json!({"a": 1, "b": 2});
        let out = compare_payload(PayloadKind::ErrorEvents, &expected, Some(&json!({"a": 1, "c": 2})), &files());
        let kinds: Vec<_> = out.iter().map(|m| m.kind).collect();
        assert_eq!(kinds, vec![MismatchKind::MissingField, MismatchKind::UnexpectedField]);
    }

    #[test]
    fn metric_rows_match_in_any_order() {
        let expected = json!(["?? agent run id", "??", "??", [
            [{"name": "OtherTransaction/all"}, [1, "??", "??", "??", "??", "??"]],
            [{"name": "Datastore/all", "scope": "OtherTransaction/php__FILE__"}, [2, "??", "??", "??", "??", "??"]]
        ]]);
        let actual = json!(["run", 1, 2, [
            [{"name": "Datastore/all", "scope": "OtherTransaction/phptests/test_fixture.php"}, [2, 0.1, 0.1, 0.1, 0.1, 0.01]],
            [{"name": "OtherTransaction/all"}, [1, 0.5, 0.5, 0.5, 0.5, 0.25]]
        ]]);
        assert!(compare_payload(PayloadKind::Metrics, &expected, Some(&actual), &files()).is_empty());

        let short = json!(["run", 1, 2, [
            [{"name": "OtherTransaction/all"}, [1, 0.5, 0.5, 0.5, 0.5, 0.25]],
            [{"name": "Extra/metric"}, [1, 0, 0, 0, 0, 0]]
        ]]);
        let out = compare_payload(PayloadKind::Metrics, &expected, Some(&short), &files());
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|m| m.kind == MismatchKind::UnmatchedElement));
    }

    #[test]
    fn wildcard_row_does_not_take_a_specific_rows_match() {
        let expected = json!(["??", "??", "??", [
            [{"name": "??"}, [1, "??", "??", "??", "??", "??"]],
            [{"name": "Datastore/all"}, [1, "??", "??", "??", "??", "??"]]
        ]]);
        let actual = json!(["run", 1, 2, [
            [{"name": "Datastore/all"}, [1, 0.1, 0.1, 0.1, 0.1, 0.01]],
            [{"name": "OtherTransaction/all"}, [1, 0.5, 0.5, 0.5, 0.5, 0.25]]
        ]]);
        assert!(compare_payload(PayloadKind::Metrics, &expected, Some(&actual), &files()).is_empty());
    }

    #[test]
    fn competing_rows_report_only_the_unpairable_ones() {
        let expected = json!(["??", "??", "??", [
            [{"name": "??"}, [1]],
            [{"name": "A"}, [1]],
            [{"name": "A"}, [1]]
        ]]);
        let actual = json!(["run", 1, 2, [
            [{"name": "A"}, [1]],
            [{"name": "B"}, [1]],
            [{"name": "C"}, [1]]
        ]]);
        let out = compare_payload(PayloadKind::Metrics, &expected, Some(&actual), &files());
        let paths: Vec<_> = out.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, vec!["metrics[3][2]", "metrics[3]"]);
        assert!(out.iter().all(|m| m.kind == MismatchKind::UnmatchedElement));
    }

    #[test]
    fn empty_array_expectation_requires_a_payload() {
        let out = compare_payload(PayloadKind::SpanEvents, &json!([]), None, &files());
        assert_eq!(out[0].kind, MismatchKind::ExpectedPayloadMissing);
        assert!(compare_payload(PayloadKind::SpanEvents, &json!(null), Some(&json!([])), &files()).is_empty());
    }

    #[test]
    fn output_ignores_trailing_whitespace_and_blank_lines() {
        assert!(compare_output("Hello\n", "Hello", &files()).is_empty());
        assert!(compare_output("a  \nb\n\n", "a\nb   \n", &files()).is_empty());
        let out = compare_output("a\nb\n", "a\n", &files());
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|m| m.kind == MismatchKind::OutputMismatch));
    }
}
