// crates/fixture-harness-core/tests/proptest_wildcards.rs
// ============================================================================
// Module: Wildcard Property-Based Tests
// Description: Property tests for wildcard monotonicity and comparator stability.
// Purpose: Detect widening violations and panics across wide input ranges.
// ============================================================================

//! Property-based tests for wildcard comparison invariants.

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
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::BTreeSet;
use std::path::Path;

use fixture_harness_core::DirectiveKind;
use fixture_harness_core::PayloadKind;
use fixture_harness_core::runtime::comparator::compare_json;
use fixture_harness_core::runtime::comparator::compare_payload;
use fixture_harness_core::runtime::pattern::FileSubstitution;
use proptest::prelude::*;
use serde_json::Value;
use serde_json::json;

/// Generates arbitrary JSON values up to `max_depth` levels deep.
fn json_value_strategy(max_depth: u32) -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1000_i64 .. 1000).prop_map(|v| Value::Number(v.into())),
        (-1000.0_f64 .. 1000.0)
            .prop_map(|v| serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)),
        "[a-z ]{0,6}".prop_map(Value::String),
    ];

    leaf.prop_recursive(max_depth, 48, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0 .. 4).prop_map(Value::Array),
            prop::collection::btree_map("[a-c]{1,2}", inner, 0 .. 4).prop_map(|map| {
                let mut object = serde_json::Map::new();
                for (key, value) in map {
                    object.insert(key, value);
                }
                Value::Object(object)
            }),
        ]
    })
}

/// Collects the location of every leaf as a list of steps.
fn leaf_locations(value: &Value, prefix: &mut Vec<Step>, out: &mut Vec<Vec<Step>>) {
    match value {
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                prefix.push(Step::Index(index));
                leaf_locations(item, prefix, out);
                prefix.pop();
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                prefix.push(Step::Key(key.clone()));
                leaf_locations(item, prefix, out);
                prefix.pop();
            }
        }
        _ => out.push(prefix.clone()),
    }
}

/// One step into a JSON value.
#[derive(Debug, Clone)]
enum Step {
    /// Array position.
    Index(usize),
    /// Object key.
    Key(String),
}

/// Replaces the leaf at `location` with the wildcard token.
fn replace_with_wildcard(value: &mut Value, location: &[Step]) {
    let Some((first, rest)) = location.split_first() else {
        *value = json!("??");
        return;
    };
    let child = match (first, value) {
        (Step::Index(index), Value::Array(items)) => items.get_mut(*index),
        (Step::Key(key), Value::Object(map)) => map.get_mut(key),
        _ => None,
    };
    if let Some(child) = child {
        replace_with_wildcard(child, rest);
    }
}

/// Returns the mismatch paths and kinds for a custom events comparison.
fn mismatch_paths(expected: &Value, actual: &Value) -> BTreeSet<String> {
    let files = FileSubstitution::for_path(Path::new("test_prop.php"));
    compare_json(DirectiveKind::ExpectCustomEvents, "events", expected, actual, &files)
        .into_iter()
        .map(|mismatch| format!("{} {}", mismatch.path, mismatch.kind.as_str()))
        .collect()
}

/// Builds metric rows with colliding names and counts, plus a shuffled copy.
fn metric_rows_strategy() -> impl Strategy<Value = (Vec<Value>, Vec<Value>)> {
    prop::collection::vec(("[A-C]/all", prop::collection::vec(0_i64 .. 3, 2)), 1 .. 6)
        .prop_map(|rows| {
            rows.into_iter()
                .map(|(name, counts)| json!([{"name": name}, counts]))
                .collect::<Vec<_>>()
        })
        .prop_flat_map(|rows| (Just(rows.clone()), Just(rows).prop_shuffle()))
}

/// Returns rendered mismatches for a metrics payload comparison.
fn metric_mismatches(expected: &Value, actual: &Value) -> Vec<String> {
    let files = FileSubstitution::for_path(Path::new("test_prop.php"));
    compare_payload(PayloadKind::Metrics, expected, Some(actual), &files)
        .into_iter()
        .map(|mismatch| format!("{} {}", mismatch.path, mismatch.reason))
        .collect()
}

proptest! {
    #[test]
    fn comparison_is_reflexive(value in json_value_strategy(3)) {
        prop_assert!(mismatch_paths(&value, &value).is_empty());
    }

    #[test]
    fn wildcard_leaf_only_widens_acceptance(
        expected in json_value_strategy(3),
        actual in json_value_strategy(3),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut locations = Vec::new();
        leaf_locations(&expected, &mut Vec::new(), &mut locations);
        prop_assume!(!locations.is_empty());
        let location = pick.get(&locations).clone();
        let mut widened = expected.clone();
        replace_with_wildcard(&mut widened, &location);

        let before = mismatch_paths(&expected, &actual);
        let after = mismatch_paths(&widened, &actual);
        prop_assert!(after.is_subset(&before), "before={before:?} after={after:?}");
        if before.is_empty() {
            prop_assert!(after.is_empty());
        }
    }

    #[test]
    fn wildcard_in_metric_rows_keeps_a_passing_payload_passing(
        (rows, shuffled) in metric_rows_strategy(),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 1 .. 4),
    ) {
        let expected = json!(["run", 0, 1, rows]);
        let actual = json!(["run", 0, 1, shuffled]);
        prop_assert!(metric_mismatches(&expected, &actual).is_empty());

        let mut locations = Vec::new();
        leaf_locations(&expected, &mut Vec::new(), &mut locations);
        let mut widened = expected.clone();
        for pick in &picks {
            replace_with_wildcard(&mut widened, pick.get::<Vec<Step>>(&locations));
        }
        let after = metric_mismatches(&widened, &actual);
        prop_assert!(after.is_empty(), "widened={widened} after={after:?}");
    }

    #[test]
    fn whole_value_wildcard_accepts_anything(actual in json_value_strategy(3)) {
        prop_assert!(mismatch_paths(&json!("??"), &actual).is_empty());
        prop_assert!(mismatch_paths(&json!("?? any note"), &actual).is_empty());
    }

    #[test]
    fn integer_and_float_spellings_agree(value in -100_000_i64 .. 100_000) {
        let float = serde_json::Number::from_f64(value as f64).map_or(Value::Null, Value::Number);
        prop_assert!(mismatch_paths(&json!(value), &float).is_empty());
    }
}
