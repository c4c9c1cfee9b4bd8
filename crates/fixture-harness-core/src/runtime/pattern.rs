// crates/fixture-harness-core/src/runtime/pattern.rs
// ============================================================================
// Module: Wildcard Patterns
// Description: Wildcard token recognition and `??` string globbing.
// Purpose: Share placeholder semantics between JSON and text comparison.
// Dependencies: std
// ============================================================================

//! ## Overview
//! `??` is the only wildcard. As a whole value, or as a `"?? note"` string
//! whose note is documentation, it accepts anything. Inside a longer string it
//! matches any run of characters, so `"in foo.php (??)"` accepts any line
//! number. The `__FILE__` placeholder is replaced by each spelling of the
//! fixture path before matching.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use serde_json::Value;

// ============================================================================
// SECTION: Wildcards
// ============================================================================

/// The wildcard token.
pub const WILDCARD: &str = "??";

/// Placeholder for the fixture's own path.
pub const FILE_PLACEHOLDER: &str = "__FILE__";

/// Returns true when a string is a whole-value wildcard.
#[must_use]
pub fn is_wildcard_str(value: &str) -> bool {
    value == WILDCARD || value.starts_with("?? ")
}

/// Returns true when a JSON value is a whole-value wildcard.
#[must_use]
pub fn is_wildcard(value: &Value) -> bool {
    value.as_str().is_some_and(is_wildcard_str)
}

/// Matches `actual` against `pattern`, where each `??` matches any run of
/// characters (including none). Patterns without `??` require equality.
#[must_use]
pub fn glob_match(pattern: &str, actual: &str) -> bool {
    if !pattern.contains(WILDCARD) {
        return pattern == actual;
    }
    let segments: Vec<&str> = pattern.split(WILDCARD).collect();
    let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
        return pattern == actual;
    };
    if actual.len() < first.len() + last.len()
        || !actual.starts_with(first)
        || !actual.ends_with(last)
    {
        return false;
    }
    let mut remaining = &actual[first.len() .. actual.len() - last.len()];
    for segment in &segments[1 .. segments.len() - 1] {
        match remaining.find(segment) {
            Some(offset) => remaining = &remaining[offset + segment.len() ..],
            None => return false,
        }
    }
    true
}

// ============================================================================
// SECTION: File Substitution
// ============================================================================

/// Spellings of a fixture path accepted in place of `__FILE__`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSubstitution {
    /// Candidate spellings, most specific first.
    candidates: Vec<String>,
}

impl FileSubstitution {
    /// Builds the candidates for a fixture path: as given, canonical, and file name.
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        let mut candidates = Vec::new();
        if let Ok(canonical) = std::fs::canonicalize(path) {
            candidates.push(canonical.display().to_string());
        }
        candidates.push(path.display().to_string());
        if let Some(name) = path.file_name() {
            candidates.push(name.to_string_lossy().into_owned());
        }
        candidates.dedup();
        Self { candidates }
    }

    /// Matches an expected string against an actual one, honoring both
    /// `__FILE__` and `??`.
    #[must_use]
    pub fn matches(&self, expected: &str, actual: &str) -> bool {
        if is_wildcard_str(expected) {
            return true;
        }
        if !expected.contains(FILE_PLACEHOLDER) {
            return glob_match(expected, actual);
        }
        self.candidates
            .iter()
            .any(|candidate| glob_match(&expected.replace(FILE_PLACEHOLDER, candidate), actual))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::path::Path;

    use serde_json::json;

    use super::FileSubstitution;
    use super::glob_match;
    use super::is_wildcard;

    #[test]
    fn wildcard_tokens() {
        assert!(is_wildcard(&json!("??")));
        assert!(is_wildcard(&json!("?? agent run id")));
        assert!(!is_wildcard(&json!("??x")));
        assert!(!is_wildcard(&json!(1)));
    }

    #[test]
    fn glob_segments_match_in_order() {
        assert!(glob_match("a ?? c", "a b c"));
        assert!(glob_match("a ?? c", "a  c"));
        assert!(glob_match("??", ""));
        assert!(glob_match("x??y??z", "xAAyBBz"));
        assert!(!glob_match("x??y??z", "xAAzBBy"));
        assert!(!glob_match("ab??ba", "aba"));
        assert!(glob_match("plain", "plain"));
        assert!(!glob_match("plain", "plain "));
    }

    #[test]
    fn file_placeholder_accepts_full_path_or_basename() {
        let files = FileSubstitution::for_path(Path::new("tests/pdo/test_query.php"));
        assert!(files.matches(" in PDO::query called at __FILE__ (??)", " in PDO::query called at tests/pdo/test_query.php (12)"));
        assert!(files.matches("__FILE__", "test_query.php"));
        assert!(!files.matches("__FILE__", "other.php"));
    }
}
