// crates/fixture-harness-core/src/core/fixture.rs
// ============================================================================
// Module: Fixture Parser
// Description: Extracts directive blocks from fixture source text.
// Purpose: Produce an immutable, fully validated fixture before execution.
// Dependencies: regex, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Fixtures carry `/*NAME ... */` directive blocks before or between their
//! executable payload. Parsing is strict for recognized blocks: an
//! unterminated block, a malformed `INI`/`HEADERS` line, invalid JSON in a
//! payload expectation, or an invalid `EXPECT_REGEX` pattern all fail the
//! fixture up front. Unrecognized and unnamed comments are skipped.
//!
//! Expectation bodies keep `__FILE__` verbatim; substitution happens at
//! comparison time. Bare `??` tokens outside JSON strings are normalized to
//! the string wildcard `"??"` before the body is parsed.
//!
//! Security posture: fixture files are untrusted input; reads are bounded by
//! [`MAX_FIXTURE_BYTES`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use regex::Regex;
use regex::RegexBuilder;
use serde_json::Value;
use thiserror::Error;

use crate::core::directive::DirectiveBlock;
use crate::core::directive::DirectiveKind;
use crate::core::directive::PayloadKind;
use crate::core::verdict::FailureReason;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum fixture file size accepted by [`Fixture::load`].
pub const MAX_FIXTURE_BYTES: usize = 4 * 1024 * 1024;

/// Opening marker of a directive block.
const BLOCK_OPEN: &str = "/*";
/// Closing marker of a directive block.
const BLOCK_CLOSE: &str = "*/";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Fixture parse errors. Each is fatal for its fixture only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FixtureError {
    /// Fixture file could not be read.
    #[error("failed to read fixture {path}: {message}")]
    Io {
        /// Fixture path.
        path: String,
        /// Underlying error message.
        message: String,
    },
    /// A recognized block has no closing marker.
    #[error("{path}:{line}: block {block} has no closing */")]
    Unterminated {
        /// Fixture path.
        path: String,
        /// Block name.
        block: DirectiveKind,
        /// Line of the block start marker.
        line: usize,
    },
    /// A block body violates its line grammar.
    #[error("{path}: {message}")]
    Malformed {
        /// Fixture path.
        path: String,
        /// Description of the violation.
        message: String,
    },
    /// A JSON expectation block is not valid JSON.
    #[error("{path}: block {block} is not valid JSON: {message}")]
    PayloadParse {
        /// Fixture path.
        path: String,
        /// Block name.
        block: DirectiveKind,
        /// Parser error message.
        message: String,
    },
    /// The `EXPECT_REGEX` body is not a valid pattern.
    #[error("{path}: block EXPECT_REGEX is not a valid pattern: {message}")]
    InvalidRegex {
        /// Fixture path.
        path: String,
        /// Regex compiler error message.
        message: String,
    },
}

impl FixtureError {
    /// Returns the verdict failure reason for this error.
    #[must_use]
    pub const fn failure_reason(&self) -> FailureReason {
        match self {
            Self::PayloadParse { .. } => FailureReason::PayloadParseError,
            Self::Io { .. }
            | Self::Unterminated { .. }
            | Self::Malformed { .. }
            | Self::InvalidRegex { .. } => FailureReason::MalformedFixture,
        }
    }
}

// ============================================================================
// SECTION: Fixture
// ============================================================================

/// A parsed fixture. Immutable after [`Fixture::parse`].
#[derive(Debug, Clone)]
pub struct Fixture {
    /// Fixture path as given to the parser.
    path: PathBuf,
    /// Recognized blocks; first occurrence of each name wins.
    blocks: BTreeMap<DirectiveKind, DirectiveBlock>,
    /// Runtime configuration overrides in declaration order.
    ini: Vec<(String, String)>,
    /// Injected request headers in declaration order.
    headers: Vec<(String, String)>,
    /// Parsed JSON expectations keyed by payload kind.
    payload_expectations: BTreeMap<PayloadKind, Value>,
    /// Compiled `EXPECT_REGEX` pattern.
    expected_regex: Option<Regex>,
}

impl Fixture {
    /// Reads and parses a fixture file.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] when the file cannot be read, exceeds
    /// [`MAX_FIXTURE_BYTES`], is not UTF-8, or fails to parse.
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let display = path.display().to_string();
        let io_error = |message: String| FixtureError::Io {
            path: display.clone(),
            message,
        };
        let file = File::open(path).map_err(|err| io_error(err.to_string()))?;
        let mut bytes = Vec::new();
        let limit = u64::try_from(MAX_FIXTURE_BYTES).unwrap_or(u64::MAX).saturating_add(1);
        file.take(limit).read_to_end(&mut bytes).map_err(|err| io_error(err.to_string()))?;
        if bytes.len() > MAX_FIXTURE_BYTES {
            return Err(io_error(format!("file exceeds {MAX_FIXTURE_BYTES} bytes")));
        }
        let source =
            String::from_utf8(bytes).map_err(|_| io_error("file is not valid UTF-8".to_string()))?;
        Self::parse(path, &source)
    }

    /// Parses fixture source text.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] for unterminated blocks, malformed `INI` or
    /// `HEADERS` lines, invalid JSON bodies, or an invalid regex.
    pub fn parse(path: impl Into<PathBuf>, source: &str) -> Result<Self, FixtureError> {
        let path = path.into();
        let display = path.display().to_string();

        let blocks = scan_blocks(&display, source)?;
        let ini = match blocks.get(&DirectiveKind::Ini) {
            Some(block) => parse_assignments(&display, block, true)?,
            None => Vec::new(),
        };
        let headers = match blocks.get(&DirectiveKind::Headers) {
            Some(block) => parse_assignments(&display, block, false)?,
            None => Vec::new(),
        };

        let mut payload_expectations = BTreeMap::new();
        for block in blocks.values() {
            let Some(kind) = block.kind.payload_kind() else {
                continue;
            };
            let normalized = normalize_wildcards(&block.body);
            let value: Value =
                serde_json::from_str(&normalized).map_err(|err| FixtureError::PayloadParse {
                    path: display.clone(),
                    block: block.kind,
                    message: err.to_string(),
                })?;
            payload_expectations.insert(kind, value);
        }

        let expected_regex = match blocks.get(&DirectiveKind::ExpectRegex) {
            Some(block) => Some(
                RegexBuilder::new(block.body.trim())
                    .multi_line(true)
                    .build()
                    .map_err(|err| FixtureError::InvalidRegex {
                        path: display.clone(),
                        message: err.to_string(),
                    })?,
            ),
            None => None,
        };

        Ok(Self {
            path,
            blocks,
            ini,
            headers,
            payload_expectations,
            expected_regex,
        })
    }

    /// Returns the fixture path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the block of the given kind, if present.
    #[must_use]
    pub fn block(&self, kind: DirectiveKind) -> Option<&DirectiveBlock> {
        self.blocks.get(&kind)
    }

    /// Returns every recognized block in canonical order.
    pub fn blocks(&self) -> impl Iterator<Item = &DirectiveBlock> {
        self.blocks.values()
    }

    /// Returns the trimmed `DESCRIPTION` text.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.block(DirectiveKind::Description).map(|block| block.body.trim())
    }

    /// Returns the `SKIPIF` guard script.
    #[must_use]
    pub fn skip_guard(&self) -> Option<&str> {
        self.block(DirectiveKind::SkipIf).map(|block| block.body.as_str())
    }

    /// Returns configuration overrides in declaration order.
    #[must_use]
    pub fn ini(&self) -> &[(String, String)] {
        &self.ini
    }

    /// Returns injected request headers in declaration order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Returns the parsed expectation for a payload kind.
    #[must_use]
    pub fn payload_expectation(&self, kind: PayloadKind) -> Option<&Value> {
        self.payload_expectations.get(&kind)
    }

    /// Returns the literal `EXPECT` body.
    #[must_use]
    pub fn expected_output(&self) -> Option<&str> {
        self.block(DirectiveKind::Expect).map(|block| block.body.as_str())
    }

    /// Returns the compiled `EXPECT_REGEX` pattern.
    #[must_use]
    pub const fn expected_regex(&self) -> Option<&Regex> {
        self.expected_regex.as_ref()
    }

    /// Returns the `EXPECT_RESPONSE_HEADERS` lines, blank lines removed.
    #[must_use]
    pub fn expected_response_headers(&self) -> Option<Vec<&str>> {
        self.block(DirectiveKind::ExpectResponseHeaders).map(|block| {
            block.body.lines().map(str::trim).filter(|line| !line.is_empty()).collect()
        })
    }

    /// Returns true when the fixture declares any expectation block.
    #[must_use]
    pub fn has_expectations(&self) -> bool {
        self.blocks.keys().any(|kind| {
            !matches!(
                kind,
                DirectiveKind::Description
                    | DirectiveKind::SkipIf
                    | DirectiveKind::Ini
                    | DirectiveKind::Headers
            )
        })
    }
}

// ============================================================================
// SECTION: Block Scanning
// ============================================================================

/// Scans source text for recognized directive blocks.
fn scan_blocks(
    path: &str,
    source: &str,
) -> Result<BTreeMap<DirectiveKind, DirectiveBlock>, FixtureError> {
    let mut blocks = BTreeMap::new();
    let mut cursor = 0;
    while let Some(offset) = source[cursor ..].find(BLOCK_OPEN) {
        let start = cursor + offset;
        let name_start = start + BLOCK_OPEN.len();
        let rest = &source[name_start ..];
        let name_len =
            rest.bytes().take_while(|byte| byte.is_ascii_uppercase() || *byte == b'_').count();
        let name_ends_cleanly =
            rest[name_len ..].chars().next().is_none_or(|next| next.is_whitespace() || next == '*');
        let kind = if name_len > 0 && name_ends_cleanly {
            DirectiveKind::from_name(&rest[.. name_len])
        } else {
            None
        };
        let body_start = name_start + name_len;
        let Some(end_offset) = source[body_start ..].find(BLOCK_CLOSE) else {
            if let Some(kind) = kind {
                return Err(FixtureError::Unterminated {
                    path: path.to_string(),
                    block: kind,
                    line: line_of(source, start),
                });
            }
            break;
        };
        let end = body_start + end_offset;
        if let Some(kind) = kind {
            blocks.entry(kind).or_insert_with(|| DirectiveBlock {
                kind,
                body: strip_marker_line(&source[body_start .. end]).to_string(),
                line: line_of(source, start),
            });
        }
        cursor = end + BLOCK_CLOSE.len();
    }
    Ok(blocks)
}

/// Returns the one-based line number of a byte offset.
fn line_of(source: &str, offset: usize) -> usize {
    source[.. offset].matches('\n').count() + 1
}

/// Removes the remainder of the marker line (trailing blanks and one newline).
fn strip_marker_line(body: &str) -> &str {
    let trimmed = body.trim_start_matches([' ', '\t']);
    trimmed
        .strip_prefix("\r\n")
        .or_else(|| trimmed.strip_prefix('\n'))
        .unwrap_or(trimmed)
}

// ============================================================================
// SECTION: Body Grammars
// ============================================================================

/// Parses `key = value` lines from an `INI` or `HEADERS` block.
fn parse_assignments(
    path: &str,
    block: &DirectiveBlock,
    allow_comments: bool,
) -> Result<Vec<(String, String)>, FixtureError> {
    let mut entries = Vec::new();
    for (index, raw) in block.body.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || (allow_comments && (line.starts_with(';') || line.starts_with('#')))
        {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(FixtureError::Malformed {
                path: path.to_string(),
                message: format!(
                    "{} line {}: expected key=value, found {line:?}",
                    block.kind,
                    block.line + index + 1
                ),
            });
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(FixtureError::Malformed {
                path: path.to_string(),
                message: format!("{} line {}: empty key", block.kind, block.line + index + 1),
            });
        }
        entries.push((key.to_string(), value.trim().to_string()));
    }
    Ok(entries)
}

/// Rewrites bare `??` tokens outside JSON strings as the string `"??"`.
pub(crate) fn normalize_wildcards(body: &str) -> String {
    let mut out = String::with_capacity(body.len() + 8);
    let mut in_string = false;
    let mut escaped = false;
    let mut chars = body.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
            }
            '?' if chars.peek() == Some(&'?') => {
                chars.next();
                out.push_str("\"??\"");
            }
            _ => out.push(ch),
        }
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use serde_json::json;

    use super::Fixture;
    use super::FixtureError;
    use super::normalize_wildcards;
    use crate::core::directive::DirectiveKind;
    use crate::core::directive::PayloadKind;
    use crate::core::verdict::FailureReason;

    #[test]
    fn bare_wildcards_become_strings() {
        let normalized = normalize_wildcards(r#"{"priority": ??, "name": "a ?? b", "q": "\"??"}"#);
        assert_eq!(normalized, r#"{"priority": "??", "name": "a ?? b", "q": "\"??"}"#);
    }

    #[test]
    fn marker_line_remainder_is_dropped() {
        let fixture = Fixture::parse("t.php", "<?php\n/*EXPECT   \nhello\n*/\necho 'hello';\n").unwrap();
        assert_eq!(fixture.expected_output(), Some("hello\n"));
        assert_eq!(fixture.block(DirectiveKind::Expect).unwrap().line, 2);
    }

    #[test]
    fn first_occurrence_wins_and_unknown_blocks_are_ignored() {
        let source = "/*EXPECT\none\n*/\n/*EXPECT\ntwo\n*/\n/*XFAIL later */\n/*\n * note */";
        let fixture = Fixture::parse("t.php", source).unwrap();
        assert_eq!(fixture.expected_output(), Some("one\n"));
        assert_eq!(fixture.blocks().count(), 1);
    }

    #[test]
    fn unterminated_recognized_block_fails() {
        let err = Fixture::parse("t.php", "/*EXPECT\nhello\n").unwrap_err();
        assert!(matches!(err, FixtureError::Unterminated { block: DirectiveKind::Expect, .. }));
        assert_eq!(err.failure_reason(), FailureReason::MalformedFixture);
    }

    #[test]
    fn unterminated_unnamed_comment_is_tolerated() {
        let fixture = Fixture::parse("t.php", "/*EXPECT\nok\n*/\n$x = '/* open';\n").unwrap();
        assert_eq!(fixture.expected_output(), Some("ok\n"));
    }

    #[test]
    fn ini_and_headers_keep_declaration_order() {
        let source = "/*INI\n; comment\nnewrelic.distributed_tracing_enabled = 1\nnewrelic.appname=app\n*/\n\
                      /*HEADERS\nX-Request-Start=1368811467146000\nX-Other=a=b\n*/";
        let fixture = Fixture::parse("t.php", source).unwrap();
        assert_eq!(
            fixture.ini(),
            &[
                ("newrelic.distributed_tracing_enabled".to_string(), "1".to_string()),
                ("newrelic.appname".to_string(), "app".to_string()),
            ]
        );
        assert_eq!(fixture.headers()[1], ("X-Other".to_string(), "a=b".to_string()));
    }

    #[test]
    fn ini_line_without_assignment_is_malformed() {
        let err = Fixture::parse("t.php", "/*INI\nnot an assignment\n*/").unwrap_err();
        assert!(matches!(err, FixtureError::Malformed { .. }));
    }

    #[test]
    fn invalid_json_is_a_payload_parse_error() {
        let err = Fixture::parse("t.php", "/*EXPECT_METRICS\n[1, 2,\n*/").unwrap_err();
        assert!(matches!(err, FixtureError::PayloadParse { block: DirectiveKind::ExpectMetrics, .. }));
        assert_eq!(err.failure_reason(), FailureReason::PayloadParseError);
    }

    #[test]
    fn json_blocks_are_parsed_with_wildcards() {
        let source = "/*EXPECT_SPAN_EVENTS\nnull\n*/\n/*EXPECT_TRACED_ERRORS\n[[\"??\", ??]]\n*/";
        let fixture = Fixture::parse("t.php", source).unwrap();
        assert_eq!(fixture.payload_expectation(PayloadKind::SpanEvents), Some(&json!(null)));
        assert_eq!(
            fixture.payload_expectation(PayloadKind::TracedErrors),
            Some(&json!([["??", "??"]]))
        );
        assert!(fixture.payload_expectation(PayloadKind::Metrics).is_none());
    }

    #[test]
    fn regex_block_is_multi_line() {
        let fixture = Fixture::parse("t.php", "/*EXPECT_REGEX\n^ok$\n*/").unwrap();
        assert!(fixture.expected_regex().unwrap().is_match("first\nok\nlast"));

        let err = Fixture::parse("t.php", "/*EXPECT_REGEX\n(unclosed\n*/").unwrap_err();
        assert!(matches!(err, FixtureError::InvalidRegex { .. }));
    }

    #[test]
    fn file_placeholder_is_preserved() {
        let fixture = Fixture::parse("t.php", "/*EXPECT\nin __FILE__ (??)\n*/").unwrap();
        assert_eq!(fixture.expected_output(), Some("in __FILE__ (??)\n"));
    }
}
