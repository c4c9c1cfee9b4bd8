// crates/fixture-harness-core/src/core/verdict.rs
// ============================================================================
// Module: Fixture Verdicts
// Description: Pass/fail/skip outcomes with mismatch detail.
// Purpose: Record the result of one fixture as an immutable value.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Verdict`] is the only thing a fixture worker hands to the aggregator.
//! Failed verdicts carry a [`FailureReason`] and, for comparison failures, the
//! complete ordered list of [`Mismatch`] entries rather than just the first.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::core::directive::DirectiveKind;

// ============================================================================
// SECTION: Identity
// ============================================================================

/// Report identity of a fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureIdentity {
    /// Fixture file path as discovered.
    pub path: PathBuf,
    /// Test case name (the fixture file name).
    pub name: String,
    /// Dotted grouping chain derived from the fixture's directories.
    pub classname: String,
}

impl FixtureIdentity {
    /// Creates an identity from a path, deriving the name and grouping from it.
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map_or_else(|| path.to_string_lossy().into_owned(), |n| n.to_string_lossy().into_owned());
        let classname = path.parent().map(dotted_chain).unwrap_or_default();
        Self {
            path,
            name,
            classname: if classname.is_empty() { "fixtures".to_string() } else { classname },
        }
    }
}

/// Joins the normal components of a directory path with dots.
pub(crate) fn dotted_chain(dir: &std::path::Path) -> String {
    dir.components()
        .filter_map(|component| match component {
            std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(".")
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Final outcome of a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictOutcome {
    /// Every expectation matched.
    Passed,
    /// At least one expectation failed or the fixture could not be run.
    Failed,
    /// The fixture was skipped by its guard, its own output, or cancellation.
    Skipped,
}

impl VerdictOutcome {
    /// Returns the stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Why a fixture failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureReason {
    /// Block markers could not be parsed.
    MalformedFixture,
    /// A JSON expectation block is not valid JSON.
    PayloadParseError,
    /// The executor did not finish within the fixture timeout.
    ExecutionTimeout,
    /// The executor failed to produce a result.
    ExecutionCrash,
    /// One or more expectations did not match.
    Mismatch,
}

impl FailureReason {
    /// Returns the stable label for the reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MalformedFixture => "MalformedFixture",
            Self::PayloadParseError => "PayloadParseError",
            Self::ExecutionTimeout => "ExecutionTimeout",
            Self::ExecutionCrash => "ExecutionCrash",
            Self::Mismatch => "MismatchError",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Mismatches
// ============================================================================

/// Classification of a single comparison mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MismatchKind {
    /// An expected object key is absent.
    MissingField,
    /// The actual object has a key the expectation does not name.
    UnexpectedField,
    /// Arrays differ in length.
    ArrayLengthMismatch,
    /// The actual value has a different JSON type.
    TypeMismatch,
    /// Scalars differ.
    ValueMismatch,
    /// An unordered element has no counterpart on the other side.
    UnmatchedElement,
    /// A payload expected to be absent was reported.
    UnexpectedPayloadPresent,
    /// A payload expected to be present was not reported.
    ExpectedPayloadMissing,
    /// Literal output lines differ.
    OutputMismatch,
    /// Output does not match the expected pattern.
    RegexMismatch,
    /// Response header lines differ.
    HeaderMismatch,
}

impl MismatchKind {
    /// Returns the stable label for the mismatch kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "MissingField",
            Self::UnexpectedField => "UnexpectedField",
            Self::ArrayLengthMismatch => "ArrayLengthMismatch",
            Self::TypeMismatch => "TypeMismatch",
            Self::ValueMismatch => "ValueMismatch",
            Self::UnmatchedElement => "UnmatchedElement",
            Self::UnexpectedPayloadPresent => "UnexpectedPayloadPresent",
            Self::ExpectedPayloadMissing => "ExpectedPayloadMissing",
            Self::OutputMismatch => "OutputMismatch",
            Self::RegexMismatch => "RegexMismatch",
            Self::HeaderMismatch => "HeaderMismatch",
        }
    }
}

/// One difference between expected and actual output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    /// Expectation block that produced the mismatch.
    pub block: DirectiveKind,
    /// Location inside the block (for example `span_events[2].priority`).
    pub path: String,
    /// Mismatch classification.
    pub kind: MismatchKind,
    /// Human-readable reason.
    pub reason: String,
}

impl Mismatch {
    /// Creates a mismatch record.
    #[must_use]
    pub fn new(
        block: DirectiveKind,
        path: impl Into<String>,
        kind: MismatchKind,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            block,
            path: path.into(),
            kind,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} [{}]: {}", self.block, self.path, self.kind.as_str(), self.reason)
    }
}

// ============================================================================
// SECTION: Verdict
// ============================================================================

/// Outcome of a single fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Fixture identity.
    pub identity: FixtureIdentity,
    /// Final outcome.
    pub outcome: VerdictOutcome,
    /// Failure classification for failed verdicts.
    pub reason: Option<FailureReason>,
    /// Free-form detail (skip reason, executor error, parse error).
    pub detail: Option<String>,
    /// Ordered comparison mismatches.
    pub mismatches: Vec<Mismatch>,
    /// Expected-failure annotation announced by the fixture output.
    pub xfail: Option<String>,
    /// Time spent on the fixture.
    pub duration: Duration,
}

impl Verdict {
    /// Creates a passed verdict.
    #[must_use]
    pub const fn passed(identity: FixtureIdentity, duration: Duration) -> Self {
        Self {
            identity,
            outcome: VerdictOutcome::Passed,
            reason: None,
            detail: None,
            mismatches: Vec::new(),
            xfail: None,
            duration,
        }
    }

    /// Creates a failed verdict that carries no comparison mismatches.
    #[must_use]
    pub fn failed(
        identity: FixtureIdentity,
        reason: FailureReason,
        detail: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            identity,
            outcome: VerdictOutcome::Failed,
            reason: Some(reason),
            detail: Some(detail.into()),
            mismatches: Vec::new(),
            xfail: None,
            duration,
        }
    }

    /// Creates a verdict from comparison results: passed when `mismatches` is empty.
    #[must_use]
    pub fn from_mismatches(
        identity: FixtureIdentity,
        mismatches: Vec<Mismatch>,
        duration: Duration,
    ) -> Self {
        if mismatches.is_empty() {
            return Self::passed(identity, duration);
        }
        Self {
            identity,
            outcome: VerdictOutcome::Failed,
            reason: Some(FailureReason::Mismatch),
            detail: None,
            mismatches,
            xfail: None,
            duration,
        }
    }

    /// Creates a skipped verdict.
    #[must_use]
    pub fn skipped(identity: FixtureIdentity, reason: impl Into<String>, duration: Duration) -> Self {
        Self {
            identity,
            outcome: VerdictOutcome::Skipped,
            reason: None,
            detail: Some(reason.into()),
            mismatches: Vec::new(),
            xfail: None,
            duration,
        }
    }

    /// Creates the verdict recorded for a fixture cancelled before it finished.
    #[must_use]
    pub fn cancelled(identity: FixtureIdentity) -> Self {
        Self::skipped(identity, "cancelled", Duration::ZERO)
    }

    /// Marks the verdict as an announced expected failure.
    #[must_use]
    pub fn with_xfail(mut self, note: Option<String>) -> Self {
        self.xfail = note;
        self
    }

    /// Returns true when the fixture failed and did not announce it would.
    #[must_use]
    pub const fn is_unexpected_failure(&self) -> bool {
        matches!(self.outcome, VerdictOutcome::Failed) && self.xfail.is_none()
    }

    /// Returns true when a rerun may change the outcome: the fixture timed
    /// out, or every mismatch is a payload that was never reported.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        if !matches!(self.outcome, VerdictOutcome::Failed) {
            return false;
        }
        match self.reason {
            Some(FailureReason::ExecutionTimeout) => true,
            Some(FailureReason::Mismatch) => {
                !self.mismatches.is_empty()
                    && self
                        .mismatches
                        .iter()
                        .all(|mismatch| mismatch.kind == MismatchKind::ExpectedPayloadMissing)
            }
            _ => false,
        }
    }

    /// Renders the failure detail text used by reports.
    #[must_use]
    pub fn failure_text(&self) -> String {
        let mut lines = Vec::new();
        if let Some(reason) = self.reason {
            lines.push(format!("reason: {reason}"));
        }
        if let Some(detail) = &self.detail {
            lines.push(detail.clone());
        }
        lines.extend(self.mismatches.iter().map(ToString::to_string));
        lines.join("\n")
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::FailureReason;
    use super::FixtureIdentity;
    use super::Mismatch;
    use super::MismatchKind;
    use super::Verdict;
    use super::VerdictOutcome;
    use crate::core::directive::DirectiveKind;

    #[test]
    fn identity_derives_dotted_grouping() {
        let identity = FixtureIdentity::from_path("tests/integration/pdo/test_slow_sql_1.php");
        assert_eq!(identity.name, "test_slow_sql_1.php");
        assert_eq!(identity.classname, "tests.integration.pdo");

        let bare = FixtureIdentity::from_path("test_bare.php");
        assert_eq!(bare.classname, "fixtures");
    }

    #[test]
    fn empty_mismatch_list_passes() {
        let identity = FixtureIdentity::from_path("a/test_a.php");
        let verdict = Verdict::from_mismatches(identity, Vec::new(), Duration::ZERO);
        assert_eq!(verdict.outcome, VerdictOutcome::Passed);
        assert!(verdict.reason.is_none());
    }

    #[test]
    fn failure_text_lists_every_mismatch() {
        let identity = FixtureIdentity::from_path("a/test_a.php");
        let mismatches = vec![
            Mismatch::new(DirectiveKind::Expect, "line 1", MismatchKind::OutputMismatch, "x"),
            Mismatch::new(DirectiveKind::ExpectMetrics, "metrics[0]", MismatchKind::ValueMismatch, "y"),
        ];
        let verdict = Verdict::from_mismatches(identity, mismatches, Duration::ZERO);
        assert_eq!(verdict.reason, Some(FailureReason::Mismatch));
        let text = verdict.failure_text();
        assert!(text.contains("EXPECT line 1 [OutputMismatch]: x"));
        assert!(text.contains("EXPECT_METRICS metrics[0] [ValueMismatch]: y"));
    }

    #[test]
    fn xfail_failures_are_not_unexpected() {
        let identity = FixtureIdentity::from_path("a/test_a.php");
        let verdict =
            Verdict::failed(identity, FailureReason::ExecutionCrash, "boom", Duration::ZERO)
                .with_xfail(Some("xfail: known issue".to_string()));
        assert!(!verdict.is_unexpected_failure());
    }

    #[test]
    fn only_missing_payloads_and_timeouts_are_retryable() {
        let identity = FixtureIdentity::from_path("a/test_a.php");
        let missing = Mismatch::new(
            DirectiveKind::ExpectMetrics,
            "metrics",
            MismatchKind::ExpectedPayloadMissing,
            "none",
        );
        let output = Mismatch::new(DirectiveKind::Expect, "line 1", MismatchKind::OutputMismatch, "x");

        let no_telemetry =
            Verdict::from_mismatches(identity.clone(), vec![missing.clone()], Duration::ZERO);
        assert!(no_telemetry.is_retryable());
        let mixed = Verdict::from_mismatches(identity.clone(), vec![missing, output], Duration::ZERO);
        assert!(!mixed.is_retryable());
        let timeout =
            Verdict::failed(identity.clone(), FailureReason::ExecutionTimeout, "slow", Duration::ZERO);
        assert!(timeout.is_retryable());
        let crash = Verdict::failed(identity.clone(), FailureReason::ExecutionCrash, "boom", Duration::ZERO);
        assert!(!crash.is_retryable());
        assert!(!Verdict::passed(identity, Duration::ZERO).is_retryable());
    }
}
