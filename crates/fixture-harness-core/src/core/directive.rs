// crates/fixture-harness-core/src/core/directive.rs
// ============================================================================
// Module: Fixture Directive Blocks
// Description: Directive block names and telemetry payload kinds.
// Purpose: Map block markers onto typed kinds with fixed body semantics.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A directive block is a `/*NAME ... */` region inside a fixture. The set of
//! recognized names is closed; anything else is ignored by the parser so new
//! annotations can be added to fixtures without breaking older harnesses.
//! Each JSON-typed expectation block maps onto exactly one [`PayloadKind`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Directive Kinds
// ============================================================================

/// Recognized directive block names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DirectiveKind {
    /// Free-form fixture description.
    #[serde(rename = "DESCRIPTION")]
    Description,
    /// Guard script deciding whether the fixture is skipped.
    #[serde(rename = "SKIPIF")]
    SkipIf,
    /// Runtime configuration overrides.
    #[serde(rename = "INI")]
    Ini,
    /// Request headers injected into the fixture execution.
    #[serde(rename = "HEADERS")]
    Headers,
    /// Literal expected stdout.
    #[serde(rename = "EXPECT")]
    Expect,
    /// Regular expression the stdout must match.
    #[serde(rename = "EXPECT_REGEX")]
    ExpectRegex,
    /// Expected metrics payload.
    #[serde(rename = "EXPECT_METRICS")]
    ExpectMetrics,
    /// Expected transaction traces payload.
    #[serde(rename = "EXPECT_TXN_TRACES")]
    ExpectTxnTraces,
    /// Expected span events payload.
    #[serde(rename = "EXPECT_SPAN_EVENTS")]
    ExpectSpanEvents,
    /// Expected slow SQL payload.
    #[serde(rename = "EXPECT_SLOW_SQLS")]
    ExpectSlowSqls,
    /// Expected custom events payload.
    #[serde(rename = "EXPECT_CUSTOM_EVENTS")]
    ExpectCustomEvents,
    /// Expected analytics (transaction) events payload.
    #[serde(rename = "EXPECT_ANALYTICS_EVENTS")]
    ExpectAnalyticsEvents,
    /// Expected error events payload.
    #[serde(rename = "EXPECT_ERROR_EVENTS")]
    ExpectErrorEvents,
    /// Literal expected response headers.
    #[serde(rename = "EXPECT_RESPONSE_HEADERS")]
    ExpectResponseHeaders,
    /// Expected traced errors payload.
    #[serde(rename = "EXPECT_TRACED_ERRORS")]
    ExpectTracedErrors,
}

impl DirectiveKind {
    /// Every recognized directive kind in canonical order.
    pub const ALL: [Self; 15] = [
        Self::Description,
        Self::SkipIf,
        Self::Ini,
        Self::Headers,
        Self::Expect,
        Self::ExpectRegex,
        Self::ExpectMetrics,
        Self::ExpectTxnTraces,
        Self::ExpectSpanEvents,
        Self::ExpectSlowSqls,
        Self::ExpectCustomEvents,
        Self::ExpectAnalyticsEvents,
        Self::ExpectErrorEvents,
        Self::ExpectResponseHeaders,
        Self::ExpectTracedErrors,
    ];

    /// Returns the block marker name as written in fixtures.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Description => "DESCRIPTION",
            Self::SkipIf => "SKIPIF",
            Self::Ini => "INI",
            Self::Headers => "HEADERS",
            Self::Expect => "EXPECT",
            Self::ExpectRegex => "EXPECT_REGEX",
            Self::ExpectMetrics => "EXPECT_METRICS",
            Self::ExpectTxnTraces => "EXPECT_TXN_TRACES",
            Self::ExpectSpanEvents => "EXPECT_SPAN_EVENTS",
            Self::ExpectSlowSqls => "EXPECT_SLOW_SQLS",
            Self::ExpectCustomEvents => "EXPECT_CUSTOM_EVENTS",
            Self::ExpectAnalyticsEvents => "EXPECT_ANALYTICS_EVENTS",
            Self::ExpectErrorEvents => "EXPECT_ERROR_EVENTS",
            Self::ExpectResponseHeaders => "EXPECT_RESPONSE_HEADERS",
            Self::ExpectTracedErrors => "EXPECT_TRACED_ERRORS",
        }
    }

    /// Resolves a block marker name. Names are case-sensitive.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Returns the telemetry payload kind checked by this block, if any.
    #[must_use]
    pub const fn payload_kind(self) -> Option<PayloadKind> {
        match self {
            Self::ExpectMetrics => Some(PayloadKind::Metrics),
            Self::ExpectTxnTraces => Some(PayloadKind::TxnTraces),
            Self::ExpectSpanEvents => Some(PayloadKind::SpanEvents),
            Self::ExpectSlowSqls => Some(PayloadKind::SlowSqls),
            Self::ExpectCustomEvents => Some(PayloadKind::CustomEvents),
            Self::ExpectAnalyticsEvents => Some(PayloadKind::AnalyticsEvents),
            Self::ExpectErrorEvents => Some(PayloadKind::ErrorEvents),
            Self::ExpectTracedErrors => Some(PayloadKind::TracedErrors),
            Self::Description
            | Self::SkipIf
            | Self::Ini
            | Self::Headers
            | Self::Expect
            | Self::ExpectRegex
            | Self::ExpectResponseHeaders => None,
        }
    }

    /// Returns true when the block body is parsed as JSON.
    #[must_use]
    pub const fn is_json(self) -> bool {
        self.payload_kind().is_some()
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// SECTION: Payload Kinds
// ============================================================================

/// Telemetry payload documents reported by the monitored process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    /// Metric timeslice data.
    Metrics,
    /// Transaction traces.
    TxnTraces,
    /// Span events.
    SpanEvents,
    /// Slow SQL traces.
    SlowSqls,
    /// Custom events.
    CustomEvents,
    /// Analytics (transaction) events.
    AnalyticsEvents,
    /// Error events.
    ErrorEvents,
    /// Traced errors.
    TracedErrors,
}

impl PayloadKind {
    /// Every payload kind in canonical comparison order.
    pub const ALL: [Self; 8] = [
        Self::Metrics,
        Self::TxnTraces,
        Self::SpanEvents,
        Self::SlowSqls,
        Self::CustomEvents,
        Self::AnalyticsEvents,
        Self::ErrorEvents,
        Self::TracedErrors,
    ];

    /// Returns the stable key used for payload documents.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Metrics => "metrics",
            Self::TxnTraces => "txn_traces",
            Self::SpanEvents => "span_events",
            Self::SlowSqls => "slow_sqls",
            Self::CustomEvents => "custom_events",
            Self::AnalyticsEvents => "analytics_events",
            Self::ErrorEvents => "error_events",
            Self::TracedErrors => "traced_errors",
        }
    }

    /// Resolves a payload kind from its stable key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    /// Returns the expectation block that checks this payload.
    #[must_use]
    pub const fn directive(self) -> DirectiveKind {
        match self {
            Self::Metrics => DirectiveKind::ExpectMetrics,
            Self::TxnTraces => DirectiveKind::ExpectTxnTraces,
            Self::SpanEvents => DirectiveKind::ExpectSpanEvents,
            Self::SlowSqls => DirectiveKind::ExpectSlowSqls,
            Self::CustomEvents => DirectiveKind::ExpectCustomEvents,
            Self::AnalyticsEvents => DirectiveKind::ExpectAnalyticsEvents,
            Self::ErrorEvents => DirectiveKind::ExpectErrorEvents,
            Self::TracedErrors => DirectiveKind::ExpectTracedErrors,
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ============================================================================
// SECTION: Directive Block
// ============================================================================

/// A directive block extracted from fixture source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveBlock {
    /// Block kind.
    pub kind: DirectiveKind,
    /// Raw block body with the marker line removed.
    pub body: String,
    /// One-based source line of the block start marker.
    pub line: usize,
}

// ============================================================================
// SECTION: Tests
// ============================================================================
