// crates/fixture-harness-core/src/runtime/mod.rs
// ============================================================================
// Module: Fixture Harness Runtime
// Description: Discovery, comparison, execution, and aggregation.
// Purpose: Drive fixtures from discovery to a finalized summary.
// Dependencies: crate::{core, events, interfaces}, regex, tokio
// ============================================================================

//! ## Overview
//! The runtime is split along the pipeline: [`discovery`] finds fixtures,
//! [`runner`] schedules them against an [`crate::Executor`], [`evaluate`]
//! applies the [`comparator`] to every declared expectation, and
//! [`aggregate`] serializes verdicts into a [`crate::Summary`].

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod aggregate;
pub mod comparator;
pub mod discovery;
pub mod evaluate;
pub mod pattern;
pub mod process;
pub mod runner;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use aggregate::Aggregator;
pub use discovery::DiscoveredFixture;
pub use discovery::DiscoveryError;
pub use discovery::FilePattern;
pub use discovery::discover_fixtures;
pub use evaluate::evaluate_expectations;
pub use process::ExecutionMode;
pub use process::ProcessExecutor;
pub use process::ProcessExecutorConfig;
pub use process::TELEMETRY_DIR_ENV;
pub use runner::DEFAULT_TIMEOUT;
pub use runner::Runner;
pub use runner::RunnerConfig;
