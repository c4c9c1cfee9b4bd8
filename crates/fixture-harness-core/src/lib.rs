// crates/fixture-harness-core/src/lib.rs
// ============================================================================
// Module: Fixture Harness Core Library
// Description: Public API surface for the fixture harness core.
// Purpose: Expose fixture types, executor interfaces, and runtime helpers.
// Dependencies: crate::{core, events, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Fixture harness core turns agent integration fixtures into verdicts. A
//! fixture is a self-contained script carrying directive blocks that describe
//! its configuration and expected output; the runtime parses those blocks,
//! hands the fixture to an [`Executor`], and compares the captured output and
//! telemetry payloads against the expectations with wildcard-tolerant
//! structural matching.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod events;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use events::FileEventSink;
pub use events::HarnessEvent;
pub use events::HarnessEventSink;
pub use events::MemoryEventSink;
pub use events::NoopEventSink;
pub use events::StderrEventSink;
pub use interfaces::ExecutionRequest;
pub use interfaces::Executor;
pub use interfaces::ExecutorError;
pub use interfaces::GuardRequest;
pub use runtime::Aggregator;
pub use runtime::DiscoveredFixture;
pub use runtime::DiscoveryError;
pub use runtime::ExecutionMode;
pub use runtime::FilePattern;
pub use runtime::ProcessExecutor;
pub use runtime::ProcessExecutorConfig;
pub use runtime::Runner;
pub use runtime::RunnerConfig;
pub use runtime::TELEMETRY_DIR_ENV;
pub use runtime::discover_fixtures;
pub use runtime::evaluate_expectations;
