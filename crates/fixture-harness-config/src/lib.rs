// crates/fixture-harness-config/src/lib.rs
// ============================================================================
// Module: Fixture Harness Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for fixture-harness.toml semantics.
// Dependencies: fixture-harness-core, fixture-harness-report, serde, toml
// ============================================================================

//! ## Overview
//! `fixture-harness-config` defines the configuration model shared by every
//! harness command. Loading is size- and path-limited and validation rejects
//! out-of-range limits before any fixture runs. Helpers translate the model
//! into the runtime types of the core and report crates.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
