// crates/fixture-harness-core/src/runtime/discovery.rs
// ============================================================================
// Module: Fixture Discovery
// Description: Finds fixture files under configured roots.
// Purpose: Produce the deterministic fixture order reports follow.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Directory roots are walked recursively with entries visited in sorted
//! order, so discovery order is stable across platforms. File roots are
//! taken as-is, even when they do not match the name pattern. A path reached
//! through more than one root is reported once, at its first position.
//! Symlinks below a root are not followed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::verdict::FixtureIdentity;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Discovery errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    /// A configured root does not exist.
    #[error("fixture path does not exist: {0}")]
    MissingRoot(String),
    /// A directory could not be read.
    #[error("failed to read {0}")]
    Io(String),
    /// The file name pattern is not supported.
    #[error("invalid fixture pattern: {0}")]
    InvalidPattern(String),
}

// ============================================================================
// SECTION: Pattern
// ============================================================================

/// File name pattern with at most one `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePattern {
    /// Text before the `*` (or the whole name).
    prefix: String,
    /// Text after the `*`, absent for exact names.
    suffix: Option<String>,
}

impl FilePattern {
    /// Parses a pattern such as `test_*.php`.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::InvalidPattern`] for empty patterns, path
    /// separators, or more than one `*`.
    pub fn parse(pattern: &str) -> Result<Self, DiscoveryError> {
        if pattern.is_empty() || pattern.contains('/') || pattern.contains('\\') {
            return Err(DiscoveryError::InvalidPattern(pattern.to_string()));
        }
        match pattern.split_once('*') {
            None => Ok(Self {
                prefix: pattern.to_string(),
                suffix: None,
            }),
            Some((_, suffix)) if suffix.contains('*') => {
                Err(DiscoveryError::InvalidPattern(pattern.to_string()))
            }
            Some((prefix, suffix)) => Ok(Self {
                prefix: prefix.to_string(),
                suffix: Some(suffix.to_string()),
            }),
        }
    }

    /// Returns true when a file name matches the pattern.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        match &self.suffix {
            None => name == self.prefix,
            Some(suffix) => {
                name.len() >= self.prefix.len() + suffix.len()
                    && name.starts_with(&self.prefix)
                    && name.ends_with(suffix.as_str())
            }
        }
    }
}

// ============================================================================
// SECTION: Discovery
// ============================================================================

/// A fixture found by discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFixture {
    /// Report identity derived from the path.
    pub identity: FixtureIdentity,
}

impl DiscoveredFixture {
    /// Returns the fixture path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.identity.path
    }
}

/// Discovers fixtures under the given roots in deterministic order.
///
/// # Errors
///
/// Returns [`DiscoveryError`] when a root is missing or a directory cannot be read.
pub fn discover_fixtures(
    roots: &[PathBuf],
    pattern: &FilePattern,
) -> Result<Vec<DiscoveredFixture>, DiscoveryError> {
    let mut paths = Vec::new();
    let mut visited_dirs = HashSet::new();
    for root in roots {
        if root.is_file() {
            paths.push(root.clone());
        } else if root.is_dir() {
            collect_dir(root, pattern, &mut visited_dirs, &mut paths)?;
        } else {
            return Err(DiscoveryError::MissingRoot(root.display().to_string()));
        }
    }
    let mut seen = BTreeSet::new();
    Ok(paths
        .into_iter()
        .filter(|path| seen.insert(path.clone()))
        .map(|path| DiscoveredFixture {
            identity: FixtureIdentity::from_path(path),
        })
        .collect())
}

/// Recursively collects matching files in sorted order.
///
/// Symlinks are skipped and each canonical directory is walked once.
fn collect_dir(
    dir: &Path,
    pattern: &FilePattern,
    visited_dirs: &mut HashSet<PathBuf>,
    out: &mut Vec<PathBuf>,
) -> Result<(), DiscoveryError> {
    let read_error = |err: std::io::Error| DiscoveryError::Io(format!("{}: {err}", dir.display()));
    let canonical = dir.canonicalize().map_err(read_error)?;
    if !visited_dirs.insert(canonical) {
        return Ok(());
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        let file_type = entry.file_type().map_err(read_error)?;
        entries.push((entry.path(), file_type));
    }
    entries.sort_by(|(left, _), (right, _)| left.cmp(right));

    for (path, file_type) in entries {
        if file_type.is_symlink() {
            continue;
        }
        if file_type.is_dir() {
            collect_dir(&path, pattern, visited_dirs, out)?;
        } else if file_type.is_file()
            && path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| pattern.matches(name))
        {
            out.push(path);
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
