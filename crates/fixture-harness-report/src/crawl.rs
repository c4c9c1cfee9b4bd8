// crates/fixture-harness-report/src/crawl.rs
// ============================================================================
// Module: Capture Crawler
// Description: Locates and scans `.out` capture files for one build flavor.
// Purpose: Feed the JUnit model from a native unit-test build tree.
// Dependencies: crate::{capture, error}
// ============================================================================

//! ## Overview
//! Captures live at `<root>/<uname>/<compiler>/<arch>/<suite>/tests/*.out`.
//! Files are scanned sequentially in sorted name order. A missing capture
//! directory yields an empty report rather than an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use crate::capture::CaptureGrammar;
use crate::capture::CaptureReport;
use crate::error::ReportError;

// ============================================================================
// SECTION: Options
// ============================================================================

/// File extension of capture files.
const CAPTURE_EXTENSION: &str = "out";

/// Build flavor selecting the capture directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Build tree root.
    pub root: PathBuf,
    /// Operating system name, as reported by `uname`.
    pub uname: String,
    /// Compiler short name.
    pub compiler: String,
    /// Architecture name.
    pub arch: String,
    /// Test suite directory name.
    pub suite: String,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("agent"),
            uname: "Darwin".to_string(),
            compiler: "gcc".to_string(),
            arch: "x86_64".to_string(),
            suite: "axiom".to_string(),
        }
    }
}

impl CrawlOptions {
    /// Returns the directory holding the capture files.
    #[must_use]
    pub fn capture_dir(&self) -> PathBuf {
        self.root
            .join(&self.uname)
            .join(&self.compiler)
            .join(&self.arch)
            .join(&self.suite)
            .join("tests")
    }
}

// ============================================================================
// SECTION: Crawl
// ============================================================================

/// Scans every capture file for the build flavor, in sorted path order.
///
/// # Errors
///
/// Returns [`ReportError::Io`] when the capture directory or a capture file
/// exists but cannot be read.
pub fn crawl_captures(
    options: &CrawlOptions,
    grammar: &CaptureGrammar,
) -> Result<Vec<CaptureReport>, ReportError> {
    let dir = options.capture_dir();
    let mut reports = Vec::new();
    for path in capture_files(&dir)? {
        let bytes = fs::read(&path)
            .map_err(|err| ReportError::Io(format!("{}: {err}", path.display())))?;
        let text = String::from_utf8_lossy(&bytes);
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        reports.push(grammar.scan(&text, &stem));
    }
    Ok(reports)
}

/// Lists `.out` files directly inside `dir`, sorted.
fn capture_files(dir: &Path) -> Result<Vec<PathBuf>, ReportError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(ReportError::Io(format!("{}: {err}", dir.display()))),
    };
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|err| ReportError::Io(format!("{}: {err}", dir.display())))?
            .path();
        if path.is_file()
            && path.extension().is_some_and(|ext| ext == CAPTURE_EXTENSION)
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::CrawlOptions;

    #[test]
    fn default_capture_dir_layout() {
        assert_eq!(
            CrawlOptions::default().capture_dir(),
            PathBuf::from("agent/Darwin/gcc/x86_64/axiom/tests")
        );
    }
}
