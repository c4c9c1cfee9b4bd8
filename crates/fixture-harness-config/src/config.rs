// crates/fixture-harness-config/src/config.rs
// ============================================================================
// Module: Fixture Harness Configuration
// Description: Configuration loading and validation for the fixture harness.
// Purpose: Provide strict config parsing with hard limits and sane defaults.
// Dependencies: fixture-harness-core, fixture-harness-report, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! An explicitly named file (argument or `FIXTURE_HARNESS_CONFIG`) must exist;
//! when neither is given and `fixture-harness.toml` is absent, defaults apply.
//! Unknown keys and out-of-range limits are rejected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use fixture_harness_core::ExecutionMode;
use fixture_harness_core::FileEventSink;
use fixture_harness_core::FilePattern;
use fixture_harness_core::HarnessEventSink;
use fixture_harness_core::NoopEventSink;
use fixture_harness_core::ProcessExecutorConfig;
use fixture_harness_core::RunnerConfig;
use fixture_harness_core::StderrEventSink;
use fixture_harness_report::CrawlOptions;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "fixture-harness.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "FIXTURE_HARNESS_CONFIG";
/// Maximum config file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Minimum worker concurrency.
pub const MIN_CONCURRENCY: usize = 1;
/// Maximum worker concurrency.
pub const MAX_CONCURRENCY: usize = 256;
/// Minimum per-fixture timeout in milliseconds.
pub const MIN_TIMEOUT_MS: u64 = 100;
/// Maximum per-fixture timeout in milliseconds.
pub const MAX_TIMEOUT_MS: u64 = 3_600_000;
/// Maximum number of retry passes.
pub const MAX_RETRIES: u32 = 10;
/// Maximum number of runtime settings or environment entries.
pub(crate) const MAX_MAP_ENTRIES: usize = 256;
/// Maximum number of discovery roots.
pub(crate) const MAX_DISCOVERY_PATHS: usize = 1024;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Fixture harness configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    /// Worker pool and timeout settings.
    #[serde(default)]
    pub runner: RunnerSection,
    /// Runtime binary settings.
    #[serde(default)]
    pub executor: ExecutorSection,
    /// Fixture discovery settings.
    #[serde(default)]
    pub discovery: DiscoverySection,
    /// Structured event logging settings.
    #[serde(default)]
    pub logging: LoggingSection,
    /// Report output settings.
    #[serde(default)]
    pub report: ReportSection,
    /// File the configuration was loaded from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl HarnessConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        validate_path(&resolved)?;
        if !explicit && !resolved.exists() {
            return Ok(Self::default());
        }
        let bytes = fs::read(&resolved)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", resolved.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::from_toml_str(content)?;
        config.source = Some(resolved);
        Ok(config)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.runner.validate()?;
        self.executor.validate()?;
        self.discovery.validate()?;
        self.logging.validate()?;
        self.report.validate()
    }

    /// Returns the runner limits.
    #[must_use]
    pub fn runner_config(&self) -> RunnerConfig {
        let defaults = RunnerConfig::default();
        RunnerConfig {
            concurrency: self.runner.concurrency.unwrap_or(defaults.concurrency),
            timeout: Duration::from_millis(self.runner.timeout_ms),
            retries: self.runner.retries,
        }
    }

    /// Returns the process executor settings.
    #[must_use]
    pub fn process_executor_config(&self) -> ProcessExecutorConfig {
        ProcessExecutorConfig {
            program: PathBuf::from(&self.executor.program),
            args: self.executor.args.clone(),
            mode: self.executor.mode,
            settings: self.executor.settings.clone(),
            env: self.executor.env.clone(),
        }
    }

    /// Returns the fixture file name pattern.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the pattern is unsupported.
    pub fn fixture_pattern(&self) -> Result<FilePattern, ConfigError> {
        FilePattern::parse(&self.discovery.pattern)
            .map_err(|err| ConfigError::Invalid(format!("discovery.pattern: {err}")))
    }

    /// Returns the configured discovery roots.
    #[must_use]
    pub fn fixture_roots(&self) -> Vec<PathBuf> {
        self.discovery.paths.iter().map(PathBuf::from).collect()
    }

    /// Builds the configured event sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the log file cannot be opened.
    pub fn event_sink(&self) -> Result<Arc<dyn HarnessEventSink>, ConfigError> {
        match self.logging.sink {
            LogSink::Stderr => Ok(Arc::new(StderrEventSink)),
            LogSink::None => Ok(Arc::new(NoopEventSink)),
            LogSink::File => {
                let path = self.logging.path.as_deref().ok_or_else(|| {
                    ConfigError::Invalid("logging.sink=file requires logging.path".to_string())
                })?;
                let sink = FileEventSink::new(Path::new(path))
                    .map_err(|err| ConfigError::Io(format!("{path}: {err}")))?;
                Ok(Arc::new(sink))
            }
        }
    }

    /// Returns the capture crawl options.
    #[must_use]
    pub fn crawl_options(&self) -> CrawlOptions {
        CrawlOptions {
            root: PathBuf::from(&self.report.root),
            uname: self.report.uname.clone(),
            compiler: self.report.compiler.clone(),
            arch: self.report.arch.clone(),
            suite: self.report.suite.clone(),
        }
    }
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Worker pool settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerSection {
    /// Worker count; available parallelism when unset.
    #[serde(default)]
    pub concurrency: Option<usize>,
    /// Per-fixture execution timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Retry passes over fixtures that timed out or reported no telemetry.
    #[serde(default)]
    pub retries: u32,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            concurrency: None,
            timeout_ms: default_timeout_ms(),
            retries: 0,
        }
    }
}

impl RunnerSection {
    /// Validates runner limits.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(concurrency) = self.concurrency
            && !(MIN_CONCURRENCY ..= MAX_CONCURRENCY).contains(&concurrency)
        {
            return Err(ConfigError::Invalid(format!(
                "runner.concurrency must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
            )));
        }
        if !(MIN_TIMEOUT_MS ..= MAX_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "runner.timeout_ms must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS}"
            )));
        }
        if self.retries > MAX_RETRIES {
            return Err(ConfigError::Invalid(format!(
                "runner.retries must be at most {MAX_RETRIES}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Executor
// ============================================================================

/// Runtime binary settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutorSection {
    /// Runtime binary name or path.
    #[serde(default = "default_program")]
    pub program: String,
    /// Arguments placed before generated arguments.
    #[serde(default)]
    pub args: Vec<String>,
    /// Invocation mode.
    #[serde(default)]
    pub mode: ExecutionMode,
    /// Runtime settings applied to every fixture.
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
    /// Extra environment variables for the runtime.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl Default for ExecutorSection {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
            mode: ExecutionMode::default(),
            settings: BTreeMap::new(),
            env: BTreeMap::new(),
        }
    }
}

impl ExecutorSection {
    /// Validates executor settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("executor.program", &self.program)?;
        validate_map("executor.settings", &self.settings)?;
        validate_map("executor.env", &self.env)?;
        if self.env.keys().any(|key| key.contains('\0')) {
            return Err(ConfigError::Invalid(
                "executor.env keys must not contain NUL".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Discovery
// ============================================================================

/// Fixture discovery settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscoverySection {
    /// Roots searched when no paths are given on the command line.
    #[serde(default = "default_discovery_paths")]
    pub paths: Vec<String>,
    /// Fixture file name pattern.
    #[serde(default = "default_pattern")]
    pub pattern: String,
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            paths: default_discovery_paths(),
            pattern: default_pattern(),
        }
    }
}

impl DiscoverySection {
    /// Validates discovery settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.paths.len() > MAX_DISCOVERY_PATHS {
            return Err(ConfigError::Invalid("discovery.paths exceeds max entries".to_string()));
        }
        for path in &self.paths {
            validate_path_string("discovery.paths", path)?;
        }
        FilePattern::parse(&self.pattern)
            .map_err(|err| ConfigError::Invalid(format!("discovery.pattern: {err}")))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Event sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSink {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to `logging.path`.
    File,
    /// Discard events.
    None,
}

/// Structured event logging settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Event sink.
    #[serde(default)]
    pub sink: LogSink,
    /// Log file for the `file` sink.
    #[serde(default)]
    pub path: Option<String>,
}

impl LoggingSection {
    /// Validates logging settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (LogSink::File, None) => Err(ConfigError::Invalid(
                "logging.sink=file requires logging.path".to_string(),
            )),
            (LogSink::File, Some(path)) => validate_path_string("logging.path", path),
            (_, Some(_)) => Err(ConfigError::Invalid(
                "logging.path is only valid with logging.sink=file".to_string(),
            )),
            (_, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Report
// ============================================================================

/// Report formats for fixture runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// JUnit XML document.
    #[default]
    Junit,
    /// TAP text.
    Tap,
}

/// Report output settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportSection {
    /// Report format for `run`.
    #[serde(default)]
    pub format: ReportFormat,
    /// Report destination; `stdout` or unset writes to standard output.
    #[serde(default)]
    pub output: Option<String>,
    /// Build tree root for capture files.
    #[serde(default = "default_capture_root")]
    pub root: String,
    /// Operating system name in the capture path.
    #[serde(default = "default_uname")]
    pub uname: String,
    /// Compiler short name in the capture path.
    #[serde(default = "default_compiler")]
    pub compiler: String,
    /// Architecture name in the capture path.
    #[serde(default = "default_arch")]
    pub arch: String,
    /// Suite directory in the capture path.
    #[serde(default = "default_suite")]
    pub suite: String,
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            format: ReportFormat::default(),
            output: None,
            root: default_capture_root(),
            uname: default_uname(),
            compiler: default_compiler(),
            arch: default_arch(),
            suite: default_suite(),
        }
    }
}

impl ReportSection {
    /// Validates report settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(output) = &self.output {
            validate_path_string("report.output", output)?;
        }
        validate_path_string("report.root", &self.root)?;
        validate_component("report.uname", &self.uname)?;
        validate_component("report.compiler", &self.compiler)?;
        validate_component("report.arch", &self.arch)?;
        validate_component("report.suite", &self.suite)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults; true when named explicitly.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a value used as a single directory name.
fn validate_component(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_PATH_COMPONENT_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} must be a non-empty name")));
    }
    if trimmed == "." || trimmed == ".." || trimmed.contains(['/', '\\']) {
        return Err(ConfigError::Invalid(format!("{field} must be a single path component")));
    }
    Ok(())
}

/// Validates a key/value map.
fn validate_map(field: &str, map: &BTreeMap<String, String>) -> Result<(), ConfigError> {
    if map.len() > MAX_MAP_ENTRIES {
        return Err(ConfigError::Invalid(format!("{field} exceeds max entries")));
    }
    if map.keys().any(|key| key.trim().is_empty() || key.contains('=')) {
        return Err(ConfigError::Invalid(format!(
            "{field} keys must be non-empty and must not contain '='"
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default per-fixture timeout.
const fn default_timeout_ms() -> u64 {
    10_000
}

/// Default runtime binary.
fn default_program() -> String {
    "php".to_string()
}

/// Default discovery roots.
fn default_discovery_paths() -> Vec<String> {
    vec!["tests".to_string()]
}

/// Default fixture name pattern.
fn default_pattern() -> String {
    "test_*.php".to_string()
}

/// Default capture root.
fn default_capture_root() -> String {
    "agent".to_string()
}

/// Default capture OS name.
fn default_uname() -> String {
    "Darwin".to_string()
}

/// Default capture compiler.
fn default_compiler() -> String {
    "gcc".to_string()
}

/// Default capture architecture.
fn default_arch() -> String {
    "x86_64".to_string()
}

/// Default capture suite.
fn default_suite() -> String {
    "axiom".to_string()
}
