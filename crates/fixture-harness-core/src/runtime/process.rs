// crates/fixture-harness-core/src/runtime/process.rs
// ============================================================================
// Module: Process Executor
// Description: Executor that runs fixtures as child processes.
// Purpose: Bridge the executor contract onto a real runtime binary.
// Dependencies: crate::{core, interfaces}, tempfile, tokio
// ============================================================================

//! ## Overview
//! Each execution gets a fresh scratch directory exported as
//! `FIXTURE_HARNESS_TELEMETRY_DIR`; the monitored runtime writes one
//! `<kind>.json` document per reported payload there. Configuration
//! overrides are passed as `-d key=value`, request headers as `HTTP_<NAME>`
//! environment variables. In [`ExecutionMode::Cgi`] the output begins with
//! `Name: value` header lines terminated by a blank line.
//!
//! Children are spawned with `kill_on_drop`, so dropping an execution future
//! (timeout or cancellation) terminates the process. A non-zero exit status
//! is not an error; termination by a signal is.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::process::Output;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tokio::process::Command;

use crate::core::capture::CapturedResult;
use crate::core::capture::ResponseHeader;
use crate::core::directive::PayloadKind;
use crate::interfaces::ExecutionRequest;
use crate::interfaces::Executor;
use crate::interfaces::ExecutorError;
use crate::interfaces::GuardRequest;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable naming the telemetry scratch directory.
pub const TELEMETRY_DIR_ENV: &str = "FIXTURE_HARNESS_TELEMETRY_DIR";

/// File name used for guard scripts inside the scratch directory.
const GUARD_FILE_NAME: &str = "skipif.php";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// How the runtime binary is invoked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Command-line interpreter; the script path is the last argument.
    #[default]
    Cli,
    /// CGI binary; the script is named by `SCRIPT_FILENAME` and output starts with headers.
    Cgi,
}

/// Process executor settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessExecutorConfig {
    /// Runtime binary.
    pub program: PathBuf,
    /// Arguments placed before any generated arguments.
    pub args: Vec<String>,
    /// Invocation mode.
    pub mode: ExecutionMode,
    /// Configuration overrides applied to every fixture, before fixture overrides.
    pub settings: BTreeMap<String, String>,
    /// Extra environment variables.
    pub env: BTreeMap<String, String>,
}

impl Default for ProcessExecutorConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("php"),
            args: Vec::new(),
            mode: ExecutionMode::Cli,
            settings: BTreeMap::new(),
            env: BTreeMap::new(),
        }
    }
}

// ============================================================================
// SECTION: Executor
// ============================================================================

/// Executor that spawns the runtime binary per fixture.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    /// Executor settings.
    config: ProcessExecutorConfig,
}

impl ProcessExecutor {
    /// Creates a process executor.
    #[must_use]
    pub const fn new(config: ProcessExecutorConfig) -> Self {
        Self { config }
    }

    /// Spawns the runtime on `script` and waits for it to exit.
    async fn spawn(
        &self,
        script: &Path,
        working_dir: Option<&Path>,
        ini: &[(String, String)],
        headers: &[(String, String)],
        telemetry_dir: &Path,
    ) -> Result<Output, ExecutorError> {
        let script = std::path::absolute(script)
            .map_err(|err| ExecutorError::Io(format!("{}: {err}", script.display())))?;
        let mut command = Command::new(&self.config.program);
        command.args(&self.config.args);
        let settings = self.config.settings.iter().map(|(key, value)| (key.as_str(), value.as_str()));
        let overrides = ini.iter().map(|(key, value)| (key.as_str(), value.as_str()));
        for (key, value) in settings.chain(overrides) {
            command.arg("-d").arg(format!("{key}={value}"));
        }
        command.envs(&self.config.env);
        command.env(TELEMETRY_DIR_ENV, telemetry_dir);
        for (name, value) in headers {
            command.env(cgi_header_variable(name), value);
        }
        match self.config.mode {
            ExecutionMode::Cli => {
                command.arg(&script);
            }
            ExecutionMode::Cgi => {
                command.env("SCRIPT_FILENAME", &script);
                command.env("REQUEST_METHOD", "GET");
                command.env("REDIRECT_STATUS", "200");
                command.env("GATEWAY_INTERFACE", "CGI/1.1");
            }
        }
        if let Some(dir) = working_dir.filter(|dir| !dir.as_os_str().is_empty()) {
            command.current_dir(dir);
        }
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        command.kill_on_drop(true);

        let child = command.spawn().map_err(|err| {
            ExecutorError::Spawn(format!("{}: {err}", self.config.program.display()))
        })?;
        let output = child.wait_with_output().await.map_err(|err| ExecutorError::Io(err.to_string()))?;
        if output.status.code().is_none() {
            return Err(ExecutorError::Crashed(format!(
                "{} terminated by signal ({})",
                script.display(),
                output.status
            )));
        }
        Ok(output)
    }

    /// Splits raw stdout into headers and body according to the mode.
    fn split_output(&self, raw: &[u8]) -> (Vec<ResponseHeader>, String) {
        let text = String::from_utf8_lossy(raw).into_owned();
        match self.config.mode {
            ExecutionMode::Cli => (Vec::new(), text),
            ExecutionMode::Cgi => split_cgi_output(&text),
        }
    }
}

#[async_trait]
impl Executor for ProcessExecutor {
    async fn execute(&self, request: &ExecutionRequest) -> Result<CapturedResult, ExecutorError> {
        let started = Instant::now();
        let telemetry_dir = tempfile::tempdir().map_err(|err| ExecutorError::Io(err.to_string()))?;
        let output = self
            .spawn(
                &request.fixture_path,
                request.fixture_path.parent(),
                &request.ini,
                &request.headers,
                telemetry_dir.path(),
            )
            .await?;
        let (headers, stdout) = self.split_output(&output.stdout);
        let payloads = read_payloads(telemetry_dir.path()).await?;
        Ok(CapturedResult {
            stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            headers,
            payloads,
            exit_code: output.status.code(),
            duration: started.elapsed(),
        })
    }

    async fn run_guard(&self, request: &GuardRequest) -> Result<String, ExecutorError> {
        let scratch = tempfile::tempdir().map_err(|err| ExecutorError::Io(err.to_string()))?;
        let script = scratch.path().join(GUARD_FILE_NAME);
        tokio::fs::write(&script, &request.script)
            .await
            .map_err(|err| ExecutorError::Io(err.to_string()))?;
        let output = self
            .spawn(&script, request.fixture_path.parent(), &request.ini, &[], scratch.path())
            .await?;
        Ok(self.split_output(&output.stdout).1)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a request header name onto its CGI environment variable.
fn cgi_header_variable(name: &str) -> String {
    let normalized: String = name
        .chars()
        .map(|ch| if ch == '-' { '_' } else { ch.to_ascii_uppercase() })
        .collect();
    format!("HTTP_{normalized}")
}

/// Splits CGI output into header lines and body at the first blank line.
fn split_cgi_output(text: &str) -> (Vec<ResponseHeader>, String) {
    let mut headers = Vec::new();
    let mut rest = text;
    loop {
        let (line, remainder) = match rest.split_once('\n') {
            Some((line, remainder)) => (line, remainder),
            None => (rest, ""),
        };
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            return (headers, remainder.to_string());
        }
        let Some((name, value)) = line.split_once(':') else {
            return (headers, rest.to_string());
        };
        headers.push(ResponseHeader::new(name.trim(), value.trim()));
        if remainder.is_empty() {
            return (headers, String::new());
        }
        rest = remainder;
    }
}

/// Reads every `<kind>.json` document from the telemetry directory.
async fn read_payloads(dir: &Path) -> Result<BTreeMap<PayloadKind, Value>, ExecutorError> {
    let mut payloads = BTreeMap::new();
    for kind in PayloadKind::ALL {
        let path = dir.join(format!("{}.json", kind.key()));
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
            Err(err) => return Err(ExecutorError::Io(format!("{}: {err}", path.display()))),
        };
        let value: Value = serde_json::from_str(&contents)
            .map_err(|err| ExecutorError::Telemetry(format!("{}: {err}", kind.key())))?;
        payloads.insert(kind, value);
    }
    Ok(payloads)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
