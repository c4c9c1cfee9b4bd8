// crates/fixture-harness-cli/src/main.rs
// ============================================================================
// Module: Fixture Harness CLI Entry Point
// Description: Command dispatcher for fixture runs and report generation.
// Purpose: Run fixtures, check fixture syntax, and convert unit-test captures.
// Dependencies: clap, fixture-harness-{config, core, report}, thiserror, time, tokio
// ============================================================================

//! ## Overview
//! `fixture-harness` runs integration fixtures through the configured runtime
//! and renders the results as JUnit XML or TAP. `report` converts `.out`
//! captures of native unit-test binaries into JUnit XML. Reports go to
//! stdout or a file; progress and diagnostics go to stderr.
//!
//! Exit codes: failures inside a report never fail `report`; `run` fails on
//! unexpected fixture failures only with `--fail-on-failures`. Invalid
//! arguments, config errors, and report I/O failures always exit non-zero.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use fixture_harness_cli::t;
use fixture_harness_config::HarnessConfig;
use fixture_harness_config::ReportFormat;
use fixture_harness_core::DiscoveredFixture;
use fixture_harness_core::Fixture;
use fixture_harness_core::ProcessExecutor;
use fixture_harness_core::Runner;
use fixture_harness_core::Summary;
use fixture_harness_core::discover_fixtures;
use fixture_harness_report::CaptureGrammar;
use fixture_harness_report::JunitSuite;
use fixture_harness_report::crawl_captures;
use fixture_harness_report::render_junit;
use fixture_harness_report::render_tap;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::watch;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "fixture-harness", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run fixtures and render a report.
    Run(RunCommand),
    /// Parse fixtures and report malformed ones without running them.
    Check(CheckCommand),
    /// Convert unit-test `.out` captures into a JUnit report.
    Report(ReportCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Report format flag values.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FormatArg {
    /// JUnit XML.
    Junit,
    /// TAP text.
    Tap,
}

impl From<FormatArg> for ReportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Junit => Self::Junit,
            FormatArg::Tap => Self::Tap,
        }
    }
}

/// Configuration for the `run` command.
#[derive(Args, Debug)]
struct RunCommand {
    /// Fixture files or directories (defaults to `discovery.paths`).
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,
    /// Optional config file path (defaults to fixture-harness.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Maximum number of fixtures running at once.
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,
    /// Per-fixture timeout in milliseconds.
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,
    /// Retry passes over fixtures that timed out or reported no telemetry.
    #[arg(long = "retry", value_name = "N")]
    retries: Option<u32>,
    /// Report format.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,
    /// Report destination (`stdout` or a file path).
    #[arg(long, value_name = "PATH")]
    output: Option<String>,
    /// Exit non-zero when any fixture fails unexpectedly.
    #[arg(long, action = ArgAction::SetTrue)]
    fail_on_failures: bool,
}

/// Configuration for the `check` command.
#[derive(Args, Debug)]
struct CheckCommand {
    /// Fixture files or directories (defaults to `discovery.paths`).
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,
    /// Optional config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Configuration for the `report` command.
#[derive(Args, Debug)]
struct ReportCommand {
    /// Report destination (`stdout` or a file path).
    #[arg(short, long, value_name = "PATH")]
    output: Option<String>,
    /// Operating system name, such as Darwin or Linux.
    #[arg(short, long)]
    uname: Option<String>,
    /// Compiler short name, such as gcc or clang.
    #[arg(short, long)]
    compiler: Option<String>,
    /// Architecture name, such as `x86_64`.
    #[arg(short, long)]
    arch: Option<String>,
    /// Build tree root holding the captures.
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,
    /// Test suite directory name.
    #[arg(long)]
    suite: Option<String>,
    /// Optional config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a fixture harness configuration file.
    Validate(ConfigValidateCommand),
}

/// Configuration for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for catalog messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a catalog message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Run(command) => command_run(command).await,
        Commands::Check(command) => command_check(&command),
        Commands::Report(command) => command_report(command),
        Commands::Config {
            command,
        } => command_config(&command),
    }
}

/// Prints the top-level help text.
fn show_help() -> CliResult<()> {
    let help = Cli::command().render_help().to_string();
    write_stdout_line(help.trim_end()).map_err(|err| CliError::new(output_error("stdout", &err)))
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes the `run` command.
async fn command_run(command: RunCommand) -> CliResult<ExitCode> {
    let mut config = load_config(command.config.as_deref())?;
    apply_run_overrides(&mut config, &command)?;
    let fixtures = discover(&config, &command.paths)?;
    if fixtures.is_empty() {
        write_stderr_line(&t!("discovery.empty"))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }

    let events = config
        .event_sink()
        .map_err(|err| CliError::new(t!("logging.open_failed", error = err)))?;
    let executor = Arc::new(ProcessExecutor::new(config.process_executor_config()));
    let runner = Runner::new(executor, config.runner_config()).with_events(events);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = write_stderr_line(&t!("run.cancel_requested"));
            let _ = cancel_tx.send(true);
        }
    });

    let timestamp = OffsetDateTime::now_utc();
    let summary = runner.run(&fixtures, cancel_rx).await;
    interrupt.abort();

    let report = render_summary(&summary, config.report.format, timestamp)?;
    write_report(config.report.output.as_deref(), &report)?;
    write_stderr_line(&summary_line(&summary))
        .map_err(|err| CliError::new(output_error("stderr", &err)))?;

    if command.fail_on_failures && summary.unexpected_failures() > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Applies `run` flags on top of the loaded configuration and revalidates.
fn apply_run_overrides(config: &mut HarnessConfig, command: &RunCommand) -> CliResult<()> {
    if let Some(concurrency) = command.concurrency {
        config.runner.concurrency = Some(concurrency);
    }
    if let Some(timeout_ms) = command.timeout_ms {
        config.runner.timeout_ms = timeout_ms;
    }
    if let Some(retries) = command.retries {
        config.runner.retries = retries;
    }
    if let Some(format) = command.format {
        config.report.format = format.into();
    }
    if let Some(output) = &command.output {
        config.report.output = Some(output.clone());
    }
    config.validate().map_err(|err| CliError::new(t!("config.override_invalid", error = err)))
}

/// Renders a run summary in the configured format.
fn render_summary(
    summary: &Summary,
    format: ReportFormat,
    timestamp: OffsetDateTime,
) -> CliResult<String> {
    match format {
        ReportFormat::Junit => render_junit(&JunitSuite::from_summary(summary, timestamp))
            .map_err(|err| CliError::new(t!("report.render_failed", error = err))),
        ReportFormat::Tap => Ok(render_tap(summary)),
    }
}

/// Formats the one-line run summary.
fn summary_line(summary: &Summary) -> String {
    t!(
        "run.summary",
        total = summary.total(),
        passed = summary.passed,
        failed = summary.failed,
        xfail = summary.expected_failures,
        skipped = summary.skipped,
        seconds = format!("{:.3}", summary.duration.as_secs_f64())
    )
}

// ============================================================================
// SECTION: Check Command
// ============================================================================

/// Executes the `check` command.
fn command_check(command: &CheckCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let fixtures = discover(&config, &command.paths)?;
    let mut valid = 0usize;
    for fixture in &fixtures {
        match Fixture::load(fixture.path()) {
            Ok(parsed) => {
                valid += 1;
                if !parsed.has_expectations() {
                    write_stdout_line(&t!(
                        "check.no_expectations",
                        path = fixture.path().display()
                    ))
                    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
                }
            }
            Err(err) => {
                write_stdout_line(&t!(
                    "check.malformed",
                    path = fixture.path().display(),
                    error = err
                ))
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            }
        }
    }
    write_stderr_line(&t!("check.summary", valid = valid, total = fixtures.len()))
        .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    if valid == fixtures.len() { Ok(ExitCode::SUCCESS) } else { Ok(ExitCode::FAILURE) }
}

// ============================================================================
// SECTION: Report Command
// ============================================================================

/// Executes the `report` command.
fn command_report(command: ReportCommand) -> CliResult<ExitCode> {
    let started = Instant::now();
    let timestamp = OffsetDateTime::now_utc();
    let mut config = load_config(command.config.as_deref())?;
    apply_report_overrides(&mut config, command)?;

    let grammar = CaptureGrammar::new()
        .map_err(|err| CliError::new(t!("report.grammar_failed", error = err)))?;
    let reports = crawl_captures(&config.crawl_options(), &grammar)
        .map_err(|err| CliError::new(t!("report.crawl_failed", error = err)))?;
    let suite = JunitSuite::from_captures(&reports, started.elapsed(), timestamp);
    let xml = render_junit(&suite)
        .map_err(|err| CliError::new(t!("report.render_failed", error = err)))?;
    write_report(config.report.output.as_deref(), &xml)?;
    write_stderr_line(&t!(
        "report.summary",
        total = suite.tests(),
        failures = suite.failures(),
        skipped = suite.skipped()
    ))
    .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Applies `report` flags on top of the loaded configuration and revalidates.
fn apply_report_overrides(config: &mut HarnessConfig, command: ReportCommand) -> CliResult<()> {
    let report = &mut config.report;
    if let Some(output) = command.output {
        report.output = Some(output);
    }
    if let Some(uname) = command.uname {
        report.uname = uname;
    }
    if let Some(compiler) = command.compiler {
        report.compiler = compiler;
    }
    if let Some(arch) = command.arch {
        report.arch = arch;
    }
    if let Some(root) = command.root {
        report.root = root.to_string_lossy().into_owned();
    }
    if let Some(suite) = command.suite {
        report.suite = suite;
    }
    config.validate().map_err(|err| CliError::new(t!("config.override_invalid", error = err)))
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: &ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(command),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let source = config
        .source
        .as_ref()
        .map_or_else(|| t!("config.source.defaults"), |path| path.display().to_string());
    write_stdout_line(&t!("config.validate.ok", source = source))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads configuration, mapping failures to a catalog message.
fn load_config(path: Option<&Path>) -> CliResult<HarnessConfig> {
    HarnessConfig::load(path).map_err(|err| CliError::new(t!("config.load_failed", error = err)))
}

/// Discovers fixtures under explicit paths or the configured roots.
fn discover(config: &HarnessConfig, paths: &[PathBuf]) -> CliResult<Vec<DiscoveredFixture>> {
    let pattern = config
        .fixture_pattern()
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    let roots = if paths.is_empty() { config.fixture_roots() } else { paths.to_vec() };
    discover_fixtures(&roots, &pattern)
        .map_err(|err| CliError::new(t!("discovery.failed", error = err)))
}

/// Writes a rendered report to stdout or a file.
fn write_report(output: Option<&str>, report: &str) -> CliResult<()> {
    match output {
        None | Some("stdout" | "-") => write_stdout_bytes(report.as_bytes())
            .map_err(|err| CliError::new(output_error("stdout", &err))),
        Some(path) => fs::write(path, report)
            .map_err(|err| CliError::new(t!("report.write_failed", path = path, error = err))),
    }
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)?;
    stdout.flush()
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
