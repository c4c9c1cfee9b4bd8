// crates/fixture-harness-core/src/runtime/runner.rs
// ============================================================================
// Module: Fixture Runner
// Description: Bounded concurrent execution of discovered fixtures.
// Purpose: Turn a fixture list into a complete summary under timeouts and cancellation.
// Dependencies: crate::{core, events, interfaces}, tokio
// ============================================================================

//! ## Overview
//! Each fixture runs in its own task, gated by a semaphore sized to the
//! configured concurrency. Tasks never touch shared results: they send
//! `(index, verdict)` over a channel to the loop in [`Runner::run`], which
//! owns the [`Aggregator`].
//!
//! Every executor call is bounded by the fixture timeout; dropping the call
//! on timeout or cancellation drops the executor future, which kills any
//! child process it owns. A run cancelled through the watch channel records
//! every unfinished fixture as skipped with reason `cancelled`.
//!
//! Fixture loading and expectation evaluation touch the filesystem and run
//! on the blocking pool.
//!
//! Retry passes rerun fixtures that timed out or reported none of their
//! expected telemetry. A retry interrupted by cancellation keeps the verdict
//! from the previous pass.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::task;
use tokio::task::JoinSet;

use crate::core::fixture::Fixture;
use crate::core::summary::Summary;
use crate::core::verdict::FailureReason;
use crate::core::verdict::FixtureIdentity;
use crate::core::verdict::Verdict;
use crate::events::HarnessEvent;
use crate::events::HarnessEventSink;
use crate::events::NoopEventSink;
use crate::interfaces::ExecutionRequest;
use crate::interfaces::Executor;
use crate::interfaces::GuardRequest;
use crate::runtime::aggregate::Aggregator;
use crate::runtime::discovery::DiscoveredFixture;
use crate::runtime::evaluate::evaluate_expectations;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Default per-fixture execution timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Runner limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Maximum number of fixtures executing at once.
    pub concurrency: usize,
    /// Time limit for each executor call.
    pub timeout: Duration,
    /// Maximum number of retry passes over retryable verdicts.
    pub retries: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            concurrency: std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get),
            timeout: DEFAULT_TIMEOUT,
            retries: 0,
        }
    }
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Runs fixtures through an executor.
pub struct Runner {
    /// Executor shared by all fixture tasks.
    executor: Arc<dyn Executor>,
    /// Runner limits.
    config: RunnerConfig,
    /// Progress event sink.
    events: Arc<dyn HarnessEventSink>,
}

impl Runner {
    /// Creates a runner that emits no events.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>, config: RunnerConfig) -> Self {
        Self {
            executor,
            config,
            events: Arc::new(NoopEventSink),
        }
    }

    /// Replaces the progress event sink.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn HarnessEventSink>) -> Self {
        self.events = events;
        self
    }

    /// Runs every fixture and returns the summary in discovery order.
    ///
    /// After the first pass, fixtures whose verdicts are retryable are rerun
    /// up to `retries` times; the last verdict wins. Setting the watch value
    /// to `true` cancels the run.
    pub async fn run(
        &self,
        fixtures: &[DiscoveredFixture],
        mut cancel: watch::Receiver<bool>,
    ) -> Summary {
        let started = Instant::now();
        let concurrency = self.config.concurrency.max(1);
        self.events.record(&HarnessEvent::run_started(fixtures.len(), concurrency));

        let mut aggregator =
            Aggregator::new(fixtures.iter().map(|fixture| fixture.identity.clone()).collect());
        let batch =
            fixtures.iter().map(|fixture| fixture.identity.clone()).enumerate().collect();
        let mut cancelled = self.dispatch(batch, &mut aggregator, &mut cancel, false).await;

        let mut attempt = 0;
        while !cancelled && attempt < self.config.retries {
            let batch = aggregator.retryable();
            if batch.is_empty() {
                break;
            }
            attempt += 1;
            self.events.record(&HarnessEvent::retry_started(attempt, batch.len()));
            cancelled = self.dispatch(batch, &mut aggregator, &mut cancel, true).await;
        }

        if cancelled {
            self.events.record(&HarnessEvent::run_cancelled(aggregator.pending()));
            aggregator.cancel_pending();
        }

        let summary = aggregator.finish(started.elapsed());
        self.events.record(&HarnessEvent::run_finished(
            summary.total(),
            summary.failed,
            summary.duration.as_millis(),
        ));
        summary
    }

    /// Runs one batch of `(index, identity)` pairs and feeds the verdicts to
    /// the aggregator, replacing earlier verdicts when `replace` is set.
    ///
    /// Returns true when the run was cancelled before the batch finished.
    async fn dispatch(
        &self,
        batch: Vec<(usize, FixtureIdentity)>,
        aggregator: &mut Aggregator,
        cancel: &mut watch::Receiver<bool>,
        replace: bool,
    ) -> bool {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let (sender, mut receiver) = mpsc::unbounded_channel::<(usize, Verdict)>();
        let mut workers = JoinSet::new();

        for (index, identity) in batch {
            let executor = Arc::clone(&self.executor);
            let semaphore = Arc::clone(&semaphore);
            let sender = sender.clone();
            let timeout = self.config.timeout;
            workers.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                let verdict = run_fixture(executor.as_ref(), identity, timeout).await;
                let _ = sender.send((index, verdict));
            });
        }
        drop(sender);

        let mut store = |index: usize, verdict: Verdict| {
            self.events.record(&HarnessEvent::fixture_finished(&verdict));
            if replace {
                aggregator.replace(index, verdict);
            } else {
                aggregator.record(index, verdict);
            }
        };

        let mut cancel_open = true;
        let mut cancelled = *cancel.borrow();
        while !cancelled {
            tokio::select! {
                message = receiver.recv() => match message {
                    Some((index, verdict)) => store(index, verdict),
                    None => break,
                },
                changed = cancel.changed(), if cancel_open => {
                    if changed.is_err() {
                        cancel_open = false;
                    } else {
                        cancelled = *cancel.borrow();
                    }
                }
            }
        }

        if cancelled {
            workers.abort_all();
            while let Ok((index, verdict)) = receiver.try_recv() {
                store(index, verdict);
            }
        }
        while workers.join_next().await.is_some() {}
        cancelled
    }
}

// ============================================================================
// SECTION: Fixture Execution
// ============================================================================

/// Parses, executes, and evaluates one fixture.
async fn run_fixture(
    executor: &dyn Executor,
    identity: FixtureIdentity,
    timeout: Duration,
) -> Verdict {
    let started = Instant::now();
    let path = identity.path.clone();
    let fixture = match task::spawn_blocking(move || Fixture::load(&path)).await {
        Ok(Ok(fixture)) => fixture,
        Ok(Err(err)) => {
            return Verdict::failed(identity, err.failure_reason(), err.to_string(), started.elapsed());
        }
        Err(err) => {
            return Verdict::failed(
                identity,
                FailureReason::ExecutionCrash,
                format!("fixture loading stopped: {err}"),
                started.elapsed(),
            );
        }
    };

    if let Some(guard) = GuardRequest::for_fixture(&fixture) {
        match tokio::time::timeout(timeout, executor.run_guard(&guard)).await {
            Err(_) => {
                return Verdict::failed(
                    identity,
                    FailureReason::ExecutionTimeout,
                    format!("SKIPIF guard did not finish within {} ms", timeout.as_millis()),
                    started.elapsed(),
                );
            }
            Ok(Err(err)) => {
                return Verdict::failed(
                    identity,
                    FailureReason::ExecutionCrash,
                    format!("SKIPIF guard failed: {err}"),
                    started.elapsed(),
                );
            }
            Ok(Ok(output)) => {
                if let Some(reason) = skip_reason(&output) {
                    return Verdict::skipped(identity, reason, started.elapsed());
                }
            }
        }
    }

    let request = ExecutionRequest::for_fixture(&fixture);
    let mut captured = match tokio::time::timeout(timeout, executor.execute(&request)).await {
        Err(_) => {
            return Verdict::failed(
                identity,
                FailureReason::ExecutionTimeout,
                format!("no result within {} ms", timeout.as_millis()),
                started.elapsed(),
            );
        }
        Ok(Err(err)) => {
            return Verdict::failed(
                identity,
                FailureReason::ExecutionCrash,
                err.to_string(),
                started.elapsed(),
            );
        }
        Ok(Ok(captured)) => captured,
    };

    if let Some(reason) = skip_reason(&captured.stdout) {
        return Verdict::skipped(identity, reason, started.elapsed());
    }
    let xfail = take_xfail(&mut captured.stdout);
    let evaluation =
        task::spawn_blocking(move || evaluate_expectations(&fixture, &captured)).await;
    match evaluation {
        Ok(mismatches) => {
            Verdict::from_mismatches(identity, mismatches, started.elapsed()).with_xfail(xfail)
        }
        Err(err) => Verdict::failed(
            identity,
            FailureReason::ExecutionCrash,
            format!("expectation evaluation stopped: {err}"),
            started.elapsed(),
        ),
    }
}

/// Returns the first non-blank line when the output starts with `skip`
/// (any case, leading whitespace and blank lines allowed).
fn skip_reason(output: &str) -> Option<String> {
    let first = output.trim_start().lines().next()?;
    starts_with_keyword(first, "skip").then(|| first.trim().to_string())
}

/// Strips a leading `xfail` line, and any blank lines before it, from the
/// output and returns it.
fn take_xfail(output: &mut String) -> Option<String> {
    let body = output.trim_start();
    let first = body.lines().next()?;
    if !starts_with_keyword(first, "xfail") {
        return None;
    }
    let note = first.trim().to_string();
    let rest = body.split_once('\n').map(|(_, rest)| rest.to_string()).unwrap_or_default();
    *output = rest;
    Some(note)
}

/// Case-insensitive keyword prefix check after leading whitespace.
fn starts_with_keyword(line: &str, keyword: &str) -> bool {
    line.trim_start()
        .get(.. keyword.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(keyword))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::skip_reason;
    use super::take_xfail;

    #[test]
    fn skip_detection_uses_first_non_blank_line() {
        assert_eq!(skip_reason("  SKIP: no pdo\nmore"), Some("SKIP: no pdo".to_string()));
        assert_eq!(skip_reason("skipped"), Some("skipped".to_string()));
        assert_eq!(skip_reason("ok\nskip"), None);
        assert_eq!(skip_reason("\n\n  skip: no redis\n"), Some("skip: no redis".to_string()));
        assert_eq!(skip_reason(""), None);
    }

    #[test]
    fn xfail_line_is_stripped() {
        let mut output = "xfail: flaky on 8.x\nHello\n".to_string();
        assert_eq!(take_xfail(&mut output), Some("xfail: flaky on 8.x".to_string()));
        assert_eq!(output, "Hello\n");

        let mut padded = "\nXFAIL: pending\nHello\n".to_string();
        assert_eq!(take_xfail(&mut padded), Some("XFAIL: pending".to_string()));
        assert_eq!(padded, "Hello\n");

        let mut untouched = "Hello\n".to_string();
        assert_eq!(take_xfail(&mut untouched), None);
        assert_eq!(untouched, "Hello\n");
    }
}
