//! Executor - splits runner calls into queries and mutations
//!
//! Queries always hit the runner, dry-run or not, so a diagnosis reflects
//! the real host. Mutations are logged with their exact command line and,
//! in dry-run, never reach the runner.

use crate::runner::{render_command, CommandOutput, CommandRunner};
use crate::sink::LogSink;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Prefix for mutations suppressed by dry-run
pub const DRY_RUN_PREFIX: &str = "[DRY RUN] Would execute:";

/// Prefix for mutations actually executed
pub const LIVE_PREFIX: &str = "Executing:";

/// What happened to an attempted action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Command ran and exited 0
    Applied,
    /// Command ran and failed, or could not run
    Failed,
    /// Dry-run: logged, not executed
    DryRun,
    /// Nothing to run, or gated off; guidance was logged instead
    Skipped,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Applied => "applied",
            OutcomeStatus::Failed => "failed",
            OutcomeStatus::DryRun => "dry-run",
            OutcomeStatus::Skipped => "skipped",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            OutcomeStatus::Applied => "[OK]",
            OutcomeStatus::Failed => "[FAIL]",
            OutcomeStatus::DryRun => "[DRY]",
            OutcomeStatus::Skipped => "[SKIP]",
        }
    }
}

/// Result of a mutation attempt
#[derive(Debug, Clone)]
pub struct MutationResult {
    pub command: String,
    pub status: OutcomeStatus,
    pub output: String,
}

/// Timeout-bounded gateway to the command runner
pub struct Executor<'a> {
    runner: &'a dyn CommandRunner,
    sink: &'a dyn LogSink,
    dry_run: bool,
    query_timeout: Duration,
    action_timeout: Duration,
}

impl<'a> Executor<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        sink: &'a dyn LogSink,
        dry_run: bool,
        query_timeout: Duration,
        action_timeout: Duration,
    ) -> Self {
        Self {
            runner,
            sink,
            dry_run,
            query_timeout,
            action_timeout,
        }
    }

    pub fn sink(&self) -> &dyn LogSink {
        self.sink
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// Read-only command with the default query timeout
    pub async fn query(&self, argv: &[String]) -> CommandOutput {
        self.query_with_timeout(argv, self.query_timeout).await
    }

    /// Read-only command with an explicit timeout
    pub async fn query_with_timeout(&self, argv: &[String], timeout: Duration) -> CommandOutput {
        let output = self.runner.run(argv, timeout).await;
        self.sink.debug(&format!(
            "query `{}` -> {} (exit {}, {}ms)",
            render_command(argv),
            output.status.as_str(),
            output.exit_code,
            output.duration_ms
        ));
        output
    }

    /// Log a mutation line with the mode-appropriate prefix
    ///
    /// The text after the prefix is identical in both modes.
    pub fn announce_mutation(&self, command_line: &str) {
        if self.dry_run {
            self.sink.info(&format!("{} {}", DRY_RUN_PREFIX, command_line));
        } else {
            self.sink.info(&format!("{} {}", LIVE_PREFIX, command_line));
        }
    }

    /// State-changing command; a logged no-op in dry-run
    pub async fn mutate(&self, argv: &[String]) -> MutationResult {
        let command = render_command(argv);
        self.announce_mutation(&command);

        if self.dry_run {
            return MutationResult {
                command,
                status: OutcomeStatus::DryRun,
                output: String::new(),
            };
        }

        let output = self.runner.run(argv, self.action_timeout).await;
        let status = if output.success() {
            OutcomeStatus::Applied
        } else {
            OutcomeStatus::Failed
        };

        MutationResult {
            command,
            status,
            output: output.combined_output(),
        }
    }
}
