//! Command runner - the single place where OS commands are executed
//!
//! - Takes an argument vector and a timeout
//! - Captures real exit code, stdout, stderr, duration
//! - Never returns an error: spawn failures and timeouts are failed results
//!
//! Callers decide what a result means. This layer does not interpret output.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Maximum output length to capture (prevent memory issues)
const MAX_OUTPUT_BYTES: usize = 64 * 1024; // 64KB

/// Execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Command ran successfully (exit code 0)
    Success,
    /// Command ran but returned non-zero exit code
    NonZeroExit,
    /// Command not found on system
    CommandNotFound,
    /// Permission denied
    PermissionDenied,
    /// Command timed out and was killed
    Timeout,
    /// Other OS error
    OsError,
}

impl ExecutionStatus {
    /// Human-readable description
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NonZeroExit => "non-zero exit",
            Self::CommandNotFound => "command not found",
            Self::PermissionDenied => "permission denied",
            Self::Timeout => "timeout",
            Self::OsError => "OS error",
        }
    }
}

/// Result of a command execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Exit code (0 = success, -1 = no exit code)
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
    pub status: ExecutionStatus,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }

    /// Successful result with the given stdout
    pub fn ok(stdout: &str) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
            duration_ms: 0,
            status: ExecutionStatus::Success,
        }
    }

    /// Non-zero exit with the given stderr
    pub fn failed(exit_code: i32, stderr: &str) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.to_string(),
            duration_ms: 0,
            status: ExecutionStatus::NonZeroExit,
        }
    }

    /// Command killed after exceeding its timeout
    pub fn timed_out(timeout: Duration) -> Self {
        Self {
            exit_code: -1,
            stdout: String::new(),
            stderr: format!("timed out after {}s", timeout.as_secs()),
            duration_ms: timeout.as_millis() as u64,
            status: ExecutionStatus::Timeout,
        }
    }

    /// Whichever stream carries the message, trimmed
    pub fn combined_output(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (true, true) => String::new(),
            (false, true) => stdout.to_string(),
            (true, false) => stderr.to_string(),
            (false, false) => format!("{}\n{}", stdout, stderr),
        }
    }
}

/// Executes an OS command with a timeout
///
/// Implementations must never panic or block past `timeout`.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, argv: &[String], timeout: Duration) -> CommandOutput;
}

/// Runs commands on the real system via `tokio::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, argv: &[String], timeout: Duration) -> CommandOutput {
        let start = Instant::now();

        let (program, args) = match argv.split_first() {
            Some(split) => split,
            None => {
                return CommandOutput {
                    exit_code: -1,
                    stdout: String::new(),
                    stderr: "empty command".to_string(),
                    duration_ms: 0,
                    status: ExecutionStatus::OsError,
                }
            }
        };

        debug!("  Executing: {} {:?}", program, args);

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(timeout, child).await {
            Ok(output) => output,
            Err(_) => return CommandOutput::timed_out(timeout),
        };

        let duration_ms = start.elapsed().as_millis() as u64;

        match output {
            Ok(output) => {
                let stdout = truncate_output(&output.stdout);
                let stderr = truncate_output(&output.stderr);
                let exit_code = output.status.code().unwrap_or(-1);

                let status = if output.status.success() {
                    ExecutionStatus::Success
                } else if stderr.contains("Permission denied") {
                    ExecutionStatus::PermissionDenied
                } else {
                    ExecutionStatus::NonZeroExit
                };

                CommandOutput {
                    exit_code,
                    stdout,
                    stderr,
                    duration_ms,
                    status,
                }
            }
            Err(e) => {
                let status = match e.kind() {
                    std::io::ErrorKind::NotFound => ExecutionStatus::CommandNotFound,
                    std::io::ErrorKind::PermissionDenied => ExecutionStatus::PermissionDenied,
                    _ => ExecutionStatus::OsError,
                };

                CommandOutput {
                    exit_code: -1,
                    stdout: String::new(),
                    stderr: format!("OS error: {}", e),
                    duration_ms,
                    status,
                }
            }
        }
    }
}

/// Build an owned argument vector from string slices
pub fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

/// Render an argument vector as the shell line an operator would type
pub fn render_command(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                format!("'{}'", arg.replace('\'', "'\\''"))
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncate output to max bytes, converting to string
fn truncate_output(bytes: &[u8]) -> String {
    let slice = if bytes.len() > MAX_OUTPUT_BYTES {
        &bytes[..MAX_OUTPUT_BYTES]
    } else {
        bytes
    };

    String::from_utf8_lossy(slice).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_command_plain() {
        let cmd = argv(&["systemctl", "restart", "NetworkManager"]);
        assert_eq!(render_command(&cmd), "systemctl restart NetworkManager");
    }

    #[test]
    fn test_render_command_quotes_whitespace() {
        let cmd = argv(&["nmcli", "device", "connect", "my iface"]);
        assert_eq!(render_command(&cmd), "nmcli device connect 'my iface'");
    }

    #[test]
    fn test_combined_output() {
        let mut out = CommandOutput::ok("  hello \n");
        assert_eq!(out.combined_output(), "hello");
        out.stderr = "warn".to_string();
        assert_eq!(out.combined_output(), "hello\nwarn");
        assert_eq!(CommandOutput::failed(1, "boom").combined_output(), "boom");
    }

    #[test]
    fn test_truncate_output() {
        let big = vec![b'a'; MAX_OUTPUT_BYTES + 10];
        assert_eq!(truncate_output(&big).len(), MAX_OUTPUT_BYTES);
    }

    #[tokio::test]
    async fn test_system_runner_echo() {
        let out = SystemRunner::new()
            .run(&argv(&["echo", "netmedic-ok"]), Duration::from_secs(5))
            .await;
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "netmedic-ok");
    }

    #[tokio::test]
    async fn test_system_runner_nonzero() {
        let out = SystemRunner::new()
            .run(&argv(&["false"]), Duration::from_secs(5))
            .await;
        assert!(!out.success());
        assert_eq!(out.status, ExecutionStatus::NonZeroExit);
    }

    #[tokio::test]
    async fn test_system_runner_missing_binary() {
        let out = SystemRunner::new()
            .run(
                &argv(&["netmedic-definitely-not-a-binary"]),
                Duration::from_secs(5),
            )
            .await;
        assert_eq!(out.status, ExecutionStatus::CommandNotFound);
        assert_eq!(out.exit_code, -1);
    }

    #[tokio::test]
    async fn test_system_runner_timeout() {
        let out = SystemRunner::new()
            .run(&argv(&["sleep", "5"]), Duration::from_millis(200))
            .await;
        assert_eq!(out.status, ExecutionStatus::Timeout);
        assert!(!out.success());
    }

    #[tokio::test]
    async fn test_system_runner_empty_argv() {
        let out = SystemRunner::new().run(&[], Duration::from_secs(1)).await;
        assert_eq!(out.status, ExecutionStatus::OsError);
    }
}
