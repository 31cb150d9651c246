//! Log sink - append-only line consumer injected into the engine
//!
//! The engine never touches a global logger directly. Production wires
//! `TracingSink`, tests wire `MemorySink` and assert on the recorded lines.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Severity of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Accepts leveled text lines
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, line: &str);

    fn debug(&self, line: &str) {
        self.log(LogLevel::Debug, line);
    }

    fn info(&self, line: &str) {
        self.log(LogLevel::Info, line);
    }

    fn warn(&self, line: &str) {
        self.log(LogLevel::Warn, line);
    }

    fn error(&self, line: &str) {
        self.log(LogLevel::Error, line);
    }
}

/// Forwards every line to the `tracing` subscriber installed by the binary
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: LogLevel, line: &str) {
        match level {
            LogLevel::Debug => tracing::debug!("{}", line),
            LogLevel::Info => tracing::info!("{}", line),
            LogLevel::Warn => tracing::warn!("{}", line),
            LogLevel::Error => tracing::error!("{}", line),
        }
    }
}

/// A recorded log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub level: LogLevel,
    pub text: String,
}

/// In-memory sink for tests and for embedding callers that render lines themselves
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<LogLine>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far
    pub fn lines(&self) -> Vec<LogLine> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// True if any line at any level contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.text.contains(needle))
    }

    /// Lines at exactly `level`
    pub fn at_level(&self, level: LogLevel) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|l| l.level == level)
            .map(|l| l.text)
            .collect()
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: LogLevel, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(LogLine {
                level,
                text: line.to_string(),
            });
        }
    }
}
