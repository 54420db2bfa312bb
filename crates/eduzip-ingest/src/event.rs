//! Progress reporting for a batch: per-file states and the user-facing log.

use std::fmt;

use chrono::{DateTime, Local, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Error,
}

/// One line of the batch log, timestamped when recorded.
///
/// This is the log a reviewer reads, kept apart from `tracing` output.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
        }
    }
}

/// `[HH:MM:SS] message`, in local time.
impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let local: DateTime<Local> = self.timestamp.into();
        write!(f, "[{}] {}", local.format("%H:%M:%S"), self.message)
    }
}

/// Where a file is in the pipeline.
///
/// `Queued → Parsing → Extracting | Analyzing → Appended`, or
/// `Queued → Parsing → … → Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Queued,
    Parsing,
    /// Table mode: reading rows out of the parsed HTML.
    Extracting,
    /// AI mode: waiting on the chat model.
    Analyzing,
    Appended,
    Failed,
}

impl FileState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Appended | Self::Failed)
    }
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "queued",
            Self::Parsing => "parsing",
            Self::Extracting => "extracting",
            Self::Analyzing => "analyzing",
            Self::Appended => "appended",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Emitted to the caller's observer while a batch runs, in order.
#[derive(Debug, Clone)]
pub enum IngestEvent {
    Log(LogEntry),
    State {
        index: usize,
        file: String,
        state: FileState,
    },
    /// Sent after every file, whether it succeeded or not.
    Progress { processed: usize, total: usize },
}
