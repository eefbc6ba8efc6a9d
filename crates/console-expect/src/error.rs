//! Error types for console-expect.
//!
//! Every failed wait carries the unread buffer and the criteria it was
//! waiting for, so a failing test shows what the program actually printed.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use pty_pair::PtyError;
use thiserror::Error;

use crate::types::EndReason;

/// Maximum length of buffer content to display in error messages.
const MAX_BUFFER_DISPLAY: usize = 500;

/// Context lines to show before/after truncation point.
const CONTEXT_LINES: usize = 3;

/// Format buffer content for display, truncating if necessary.
fn format_buffer_snippet(buffer: &str) -> String {
    if buffer.is_empty() {
        return "(empty buffer)".to_string();
    }

    let buffer_len = buffer.len();

    if buffer_len <= MAX_BUFFER_DISPLAY {
        return format!(
            "┌─ buffer ({} bytes) ──────────────────────\n│ {}\n└────────────────────────────────────────",
            buffer_len,
            buffer.lines().collect::<Vec<_>>().join("\n│ ")
        );
    }

    let lines: Vec<&str> = buffer.lines().collect();
    let total_lines = lines.len();

    if total_lines <= CONTEXT_LINES * 2 {
        return format!(
            "┌─ buffer ({} bytes, {} lines) ─────────────\n│ {}\n└────────────────────────────────────────",
            buffer_len,
            total_lines,
            lines.join("\n│ ")
        );
    }

    // Only the tail is shown; the end of the output is what a failed wait
    // was looking at.
    let tail_lines = &lines[lines.len().saturating_sub(CONTEXT_LINES * 2)..];
    let hidden = total_lines - tail_lines.len();

    format!(
        "┌─ buffer ({} bytes, {} lines) ─────────────\n│ ... ({} lines hidden)\n│ {}\n└────────────────────────────────────────",
        buffer_len,
        total_lines,
        hidden,
        tail_lines.join("\n│ ")
    )
}

/// Render a list of criteria descriptions as `["a", "b"]`.
#[must_use]
pub fn format_criteria(criteria: &[String]) -> String {
    let quoted: Vec<String> = criteria.iter().map(|c| format!("{c:?}")).collect();
    format!("[{}]", quoted.join(", "))
}

fn format_timeout_error(duration: Duration, criteria: &[String], buffer: &str) -> String {
    format!(
        "i/o timeout after {duration:?} waiting for {}\n\n{}",
        format_criteria(criteria),
        format_buffer_snippet(buffer)
    )
}

fn format_unexpected_end_error(reason: EndReason, criteria: &[String], buffer: &str) -> String {
    format!(
        "unexpected end of input ({reason}) while waiting for {}\n\n{}",
        format_criteria(criteria),
        format_buffer_snippet(buffer)
    )
}

fn format_read_failure_error(source: &io::Error, buffer: &str) -> String {
    format!(
        "failed to read from console: {source}\n\n{}",
        format_buffer_snippet(buffer)
    )
}

/// The main error type for console operations.
#[derive(Debug, Error)]
pub enum ExpectError {
    /// The console has been closed.
    #[error("session closed")]
    SessionClosed,

    /// The terminal accepted fewer bytes than requested.
    #[error("short write: {written} of {expected} bytes written")]
    ShortWrite {
        /// Bytes actually written.
        written: usize,
        /// Bytes requested.
        expected: usize,
    },

    /// Reading terminal output failed. Every waiter sees the same failure.
    #[error("{}", format_read_failure_error(source, buffer))]
    ReadFailure {
        /// The stored read error.
        source: Arc<io::Error>,
        /// Unread buffer contents when the wait resolved.
        buffer: String,
    },

    /// The wait deadline passed without any criterion being met.
    #[error("{}", format_timeout_error(*duration, criteria, buffer))]
    Timeout {
        /// The deadline that elapsed.
        duration: Duration,
        /// The criteria that were not met.
        criteria: Vec<String>,
        /// Unread buffer contents at the deadline.
        buffer: String,
    },

    /// An end condition was reached that none of the criteria accepted.
    #[error("{}", format_unexpected_end_error(*reason, criteria, buffer))]
    UnexpectedEnd {
        /// Which end condition was reached.
        reason: EndReason,
        /// The criteria that were not met.
        criteria: Vec<String>,
        /// Unread buffer contents when the end was observed.
        buffer: String,
    },

    /// Another expect call is already waiting on this console.
    #[error("another expect is already in progress on this console")]
    ExpectInProgress,

    /// Expect was called with nothing to wait for.
    #[error("expect called without any matchers")]
    NoMatchers,

    /// Allocating or controlling the terminal failed.
    #[error("PTY error: {0}")]
    Pty(#[from] PtyError),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An I/O error occurred with additional context.
    #[error("{context}: {source}")]
    IoWithContext {
        /// What operation was being performed.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Invalid regex pattern.
    #[error("invalid regex pattern: {0}")]
    Regex(#[from] regex::Error),

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

/// Result type alias for console operations.
pub type Result<T> = std::result::Result<T, ExpectError>;

impl ExpectError {
    /// Create a timeout error with the given details.
    pub fn timeout(duration: Duration, criteria: Vec<String>, buffer: impl Into<String>) -> Self {
        Self::Timeout {
            duration,
            criteria,
            buffer: buffer.into(),
        }
    }

    /// Create an unexpected end error.
    pub fn unexpected_end(
        reason: EndReason,
        criteria: Vec<String>,
        buffer: impl Into<String>,
    ) -> Self {
        Self::UnexpectedEnd {
            reason,
            criteria,
            buffer: buffer.into(),
        }
    }

    /// Create a read failure error around a shared source.
    pub fn read_failure(source: Arc<io::Error>, buffer: impl Into<String>) -> Self {
        Self::ReadFailure {
            source,
            buffer: buffer.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io_context(context: impl Into<String>, source: io::Error) -> Self {
        Self::IoWithContext {
            context: context.into(),
            source,
        }
    }

    /// Wrap an I/O result with context.
    pub fn with_io_context<T>(result: io::Result<T>, context: impl Into<String>) -> Result<T> {
        result.map_err(|e| Self::io_context(context, e))
    }

    /// Check if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if this is an unexpected end error.
    #[must_use]
    pub const fn is_unexpected_end(&self) -> bool {
        matches!(self, Self::UnexpectedEnd { .. })
    }

    /// Check if the console was closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(
            self,
            Self::SessionClosed
                | Self::UnexpectedEnd {
                    reason: EndReason::SessionClosed,
                    ..
                }
        )
    }

    /// Get the buffer contents if this error contains them.
    #[must_use]
    pub fn buffer(&self) -> Option<&str> {
        match self {
            Self::Timeout { buffer, .. }
            | Self::UnexpectedEnd { buffer, .. }
            | Self::ReadFailure { buffer, .. } => Some(buffer),
            _ => None,
        }
    }

    /// Get the unmatched criteria if this error is a failed wait.
    #[must_use]
    pub fn criteria(&self) -> Option<&[String]> {
        match self {
            Self::Timeout { criteria, .. } | Self::UnexpectedEnd { criteria, .. } => {
                Some(criteria)
            }
            _ => None,
        }
    }
}
