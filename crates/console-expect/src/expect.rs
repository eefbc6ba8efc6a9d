//! Expect matching and waiting.
//!
//! This module provides the matcher set, the output buffer the consumer
//! fills, and the engine that resolves waits against it.

mod buffer;
mod engine;
mod matcher;

pub use buffer::OutputBuffer;
pub(crate) use engine::StreamMonitor;
pub use matcher::{
    EOF_CRITERIA, MatchState, Matcher, TTY_CLOSED_CRITERIA, TextPattern, criteria_of,
    first_match, render_criteria,
};

/// Per-call options for an expect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpectOptions {
    /// Deadline for this call only. `None` uses the console default.
    pub timeout: Option<std::time::Duration>,
}

impl ExpectOptions {
    /// Options with no overrides.
    #[must_use]
    pub const fn new() -> Self {
        Self { timeout: None }
    }

    /// Override the deadline for this call.
    #[must_use]
    pub const fn timeout(timeout: std::time::Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    /// Resolve the effective deadline against a console default.
    #[must_use]
    pub const fn effective_timeout(
        &self,
        default: Option<std::time::Duration>,
    ) -> Option<std::time::Duration> {
        match self.timeout {
            Some(timeout) => Some(timeout),
            None => default,
        }
    }
}
