//! Configuration types for console-expect.
//!
//! [`ConsoleConfig`] holds the plain settings of a console. The composable
//! option set (input attachments, mirrors, hooks) lives on
//! [`ConsoleBuilder`](crate::ConsoleBuilder), which carries one of these.

mod env;

use std::str::FromStr;
use std::time::Duration;

pub use env::{DEFAULT_PREFIX, EnvConfig, vars};
use pty_pair::{PtyConfig, WindowSize};

use crate::error::{ExpectError, Result};

/// Default size of each read from the terminal.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 4096;

/// Default quiet period the consumer waits for in-flight output after the
/// terminal side is closed.
pub const DEFAULT_CLOSE_DRAIN_GRACE: Duration = Duration::from_millis(20);

/// Settings for a console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Deadline applied to every expect without its own. `None` waits
    /// until a criterion or end condition is met.
    pub default_timeout: Option<Duration>,

    /// Terminator appended by `send_line`.
    pub line_ending: LineEnding,

    /// Terminal allocation settings.
    pub pty: PtyConfig,

    /// Size of each read from the terminal.
    pub read_chunk_size: usize,

    /// Quiet period drained after a half-close.
    pub close_drain_grace: Duration,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            default_timeout: None,
            line_ending: LineEnding::default(),
            pty: PtyConfig::default(),
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            close_drain_grace: DEFAULT_CLOSE_DRAIN_GRACE,
        }
    }
}

impl ConsoleConfig {
    /// Create a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with `CONSOLE_EXPECT_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a variable is set to an invalid
    /// value.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env(&EnvConfig::default())
    }

    /// Overlay values found through `env` onto this configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a variable is set to an invalid
    /// value.
    pub fn with_env(mut self, env: &EnvConfig) -> Result<Self> {
        if let Some(raw) = env.get(vars::TIMEOUT_MS) {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                ExpectError::config(format!(
                    "{} must be a number of milliseconds, got {raw:?}",
                    env.var_name(vars::TIMEOUT_MS)
                ))
            })?;
            self.default_timeout = Some(Duration::from_millis(millis));
        }

        if let Some(raw) = env.get(vars::LINE_ENDING) {
            self.line_ending = raw.parse()?;
        }

        if let Some(echo) = env.bool(vars::ECHO) {
            self.pty.echo = echo;
        }

        Ok(self)
    }

    /// Set the default expect deadline.
    #[must_use]
    pub const fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Remove the default expect deadline.
    #[must_use]
    pub const fn no_default_timeout(mut self) -> Self {
        self.default_timeout = None;
        self
    }

    /// Set the line ending used by `send_line`.
    #[must_use]
    pub const fn line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Set the initial window size.
    #[must_use]
    pub const fn window_size(mut self, cols: u16, rows: u16) -> Self {
        self.pty.window_size = WindowSize::new(cols, rows);
        self
    }

    /// Set whether the terminal echoes input.
    #[must_use]
    pub const fn echo(mut self, echo: bool) -> Self {
        self.pty.echo = echo;
        self
    }

    /// Set the read chunk size.
    #[must_use]
    pub const fn read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size;
        self
    }

    /// Set the half-close drain period.
    #[must_use]
    pub const fn close_drain_grace(mut self, grace: Duration) -> Self {
        self.close_drain_grace = grace;
        self
    }

    /// Check the configuration for values the console cannot run with.
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.read_chunk_size == 0 {
            return Err(ExpectError::config("read_chunk_size must be non-zero"));
        }
        if !self.pty.window_size.is_valid() {
            return Err(ExpectError::config(format!(
                "window size must be non-zero, got {}x{}",
                self.pty.window_size.cols, self.pty.window_size.rows
            )));
        }
        Ok(())
    }
}

/// Line ending styles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineEnding {
    /// Unix-style line ending (LF).
    #[default]
    Lf,

    /// Windows-style line ending (CRLF).
    CrLf,

    /// Classic Mac line ending (CR).
    Cr,
}

impl LineEnding {
    /// Get the line ending as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Cr => "\r",
        }
    }

    /// Get the line ending as bytes.
    #[must_use]
    pub const fn as_bytes(self) -> &'static [u8] {
        self.as_str().as_bytes()
    }
}

impl FromStr for LineEnding {
    type Err = ExpectError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lf" | "\n" => Ok(Self::Lf),
            "crlf" | "\r\n" => Ok(Self::CrLf),
            "cr" | "\r" => Ok(Self::Cr),
            other => Err(ExpectError::config(format!(
                "unknown line ending {other:?}, expected lf, crlf or cr"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ConsoleConfig::default();
        assert_eq!(config.default_timeout, None);
        assert_eq!(config.line_ending, LineEnding::Lf);
        assert_eq!(config.read_chunk_size, DEFAULT_READ_CHUNK_SIZE);
        assert_eq!(config.close_drain_grace, DEFAULT_CLOSE_DRAIN_GRACE);
        assert!(config.pty.echo);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn setters_chain() {
        let config = ConsoleConfig::new()
            .default_timeout(Duration::from_secs(1))
            .line_ending(LineEnding::CrLf)
            .window_size(100, 30)
            .echo(false);

        assert_eq!(config.default_timeout, Some(Duration::from_secs(1)));
        assert_eq!(config.line_ending.as_bytes(), b"\r\n");
        assert_eq!(config.pty.window_size, WindowSize::new(100, 30));
        assert!(!config.pty.echo);
        assert_eq!(config.no_default_timeout().default_timeout, None);
    }

    #[test]
    fn validate_rejects_zero_chunk() {
        let err = ConsoleConfig::new().read_chunk_size(0).validate().unwrap_err();
        assert!(err.to_string().contains("read_chunk_size"));
    }

    #[test]
    fn line_ending_parsing() {
        assert_eq!("LF".parse::<LineEnding>().unwrap(), LineEnding::Lf);
        assert_eq!("crlf".parse::<LineEnding>().unwrap(), LineEnding::CrLf);
        assert_eq!(" cr ".parse::<LineEnding>().unwrap(), LineEnding::Cr);
        assert!("nl".parse::<LineEnding>().is_err());
    }

    #[test]
    fn env_overlay() {
        let env = EnvConfig::new("TEST_OVERLAY")
            .with_var(vars::TIMEOUT_MS, "250")
            .with_var(vars::LINE_ENDING, "crlf")
            .with_var(vars::ECHO, "off");

        let config = ConsoleConfig::default().with_env(&env).unwrap();
        assert_eq!(config.default_timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.line_ending, LineEnding::CrLf);
        assert!(!config.pty.echo);
    }

    #[test]
    fn env_overlay_rejects_garbage_timeout() {
        let env = EnvConfig::new("TEST_GARBAGE").with_var(vars::TIMEOUT_MS, "soon");
        let err = ConsoleConfig::default().with_env(&env).unwrap_err();
        assert!(err.to_string().contains("TEST_GARBAGE_TIMEOUT_MS"));
    }

    #[test]
    fn env_overlay_leaves_unset_values() {
        let env = EnvConfig::new("TEST_UNSET_NOTHING_HERE");
        let config = ConsoleConfig::default()
            .default_timeout(Duration::from_secs(3))
            .with_env(&env)
            .unwrap();
        assert_eq!(config.default_timeout, Some(Duration::from_secs(3)));
    }
}
