//! Builder for consoles.
//!
//! The builder is the composable option set: every option can be given any
//! number of times and later values extend, rather than replace, earlier
//! ones where that makes sense (input sources, mirrors, hooks, closers).

use std::io;
use std::sync::Arc;
use std::time::Duration;

use pty_pair::WindowSize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::runtime::Handle;

use super::consumer::{Consumer, InputSource, OutputMirror, copy_input};
use super::handle::{Closer, Console};
use super::hooks::{ExpectOutcome, Hooks, SendRecord};
use super::tty::{HalfClose, Tty};
use crate::config::{ConsoleConfig, LineEnding};
use crate::error::{ExpectError, Result};
use crate::expect::StreamMonitor;
use crate::send::SendPath;

/// Builder for [`Console`].
#[derive(Default)]
pub struct ConsoleBuilder {
    config: ConsoleConfig,
    stdin: Vec<InputSource>,
    stdout: Vec<OutputMirror>,
    hooks: Hooks,
    closers: Vec<Closer>,
}

impl ConsoleBuilder {
    /// Create a builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the plain settings.
    #[must_use]
    pub fn config(mut self, config: ConsoleConfig) -> Self {
        self.config = config;
        self
    }

    /// Copy everything read from `reader` into the terminal.
    #[must_use]
    pub fn stdin<R>(mut self, reader: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        self.stdin.push(Box::new(reader));
        self
    }

    /// Mirror all terminal output to `writer`.
    #[must_use]
    pub fn stdout<W>(mut self, writer: W) -> Self
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        self.stdout.push(Box::new(writer));
        self
    }

    /// Set the deadline for expects that do not set their own.
    #[must_use]
    pub const fn default_timeout(mut self, timeout: Duration) -> Self {
        self.config.default_timeout = Some(timeout);
        self
    }

    /// Observe the outcome of every expect.
    #[must_use]
    pub fn on_expect<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ExpectOutcome<'_>) + Send + Sync + 'static,
    {
        self.hooks.add_expect_observer(hook);
        self
    }

    /// Observe the outcome of every send.
    #[must_use]
    pub fn on_send<F>(mut self, hook: F) -> Self
    where
        F: Fn(&SendRecord<'_>) + Send + Sync + 'static,
    {
        self.hooks.add_send_observer(hook);
        self
    }

    /// Run `closer` when the console is closed.
    #[must_use]
    pub fn closer<F>(mut self, closer: F) -> Self
    where
        F: FnOnce() -> io::Result<()> + Send + 'static,
    {
        self.closers.push(Box::new(closer));
        self
    }

    /// Set the line ending used by `send_line`.
    #[must_use]
    pub const fn line_ending(mut self, line_ending: LineEnding) -> Self {
        self.config.line_ending = line_ending;
        self
    }

    /// Set the initial window size.
    #[must_use]
    pub const fn window_size(mut self, cols: u16, rows: u16) -> Self {
        self.config.pty.window_size = WindowSize::new(cols, rows);
        self
    }

    /// Set whether the terminal echoes input.
    #[must_use]
    pub const fn echo(mut self, echo: bool) -> Self {
        self.config.pty.echo = echo;
        self
    }

    /// Open the terminal pair and start the background tasks.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no runtime, the configuration is
    /// invalid, or the terminal cannot be allocated.
    pub fn build(self) -> Result<Console> {
        let runtime = Handle::try_current()
            .map_err(|_| ExpectError::config("a console must be created inside a tokio runtime"))?;
        self.config.validate()?;

        let (master, slave) = pty_pair::open_pair(&self.config.pty)?;
        let master = Arc::new(master);
        let monitor = Arc::new(StreamMonitor::new());
        let half_close = Arc::new(HalfClose::new(Arc::clone(&monitor)));
        let tty = Tty::new(slave, Arc::clone(&half_close))?;
        let send_path = Arc::new(SendPath::new(Arc::clone(&master)));

        tracing::debug!(
            tty = %tty.path().display(),
            inputs = self.stdin.len(),
            mirrors = self.stdout.len(),
            default_timeout = ?self.config.default_timeout,
            "opening console"
        );

        let consumer = Consumer {
            master: Arc::clone(&master),
            monitor: Arc::clone(&monitor),
            half_close,
            mirrors: self.stdout,
            chunk_size: self.config.read_chunk_size,
            drain_grace: self.config.close_drain_grace,
        };

        let mut tasks = Vec::with_capacity(1 + self.stdin.len());
        tasks.push(runtime.spawn(consumer.run()));
        for source in self.stdin {
            tasks.push(runtime.spawn(copy_input(source, Arc::clone(&send_path))));
        }

        Ok(Console::from_parts(
            master,
            send_path,
            monitor,
            tty,
            self.hooks,
            self.config,
            tasks,
            self.closers,
        ))
    }
}

impl std::fmt::Debug for ConsoleBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleBuilder")
            .field("config", &self.config)
            .field("stdin", &self.stdin.len())
            .field("stdout", &self.stdout.len())
            .field("hooks", &self.hooks)
            .field("closers", &self.closers.len())
            .finish()
    }
}
