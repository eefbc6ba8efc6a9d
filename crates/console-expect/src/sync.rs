//! Synchronous wrapper for console operations.
//!
//! This module provides a blocking API for callers that do not run inside
//! an async runtime. The wrapper owns a small runtime whose worker keeps the
//! background consumer draining between calls.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::runtime::{Builder, Runtime};

use crate::config::ConsoleConfig;
use crate::console::{Console, ConsoleBuilder, Tty};
use crate::error::{ExpectError, Result};
use crate::expect::Matcher;
use crate::types::{ConsoleState, ControlChar, Match};

/// A blocking console.
pub struct SyncConsole {
    // Declared before the runtime so the console closes while the runtime
    // is still alive.
    inner: Console,
    runtime: Runtime,
}

impl SyncConsole {
    /// Open a console with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime or the terminal cannot be created.
    pub fn new() -> Result<Self> {
        Self::with_builder(ConsoleBuilder::new())
    }

    /// Open a console with the given settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime or the terminal cannot be created.
    pub fn with_config(config: ConsoleConfig) -> Result<Self> {
        Self::with_builder(ConsoleBuilder::new().config(config))
    }

    /// Open a console from a prepared builder.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime or the terminal cannot be created.
    pub fn with_builder(builder: ConsoleBuilder) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("console-expect")
            .enable_all()
            .build()
            .map_err(|e| ExpectError::io_context("creating tokio runtime", e))?;

        let inner = {
            let _entered = runtime.enter();
            builder.build()?
        };

        Ok(Self { inner, runtime })
    }

    /// The wrapped async console.
    #[must_use]
    pub const fn console(&self) -> &Console {
        &self.inner
    }

    /// The terminal side.
    #[must_use]
    pub const fn tty(&self) -> &Tty {
        self.inner.tty()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConsoleState {
        self.inner.state()
    }

    /// Send raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn send(&self, data: impl AsRef<[u8]>) -> Result<usize> {
        self.runtime.block_on(self.inner.send(data))
    }

    /// Send a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn send_line(&self, line: impl AsRef<[u8]>) -> Result<usize> {
        self.runtime.block_on(self.inner.send_line(line))
    }

    /// Send a control character.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn send_control(&self, ctrl: ControlChar) -> Result<usize> {
        self.runtime.block_on(self.inner.send_control(ctrl))
    }

    /// Wait for one of `matchers`.
    ///
    /// # Errors
    ///
    /// Returns an error on timeout, unexpected end or read failure.
    pub fn expect<I, M>(&self, matchers: I) -> Result<Match>
    where
        I: IntoIterator<Item = M>,
        M: Into<Matcher>,
    {
        self.runtime.block_on(self.inner.expect(matchers))
    }

    /// Wait for one of `matchers` with an explicit deadline.
    ///
    /// # Errors
    ///
    /// Returns an error on timeout, unexpected end or read failure.
    pub fn expect_timeout<I, M>(&self, matchers: I, timeout: Duration) -> Result<Match>
    where
        I: IntoIterator<Item = M>,
        M: Into<Matcher>,
    {
        self.runtime
            .block_on(self.inner.expect_timeout(matchers, timeout))
    }

    /// Wait for exact text.
    ///
    /// # Errors
    ///
    /// Returns an error on timeout, unexpected end or read failure.
    pub fn expect_string(&self, text: impl Into<String>) -> Result<String> {
        self.runtime.block_on(self.inner.expect_string(text))
    }

    /// Format a literal and wait for it.
    ///
    /// # Errors
    ///
    /// Returns an error on timeout, unexpected end or read failure.
    pub fn expect_fmt(&self, args: fmt::Arguments<'_>) -> Result<String> {
        self.runtime.block_on(self.inner.expect_fmt(args))
    }

    /// Wait for the output to end.
    ///
    /// # Errors
    ///
    /// Returns an error on timeout or read failure.
    pub fn expect_eof(&self) -> Result<String> {
        self.runtime.block_on(self.inner.expect_eof())
    }

    /// Everything received so far.
    #[must_use]
    pub fn output(&self) -> String {
        self.inner.output()
    }

    /// Change the window size.
    ///
    /// # Errors
    ///
    /// Returns an error if the console is closed or the size is rejected.
    pub fn resize(&self, cols: u16, rows: u16) -> Result<()> {
        self.inner.resize(cols, rows)
    }

    /// Close the console.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by a closer.
    pub fn close(&self) -> Result<()> {
        let _entered = self.runtime.enter();
        self.inner.close()
    }

    /// Run an async operation synchronously.
    pub fn block_on<F, T>(&self, future: F) -> T
    where
        F: Future<Output = T>,
    {
        self.runtime.block_on(future)
    }
}

impl fmt::Debug for SyncConsole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConsole")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}
