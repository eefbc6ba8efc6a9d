//! The console handle.

use std::fmt;
use std::future::Future;
use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use pty_pair::{PtyMaster, WindowSize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::builder::ConsoleBuilder;
use super::hooks::{ExpectOutcome, Hooks, SendRecord};
use super::tty::Tty;
use crate::config::ConsoleConfig;
use crate::error::{ExpectError, Result};
use crate::expect::{ExpectOptions, Matcher, StreamMonitor, render_criteria};
use crate::types::{ConsoleState, ControlChar, Match};

/// Extra cleanup run when a console closes.
pub(crate) type Closer = Box<dyn FnOnce() -> io::Result<()> + Send>;

/// A pseudo-terminal driven with expect-style waits.
///
/// The program under test talks to [`Console::tty`]; the console writes its
/// input with [`send`](Self::send) and waits for its output with
/// [`expect`](Self::expect). A background task drains the terminal into a
/// shared buffer for the whole lifetime of the console, so output is never
/// lost between calls.
///
/// All methods take `&self`. Sends may run concurrently with an expect, but
/// only one expect may be in flight at a time.
///
/// # Example
///
/// ```ignore
/// use console_expect::Console;
///
/// let console = Console::new()?;
/// // hand console.tty().stdio()? to a child process, then:
/// console.expect_string("login: ").await?;
/// console.send_line("admin").await?;
/// console.expect_eof().await?;
/// ```
pub struct Console {
    master: StdMutex<Option<Arc<PtyMaster>>>,
    send_path: Arc<crate::send::SendPath<PtyMaster>>,
    monitor: Arc<StreamMonitor>,
    tty: Tty,
    hooks: Hooks,
    config: ConsoleConfig,
    expect_gate: Mutex<()>,
    tasks: StdMutex<Vec<JoinHandle<()>>>,
    closers: StdMutex<Vec<Closer>>,
    closed: AtomicBool,
}

impl Console {
    /// Open a console with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if called outside a tokio runtime or the terminal
    /// cannot be allocated.
    pub fn new() -> Result<Self> {
        ConsoleBuilder::new().build()
    }

    /// Start building a console.
    #[must_use]
    pub fn builder() -> ConsoleBuilder {
        ConsoleBuilder::new()
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        master: Arc<PtyMaster>,
        send_path: Arc<crate::send::SendPath<PtyMaster>>,
        monitor: Arc<StreamMonitor>,
        tty: Tty,
        hooks: Hooks,
        config: ConsoleConfig,
        tasks: Vec<JoinHandle<()>>,
        closers: Vec<Closer>,
    ) -> Self {
        Self {
            master: StdMutex::new(Some(master)),
            send_path,
            monitor,
            tty,
            hooks,
            config,
            expect_gate: Mutex::new(()),
            tasks: StdMutex::new(tasks),
            closers: StdMutex::new(closers),
            closed: AtomicBool::new(false),
        }
    }

    fn master(&self) -> Option<Arc<PtyMaster>> {
        self.master
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ------------------------------------------------------------------
    // Sending
    // ------------------------------------------------------------------

    /// Write raw bytes to the program's input.
    ///
    /// Returns the number of bytes written, which on success is always the
    /// full length of `data`.
    ///
    /// # Errors
    ///
    /// Returns [`ExpectError::SessionClosed`] after [`close`](Self::close),
    /// [`ExpectError::ShortWrite`] if the terminal stops accepting input,
    /// or the underlying I/O error.
    pub async fn send(&self, data: impl AsRef<[u8]>) -> Result<usize> {
        let data = data.as_ref();
        let (written, result) = self.send_path.write_all(data).await;

        self.hooks.notify_send(&SendRecord {
            data,
            written,
            error: result.as_ref().err(),
        });

        match result {
            Ok(()) => {
                tracing::debug!(bytes = written, "sent");
                Ok(written)
            }
            Err(e) => {
                tracing::debug!(bytes = written, error = %e, "send failed");
                Err(e)
            }
        }
    }

    /// Write `line` followed by the configured line ending.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn send_line(&self, line: impl AsRef<[u8]>) -> Result<usize> {
        let line = line.as_ref();
        let ending = self.config.line_ending.as_bytes();
        let mut data = Vec::with_capacity(line.len() + ending.len());
        data.extend_from_slice(line);
        data.extend_from_slice(ending);
        self.send(data).await
    }

    /// Send a single control character.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn send_control(&self, ctrl: ControlChar) -> Result<usize> {
        self.send([ctrl.as_byte()]).await
    }

    // ------------------------------------------------------------------
    // Waiting
    // ------------------------------------------------------------------

    /// Wait until one of `matchers` is satisfied.
    ///
    /// Matchers are evaluated in argument order every time output arrives
    /// or an end condition is raised; the first one satisfied wins. The
    /// console's default timeout applies.
    ///
    /// # Errors
    ///
    /// Returns [`ExpectError::Timeout`] when the deadline passes,
    /// [`ExpectError::UnexpectedEnd`] when the stream ends in a way no
    /// matcher accepts, [`ExpectError::ReadFailure`] after a terminal read
    /// error, or [`ExpectError::ExpectInProgress`] if another expect is
    /// already waiting.
    pub async fn expect<I, M>(&self, matchers: I) -> Result<Match>
    where
        I: IntoIterator<Item = M>,
        M: Into<Matcher>,
    {
        self.expect_with(matchers, ExpectOptions::new()).await
    }

    /// Wait with per-call options.
    ///
    /// # Errors
    ///
    /// See [`expect`](Self::expect).
    pub async fn expect_with<I, M>(&self, matchers: I, options: ExpectOptions) -> Result<Match>
    where
        I: IntoIterator<Item = M>,
        M: Into<Matcher>,
    {
        let matchers: Vec<Matcher> = matchers.into_iter().map(Into::into).collect();
        self.wait(&matchers, options).await
    }

    /// Wait with an explicit deadline for this call only.
    ///
    /// # Errors
    ///
    /// See [`expect`](Self::expect).
    pub async fn expect_timeout<I, M>(&self, matchers: I, timeout: Duration) -> Result<Match>
    where
        I: IntoIterator<Item = M>,
        M: Into<Matcher>,
    {
        self.expect_with(matchers, ExpectOptions::timeout(timeout))
            .await
    }

    /// Wait for exact text and return it.
    ///
    /// # Errors
    ///
    /// See [`expect`](Self::expect).
    pub async fn expect_string(&self, text: impl Into<String>) -> Result<String> {
        let m = self.wait(&[Matcher::literal(text)], ExpectOptions::new()).await?;
        Ok(m.matched)
    }

    /// Format a literal and wait for it.
    ///
    /// ```ignore
    /// console.expect_fmt(format_args!("What is {}+{}?", 1, 1)).await?;
    /// ```
    ///
    /// # Errors
    ///
    /// See [`expect`](Self::expect).
    pub fn expect_fmt<'a>(
        &'a self,
        args: fmt::Arguments<'_>,
    ) -> impl Future<Output = Result<String>> + Send + use<'a> {
        let text = args.to_string();
        self.expect_string(text)
    }

    /// Wait for the program's output to end.
    ///
    /// Resolves on end-of-stream and on the terminal side being closed, and
    /// returns the output that was still unread.
    ///
    /// # Errors
    ///
    /// See [`expect`](Self::expect).
    pub async fn expect_eof(&self) -> Result<String> {
        let m = self
            .wait(
                &[Matcher::eof(), Matcher::tty_closed()],
                ExpectOptions::new(),
            )
            .await?;
        Ok(m.buffer)
    }

    async fn wait(&self, matchers: &[Matcher], options: ExpectOptions) -> Result<Match> {
        let result = match self.expect_gate.try_lock() {
            Ok(_guard) => {
                let timeout = options.effective_timeout(self.config.default_timeout);
                self.monitor.wait_for(matchers, timeout).await
            }
            Err(_) => Err(ExpectError::ExpectInProgress),
        };

        match &result {
            Ok(m) => tracing::debug!(
                criteria = %render_criteria(matchers),
                index = m.index,
                matched = %m.matched,
                "expect matched"
            ),
            Err(e) => tracing::debug!(
                criteria = %render_criteria(matchers),
                error = %e,
                "expect failed"
            ),
        }

        self.hooks
            .notify_expect(&ExpectOutcome::new(matchers, &result));
        result
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// The terminal side, for attaching a program or chaining consoles.
    #[must_use]
    pub const fn tty(&self) -> &Tty {
        &self.tty
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConsoleState {
        if self.closed.load(Ordering::SeqCst) {
            ConsoleState::Closed
        } else if self.tty.is_closed() {
            ConsoleState::HalfClosed
        } else {
            ConsoleState::Open
        }
    }

    /// Everything the program has written so far.
    #[must_use]
    pub fn output(&self) -> String {
        self.monitor.output()
    }

    /// Output not yet consumed by a successful expect.
    #[must_use]
    pub fn pending(&self) -> String {
        self.monitor.pending()
    }

    /// The settings this console was built with.
    #[must_use]
    pub const fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// Change the terminal window size.
    ///
    /// # Errors
    ///
    /// Returns an error if the console is closed or the size is rejected.
    pub fn resize(&self, cols: u16, rows: u16) -> Result<()> {
        let master = self.master().ok_or(ExpectError::SessionClosed)?;
        master.resize(WindowSize::new(cols, rows))?;
        tracing::debug!(cols, rows, "console resized");
        Ok(())
    }

    /// Raw descriptor of the controlling side, while open.
    #[must_use]
    pub fn as_raw_fd(&self) -> Option<RawFd> {
        self.master().map(|master| master.as_raw_fd())
    }

    // ------------------------------------------------------------------
    // Closing
    // ------------------------------------------------------------------

    /// Close the console.
    ///
    /// Releases both sides of the terminal, stops the background tasks,
    /// wakes any waiting expect and runs the registered closers. Output
    /// already buffered stays readable through [`output`](Self::output).
    /// Calling this again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by a closer. Every closer runs
    /// regardless.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        // Waiters must see the closed condition before the hangup that
        // releasing the terminal causes.
        self.monitor.close();
        self.send_path.close();
        self.tty.close();

        let tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner));
        for task in tasks {
            task.abort();
        }

        drop(
            self.master
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );

        let closers =
            std::mem::take(&mut *self.closers.lock().unwrap_or_else(PoisonError::into_inner));
        let mut first_error = None;
        for closer in closers {
            if let Err(e) = closer() {
                tracing::warn!(error = %e, "console closer failed");
                first_error.get_or_insert(e);
            }
        }

        tracing::debug!(tty = %self.tty.path().display(), "console closed");

        match first_error {
            Some(e) => Err(ExpectError::io_context("running console closer", e)),
            None => Ok(()),
        }
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "error while dropping console");
        }
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console")
            .field("tty", &self.tty.path())
            .field("state", &self.state())
            .field("hooks", &self.hooks)
            .field("default_timeout", &self.config.default_timeout)
            .finish_non_exhaustive()
    }
}
