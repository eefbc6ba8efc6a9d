//! The terminal side of a console.
//!
//! [`Tty`] is what the program under test talks to. Closing it is a
//! half-close: the program sees its terminal go away while the console
//! keeps its buffered output and stays usable for waits.

use std::io::{self, Read, Write};
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use pty_pair::{AsyncSlave, PtySlave, ReadCancel};
use tokio::sync::Notify;

use crate::error::{ExpectError, Result};
use crate::expect::StreamMonitor;

/// Coordinates a half-close between the [`Tty`] and the consumer.
///
/// Whichever of the two learns about the other last raises the
/// terminal-closed condition, so it is raised exactly when both the close
/// was requested and buffered output has been drained.
#[derive(Debug)]
pub(crate) struct HalfClose {
    requested: AtomicBool,
    consumer_done: AtomicBool,
    wake: Notify,
    monitor: Arc<StreamMonitor>,
}

impl HalfClose {
    pub(crate) fn new(monitor: Arc<StreamMonitor>) -> Self {
        Self {
            requested: AtomicBool::new(false),
            consumer_done: AtomicBool::new(false),
            wake: Notify::new(),
            monitor,
        }
    }

    fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.wake.notify_one();
        if self.consumer_done.load(Ordering::SeqCst) {
            self.monitor.mark_tty_closed();
        }
    }

    pub(crate) fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Resolves once a half-close has been requested.
    pub(crate) async fn requested(&self) {
        while !self.is_requested() {
            self.wake.notified().await;
        }
    }

    /// Called by the consumer when it stops reading.
    pub(crate) fn consumer_exited(&self) {
        self.consumer_done.store(true, Ordering::SeqCst);
        if self.is_requested() {
            self.monitor.mark_tty_closed();
        }
    }
}

/// Handle to the terminal side of a console.
///
/// `Read` and `Write` are implemented for `&Tty`: a thread can play the
/// terminal program directly, or [`Tty::stdio`] can hand the terminal to a
/// child process.
#[derive(Debug)]
pub struct Tty {
    slave: Mutex<Option<Arc<PtySlave>>>,
    path: std::path::PathBuf,
    reads: ReadCancel,
    half_close: Arc<HalfClose>,
}

impl Tty {
    pub(crate) fn new(slave: PtySlave, half_close: Arc<HalfClose>) -> Result<Self> {
        Ok(Self {
            path: slave.path().to_path_buf(),
            slave: Mutex::new(Some(Arc::new(slave))),
            reads: ReadCancel::new()?,
            half_close,
        })
    }

    fn current(&self) -> Option<Arc<PtySlave>> {
        self.slave
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn require(&self) -> io::Result<Arc<PtySlave>> {
        self.current()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "tty closed"))
    }

    /// Device path, e.g. `/dev/pts/3`.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether [`Tty::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.current().is_none()
    }

    /// A descriptor for a child's stdin, stdout or stderr.
    ///
    /// The child holds its own duplicate, so the terminal stays open for it
    /// after [`Tty::close`].
    ///
    /// # Errors
    ///
    /// Returns an error if the tty is closed or the descriptor cannot be
    /// duplicated.
    pub fn stdio(&self) -> Result<Stdio> {
        let slave = self.require().map_err(ExpectError::Io)?;
        Ok(slave.stdio()?)
    }

    /// An independent async stream on this terminal.
    ///
    /// Used to chain consoles: one console's tty becomes another's input
    /// source or output mirror.
    ///
    /// # Errors
    ///
    /// Returns an error if the tty is closed or cannot be reopened.
    pub fn stream(&self) -> Result<AsyncSlave> {
        let slave = self.require().map_err(ExpectError::Io)?;
        Ok(slave.open_async()?)
    }

    /// Close this handle, signalling end of input to the program.
    ///
    /// A read blocked on this handle returns end of input. Output the
    /// program wrote before the close is still delivered to the console.
    /// Calling this more than once is a no-op.
    pub fn close(&self) {
        let slave = self
            .slave
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(slave) = slave {
            self.reads.raise();
            drop(slave);
            tracing::debug!(tty = %self.path.display(), "tty half-closed");
            self.half_close.request();
        }
    }
}

impl Read for &Tty {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let slave = self.require()?;
        slave.read_or_cancel(buf, &self.reads)
    }
}

impl Write for &Tty {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let slave = self.require()?;
        (&*slave).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tty() -> (pty_pair::PtyMaster, Tty, Arc<StreamMonitor>) {
        let (master, slave) = pty_pair::open().unwrap();
        let monitor = Arc::new(StreamMonitor::new());
        let half_close = Arc::new(HalfClose::new(Arc::clone(&monitor)));
        (master, Tty::new(slave, half_close).unwrap(), monitor)
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (_master, tty, _monitor) = tty();
        assert!(!tty.is_closed());
        tty.close();
        tty.close();
        assert!(tty.is_closed());
    }

    #[tokio::test]
    async fn closed_tty_refuses_io() {
        let (_master, tty, _monitor) = tty();
        tty.close();

        let err = (&tty).write(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert!(tty.stdio().is_err());
        assert!(tty.stream().is_err());
    }

    #[tokio::test]
    async fn close_after_consumer_exit_marks_closed() {
        let (_master, tty, monitor) = tty();
        tty.half_close.consumer_exited();
        assert!(!monitor.lock().tty_closed);

        tty.close();
        assert!(monitor.lock().tty_closed);
    }

    #[tokio::test]
    async fn consumer_exit_after_close_marks_closed() {
        let (_master, tty, monitor) = tty();
        tty.close();
        assert!(!monitor.lock().tty_closed);
        tty.half_close.requested().await;

        tty.half_close.consumer_exited();
        assert!(monitor.lock().tty_closed);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn close_ends_a_blocked_read() {
        let (_master, tty, _monitor) = tty();

        let n = std::thread::scope(|scope| {
            let reader = scope.spawn(|| {
                let mut buf = [0u8; 16];
                (&tty).read(&mut buf)
            });
            std::thread::sleep(std::time::Duration::from_millis(50));
            tty.close();
            reader.join().unwrap()
        })
        .unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn path_survives_close() {
        let (_master, tty, _monitor) = tty();
        let path = tty.path().to_path_buf();
        tty.close();
        assert_eq!(tty.path(), path);
    }
}
