//! The terminal side of a PTY pair.
//!
//! [`PtySlave`] is a plain blocking descriptor: it is what a child process
//! gets as its standard streams, and what synchronous code reads and writes
//! when it plays the role of a terminal program. [`AsyncSlave`] is a second,
//! independently opened non-blocking handle for use from tokio tasks.

use std::io::{self, Read, Write};
use std::os::unix::io::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;
use std::sync::{Mutex, PoisonError};
use std::task::{Context, Poll};

use rustix::event::{PollFd, PollFlags, poll};
use rustix::fs::{Mode, OFlags, open};
use rustix::io::{Errno, FdFlags, fcntl_setfd};
use tokio::io::unix::AsyncFd;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use super::get_window_size;
use crate::config::WindowSize;
use crate::error::{PtyError, Result, errno_to_io};

/// Slave side of a pseudo-terminal.
///
/// `Read` and `Write` are implemented for `&PtySlave`, so a shared reference
/// is enough to drive it from several threads.
pub struct PtySlave {
    fd: OwnedFd,
    path: PathBuf,
}

impl std::fmt::Debug for PtySlave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtySlave")
            .field("fd", &self.fd.as_raw_fd())
            .field("path", &self.path)
            .finish()
    }
}

impl PtySlave {
    pub(crate) fn open(path: &str) -> Result<Self> {
        let fd = open_path(Path::new(path), OFlags::empty())?;
        Ok(Self {
            fd,
            path: PathBuf::from(path),
        })
    }

    /// Device path of this terminal, e.g. `/dev/pts/3`.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Duplicate the underlying descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if `dup` fails.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            fd: self.fd.try_clone()?,
            path: self.path.clone(),
        })
    }

    /// A duplicate descriptor suitable for a child's stdin, stdout or stderr.
    ///
    /// # Errors
    ///
    /// Returns an error if `dup` fails.
    pub fn stdio(&self) -> Result<Stdio> {
        Ok(Stdio::from(self.fd.try_clone()?))
    }

    /// Open an independent non-blocking handle on the same terminal.
    ///
    /// The new handle has its own file description, so switching it to
    /// non-blocking mode leaves this one untouched. Must be called from
    /// within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot be reopened or registered.
    pub fn open_async(&self) -> Result<AsyncSlave> {
        let fd = open_path(&self.path, OFlags::NONBLOCK)?;
        let async_fd = AsyncFd::new(fd).map_err(PtyError::Io)?;
        Ok(AsyncSlave { async_fd })
    }

    /// Blocking read that gives up with `Ok(0)` once `cancel` is raised,
    /// including while it is waiting for input.
    ///
    /// # Errors
    ///
    /// Returns an error if polling or reading the descriptor fails.
    pub fn read_or_cancel(&self, buf: &mut [u8], cancel: &ReadCancel) -> io::Result<usize> {
        loop {
            let (readable, cancelled) = {
                let mut fds = [
                    PollFd::new(&self.fd, PollFlags::IN),
                    PollFd::new(&cancel.watch, PollFlags::IN),
                ];
                match poll(&mut fds, None) {
                    Ok(_) => {}
                    Err(Errno::INTR) => continue,
                    Err(e) => return Err(errno_to_io(e)),
                }
                (!fds[0].revents().is_empty(), !fds[1].revents().is_empty())
            };

            if cancelled {
                return Ok(0);
            }
            if readable {
                return (&*self).read(buf);
            }
        }
    }

    /// Current terminal window size.
    ///
    /// # Errors
    ///
    /// Returns an error if the ioctl fails.
    pub fn window_size(&self) -> Result<WindowSize> {
        get_window_size(&self.fd)
    }
}

fn open_path(path: &Path, extra: OFlags) -> Result<OwnedFd> {
    open(
        path,
        OFlags::RDWR | OFlags::NOCTTY | OFlags::CLOEXEC | extra,
        Mode::empty(),
    )
    .map_err(|e| PtyError::OpenSlave {
        path: path.display().to_string(),
        source: errno_to_io(e),
    })
}

/// One-shot signal that wakes blocking [`PtySlave::read_or_cancel`] calls.
///
/// Backed by a pipe: raising drops the write end, after which the read end
/// polls as hung up for good.
pub struct ReadCancel {
    watch: OwnedFd,
    trigger: Mutex<Option<OwnedFd>>,
}

impl ReadCancel {
    /// Create an unraised signal.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipe cannot be created.
    pub fn new() -> Result<Self> {
        let (watch, trigger) = rustix::pipe::pipe()?;
        fcntl_setfd(&watch, FdFlags::CLOEXEC)?;
        fcntl_setfd(&trigger, FdFlags::CLOEXEC)?;
        Ok(Self {
            watch,
            trigger: Mutex::new(Some(trigger)),
        })
    }

    /// Wake every current and future read. Idempotent.
    pub fn raise(&self) {
        drop(
            self.trigger
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
    }

    /// Whether [`raise`](Self::raise) has been called.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl std::fmt::Debug for ReadCancel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadCancel")
            .field("raised", &self.is_raised())
            .finish()
    }
}

impl Read for &PtySlave {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match rustix::io::read(&self.fd, &mut *buf) {
                Ok(n) => return Ok(n),
                Err(Errno::INTR) => {}
                // The master is gone; report it the way a pipe would.
                Err(Errno::IO) => return Ok(0),
                Err(e) => return Err(errno_to_io(e)),
            }
        }
    }
}

impl Write for &PtySlave {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        loop {
            match rustix::io::write(&self.fd, buf) {
                Ok(n) => return Ok(n),
                Err(rustix::io::Errno::INTR) => {}
                Err(e) => return Err(errno_to_io(e)),
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for PtySlave {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (&*self).read(buf)
    }
}

impl Write for PtySlave {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AsFd for PtySlave {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl AsRawFd for PtySlave {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

/// Non-blocking handle on a PTY slave, usable as a tokio stream.
pub struct AsyncSlave {
    async_fd: AsyncFd<OwnedFd>,
}

impl std::fmt::Debug for AsyncSlave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncSlave")
            .field("fd", &self.async_fd.as_raw_fd())
            .finish()
    }
}

impl AsRawFd for AsyncSlave {
    fn as_raw_fd(&self) -> RawFd {
        self.async_fd.as_raw_fd()
    }
}

impl AsyncRead for AsyncSlave {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        loop {
            let mut guard = match self.async_fd.poll_read_ready(cx) {
                Poll::Ready(Ok(guard)) => guard,
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending => return Poll::Pending,
            };

            let unfilled = buf.initialize_unfilled();
            match rustix::io::read(self.async_fd.get_ref(), unfilled) {
                Ok(n) => {
                    buf.advance(n);
                    return Poll::Ready(Ok(()));
                }
                Err(rustix::io::Errno::AGAIN) => {
                    guard.clear_ready();
                }
                Err(rustix::io::Errno::INTR) => {}
                // Master hung up: end of stream.
                Err(rustix::io::Errno::IO) => return Poll::Ready(Ok(())),
                Err(e) => return Poll::Ready(Err(errno_to_io(e))),
            }
        }
    }
}

impl AsyncWrite for AsyncSlave {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        loop {
            let mut guard = match self.async_fd.poll_write_ready(cx) {
                Poll::Ready(Ok(guard)) => guard,
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending => return Poll::Pending,
            };

            match rustix::io::write(self.async_fd.get_ref(), buf) {
                Ok(n) => return Poll::Ready(Ok(n)),
                Err(rustix::io::Errno::AGAIN) => {
                    guard.clear_ready();
                }
                Err(rustix::io::Errno::INTR) => {}
                Err(e) => return Poll::Ready(Err(errno_to_io(e))),
            }
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
