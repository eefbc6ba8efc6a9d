//! The controller side of a PTY pair.

use std::io;
use std::os::unix::io::{AsRawFd, OwnedFd, RawFd};

use rustix::fs::{OFlags, fcntl_setfl};
use rustix::pty::{OpenptFlags, grantpt, openpt, ptsname, unlockpt};
use tokio::io::unix::AsyncFd;

use super::{get_window_size, owned_fd_from, set_window_size};
use crate::config::WindowSize;
use crate::error::{PtyError, Result, errno_to_io};

/// Master side of a pseudo-terminal.
///
/// All operations take `&self`, so a single master can be shared between a
/// task that reads terminal output and a task that writes input. The
/// descriptor is non-blocking and registered with the tokio reactor.
pub struct PtyMaster {
    async_fd: AsyncFd<OwnedFd>,
}

impl std::fmt::Debug for PtyMaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyMaster")
            .field("fd", &self.async_fd.as_raw_fd())
            .finish()
    }
}

impl PtyMaster {
    /// Allocate a new master and return it with its slave path.
    pub(crate) fn open() -> Result<(Self, String)> {
        let master_fd = owned_fd_from(openpt(OpenptFlags::RDWR | OpenptFlags::NOCTTY))?;

        grantpt(&master_fd).map_err(|e| PtyError::Create(errno_to_io(e)))?;
        unlockpt(&master_fd).map_err(|e| PtyError::Create(errno_to_io(e)))?;

        let slave_name =
            ptsname(&master_fd, Vec::new()).map_err(|e| PtyError::Create(errno_to_io(e)))?;
        let slave_path = slave_name
            .to_str()
            .map_err(|_| {
                PtyError::Create(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "invalid slave path encoding",
                ))
            })?
            .to_string();

        fcntl_setfl(&master_fd, OFlags::NONBLOCK).map_err(|e| PtyError::Create(errno_to_io(e)))?;
        rustix::io::fcntl_setfd(&master_fd, rustix::io::FdFlags::CLOEXEC)
            .map_err(|e| PtyError::Create(errno_to_io(e)))?;

        let async_fd = AsyncFd::new(master_fd).map_err(PtyError::Create)?;

        Ok((Self { async_fd }, slave_path))
    }

    /// Read terminal output into `buf`.
    ///
    /// Returns `Ok(0)` on end-of-stream. Once the slave side has been fully
    /// closed, Linux reports `EIO` instead; see [`crate::is_hangup`].
    ///
    /// # Errors
    ///
    /// Returns the underlying read error.
    pub async fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let mut guard = self.async_fd.readable().await?;

            match rustix::io::read(self.async_fd.get_ref(), &mut *buf) {
                Ok(n) => return Ok(n),
                Err(rustix::io::Errno::AGAIN) => {
                    guard.clear_ready();
                }
                Err(rustix::io::Errno::INTR) => {}
                Err(e) => return Err(errno_to_io(e)),
            }
        }
    }

    /// Read whatever output is available without waiting.
    ///
    /// # Errors
    ///
    /// Returns `WouldBlock` when nothing is buffered, or the underlying read
    /// error.
    pub fn try_read(&self, buf: &mut [u8]) -> io::Result<usize> {
        rustix::io::read(self.async_fd.get_ref(), buf).map_err(errno_to_io)
    }

    /// Write input bytes, returning how many were accepted.
    ///
    /// # Errors
    ///
    /// Returns the underlying write error.
    pub async fn write(&self, buf: &[u8]) -> io::Result<usize> {
        loop {
            let mut guard = self.async_fd.writable().await?;

            match rustix::io::write(self.async_fd.get_ref(), buf) {
                Ok(n) => return Ok(n),
                Err(rustix::io::Errno::AGAIN) => {
                    guard.clear_ready();
                }
                Err(rustix::io::Errno::INTR) => {}
                Err(e) => return Err(errno_to_io(e)),
            }
        }
    }

    /// Change the terminal window size.
    ///
    /// # Errors
    ///
    /// Returns an error if the size is invalid or the ioctl fails.
    pub fn resize(&self, size: WindowSize) -> Result<()> {
        set_window_size(self.async_fd.get_ref(), size)
    }

    /// Current terminal window size.
    ///
    /// # Errors
    ///
    /// Returns an error if the ioctl fails.
    pub fn window_size(&self) -> Result<WindowSize> {
        get_window_size(self.async_fd.get_ref())
    }
}

impl AsRawFd for PtyMaster {
    fn as_raw_fd(&self) -> RawFd {
        self.async_fd.as_raw_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_returns_slave_path() {
        let (master, slave_path) = PtyMaster::open().unwrap();
        assert!(master.as_raw_fd() >= 0);
        assert!(slave_path.starts_with("/dev/pts/") || slave_path.starts_with("/dev/tty"));
    }

    #[tokio::test]
    async fn try_read_without_output_would_block() {
        let (master, slave) = crate::open().unwrap();
        let mut buf = [0u8; 16];
        let err = master.try_read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
        drop(slave);
    }

    #[tokio::test]
    async fn debug_shows_fd() {
        let (master, _) = PtyMaster::open().unwrap();
        let shown = format!("{master:?}");
        assert!(shown.starts_with("PtyMaster"));
        assert!(shown.contains(&master.as_raw_fd().to_string()));
    }
}
