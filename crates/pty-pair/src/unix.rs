//! Unix implementation of PTY pair allocation.
//!
//! This module allocates a pseudo-terminal pair via
//! openpt/grantpt/unlockpt and hands out both sides:
//!
//! - [`PtyMaster`]: the controller side, non-blocking and driven by tokio's
//!   `AsyncFd`.
//! - [`PtySlave`]: the terminal side, a plain blocking descriptor suitable
//!   for a child's standard streams.
//!
//! # Platform Support
//!
//! - Linux (using /dev/ptmx)
//! - macOS (using /dev/ptmx)
//! - FreeBSD and other Unix-like systems

mod master;
mod slave;

use std::io;
use std::os::unix::io::{AsFd, OwnedFd};

use rustix::termios::{LocalModes, OptionalActions, Winsize, tcgetattr, tcsetattr, tcsetwinsize};

pub use master::PtyMaster;
pub use slave::{AsyncSlave, PtySlave, ReadCancel};

use crate::config::{PtyConfig, WindowSize};
use crate::error::{PtyError, Result, errno_to_io};

/// Allocate a new connected PTY pair.
///
/// The slave is opened immediately so that the master never observes a
/// hangup before the caller has had a chance to use the pair.
///
/// Must be called from within a tokio runtime: the master registers with
/// the runtime's reactor.
///
/// # Errors
///
/// Returns an error if allocation, slave opening, or terminal setup fails.
pub fn open_pair(config: &PtyConfig) -> Result<(PtyMaster, PtySlave)> {
    if !config.window_size.is_valid() {
        return Err(PtyError::InvalidWindowSize {
            cols: config.window_size.cols,
            rows: config.window_size.rows,
        });
    }

    let (master, slave_path) = PtyMaster::open()?;
    let slave = PtySlave::open(&slave_path)?;

    set_window_size(&slave, config.window_size)?;
    set_echo(&slave, config.echo)?;

    tracing::debug!(
        slave = %slave_path,
        cols = config.window_size.cols,
        rows = config.window_size.rows,
        echo = config.echo,
        "opened PTY pair"
    );

    Ok((master, slave))
}

/// Whether a read error from the master means the slave side is gone.
///
/// Linux reports `EIO` once every descriptor of the slave has been closed;
/// that condition is distinct from a clean end-of-stream.
#[must_use]
pub fn is_hangup(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EIO)
}

pub(crate) fn set_window_size(fd: impl AsFd, size: WindowSize) -> Result<()> {
    if !size.is_valid() {
        return Err(PtyError::InvalidWindowSize {
            cols: size.cols,
            rows: size.rows,
        });
    }

    let winsize = Winsize {
        ws_col: size.cols,
        ws_row: size.rows,
        ws_xpixel: size.xpixel,
        ws_ypixel: size.ypixel,
    };

    tcsetwinsize(fd, winsize).map_err(|e| PtyError::Resize(errno_to_io(e)))
}

pub(crate) fn get_window_size(fd: impl AsFd) -> Result<WindowSize> {
    let winsize = rustix::termios::tcgetwinsize(fd)
        .map_err(|e| PtyError::GetAttributes(errno_to_io(e)))?;

    Ok(WindowSize {
        cols: winsize.ws_col,
        rows: winsize.ws_row,
        xpixel: winsize.ws_xpixel,
        ypixel: winsize.ws_ypixel,
    })
}

fn set_echo(fd: &impl AsFd, echo: bool) -> Result<()> {
    let mut termios = tcgetattr(fd).map_err(|e| PtyError::GetAttributes(errno_to_io(e)))?;

    if echo {
        termios.local_modes.insert(LocalModes::ECHO);
    } else {
        termios.local_modes.remove(LocalModes::ECHO);
    }

    tcsetattr(fd, OptionalActions::Now, &termios)
        .map_err(|e| PtyError::SetAttributes(errno_to_io(e)))
}

pub(crate) fn owned_fd_from(errno: rustix::io::Result<OwnedFd>) -> Result<OwnedFd> {
    errno.map_err(|e| PtyError::Create(errno_to_io(e)))
}
