//! Error types for the pty-pair crate.
//!
//! [`PtyError`] covers every failure mode of allocating and driving a
//! pseudo-terminal pair.

use std::io;

/// The error type for PTY operations.
#[derive(Debug, thiserror::Error)]
pub enum PtyError {
    /// Failed to allocate the master side.
    #[error("failed to create PTY: {0}")]
    Create(#[source] io::Error),

    /// Failed to open the slave side.
    #[error("failed to open PTY slave {path}: {source}")]
    OpenSlave {
        /// Path of the slave device.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// An I/O error occurred during PTY operations.
    #[error("PTY I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failed to set terminal attributes.
    #[error("failed to set terminal attributes: {0}")]
    SetAttributes(#[source] io::Error),

    /// Failed to get terminal attributes.
    #[error("failed to get terminal attributes: {0}")]
    GetAttributes(#[source] io::Error),

    /// Failed to resize the PTY.
    #[error("failed to resize PTY: {0}")]
    Resize(#[source] io::Error),

    /// Invalid window size specified.
    #[error("invalid window size: {cols}x{rows}")]
    InvalidWindowSize {
        /// The requested column count.
        cols: u16,
        /// The requested row count.
        rows: u16,
    },
}

/// A specialized Result type for PTY operations.
pub type Result<T> = std::result::Result<T, PtyError>;

#[cfg(unix)]
impl From<rustix::io::Errno> for PtyError {
    fn from(errno: rustix::io::Errno) -> Self {
        Self::Io(io::Error::from_raw_os_error(errno.raw_os_error()))
    }
}

/// Convert a rustix errno into a plain I/O error.
#[cfg(unix)]
pub(crate) fn errno_to_io(errno: rustix::io::Errno) -> io::Error {
    io::Error::from_raw_os_error(errno.raw_os_error())
}
