//! pty-pair: connected pseudo-terminal pairs for tokio
//!
//! This crate allocates a pseudo-terminal and hands back both ends: a
//! non-blocking [`PtyMaster`] driven by the tokio reactor, and a blocking
//! [`PtySlave`] that behaves like an ordinary terminal device. The slave can
//! be handed to a child process as its standard streams, read and written
//! directly from synchronous code, or reopened as an [`AsyncSlave`].
//!
//! # Quick Start
//!
//! ```no_run
//! use std::io::Write;
//! use pty_pair::{PtyConfig, open_pair};
//!
//! # async fn demo() -> pty_pair::Result<()> {
//! let (master, slave) = open_pair(&PtyConfig::default())?;
//!
//! (&slave).write_all(b"hello")?;
//!
//! let mut buf = [0u8; 64];
//! let n = master.read(&mut buf).await?;
//! assert_eq!(&buf[..n], b"hello");
//! # Ok(())
//! # }
//! ```
//!
//! # Platform Support
//!
//! Unix only (Linux, macOS, the BSDs).

pub mod config;
pub mod error;

#[cfg(unix)]
pub mod unix;

pub use config::{PtyConfig, PtyConfigBuilder, WindowSize};
pub use error::{PtyError, Result};

#[cfg(unix)]
pub use unix::{AsyncSlave, PtyMaster, PtySlave, ReadCancel, is_hangup, open_pair};

/// Allocate a PTY pair with the default configuration.
///
/// # Errors
///
/// Returns an error if PTY allocation fails.
#[cfg(unix)]
pub fn open() -> Result<(PtyMaster, PtySlave)> {
    open_pair(&PtyConfig::default())
}
