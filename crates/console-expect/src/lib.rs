//! console-expect: drive interactive terminal programs with expect-style waits
//!
//! This crate opens a pseudo-terminal, feeds input to whatever is attached
//! to it and waits until the output satisfies a pattern, the stream ends, or
//! a deadline passes. It is meant for testing shells, REPLs, line editors
//! and other programs whose output arrives incrementally.
//!
//! # Features
//!
//! - **Background consumer** draining the terminal into a shared buffer
//! - **Matchers** for literal text, regular expressions (or any
//!   [`TextPattern`]), end-of-stream and terminal-closed
//! - **Half-close** of the terminal side to signal end of input
//! - **Chaining** two consoles into a scripted conversation
//! - **Hooks** observing every send and expect, for fail-fast tests
//! - **Blocking wrapper** via [`SyncConsole`]
//!
//! # Example
//!
//! ```ignore
//! use console_expect::prelude::*;
//! use std::process::Command;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let console = Console::builder()
//!         .default_timeout(std::time::Duration::from_secs(5))
//!         .build()?;
//!
//!     let mut child = Command::new("cat")
//!         .stdin(console.tty().stdio()?)
//!         .stdout(console.tty().stdio()?)
//!         .spawn()?;
//!
//!     console.send_line("hello").await?;
//!     console.expect_string("hello").await?;
//!     console.send_control(ControlChar::CtrlD).await?;
//!     child.wait()?;
//!     console.tty().close();
//!     console.expect_eof().await?;
//!     Ok(())
//! }
//! ```

#[cfg(not(unix))]
compile_error!("console-expect requires a Unix pseudo-terminal");

pub mod config;
pub mod console;
pub mod error;
pub mod expect;
pub mod prelude;
pub mod send;
pub mod sync;
pub mod types;

pub use config::{ConsoleConfig, EnvConfig, LineEnding};
pub use console::{
    Console, ConsoleBuilder, ExpectObserver, ExpectOutcome, Hooks, InputSource, OutputMirror,
    SendObserver, SendRecord, Tty,
};
pub use error::{ExpectError, Result};
pub use expect::{ExpectOptions, Matcher, TextPattern, render_criteria};
pub use send::{InputSink, SendPath};
pub use sync::SyncConsole;
pub use types::{ConsoleState, ControlChar, EndReason, Match};

// Test utilities
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
