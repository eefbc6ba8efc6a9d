//! The console: a pseudo-terminal pair with a background reader.
//!
//! # Overview
//!
//! A [`Console`] owns the controlling side of a terminal pair and exposes
//! the other side as a [`Tty`]. Whatever is attached to the tty (a child
//! process, a thread, or another console) is driven with:
//!
//! - [`Console::send`], [`Console::send_line`] to write its input
//! - [`Console::expect`] and its shorthands to wait for its output
//! - [`Tty::close`] to signal end of input while keeping the console
//!   usable for final checks
//! - [`Console::close`] to release everything
//!
//! # Chaining
//!
//! One console's tty can serve as another console's input and output, so
//! the two converse:
//!
//! ```ignore
//! use console_expect::Console;
//!
//! let asker = Console::new()?;
//! let answerer = Console::builder()
//!     .stdin(asker.tty().stream()?)
//!     .stdout(asker.tty().stream()?)
//!     .build()?;
//!
//! asker.send_line("What is 1+1?").await?;
//! answerer.expect_string("What is 1+1?").await?;
//! answerer.send_line("2").await?;
//! asker.expect_string("2").await?;
//! ```

mod builder;
mod consumer;
mod handle;
mod hooks;
mod tty;

pub use builder::ConsoleBuilder;
pub use consumer::{InputSource, OutputMirror};
pub use handle::Console;
pub use hooks::{ExpectObserver, ExpectOutcome, Hooks, SendObserver, SendRecord};
pub use tty::Tty;
