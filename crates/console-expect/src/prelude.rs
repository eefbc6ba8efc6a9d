//! Convenient re-exports for common console-expect usage.
//!
//! ```ignore
//! use console_expect::prelude::*;
//! ```

// Console types
pub use crate::console::{Console, ConsoleBuilder, ExpectOutcome, SendRecord, Tty};

// Configuration
pub use crate::config::{ConsoleConfig, LineEnding};

// Error handling
pub use crate::error::{ExpectError, Result};

// Matching
pub use crate::expect::{ExpectOptions, Matcher, TextPattern};

// Common types
pub use crate::types::{ConsoleState, ControlChar, EndReason, Match};

// Sync wrapper
pub use crate::sync::SyncConsole;
