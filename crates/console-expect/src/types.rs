//! Common types for console-expect.
//!
//! Match results, console lifecycle state, end conditions and the control
//! characters that can be sent to a terminal program.

use std::fmt;

/// A successful expect result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Index of the matcher that was satisfied, in argument order.
    pub index: usize,

    /// The text that matched. Empty for end-condition matchers.
    pub matched: String,

    /// Unread buffer contents at the moment the wait resolved.
    pub buffer: String,
}

impl Match {
    /// Create a new match result.
    #[must_use]
    pub fn new(index: usize, matched: impl Into<String>, buffer: impl Into<String>) -> Self {
        Self {
            index,
            matched: matched.into(),
            buffer: buffer.into(),
        }
    }

    /// Get the matched text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.matched
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.matched)
    }
}

/// The end condition a wait observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The terminal reported end-of-stream.
    Eof,
    /// The terminal side of the pair was closed.
    TtyClosed,
    /// The console itself was closed.
    SessionClosed,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Eof => "end of stream",
            Self::TtyClosed => "terminal closed",
            Self::SessionClosed => "session closed",
        };
        write!(f, "{s}")
    }
}

/// Lifecycle state of a console.
///
/// `Open → HalfClosed → Closed`, or `Open → Closed` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleState {
    /// Both sides of the terminal are open.
    Open,
    /// The terminal side has been closed; buffered output is still readable.
    HalfClosed,
    /// The console is closed.
    Closed,
}

impl ConsoleState {
    /// Whether sends are still accepted.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open | Self::HalfClosed)
    }
}

impl fmt::Display for ConsoleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::HalfClosed => "half-closed",
            Self::Closed => "closed",
        };
        write!(f, "{s}")
    }
}

/// Control characters that can be sent to a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlChar {
    /// Ctrl+A (SOH)
    CtrlA,
    /// Ctrl+C (ETX) - Interrupt
    CtrlC,
    /// Ctrl+D (EOT) - End of input in canonical mode
    CtrlD,
    /// Ctrl+E (ENQ)
    CtrlE,
    /// Ctrl+H (BS) - Backspace
    CtrlH,
    /// Ctrl+L (FF) - Clear screen
    CtrlL,
    /// Ctrl+R (DC2) - Reverse search in most shells
    CtrlR,
    /// Ctrl+U (NAK) - Kill line
    CtrlU,
    /// Ctrl+W (ETB) - Kill word
    CtrlW,
    /// Ctrl+Z (SUB) - Suspend
    CtrlZ,
    /// Escape
    Escape,
    /// Ctrl+\ (FS) - Quit
    CtrlBackslash,
}

impl ControlChar {
    /// Get the byte value of this control character.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::CtrlA => 0x01,
            Self::CtrlC => 0x03,
            Self::CtrlD => 0x04,
            Self::CtrlE => 0x05,
            Self::CtrlH => 0x08,
            Self::CtrlL => 0x0C,
            Self::CtrlR => 0x12,
            Self::CtrlU => 0x15,
            Self::CtrlW => 0x17,
            Self::CtrlZ => 0x1A,
            Self::Escape => 0x1B,
            Self::CtrlBackslash => 0x1C,
        }
    }

    /// Create a control character from a letter, e.g. `'c'` for Ctrl+C.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'a' => Some(Self::CtrlA),
            'c' => Some(Self::CtrlC),
            'd' => Some(Self::CtrlD),
            'e' => Some(Self::CtrlE),
            'h' => Some(Self::CtrlH),
            'l' => Some(Self::CtrlL),
            'r' => Some(Self::CtrlR),
            'u' => Some(Self::CtrlU),
            'w' => Some(Self::CtrlW),
            'z' => Some(Self::CtrlZ),
            '[' => Some(Self::Escape),
            '\\' => Some(Self::CtrlBackslash),
            _ => None,
        }
    }
}

impl From<ControlChar> for u8 {
    fn from(c: ControlChar) -> Self {
        c.as_byte()
    }
}
