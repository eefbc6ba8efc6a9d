//! Accumulated console output.
//!
//! The buffer decodes terminal bytes as UTF-8 as they arrive and keeps a
//! read cursor. Waits look only at the text after the cursor; a successful
//! wait moves the cursor past what it matched.

use std::fmt;

/// Append-only output text with a read cursor.
#[derive(Default, Clone)]
pub struct OutputBuffer {
    /// Everything decoded so far.
    text: String,
    /// Trailing bytes of an incomplete UTF-8 sequence.
    pending: Vec<u8>,
    /// Byte offset in `text` where unread output starts.
    cursor: usize,
    /// Raw bytes received, including any still pending.
    bytes_received: usize,
}

impl OutputBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw terminal bytes.
    ///
    /// An incomplete multi-byte sequence at the end is held back until the
    /// rest arrives. Invalid bytes decode to U+FFFD.
    pub fn append(&mut self, data: &[u8]) {
        self.bytes_received += data.len();

        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(data);

        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    self.text.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    // valid_up_to guarantees this prefix decodes.
                    self.text.push_str(&String::from_utf8_lossy(valid));
                    if let Some(len) = e.error_len() {
                        self.text.push(char::REPLACEMENT_CHARACTER);
                        rest = &after[len..];
                    } else {
                        self.pending = after.to_vec();
                        break;
                    }
                }
            }
        }
    }

    /// Decode any held-back bytes; called once no more input can arrive.
    pub fn finish(&mut self) {
        if !self.pending.is_empty() {
            self.pending.clear();
            self.text.push(char::REPLACEMENT_CHARACTER);
        }
    }

    /// Output after the read cursor.
    #[must_use]
    pub fn unread(&self) -> &str {
        &self.text[self.cursor..]
    }

    /// Everything received, including already matched output.
    #[must_use]
    pub fn all(&self) -> &str {
        &self.text
    }

    /// Advance the cursor by `len` bytes of unread text.
    ///
    /// `len` is clamped to the unread length and must fall on a character
    /// boundary, as spans produced by matchers always do.
    pub fn consume(&mut self, len: usize) {
        let len = len.min(self.text.len() - self.cursor);
        debug_assert!(self.text.is_char_boundary(self.cursor + len));
        self.cursor += len;
    }

    /// Raw bytes received so far.
    #[must_use]
    pub const fn bytes_received(&self) -> usize {
        self.bytes_received
    }

    /// Length of unread text in bytes.
    #[must_use]
    pub fn unread_len(&self) -> usize {
        self.text.len() - self.cursor
    }

    /// Whether there is no unread text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unread_len() == 0
    }
}

impl fmt::Debug for OutputBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputBuffer")
            .field("len", &self.text.len())
            .field("cursor", &self.cursor)
            .field("pending", &self.pending.len())
            .field("bytes_received", &self.bytes_received)
            .finish()
    }
}
