//! The write path into the terminal.
//!
//! All input, whether from [`Console::send`](crate::Console::send) or from
//! an attached reader, goes through one [`SendPath`] so that writes are
//! serialized and never interleave.

use std::future::Future;
use std::io;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use pty_pair::PtyMaster;
use tokio::sync::Mutex;

use crate::error::{ExpectError, Result};

/// Something terminal input can be written to.
pub trait InputSink: Send + Sync {
    /// Write some of `buf`, returning how many bytes were accepted.
    fn write_some(&self, buf: &[u8]) -> impl Future<Output = io::Result<usize>> + Send;
}

impl InputSink for PtyMaster {
    fn write_some(&self, buf: &[u8]) -> impl Future<Output = io::Result<usize>> + Send {
        self.write(buf)
    }
}

/// Serialized, closable writer with write-all semantics.
///
/// Closing drops the path's reference to the sink; a write already in
/// progress finishes on its own clone.
pub struct SendPath<S> {
    sink: StdMutex<Option<Arc<S>>>,
    gate: Mutex<()>,
}

impl<S: InputSink> SendPath<S> {
    /// Wrap a sink.
    pub fn new(sink: Arc<S>) -> Self {
        Self {
            sink: StdMutex::new(Some(sink)),
            gate: Mutex::new(()),
        }
    }

    fn current(&self) -> Option<Arc<S>> {
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Write all of `data`.
    ///
    /// Returns the number of bytes written alongside the outcome: on
    /// failure some prefix of `data` may already have been delivered.
    pub async fn write_all(&self, data: &[u8]) -> (usize, Result<()>) {
        let _guard = self.gate.lock().await;

        let Some(sink) = self.current() else {
            return (0, Err(ExpectError::SessionClosed));
        };

        let mut written = 0;
        while written < data.len() {
            match sink.write_some(&data[written..]).await {
                Ok(0) => {
                    return (
                        written,
                        Err(ExpectError::ShortWrite {
                            written,
                            expected: data.len(),
                        }),
                    );
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return (written, Err(ExpectError::Io(e))),
            }
        }

        (written, Ok(()))
    }

    /// Refuse all further writes and release the sink.
    pub fn close(&self) {
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Whether the path has been closed.
    pub fn is_closed(&self) -> bool {
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl<S> std::fmt::Debug for SendPath<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let open = self
            .sink
            .lock()
            .map(|sink| sink.is_some())
            .unwrap_or(false);
        f.debug_struct("SendPath").field("open", &open).finish()
    }
}
