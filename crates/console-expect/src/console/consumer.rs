//! The background consumer.
//!
//! One task per console reads the terminal, appends everything to the
//! shared buffer and copies it to the output mirrors. A second kind of task
//! copies attached input readers into the terminal.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use pty_pair::{PtyMaster, is_hangup};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::tty::HalfClose;
use crate::expect::StreamMonitor;
use crate::send::SendPath;

/// Boxed input source.
pub type InputSource = Box<dyn AsyncRead + Unpin + Send>;

/// Boxed output mirror.
pub type OutputMirror = Box<dyn AsyncWrite + Unpin + Send>;

/// What to do after handling one read.
enum Flow {
    Continue,
    Stop,
}

pub(crate) struct Consumer {
    pub(crate) master: Arc<PtyMaster>,
    pub(crate) monitor: Arc<StreamMonitor>,
    pub(crate) half_close: Arc<HalfClose>,
    pub(crate) mirrors: Vec<OutputMirror>,
    pub(crate) chunk_size: usize,
    pub(crate) drain_grace: Duration,
}

impl Consumer {
    pub(crate) async fn run(mut self) {
        let mut buf = vec![0u8; self.chunk_size];
        let mut drained = false;

        loop {
            let flow = if !drained && self.half_close.is_requested() {
                drained = true;
                self.drain(&mut buf).await
            } else if drained {
                let result = self.master.read(&mut buf).await;
                self.handle(result, &buf).await
            } else {
                tokio::select! {
                    result = self.master.read(&mut buf) => self.handle(result, &buf).await,
                    () = self.half_close.requested() => Flow::Continue,
                }
            };

            if matches!(flow, Flow::Stop) {
                break;
            }
        }

        self.half_close.consumer_exited();
        tracing::debug!("console consumer stopped");
    }

    /// Read until the terminal goes quiet for the grace period, then raise
    /// the terminal-closed condition.
    async fn drain(&mut self, buf: &mut [u8]) -> Flow {
        loop {
            match tokio::time::timeout(self.drain_grace, self.master.read(buf)).await {
                Err(_elapsed) => {
                    tracing::trace!("half-close drain complete");
                    self.monitor.mark_tty_closed();
                    return Flow::Continue;
                }
                Ok(result) => {
                    if matches!(self.handle(result, buf).await, Flow::Stop) {
                        return Flow::Stop;
                    }
                }
            }
        }
    }

    async fn handle(&mut self, result: io::Result<usize>, buf: &[u8]) -> Flow {
        match result {
            Ok(0) => {
                tracing::debug!("console reached end of stream");
                self.monitor.mark_eof();
                Flow::Stop
            }
            Ok(n) => {
                let chunk = &buf[..n];
                tracing::trace!(bytes = n, "console output");
                self.monitor.append(chunk);
                self.mirror(chunk).await;
                Flow::Continue
            }
            Err(e) if is_hangup(&e) => {
                tracing::debug!("tty hung up");
                self.monitor.mark_tty_closed();
                Flow::Stop
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock) => {
                Flow::Continue
            }
            Err(e) => {
                tracing::warn!(error = %e, "console read failed");
                self.monitor.fail(e);
                Flow::Stop
            }
        }
    }

    /// Copy a chunk to every mirror, dropping mirrors that fail.
    async fn mirror(&mut self, chunk: &[u8]) {
        let mut index = 0;
        while index < self.mirrors.len() {
            let result = match self.mirrors[index].write_all(chunk).await {
                Ok(()) => self.mirrors[index].flush().await,
                Err(e) => Err(e),
            };

            if let Err(e) = result {
                tracing::warn!(error = %e, "dropping output mirror after write failure");
                drop(self.mirrors.swap_remove(index));
            } else {
                index += 1;
            }
        }
    }
}

/// Copy an attached reader into the terminal until it ends or the console
/// closes.
pub(crate) async fn copy_input(mut source: InputSource, path: Arc<SendPath<PtyMaster>>) {
    let mut buf = vec![0u8; 4096];

    loop {
        let n = match source.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!(error = %e, "input source failed");
                break;
            }
        };

        let (_, result) = path.write_all(&buf[..n]).await;
        if let Err(e) = result {
            tracing::debug!(error = %e, "stopping input copy");
            break;
        }
    }

    tracing::trace!("input source finished");
}
