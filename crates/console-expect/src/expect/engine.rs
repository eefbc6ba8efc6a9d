//! The wait engine.
//!
//! [`StreamMonitor`] is the only point of contact between the background
//! consumer and waiters. The consumer appends output and raises end
//! conditions; waiters re-evaluate their matchers after every change and
//! race that against a deadline.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

use super::buffer::OutputBuffer;
use super::matcher::{MatchState, Matcher, criteria_of, first_match};
use crate::error::{ExpectError, Result};
use crate::types::{EndReason, Match};

/// Everything the consumer has observed.
#[derive(Debug, Default)]
pub struct StreamState {
    /// Decoded output.
    pub buffer: OutputBuffer,
    /// End-of-stream was read.
    pub eof: bool,
    /// The terminal side was closed.
    pub tty_closed: bool,
    /// The console was closed.
    pub closed: bool,
    /// A read failure, surfaced by every wait from now on.
    pub read_error: Option<Arc<io::Error>>,
}

impl StreamState {
    fn match_state(&self) -> MatchState<'_> {
        MatchState {
            text: self.buffer.unread(),
            eof: self.eof,
            tty_closed: self.tty_closed,
        }
    }

    fn end_reason(&self) -> Option<EndReason> {
        if self.closed {
            Some(EndReason::SessionClosed)
        } else if self.eof {
            Some(EndReason::Eof)
        } else if self.tty_closed {
            Some(EndReason::TtyClosed)
        } else {
            None
        }
    }

    /// Resolve a wait against the current state, if it can be resolved
    /// without more input.
    ///
    /// Matchers are evaluated first, so output that arrived before an end
    /// condition or failure still satisfies them.
    pub fn resolve(&mut self, matchers: &[Matcher]) -> Option<Result<Match>> {
        if let Some((index, span)) = first_match(matchers, &self.match_state()) {
            let snapshot = self.buffer.unread().to_string();
            let matched = snapshot[span.clone()].to_string();
            self.buffer.consume(span.end);
            return Some(Ok(Match::new(index, matched, snapshot)));
        }

        if let Some(source) = &self.read_error {
            return Some(Err(ExpectError::read_failure(
                Arc::clone(source),
                self.buffer.unread(),
            )));
        }

        self.end_reason().map(|reason| {
            Err(ExpectError::unexpected_end(
                reason,
                criteria_of(matchers),
                self.buffer.unread(),
            ))
        })
    }
}

/// Shared output state plus the signal that it changed.
#[derive(Debug, Default)]
pub struct StreamMonitor {
    state: Mutex<StreamState>,
    changed: Notify,
}

impl StreamMonitor {
    /// Create an empty monitor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the state. A poisoned lock is recovered: the state is plain
    /// data and stays consistent between statements.
    pub fn lock(&self) -> MutexGuard<'_, StreamState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, f: impl FnOnce(&mut StreamState)) {
        f(&mut self.lock());
        self.changed.notify_waiters();
    }

    /// Append output and wake waiters.
    pub fn append(&self, data: &[u8]) {
        self.update(|state| state.buffer.append(data));
    }

    /// Record end-of-stream.
    pub fn mark_eof(&self) {
        self.update(|state| {
            state.buffer.finish();
            state.eof = true;
        });
    }

    /// Record that the terminal side was closed.
    pub fn mark_tty_closed(&self) {
        self.update(|state| {
            state.buffer.finish();
            state.tty_closed = true;
        });
    }

    /// Store a read failure.
    pub fn fail(&self, err: io::Error) {
        self.update(|state| {
            state.buffer.finish();
            state.read_error = Some(Arc::new(err));
        });
    }

    /// Record that the console was closed. Raises both end conditions so
    /// that every wait resolves.
    pub fn close(&self) {
        self.update(|state| {
            state.buffer.finish();
            state.closed = true;
            state.eof = true;
            state.tty_closed = true;
        });
    }

    /// Wait until a matcher is satisfied, an end condition or failure
    /// resolves the wait, or `timeout` elapses.
    ///
    /// `None` waits without a deadline. A zero timeout evaluates the
    /// already buffered output once and never waits.
    pub async fn wait_for(&self, matchers: &[Matcher], timeout: Option<Duration>) -> Result<Match> {
        if matchers.is_empty() {
            return Err(ExpectError::NoMatchers);
        }

        let deadline = timeout.map(|t| Instant::now() + t);

        loop {
            // Register interest before evaluating so that an append between
            // the evaluation and the await is not missed.
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if let Some(outcome) = state.resolve(matchers) {
                    return outcome;
                }

                if let (Some(deadline), Some(timeout)) = (deadline, timeout) {
                    if Instant::now() >= deadline {
                        return Err(ExpectError::timeout(
                            timeout,
                            criteria_of(matchers),
                            state.buffer.unread(),
                        ));
                    }
                }
            }

            match deadline {
                Some(deadline) => {
                    tokio::select! {
                        () = &mut notified => {}
                        () = tokio::time::sleep_until(deadline) => {}
                    }
                }
                None => notified.await,
            }
        }
    }

    /// Unread output.
    pub fn pending(&self) -> String {
        self.lock().buffer.unread().to_string()
    }

    /// All output received.
    pub fn output(&self) -> String {
        self.lock().buffer.all().to_string()
    }
}
