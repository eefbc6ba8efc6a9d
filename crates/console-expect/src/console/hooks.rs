//! Observers notified after every expect and every send.
//!
//! Observers run on the caller's task after the console has released its
//! locks, so they may call back into the console.

use std::sync::Arc;

use crate::error::{ExpectError, Result};
use crate::expect::Matcher;
use crate::types::Match;

/// What an expect call resolved to.
#[derive(Debug, Clone, Copy)]
pub struct ExpectOutcome<'a> {
    /// The matchers that were waited on.
    pub matchers: &'a [Matcher],
    /// The matched text; empty on failure or for end-condition matches.
    pub matched: &'a str,
    /// Unread buffer contents when the wait resolved.
    pub buffer: &'a str,
    /// The failure, if the wait failed.
    pub error: Option<&'a ExpectError>,
}

impl<'a> ExpectOutcome<'a> {
    pub(crate) fn new(matchers: &'a [Matcher], result: &'a Result<Match>) -> Self {
        match result {
            Ok(m) => Self {
                matchers,
                matched: &m.matched,
                buffer: &m.buffer,
                error: None,
            },
            Err(e) => Self {
                matchers,
                matched: "",
                buffer: e.buffer().unwrap_or_default(),
                error: Some(e),
            },
        }
    }
}

/// What a send call wrote.
#[derive(Debug, Clone, Copy)]
pub struct SendRecord<'a> {
    /// The bytes that were requested.
    pub data: &'a [u8],
    /// How many of them were written.
    pub written: usize,
    /// The failure, if the write failed.
    pub error: Option<&'a ExpectError>,
}

/// Hook type for expect results.
pub type ExpectObserver = Arc<dyn Fn(&ExpectOutcome<'_>) + Send + Sync>;

/// Hook type for send results.
pub type SendObserver = Arc<dyn Fn(&SendRecord<'_>) + Send + Sync>;

/// Registered observers.
#[derive(Default, Clone)]
pub struct Hooks {
    expect: Vec<ExpectObserver>,
    send: Vec<SendObserver>,
}

impl Hooks {
    /// Create an empty set of hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an expect observer.
    pub fn add_expect_observer<F>(&mut self, hook: F)
    where
        F: Fn(&ExpectOutcome<'_>) + Send + Sync + 'static,
    {
        self.expect.push(Arc::new(hook));
    }

    /// Add a send observer.
    pub fn add_send_observer<F>(&mut self, hook: F)
    where
        F: Fn(&SendRecord<'_>) + Send + Sync + 'static,
    {
        self.send.push(Arc::new(hook));
    }

    /// Notify every expect observer, in registration order.
    pub fn notify_expect(&self, outcome: &ExpectOutcome<'_>) {
        for hook in &self.expect {
            hook(outcome);
        }
    }

    /// Notify every send observer, in registration order.
    pub fn notify_send(&self, record: &SendRecord<'_>) {
        for hook in &self.send {
            hook(record);
        }
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("expect", &self.expect.len())
            .field("send", &self.send.len())
            .finish()
    }
}
