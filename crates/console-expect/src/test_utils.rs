//! Test utilities for console-expect.
//!
//! Fail-fast hooks, a preconfigured builder and a tracing initializer for
//! tests that drive consoles.

use std::time::Duration;

use crate::console::{ConsoleBuilder, ExpectOutcome, SendRecord};
use crate::expect::render_criteria;

/// Default expect deadline used by [`test_console`].
pub const TEST_TIMEOUT: Duration = Duration::from_secs(1);

/// Expect observer that panics on any failed expect.
///
/// The panic message shows the criteria and the error, which carries the
/// unread output.
pub fn panic_on_expect_error() -> impl Fn(&ExpectOutcome<'_>) + Send + Sync + 'static {
    |outcome: &ExpectOutcome<'_>| {
        if let Some(error) = outcome.error {
            panic!(
                "expect {} failed: {error}",
                render_criteria(outcome.matchers)
            );
        }
    }
}

/// Send observer that panics on any failed send.
pub fn panic_on_send_error() -> impl Fn(&SendRecord<'_>) + Send + Sync + 'static {
    |record: &SendRecord<'_>| {
        if let Some(error) = record.error {
            panic!(
                "send of {:?} failed after {} bytes: {error}",
                String::from_utf8_lossy(record.data),
                record.written
            );
        }
    }
}

/// A builder with fail-fast hooks and a one second default timeout.
#[must_use]
pub fn test_console() -> ConsoleBuilder {
    ConsoleBuilder::new()
        .default_timeout(TEST_TIMEOUT)
        .on_expect(panic_on_expect_error())
        .on_send(panic_on_send_error())
}

/// Install a test subscriber honouring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Assertion helpers for console output.
pub trait OutputAssertions {
    /// The output to check.
    fn output_str(&self) -> &str;

    /// Assert that the output contains `needle`.
    fn assert_contains(&self, needle: &str) {
        let output = self.output_str();
        assert!(
            output.contains(needle),
            "Expected output to contain {needle:?}, but got:\n{output}"
        );
    }

    /// Assert that the output does not contain `needle`.
    fn assert_not_contains(&self, needle: &str) {
        let output = self.output_str();
        assert!(
            !output.contains(needle),
            "Expected output NOT to contain {needle:?}, but found it in:\n{output}"
        );
    }

    /// Assert that the output ends with `suffix`.
    fn assert_ends_with(&self, suffix: &str) {
        let output = self.output_str();
        assert!(
            output.ends_with(suffix),
            "Expected output to end with {suffix:?}, but got:\n{output}"
        );
    }
}

impl OutputAssertions for String {
    fn output_str(&self) -> &str {
        self
    }
}

impl OutputAssertions for &str {
    fn output_str(&self) -> &str {
        self
    }
}
