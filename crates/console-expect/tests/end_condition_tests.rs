//! Integration tests for half-close, close and end-of-stream handling.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use console_expect::{Console, ConsoleState, EndReason, ExpectError, Matcher};

fn console() -> Arc<Console> {
    Arc::new(
        Console::builder()
            .default_timeout(Duration::from_secs(5))
            .build()
            .unwrap(),
    )
}

// =============================================================================
// Half-close
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn half_close_resolves_pending_expect_eof() {
    let console = console();
    let waiter = Arc::clone(&console);
    let pending = tokio::spawn(async move { waiter.expect_eof().await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    console.tty().close();

    let rest = pending.await.unwrap().unwrap();
    assert_eq!(rest, "");
    assert_eq!(console.state(), ConsoleState::HalfClosed);
}

#[tokio::test(flavor = "multi_thread")]
async fn output_written_before_half_close_is_kept() {
    let console = console();
    let mut tty = console.tty();
    tty.write_all(b"final words").unwrap();
    console.tty().close();

    let m = console.expect(["final words"]).await.unwrap();
    assert_eq!(m.matched, "final words");
    console.expect_eof().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn tty_closed_is_not_end_of_stream() {
    let console = console();
    console.tty().close();

    console.expect([Matcher::tty_closed()]).await.unwrap();

    let err = console.expect([Matcher::eof()]).await.unwrap_err();
    match err {
        ExpectError::UnexpectedEnd {
            reason, criteria, ..
        } => {
            assert_eq!(reason, EndReason::TtyClosed);
            assert_eq!(criteria, vec!["EOF".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn unmatched_text_after_half_close_is_unexpected_end() {
    let console = console();
    let mut tty = console.tty();
    tty.write_all(b"Goodbye").unwrap();
    console.tty().close();

    let err = console.expect_string("Hello").await.unwrap_err();
    assert!(err.is_unexpected_end());
    assert!(!err.is_timeout());
    assert_eq!(err.buffer(), Some("Goodbye"));
    assert!(err.to_string().starts_with("unexpected end of input"));
}

#[tokio::test(flavor = "multi_thread")]
async fn console_stays_open_after_half_close() {
    let console = console();
    console.tty().close();
    console.expect_eof().await.unwrap();

    assert!(console.state().is_open());
    assert!(console.as_raw_fd().is_some());
    console.resize(100, 40).unwrap();
}

// =============================================================================
// Close
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn close_wakes_a_blocked_expect() {
    // Releasing the terminal also hangs it up; the waiter must still see
    // the close, not the hangup.
    for _ in 0..20 {
        let console = Arc::new(Console::new().unwrap());
        let waiter = Arc::clone(&console);
        let pending = tokio::spawn(async move { waiter.expect(["never printed"]).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        console.close().unwrap();

        let err = tokio::time::timeout(Duration::from_secs(5), pending)
            .await
            .expect("close did not wake the waiter")
            .unwrap()
            .unwrap_err();
        match err {
            ExpectError::UnexpectedEnd { reason, .. } => {
                assert_eq!(reason, EndReason::SessionClosed);
            }
            other => panic!("expected a closed-session end, got {other:?}"),
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn close_satisfies_expect_eof() {
    let console = console();
    console.close().unwrap();
    console.expect_eof().await.unwrap();
    assert_eq!(console.state(), ConsoleState::Closed);
}

#[tokio::test(flavor = "multi_thread")]
async fn buffered_output_survives_close() {
    let console = console();
    let mut tty = console.tty();
    tty.write_all(b"kept").unwrap();
    console.expect_string("kept").await.unwrap();

    console.close().unwrap();
    assert_eq!(console.output(), "kept");
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn second_concurrent_expect_is_rejected() {
    let console = console();
    let waiter = Arc::clone(&console);
    let first = tokio::spawn(async move { waiter.expect(["go"]).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    let err = console.expect(["go"]).await.unwrap_err();
    assert!(matches!(err, ExpectError::ExpectInProgress));

    let mut tty = console.tty();
    tty.write_all(b"go").unwrap();
    first.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn send_runs_while_expect_waits() {
    let console = Arc::new(
        Console::builder()
            .default_timeout(Duration::from_secs(5))
            .echo(true)
            .build()
            .unwrap(),
    );
    let waiter = Arc::clone(&console);
    let pending = tokio::spawn(async move { waiter.expect_string("echoed").await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    console.send("echoed").await.unwrap();

    assert_eq!(pending.await.unwrap().unwrap(), "echoed");
}
