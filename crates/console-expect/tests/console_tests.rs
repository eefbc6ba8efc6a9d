//! Integration tests for driving a program attached to the console tty.

use std::io::{self, BufRead, BufReader, Write};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::io::AsyncReadExt;

use console_expect::test_utils::{OutputAssertions, init_tracing, test_console};
use console_expect::{Console, ConsoleState, Matcher, Tty};

// =============================================================================
// A scripted prompt playing the program under test
// =============================================================================

#[derive(Debug)]
enum QuizError {
    WrongAnswer { question: String, answer: String },
    Io(io::Error),
}

impl From<io::Error> for QuizError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

const QUESTIONS: [(&str, &str); 2] = [
    ("What is 1+1?", "2"),
    ("What is Netflix backwards?", "xilfteN"),
];

/// Ask every question on the tty and check the answers.
fn run_quiz(tty: &Tty) -> Result<(), QuizError> {
    let mut reader = BufReader::new(tty);
    let mut writer = tty;

    for (question, expected) in QUESTIONS {
        write!(writer, "{question} ")?;

        let mut line = String::new();
        reader.read_line(&mut line)?;
        let answer = line.trim_end();
        if answer != expected {
            return Err(QuizError::WrongAnswer {
                question: question.to_string(),
                answer: answer.to_string(),
            });
        }
    }

    Ok(())
}

fn spawn_quiz(console: &Arc<Console>) -> thread::JoinHandle<Result<(), QuizError>> {
    let console = Arc::clone(console);
    thread::spawn(move || run_quiz(console.tty()))
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn quiz_answered_correctly() {
    init_tracing();
    let console = Arc::new(test_console().build().unwrap());
    let quiz = spawn_quiz(&console);

    console.expect_string("What is 1+1?").await.unwrap();
    console.send_line("2").await.unwrap();
    console
        .expect_string("What is Netflix backwards?")
        .await
        .unwrap();
    console.send_line("xilfteN").await.unwrap();

    let outcome = tokio::task::block_in_place(|| quiz.join()).unwrap();
    assert!(outcome.is_ok(), "quiz failed: {outcome:?}");

    console.tty().close();
    console.expect_eof().await.unwrap();
    assert_eq!(console.state(), ConsoleState::HalfClosed);
    console.close().unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn wrong_answer_is_the_programs_error() {
    let console = Arc::new(test_console().build().unwrap());
    let quiz = spawn_quiz(&console);

    console.expect_string("What is 1+1?").await.unwrap();
    console.send_line("3").await.unwrap();

    let outcome = tokio::task::block_in_place(|| quiz.join()).unwrap();
    match outcome {
        Err(QuizError::WrongAnswer { question, answer }) => {
            assert_eq!(question, "What is 1+1?");
            assert_eq!(answer, "3");
        }
        other => panic!("expected a wrong answer, got {other:?}"),
    }

    // The console itself saw nothing wrong.
    console.tty().close();
    console.expect_eof().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn expectf_formats_before_matching() {
    let console = Arc::new(test_console().build().unwrap());
    let quiz = spawn_quiz(&console);

    let matched = console
        .expect_fmt(format_args!("What is {}+{}?", 1, 1))
        .await
        .unwrap();
    assert_eq!(matched, "What is 1+1?");

    console.send_line("2").await.unwrap();
    console.expect_string("backwards?").await.unwrap();
    console.send_line("xilfteN").await.unwrap();
    assert!(tokio::task::block_in_place(|| quiz.join()).unwrap().is_ok());
}

#[tokio::test(flavor = "multi_thread")]
async fn closing_the_tty_unblocks_a_waiting_prompt() {
    let console = Arc::new(
        Console::builder()
            .default_timeout(Duration::ZERO)
            .build()
            .unwrap(),
    );
    let quiz = spawn_quiz(&console);

    console
        .expect_timeout(["What is 1+1?"], Duration::from_secs(1))
        .await
        .unwrap();
    let err = console.expect_string("What is 1+2?").await.unwrap_err();
    assert!(err.is_timeout());

    // The quiz is blocked reading an answer that never comes.
    console.tty().close();
    let outcome = tokio::time::timeout(
        Duration::from_secs(2),
        tokio::task::spawn_blocking(move || quiz.join()),
    )
    .await
    .expect("quiz still blocked after the tty closed")
    .unwrap()
    .unwrap();

    match outcome {
        Err(QuizError::WrongAnswer { answer, .. }) => assert_eq!(answer, ""),
        other => panic!("expected an empty answer, got {other:?}"),
    }
}

// =============================================================================
// Matching
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn first_listed_matcher_wins() {
    let console = test_console().build().unwrap();
    let mut tty = console.tty();
    tty.write_all(b"login: password: ").unwrap();
    // Let both prompts arrive before waiting.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let m = console.expect(["password:", "login:"]).await.unwrap();
    assert_eq!(m.index, 0);
    assert_eq!(m.matched, "password:");
}

#[tokio::test(flavor = "multi_thread")]
async fn successive_expects_advance_through_output() {
    let console = test_console().build().unwrap();
    let mut tty = console.tty();
    tty.write_all(b"step 1 done, step 2 done").unwrap();

    console.expect_string("done").await.unwrap();
    let second = console.expect(["done"]).await.unwrap();
    assert_eq!(second.buffer, ", step 2 done");
    assert_eq!(console.pending(), "");
    console.output().assert_contains("step 1 done");
}

#[tokio::test(flavor = "multi_thread")]
async fn regex_matcher_returns_matched_text() {
    let console = test_console().build().unwrap();
    let mut tty = console.tty();
    tty.write_all(b"build 4521 finished in 12s").unwrap();

    let m = console
        .expect([Matcher::regex(r"in (\d+)s").unwrap()])
        .await
        .unwrap();
    assert_eq!(m.matched, "in 12s");
}

#[tokio::test(flavor = "multi_thread")]
async fn all_matcher_needs_every_part() {
    let console = Console::builder()
        .default_timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let mut tty = console.tty();
    tty.write_all(b"user=admin ").unwrap();

    let err = console
        .expect_timeout(
            [Matcher::all(["user=admin", "role=root"])],
            Duration::from_millis(50),
        )
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    tty.write_all(b"role=root").unwrap();
    let m = console
        .expect([Matcher::all(["user=admin", "role=root"])])
        .await
        .unwrap();
    assert_eq!(m.matched, "user=admin role=root");
}

// =============================================================================
// Mirrors and input attachments
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn output_is_mirrored() {
    let (mirror, mut mirrored) = tokio::io::duplex(1024);
    let console = test_console().stdout(mirror).build().unwrap();

    let mut tty = console.tty();
    tty.write_all(b"copied everywhere").unwrap();
    console.expect_string("everywhere").await.unwrap();

    let mut buf = vec![0u8; "copied everywhere".len()];
    mirrored.read_exact(&mut buf).await.unwrap();
    assert_eq!(buf, b"copied everywhere");
}

#[tokio::test(flavor = "multi_thread")]
async fn attached_input_reaches_the_program() {
    let console = Arc::new(
        test_console()
            .stdin(&b"from a reader\n"[..])
            .echo(false)
            .build()
            .unwrap(),
    );

    let reader_side = Arc::clone(&console);
    let line = tokio::task::spawn_blocking(move || {
        let mut line = String::new();
        BufReader::new(reader_side.tty()).read_line(&mut line).map(|_| line)
    })
    .await
    .unwrap()
    .unwrap();
    assert_eq!(line, "from a reader\n");
}

// =============================================================================
// Chaining
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn chained_consoles_hold_a_conversation() {
    let asker = test_console().build().unwrap();
    let answerer = test_console()
        .stdin(asker.tty().stream().unwrap())
        .stdout(asker.tty().stream().unwrap())
        .build()
        .unwrap();

    asker.send_line("What is 1+1?").await.unwrap();
    answerer.expect_string("What is 1+1?").await.unwrap();
    answerer.send_line("2").await.unwrap();
    asker.expect_string("2").await.unwrap();

    asker.send_line("What is Netflix backwards?").await.unwrap();
    answerer
        .expect_string("What is Netflix backwards?")
        .await
        .unwrap();
    answerer.send_line("xilfteN").await.unwrap();
    asker.expect_string("xilfteN").await.unwrap();

    answerer.close().unwrap();
    asker.close().unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn chained_consoles_reach_end_of_stream() {
    init_tracing();
    let asker = test_console().build().unwrap();
    let program = Arc::new(
        test_console()
            .stdin(asker.tty().stream().unwrap())
            .stdout(asker.tty().stream().unwrap())
            .build()
            .unwrap(),
    );
    let quiz = spawn_quiz(&program);

    asker.expect_string("What is 1+1?").await.unwrap();
    asker.send_line("2").await.unwrap();
    asker
        .expect_string("What is Netflix backwards?")
        .await
        .unwrap();
    asker.send_line("xilfteN").await.unwrap();

    let outcome = tokio::task::block_in_place(|| quiz.join()).unwrap();
    assert!(outcome.is_ok(), "quiz failed: {outcome:?}");

    program.tty().close();
    program.expect_eof().await.unwrap();

    // The program console still holds streams on the asker's tty, so the
    // asker's end comes from draining rather than a hangup.
    asker.tty().close();
    asker.expect_eof().await.unwrap();
    assert_eq!(asker.state(), ConsoleState::HalfClosed);

    program.close().unwrap();
    asker.close().unwrap();
}
