//! Answering a scripted quiz.
//!
//! A thread plays the program under test on the console's tty, asking two
//! questions. The console answers them and then waits for the end of the
//! conversation.
//!
//! Run with: `cargo run --example quiz`

use std::io::{self, BufRead, BufReader, Write};
use std::sync::Arc;
use std::time::Duration;

use console_expect::prelude::*;

fn ask(tty: &Tty) -> io::Result<bool> {
    let mut reader = BufReader::new(tty);
    let mut writer = tty;

    for (question, expected) in [("What is 1+1?", "2"), ("What is Netflix backwards?", "xilfteN")] {
        write!(writer, "{question} ")?;
        let mut answer = String::new();
        reader.read_line(&mut answer)?;
        if answer.trim_end() != expected {
            writeln!(writer, "Wrong!")?;
            return Ok(false);
        }
    }

    writeln!(writer, "All correct.")?;
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("console-expect Quiz Example");
    println!("===========================\n");

    let console = Arc::new(
        Console::builder()
            .default_timeout(Duration::from_secs(5))
            .stdout(tokio::io::stdout())
            .build()?,
    );

    let program = Arc::clone(&console);
    let quiz = std::thread::spawn(move || ask(program.tty()));

    console.expect_string("What is 1+1?").await?;
    console.send_line("2").await?;
    console.expect_string("What is Netflix backwards?").await?;
    console.send_line("xilfteN").await?;
    console.expect_string("All correct.").await?;

    let passed = tokio::task::spawn_blocking(move || quiz.join())
        .await
        .map_err(|e| ExpectError::config(e.to_string()))?
        .map_err(|_| ExpectError::config("quiz thread panicked"))??;

    console.tty().close();
    console.expect_eof().await?;
    console.close()?;

    println!("\n\nQuiz passed: {passed}");
    Ok(())
}
