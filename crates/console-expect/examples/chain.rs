//! Two chained consoles holding a conversation.
//!
//! The answering console reads its input from, and mirrors its output to,
//! the asking console's tty.
//!
//! Run with: `cargo run --example chain`

use std::time::Duration;

use console_expect::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let asker = Console::builder()
        .default_timeout(Duration::from_secs(5))
        .build()?;

    let answerer = Console::builder()
        .default_timeout(Duration::from_secs(5))
        .stdin(asker.tty().stream()?)
        .stdout(asker.tty().stream()?)
        .on_send(|record| {
            println!("answerer sent {:?}", String::from_utf8_lossy(record.data));
        })
        .build()?;

    for (question, answer) in [("What is 1+1?", "2"), ("What is Netflix backwards?", "xilfteN")] {
        asker.send_line(question).await?;
        answerer.expect_string(question).await?;
        answerer.send_line(answer).await?;
        let heard = asker.expect_string(answer).await?;
        println!("asker heard {heard:?}");
    }

    answerer.close()?;
    asker.close()?;
    Ok(())
}
