//! Console Module
//!
//! A line-oriented REPL over a `Store`. Reads commands from any `BufRead`
//! and writes replies to any `Write`, so the binary drives it with
//! stdin/stdout and tests drive it with in-memory buffers.

mod command;

use std::io::{BufRead, Write};

use crate::error::{LodeError, Result};
use crate::store::Store;

pub use command::{ConsoleCommand, USAGE};

const PROMPT: &str = "lodekv> ";

/// Run the console until `exit` or end of input
///
/// Command errors and failed operations are reported on `output` and the
/// loop continues; only I/O errors on `input`/`output` end it early.
pub fn run<R: BufRead, W: Write>(store: &Store, mut input: R, mut output: W) -> Result<()> {
    let mut line = String::new();
    loop {
        output.write_all(PROMPT.as_bytes())?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            break;
        }
        let text = line.trim_end_matches(['\n', '\r']);

        let reply = match ConsoleCommand::parse(text) {
            Ok(ConsoleCommand::Exit) => break,
            Ok(command) => execute(store, &command),
            Err(e) => format_error(&e),
        };
        writeln!(output, "{}", reply)?;
    }

    output.flush()?;
    Ok(())
}

/// Execute one command and render its reply
pub fn execute(store: &Store, command: &ConsoleCommand) -> String {
    let result = match command {
        ConsoleCommand::Get { key } => store
            .get(key.as_bytes())
            .map(|value| String::from_utf8_lossy(&value).into_owned()),
        ConsoleCommand::Set { key, value } => store
            .set(key.as_bytes(), value.as_bytes())
            .map(|()| "OK".to_string()),
        ConsoleCommand::Update { key, value } => store
            .update(key.as_bytes(), value.as_bytes())
            .map(|()| "OK".to_string()),
        ConsoleCommand::Delete { key } => store.delete(key.as_bytes()).map(|()| "OK".to_string()),
        ConsoleCommand::Len => Ok(store.len().to_string()),
        ConsoleCommand::Help => Ok(USAGE.to_string()),
        ConsoleCommand::Exit => Ok(String::new()),
    };

    result.unwrap_or_else(|e| format_error(&e))
}

fn format_error(error: &LodeError) -> String {
    match error {
        LodeError::KeyNotFound => "(not found)".to_string(),
        LodeError::Command(message) => message.clone(),
        other => format!("error: {}", other),
    }
}
