//! Command definitions
//!
//! Represents one line typed at the console.

use crate::error::{LodeError, Result};

pub const USAGE: &str = "\
commands:
  get <key>
  set <key> <value>
  update <key> <value>
  del <key>
  len
  help
  exit";

/// A parsed console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Get a value by key
    Get { key: String },

    /// Insert or overwrite a key
    Set { key: String, value: String },

    /// Overwrite a key
    Update { key: String, value: String },

    /// Delete a key
    Delete { key: String },

    /// Number of stored keys
    Len,

    Help,

    /// Leave the console
    Exit,
}

impl ConsoleCommand {
    /// Parse one line of input.
    ///
    /// The command word is case-insensitive. For `set`/`update` everything
    /// after the key is the value, spaces included, and may be empty.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim_start();
        let (word, rest) = split_word(line);
        let word = word.to_ascii_lowercase();

        let command = match word.as_str() {
            "get" => ConsoleCommand::Get {
                key: single_key(&word, rest)?,
            },
            "del" | "delete" => ConsoleCommand::Delete {
                key: single_key(&word, rest)?,
            },
            "set" | "update" => {
                let (key, value) = split_word(rest.trim_start());
                if key.is_empty() {
                    return Err(usage_error(&word, "<key> <value>"));
                }
                let (key, value) = (key.to_string(), value.to_string());
                if word == "set" {
                    ConsoleCommand::Set { key, value }
                } else {
                    ConsoleCommand::Update { key, value }
                }
            }
            "len" => no_args(&word, rest, ConsoleCommand::Len)?,
            "help" => no_args(&word, rest, ConsoleCommand::Help)?,
            "exit" | "quit" => no_args(&word, rest, ConsoleCommand::Exit)?,
            "" => return Err(LodeError::Command("empty command".to_string())),
            other => {
                return Err(LodeError::Command(format!(
                    "unknown command '{}', type 'help' for usage",
                    other
                )))
            }
        };

        Ok(command)
    }
}

/// Split off the first space-delimited word; the remainder keeps its
/// inner spacing minus the single separator
fn split_word(s: &str) -> (&str, &str) {
    match s.split_once(' ') {
        Some((word, rest)) => (word, rest),
        None => (s.trim_end(), ""),
    }
}

fn single_key(word: &str, rest: &str) -> Result<String> {
    let mut args = rest.split_whitespace();
    match (args.next(), args.next()) {
        (Some(key), None) => Ok(key.to_string()),
        _ => Err(usage_error(word, "<key>")),
    }
}

fn no_args(word: &str, rest: &str, command: ConsoleCommand) -> Result<ConsoleCommand> {
    if rest.trim().is_empty() {
        Ok(command)
    } else {
        Err(usage_error(word, ""))
    }
}

fn usage_error(word: &str, args: &str) -> LodeError {
    LodeError::Command(format!("usage: {} {}", word, args).trim_end().to_string())
}
