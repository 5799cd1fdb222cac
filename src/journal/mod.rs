//! Journal Module
//!
//! Provides durability through an append-only operation log.
//!
//! ## Responsibilities
//! - Append one record per successful mutation, in program order
//! - Replay all records at startup to rebuild engine state
//! - Reject torn or malformed records instead of skipping them
//!
//! ## File Format
//! UTF-8 text, one record per line, single-space separated:
//! ```text
//! set <key> <value>\n
//! update <key> <value>\n
//! delete <key> \n
//! ```
//! Keys and values are codec tokens (base64), so they never contain
//! whitespace and an empty value is an empty token. Lines are only ever
//! appended; the file is never rewritten or compacted.

mod reader;
mod record;
mod replay;
mod writer;

pub use reader::JournalReader;
pub use record::{JournalRecord, Operation};
pub use replay::{Journal, ReplayStats};
pub use writer::JournalWriter;
