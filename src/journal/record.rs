//! Journal record definitions
//!
//! Defines one logged mutation and its single-line text form.

use std::fmt;

use bytes::Bytes;

use crate::codec;
use crate::error::{LodeError, Result};

/// Mutations that can be journaled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Set,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Set => "set",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    /// Parse the operation token of a journal line
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "set" => Some(Operation::Set),
            "update" => Some(Operation::Update),
            "delete" => Some(Operation::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry in the journal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalRecord {
    /// The operation to perform
    pub operation: Operation,

    pub key: Vec<u8>,

    /// Always empty for `Delete`
    pub value: Bytes,
}

impl JournalRecord {
    pub fn set(key: &[u8], value: &[u8]) -> Self {
        Self {
            operation: Operation::Set,
            key: key.to_vec(),
            value: Bytes::copy_from_slice(value),
        }
    }

    pub fn update(key: &[u8], value: &[u8]) -> Self {
        Self {
            operation: Operation::Update,
            key: key.to_vec(),
            value: Bytes::copy_from_slice(value),
        }
    }

    pub fn delete(key: &[u8]) -> Self {
        Self {
            operation: Operation::Delete,
            key: key.to_vec(),
            value: Bytes::new(),
        }
    }

    /// Render as `<operation> <key> <value>\n`.
    ///
    /// Delete lines keep the value position with an empty token.
    pub fn encode_line(&self) -> String {
        let value = match self.operation {
            Operation::Delete => String::new(),
            Operation::Set | Operation::Update => codec::encode(&self.value),
        };
        format!("{} {} {}\n", self.operation, codec::encode(&self.key), value)
    }

    /// Parse one journal line (without its newline). `line_no` is 1-based
    /// and only used for error reporting.
    pub fn parse_line(line: &str, line_no: u64) -> Result<Self> {
        let mut fields = line.splitn(3, ' ');
        let (op_token, key_token, value_token) =
            match (fields.next(), fields.next(), fields.next()) {
                (Some(op), Some(key), Some(value)) => (op, key, value),
                _ => {
                    return Err(LodeError::corrupt(
                        line_no,
                        format!("expected 3 fields, got {:?}", line),
                    ))
                }
            };

        let operation = Operation::parse(op_token).ok_or_else(|| {
            LodeError::corrupt(line_no, format!("unknown operation {:?}", op_token))
        })?;

        let key = codec::decode(key_token)
            .map_err(|e| LodeError::corrupt(line_no, format!("bad key token: {}", e)))?;

        let value = match operation {
            Operation::Delete => Bytes::new(),
            Operation::Set | Operation::Update => codec::decode(value_token)
                .map(Bytes::from)
                .map_err(|e| LodeError::corrupt(line_no, format!("bad value token: {}", e)))?,
        };

        Ok(Self {
            operation,
            key,
            value,
        })
    }
}
