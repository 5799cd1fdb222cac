//! Error types for LodeKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using LodeError
pub type Result<T> = std::result::Result<T, LodeError>;

/// Unified error type for LodeKV operations
#[derive(Debug, Error)]
pub enum LodeError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    /// Key absent on get/delete (or on a strict update). Recoverable.
    #[error("Key not found")]
    KeyNotFound,

    // -------------------------------------------------------------------------
    // Journal Errors
    // -------------------------------------------------------------------------
    /// The journal append failed. The in-memory engine already reflects the
    /// change, so the caller must treat it as applied but not durable.
    #[error("Journal append failed (change applied in memory, not durable): {0}")]
    Durability(#[source] std::io::Error),

    /// A malformed record was found during replay. Fatal at startup.
    #[error("Journal corruption at line {line}: {reason}")]
    CorruptJournal { line: u64, reason: String },

    // -------------------------------------------------------------------------
    // Engine Errors
    // -------------------------------------------------------------------------
    /// A tree/table structural invariant does not hold.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Console Errors
    // -------------------------------------------------------------------------
    #[error("Command error: {0}")]
    Command(String),
}

impl LodeError {
    pub(crate) fn corrupt(line: u64, reason: impl Into<String>) -> Self {
        LodeError::CorruptJournal {
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        LodeError::InvariantViolation(message.into())
    }
}
