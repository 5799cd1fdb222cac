//! Journal Replay
//!
//! Rebuilds engine state at startup by feeding every record, in file order,
//! to a caller-supplied apply function.

use std::io::ErrorKind;
use std::path::Path;

use crate::error::{LodeError, Result};

use super::{JournalReader, JournalRecord, Operation};

/// Entry points for reading a whole journal
pub struct Journal;

/// Result of a replay or verification pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Records read and applied
    pub records: u64,
    pub sets: u64,
    pub updates: u64,
    pub deletes: u64,
}

impl ReplayStats {
    fn count(&mut self, operation: Operation) {
        self.records += 1;
        match operation {
            Operation::Set => self.sets += 1,
            Operation::Update => self.updates += 1,
            Operation::Delete => self.deletes += 1,
        }
    }
}

impl Journal {
    /// Replay a journal file
    ///
    /// - a missing or empty file is an empty history
    /// - any malformed record aborts with `CorruptJournal`; records before it
    ///   have already been applied, so the caller must discard its state
    /// - the first error returned by `apply` aborts the replay
    pub fn replay<F>(path: &Path, mut apply: F) -> Result<ReplayStats>
    where
        F: FnMut(JournalRecord) -> Result<()>,
    {
        let reader = match JournalReader::open(path) {
            Ok(reader) => reader,
            Err(LodeError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No journal at {}, starting empty", path.display());
                return Ok(ReplayStats::default());
            }
            Err(e) => return Err(e),
        };

        let mut stats = ReplayStats::default();
        for record in reader {
            let record = record?;
            let operation = record.operation;
            apply(record)?;
            stats.count(operation);
        }

        Ok(stats)
    }

    /// Parse a journal file without applying it
    pub fn verify(path: &Path) -> Result<ReplayStats> {
        Self::replay(path, |_| Ok(()))
    }
}
