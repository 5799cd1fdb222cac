//! Journal Writer
//!
//! Handles appending records to the journal file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::JournalSyncStrategy;
use crate::error::{LodeError, Result};

use super::JournalRecord;

/// Appends records to the journal file
pub struct JournalWriter {
    path: PathBuf,
    file: File,
    sync_strategy: JournalSyncStrategy,

    /// File length after the last complete record
    offset: u64,

    /// Records appended through this writer
    records_written: u64,

    /// Appends not yet covered by an fsync
    unsynced: usize,
}

impl JournalWriter {
    /// Open or create a journal file for appending
    pub fn open(path: &Path, sync_strategy: JournalSyncStrategy) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let offset = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            sync_strategy,
            offset,
            records_written: 0,
            unsynced: 0,
        })
    }

    /// Append one record as a single write.
    ///
    /// Returns the number of records written through this writer so far.
    /// Any I/O failure is reported as `Durability`; a partially written line
    /// is cut off again so later appends do not land behind a torn record.
    pub fn append(&mut self, record: &JournalRecord) -> Result<u64> {
        let line = record.encode_line();

        if let Err(e) = self.file.write_all(line.as_bytes()) {
            if let Err(truncate_err) = self.file.set_len(self.offset) {
                tracing::warn!(
                    "Could not trim torn journal record in {}: {}",
                    self.path.display(),
                    truncate_err
                );
            }
            return Err(LodeError::Durability(e));
        }
        self.offset += line.len() as u64;
        self.unsynced += 1;

        let must_sync = match self.sync_strategy {
            JournalSyncStrategy::EveryWrite => true,
            JournalSyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };
        if must_sync {
            self.file.sync_data().map_err(LodeError::Durability)?;
            self.unsynced = 0;
        }

        self.records_written += 1;
        Ok(self.records_written)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data().map_err(LodeError::Durability)?;
        self.unsynced = 0;
        Ok(())
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Appends not yet fsynced
    pub fn pending_sync(&self) -> usize {
        self.unsynced
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
