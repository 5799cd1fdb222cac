//! Journal Reader
//!
//! Handles reading records from the journal file, one line at a time.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{LodeError, Result};

use super::JournalRecord;

/// Reads records from a journal
pub struct JournalReader<R> {
    reader: R,

    /// Number of the last line read (1-based)
    line_no: u64,

    /// Set after the first error; the iterator is fused from then on
    failed: bool,
}

impl JournalReader<BufReader<File>> {
    /// Open a journal file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> JournalReader<R> {
    /// Read records from any buffered source
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            failed: false,
        }
    }

    /// Read the next record; `Ok(None)` at a clean end of file
    pub fn next_record(&mut self) -> Result<Option<JournalRecord>> {
        let mut buf = Vec::new();
        if self.reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        self.line_no += 1;

        if buf.pop() != Some(b'\n') {
            return Err(LodeError::corrupt(
                self.line_no,
                "torn record: final line has no terminating newline",
            ));
        }

        let line = std::str::from_utf8(&buf)
            .map_err(|_| LodeError::corrupt(self.line_no, "record is not valid UTF-8"))?;

        JournalRecord::parse_line(line, self.line_no).map(Some)
    }

    /// Number of lines consumed so far
    pub fn line_no(&self) -> u64 {
        self.line_no
    }
}

impl<R: BufRead> Iterator for JournalReader<R> {
    type Item = Result<JournalRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let next = self.next_record().transpose();
        if matches!(next, Some(Err(_))) {
            self.failed = true;
        }
        next
    }
}
