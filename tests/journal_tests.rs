//! Tests for the journal
//!
//! These tests verify:
//! - The on-disk line format
//! - Replay order and statistics
//! - Rejection of torn and malformed records, with line numbers
//! - Sync strategies

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use lodekv::journal::{Journal, JournalReader, JournalRecord, JournalWriter, Operation};
use lodekv::{codec, JournalSyncStrategy, LodeError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn journal_path(dir: &TempDir) -> PathBuf {
    dir.path().join("test.journal")
}

fn write_records(path: &Path, records: &[JournalRecord]) {
    let mut writer = JournalWriter::open(path, JournalSyncStrategy::EveryWrite).unwrap();
    for record in records {
        writer.append(record).unwrap();
    }
}

fn replay_all(path: &Path) -> lodekv::Result<Vec<JournalRecord>> {
    let mut records = Vec::new();
    Journal::replay(path, |record| {
        records.push(record);
        Ok(())
    })?;
    Ok(records)
}

fn corrupt_line(err: LodeError) -> u64 {
    match err {
        LodeError::CorruptJournal { line, .. } => line,
        other => panic!("expected CorruptJournal, got {:?}", other),
    }
}

// =============================================================================
// Format Tests
// =============================================================================

#[test]
fn test_record_line_format() {
    let set = JournalRecord::set(b"key", b"value");
    assert_eq!(
        set.encode_line(),
        format!("set {} {}\n", codec::encode(b"key"), codec::encode(b"value"))
    );

    let delete = JournalRecord::delete(b"key");
    assert_eq!(delete.encode_line(), format!("delete {} \n", codec::encode(b"key")));
}

#[test]
fn test_awkward_bytes_survive_line_format() {
    let records = vec![
        JournalRecord::set(b"with space", b"line\nbreak"),
        JournalRecord::set(b"", b""),
        JournalRecord::update(&[0, 255, 10, 32], b"\r\n \t"),
        JournalRecord::delete(b"with space"),
    ];
    for record in &records {
        let line = record.encode_line();
        assert_eq!(line.matches('\n').count(), 1);
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches(' ').count(), 2);
    }

    let dir = TempDir::new().unwrap();
    let path = journal_path(&dir);
    write_records(&path, &records);

    assert_eq!(replay_all(&path).unwrap(), records);
}

#[test]
fn test_operation_tokens() {
    for op in [Operation::Set, Operation::Update, Operation::Delete] {
        assert_eq!(Operation::parse(op.as_str()), Some(op));
    }
    assert_eq!(Operation::parse("SET"), None);
    assert_eq!(Operation::parse("put"), None);
}

// =============================================================================
// Writer Tests
// =============================================================================

#[test]
fn test_writer_counts_and_appends_to_existing_file() {
    let dir = TempDir::new().unwrap();
    let path = journal_path(&dir);

    write_records(&path, &[JournalRecord::set(b"a", b"1")]);

    let mut writer = JournalWriter::open(&path, JournalSyncStrategy::EveryWrite).unwrap();
    assert_eq!(writer.records_written(), 0);
    assert_eq!(writer.append(&JournalRecord::set(b"b", b"2")).unwrap(), 1);
    assert_eq!(writer.append(&JournalRecord::delete(b"a")).unwrap(), 2);
    assert_eq!(writer.path(), path.as_path());
    drop(writer);

    let ops: Vec<Operation> = replay_all(&path)
        .unwrap()
        .into_iter()
        .map(|r| r.operation)
        .collect();
    assert_eq!(ops, vec![Operation::Set, Operation::Set, Operation::Delete]);
}

#[test]
fn test_every_n_entries_defers_fsync() {
    let dir = TempDir::new().unwrap();
    let path = journal_path(&dir);
    let mut writer =
        JournalWriter::open(&path, JournalSyncStrategy::EveryNEntries { count: 3 }).unwrap();

    writer.append(&JournalRecord::set(b"1", b"")).unwrap();
    writer.append(&JournalRecord::set(b"2", b"")).unwrap();
    assert_eq!(writer.pending_sync(), 2);

    writer.append(&JournalRecord::set(b"3", b"")).unwrap();
    assert_eq!(writer.pending_sync(), 0);

    writer.append(&JournalRecord::set(b"4", b"")).unwrap();
    writer.sync().unwrap();
    assert_eq!(writer.pending_sync(), 0);

    // Unsynced appends are still visible to readers of the file
    assert_eq!(replay_all(&path).unwrap().len(), 4);
}

#[cfg(target_os = "linux")]
#[test]
fn test_failed_write_is_durability_error() {
    let mut writer =
        JournalWriter::open(Path::new("/dev/full"), JournalSyncStrategy::EveryWrite).unwrap();

    let result = writer.append(&JournalRecord::set(b"k", b"v"));

    assert!(matches!(result, Err(LodeError::Durability(_))));
    assert_eq!(writer.records_written(), 0);
}

// =============================================================================
// Replay Tests
// =============================================================================

#[test]
fn test_missing_journal_is_empty_history() {
    let dir = TempDir::new().unwrap();
    let stats = Journal::replay(&dir.path().join("absent.journal"), |_| {
        panic!("nothing to apply")
    })
    .unwrap();

    assert_eq!(stats.records, 0);
}

#[test]
fn test_empty_journal_is_empty_history() {
    let dir = TempDir::new().unwrap();
    let path = journal_path(&dir);
    fs::write(&path, "").unwrap();

    assert!(replay_all(&path).unwrap().is_empty());
}

#[test]
fn test_replay_preserves_order_and_counts() {
    let dir = TempDir::new().unwrap();
    let path = journal_path(&dir);
    let records = vec![
        JournalRecord::set(b"a", b"1"),
        JournalRecord::set(b"b", b"2"),
        JournalRecord::update(b"a", b"3"),
        JournalRecord::set(b"c", b"4"),
        JournalRecord::delete(b"b"),
    ];
    write_records(&path, &records);

    let mut seen = Vec::new();
    let stats = Journal::replay(&path, |record| {
        seen.push(record);
        Ok(())
    })
    .unwrap();

    assert_eq!(seen, records);
    assert_eq!(stats.records, 5);
    assert_eq!(stats.sets, 3);
    assert_eq!(stats.updates, 1);
    assert_eq!(stats.deletes, 1);
    assert_eq!(Journal::verify(&path).unwrap(), stats);
}

#[test]
fn test_apply_error_aborts_replay() {
    let dir = TempDir::new().unwrap();
    let path = journal_path(&dir);
    write_records(
        &path,
        &[
            JournalRecord::set(b"a", b"1"),
            JournalRecord::set(b"b", b"2"),
            JournalRecord::set(b"c", b"3"),
        ],
    );

    let mut applied = 0;
    let result = Journal::replay(&path, |record| {
        if record.key == b"b" {
            return Err(LodeError::InvariantViolation("stop".to_string()));
        }
        applied += 1;
        Ok(())
    });

    assert!(matches!(result, Err(LodeError::InvariantViolation(_))));
    assert_eq!(applied, 1);
}

#[test]
fn test_delete_record_value_ignored() {
    let key = codec::encode(b"k");
    let record = JournalRecord::parse_line(&format!("delete {} ", key), 1).unwrap();

    assert_eq!(record.operation, Operation::Delete);
    assert_eq!(record.key, b"k".to_vec());
    assert_eq!(record.value, Bytes::new());
}

// =============================================================================
// Corruption Tests
// =============================================================================

fn replay_text(text: &str) -> LodeError {
    let dir = TempDir::new().unwrap();
    let path = journal_path(&dir);
    fs::write(&path, text).unwrap();
    replay_all(&path).unwrap_err()
}

#[test]
fn test_torn_final_line_rejected() {
    let good = JournalRecord::set(b"a", b"1").encode_line();
    let torn = JournalRecord::set(b"b", b"2").encode_line();
    let text = format!("{}{}", good, torn.trim_end_matches('\n'));

    assert_eq!(corrupt_line(replay_text(&text)), 2);
}

#[test]
fn test_short_line_rejected() {
    let good = JournalRecord::set(b"a", b"1").encode_line();
    let text = format!("{}{}set {}\n", good, good, codec::encode(b"x"));

    assert_eq!(corrupt_line(replay_text(&text)), 3);
}

#[test]
fn test_unknown_operation_rejected() {
    let text = format!("put {} {}\n", codec::encode(b"k"), codec::encode(b"v"));

    assert_eq!(corrupt_line(replay_text(&text)), 1);
}

#[test]
fn test_bad_token_rejected() {
    let good = JournalRecord::set(b"a", b"1").encode_line();
    let text = format!("{}set !!!! {}\n", good, codec::encode(b"v"));

    assert_eq!(corrupt_line(replay_text(&text)), 2);
}

#[test]
fn test_non_utf8_line_rejected() {
    let dir = TempDir::new().unwrap();
    let path = journal_path(&dir);
    let mut bytes = JournalRecord::set(b"a", b"1").encode_line().into_bytes();
    bytes.extend_from_slice(b"set \xff\xfe x\n");
    fs::write(&path, bytes).unwrap();

    assert_eq!(corrupt_line(replay_all(&path).unwrap_err()), 2);
    assert!(Journal::verify(&path).is_err());
}

#[test]
fn test_corruption_stops_after_earlier_records_applied() {
    let good = JournalRecord::set(b"a", b"1").encode_line();
    let dir = TempDir::new().unwrap();
    let path = journal_path(&dir);
    fs::write(&path, format!("{}garbage\n{}", good, good)).unwrap();

    let mut applied = 0;
    let result = Journal::replay(&path, |_| {
        applied += 1;
        Ok(())
    });

    assert_eq!(corrupt_line(result.unwrap_err()), 2);
    assert_eq!(applied, 1);
}

// =============================================================================
// Reader Tests
// =============================================================================

#[test]
fn test_reader_over_buffer() {
    let text = format!(
        "{}{}",
        JournalRecord::set(b"a", b"1").encode_line(),
        JournalRecord::delete(b"a").encode_line()
    );
    let mut reader = JournalReader::new(Cursor::new(text.into_bytes()));

    assert_eq!(
        reader.next_record().unwrap(),
        Some(JournalRecord::set(b"a", b"1"))
    );
    assert_eq!(
        reader.next_record().unwrap(),
        Some(JournalRecord::delete(b"a"))
    );
    assert_eq!(reader.next_record().unwrap(), None);
    assert_eq!(reader.line_no(), 2);
}

#[test]
fn test_reader_iterator_stops_after_error() {
    let text = "bogus\nbogus\n";
    let reader = JournalReader::new(Cursor::new(text.as_bytes()));

    let items: Vec<_> = reader.collect();
    assert_eq!(items.len(), 1);
    assert!(items[0].is_err());
}
