//! Tests for Store
//!
//! These tests verify:
//! - Basic get/set/update/delete operations
//! - Persistence across reopen for every engine
//! - Update policies
//! - Replay of journals written by earlier sessions
//! - Concurrent access patterns

use std::fs;
use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use lodekv::journal::{Journal, JournalRecord, JournalWriter};
use lodekv::{Config, EngineKind, JournalSyncStrategy, LodeError, Store, UpdatePolicy};
use rand::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn config_for(dir: &TempDir, engine: EngineKind) -> Config {
    Config::builder()
        .journal_path(dir.path().join("store.journal"))
        .engine(engine)
        .build()
}

fn setup_temp_store() -> (TempDir, Store) {
    let temp_dir = TempDir::new().unwrap();
    let store = Store::open(config_for(&temp_dir, EngineKind::BTreeMap)).unwrap();
    (temp_dir, store)
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_open_creates_journal_and_parent_dirs() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("dir").join("db.journal");

    let store = Store::open(Config::builder().journal_path(&path).build()).unwrap();

    assert!(path.exists());
    assert!(store.is_empty());
    assert_eq!(store.journal_path(), path.as_path());
    assert_eq!(store.engine_kind(), EngineKind::BTreeMap);
}

#[test]
fn test_open_path_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db.journal");

    let store = Store::open_path(&path).unwrap();
    store.set(b"k", b"v").unwrap();

    assert_eq!(store.config().update_policy, UpdatePolicy::Upsert);
    assert_eq!(
        store.config().journal_sync_strategy,
        JournalSyncStrategy::EveryWrite
    );
    assert_eq!(store.engine_kind(), EngineKind::BTreeMap);
    drop(store);

    let store = Store::open_path(&path).unwrap();
    assert_eq!(store.get(b"k").unwrap(), Bytes::from_static(b"v"));
}

#[test]
fn test_open_rejects_invalid_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .journal_path(temp_dir.path().join("db.journal"))
        .journal_sync_strategy(JournalSyncStrategy::EveryNEntries { count: 0 })
        .build();

    assert!(matches!(Store::open(config), Err(LodeError::Config(_))));
}

#[test]
fn test_set_get() {
    let (_temp, store) = setup_temp_store();

    store.set(b"hello", b"world").unwrap();

    assert_eq!(store.get(b"hello").unwrap(), Bytes::from_static(b"world"));
    assert!(store.contains(b"hello"));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_get_nonexistent_key() {
    let (_temp, store) = setup_temp_store();

    assert!(matches!(store.get(b"nope"), Err(LodeError::KeyNotFound)));
}

#[test]
fn test_delete_nonexistent_key_is_not_journaled() {
    let (temp, store) = setup_temp_store();
    store.set(b"a", b"1").unwrap();

    assert!(matches!(store.delete(b"b"), Err(LodeError::KeyNotFound)));
    drop(store);

    let stats = Journal::verify(&temp.path().join("store.journal")).unwrap();
    assert_eq!(stats.records, 1);
}

#[test]
fn test_empty_value_round_trip() {
    let (temp, store) = setup_temp_store();
    store.set(b"empty", b"").unwrap();

    assert_eq!(store.get(b"empty").unwrap(), Bytes::new());
    store.close().unwrap();

    let store = Store::open(config_for(&temp, EngineKind::BTreeMap)).unwrap();
    assert_eq!(store.get(b"empty").unwrap(), Bytes::new());
}

// =============================================================================
// Update Policy Tests
// =============================================================================

#[test]
fn test_update_upserts_by_default() {
    let (_temp, store) = setup_temp_store();

    store.update(b"fresh", b"1").unwrap();
    assert_eq!(store.get(b"fresh").unwrap(), Bytes::from_static(b"1"));

    store.update(b"fresh", b"2").unwrap();
    assert_eq!(store.get(b"fresh").unwrap(), Bytes::from_static(b"2"));
}

#[test]
fn test_strict_update_requires_existing_key() {
    let temp = TempDir::new().unwrap();
    let config = Config::builder()
        .journal_path(temp.path().join("store.journal"))
        .update_policy(UpdatePolicy::RequireExisting)
        .build();
    let store = Store::open(config.clone()).unwrap();

    assert!(matches!(
        store.update(b"ghost", b"1"),
        Err(LodeError::KeyNotFound)
    ));
    assert!(!store.contains(b"ghost"));

    store.set(b"real", b"1").unwrap();
    store.update(b"real", b"2").unwrap();
    store.close().unwrap();

    let store = Store::open(config).unwrap();
    assert_eq!(store.get(b"real").unwrap(), Bytes::from_static(b"2"));
    assert_eq!(store.len(), 1);
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_reopen_restores_state_for_every_engine() {
    for kind in EngineKind::ALL {
        let temp = TempDir::new().unwrap();
        let store = Store::open(config_for(&temp, kind)).unwrap();
        for i in 0..100u32 {
            store
                .set(format!("key{}", i).as_bytes(), format!("value{}", i).as_bytes())
                .unwrap();
        }
        for i in (0..100u32).step_by(3) {
            store.delete(format!("key{}", i).as_bytes()).unwrap();
        }
        store.update(b"key1", b"updated").unwrap();
        store.close().unwrap();

        let store = Store::open(config_for(&temp, kind)).unwrap();
        assert_eq!(store.len(), 66, "{}", kind);
        assert_eq!(store.get(b"key1").unwrap(), Bytes::from_static(b"updated"));
        assert!(!store.contains(b"key0"));
        assert_eq!(
            store.get(b"key98").unwrap(),
            Bytes::from_static(b"value98")
        );
        store.check_invariants().unwrap();
    }
}

#[test]
fn test_journal_written_by_one_engine_replays_into_another() {
    let temp = TempDir::new().unwrap();
    let mut rng = StdRng::seed_from_u64(31);

    let store = Store::open(config_for(&temp, EngineKind::HashMap)).unwrap();
    for _ in 0..500 {
        let key = [rng.gen_range(0..50u8)];
        if rng.gen_bool(0.7) {
            let value: [u8; 3] = rng.gen();
            store.set(&key, &value).unwrap();
        } else {
            let _ = store.delete(&key);
        }
    }
    let expected: Vec<Option<Bytes>> = (0..50u8).map(|k| store.get(&[k]).ok()).collect();
    store.close().unwrap();

    for kind in EngineKind::ALL {
        let store = Store::open(config_for(&temp, kind)).unwrap();
        let actual: Vec<Option<Bytes>> = (0..50u8).map(|k| store.get(&[k]).ok()).collect();
        assert_eq!(actual, expected, "{}", kind);
    }
}

#[test]
fn test_replay_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let store = Store::open(config_for(&temp, EngineKind::SortedArrayMap)).unwrap();
    for i in 0..30u8 {
        store.set(&[i], &[i, i]).unwrap();
    }
    store.close().unwrap();

    let first = Store::open(config_for(&temp, EngineKind::SortedArrayMap)).unwrap();
    let first_state: Vec<_> = (0..30u8).map(|k| first.get(&[k]).unwrap()).collect();
    drop(first);

    let second = Store::open(config_for(&temp, EngineKind::SortedArrayMap)).unwrap();
    let second_state: Vec<_> = (0..30u8).map(|k| second.get(&[k]).unwrap()).collect();

    assert_eq!(first_state, second_state);
    assert_eq!(second.len(), 30);
}

#[test]
fn test_three_sets_and_one_delete_leave_two_keys() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store.journal");
    {
        let mut writer = JournalWriter::open(&path, JournalSyncStrategy::EveryWrite).unwrap();
        writer.append(&JournalRecord::set(b"a", b"1")).unwrap();
        writer.append(&JournalRecord::set(b"b", b"2")).unwrap();
        writer.append(&JournalRecord::set(b"c", b"3")).unwrap();
        writer.append(&JournalRecord::delete(b"b")).unwrap();
    }

    let store = Store::open(config_for(&temp, EngineKind::BTreeMap)).unwrap();

    assert_eq!(store.len(), 2);
    assert!(store.contains(b"a"));
    assert!(!store.contains(b"b"));
    assert!(store.contains(b"c"));
}

#[test]
fn test_replay_skips_delete_of_absent_key() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store.journal");
    {
        let mut writer = JournalWriter::open(&path, JournalSyncStrategy::EveryWrite).unwrap();
        writer.append(&JournalRecord::delete(b"never-set")).unwrap();
        writer.append(&JournalRecord::set(b"kept", b"1")).unwrap();
    }

    let store = Store::open(config_for(&temp, EngineKind::HashMap)).unwrap();

    assert_eq!(store.len(), 1);
    assert!(store.contains(b"kept"));
}

#[test]
fn test_strict_store_replays_update_of_absent_key() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store.journal");
    {
        let mut writer = JournalWriter::open(&path, JournalSyncStrategy::EveryWrite).unwrap();
        writer.append(&JournalRecord::update(b"k", b"v")).unwrap();
    }

    let config = Config::builder()
        .journal_path(&path)
        .update_policy(UpdatePolicy::RequireExisting)
        .build();
    let store = Store::open(config).unwrap();

    assert_eq!(store.get(b"k").unwrap(), Bytes::from_static(b"v"));
}

#[test]
fn test_corrupt_journal_fails_open() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store.journal");
    let good = JournalRecord::set(b"a", b"1").encode_line();
    fs::write(&path, format!("{}{}oops\n", good, good)).unwrap();

    let result = Store::open(config_for(&temp, EngineKind::BTreeMap));

    assert!(matches!(
        result,
        Err(LodeError::CorruptJournal { line: 3, .. })
    ));
}

#[test]
fn test_batched_sync_persists_after_close() {
    let temp = TempDir::new().unwrap();
    let config = Config::builder()
        .journal_path(temp.path().join("store.journal"))
        .journal_sync_strategy(JournalSyncStrategy::EveryNEntries { count: 16 })
        .build();

    let store = Store::open(config.clone()).unwrap();
    for i in 0..5u8 {
        store.set(&[i], b"x").unwrap();
    }
    store.sync().unwrap();
    store.close().unwrap();

    let store = Store::open(config).unwrap();
    assert_eq!(store.len(), 5);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_readers_and_writer() {
    let (_temp, store) = setup_temp_store();
    for i in 0..100u32 {
        store.set(&i.to_be_bytes(), b"initial").unwrap();
    }
    let store = Arc::new(store);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for _ in 0..50 {
                for i in 0..100u32 {
                    let value = store.get(&i.to_be_bytes()).unwrap();
                    assert!(value == "initial" || value == "changed");
                }
            }
        }));
    }

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..100u32 {
                store.set(&i.to_be_bytes(), b"changed").unwrap();
            }
        })
    };

    for handle in handles {
        handle.join().unwrap();
    }
    writer.join().unwrap();

    assert_eq!(store.len(), 100);
    store.check_invariants().unwrap();
}

#[test]
fn test_concurrent_writers_journal_every_mutation() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(Store::open(config_for(&temp, EngineKind::HashMap)).unwrap());

    let handles: Vec<_> = (0..4u8)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..50u8 {
                    store.set(&[t, i], &[i]).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(store.len(), 200);

    let stats = Journal::verify(store.journal_path()).unwrap();
    assert_eq!(stats.sets, 200);
}
