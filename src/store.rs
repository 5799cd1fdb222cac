//! Store Module
//!
//! The facade that binds one indexing engine to the journal.
//!
//! ## Responsibilities
//! - Build the configured engine and rebuild its state from the journal
//! - Route get/set/update/delete to the engine
//! - Journal every successful mutation, in mutation order

use std::fs;
use std::path::Path;

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};

use crate::config::{Config, UpdatePolicy};
use crate::error::{LodeError, Result};
use crate::index::{create_engine, EngineKind, IndexEngine};
use crate::journal::{Journal, JournalRecord, JournalWriter, Operation, ReplayStats};

/// An embedded key-value store
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader
///
/// - **Writes** (set/update/delete): take the engine write guard and hold it
///   across both the engine mutation and the journal append, so the journal
///   order is exactly the mutation order
/// - **Reads** (get/contains/len): take the shared guard and run concurrently
///
/// `Store` is `Send + Sync`; share it with `Arc`.
pub struct Store {
    config: Config,

    /// The active engine
    engine: RwLock<Box<dyn IndexEngine>>,

    /// Only ever locked while the engine write guard is held
    journal: Mutex<JournalWriter>,
}

impl Store {
    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Validate config and build an empty engine
    /// 2. Replay the journal into it (nothing is appended while replaying)
    /// 3. Verify the engine invariants once
    /// 4. Open the journal for appending
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        if let Some(parent) = config.journal_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut engine = create_engine(&config)?;
        let (stats, skipped) = Self::replay_into(engine.as_mut(), &config.journal_path)?;
        engine.check_invariants()?;

        tracing::info!(
            "Replayed {} journal records ({} set, {} update, {} delete, {} skipped) into {} engine, {} keys",
            stats.records,
            stats.sets,
            stats.updates,
            stats.deletes,
            skipped,
            engine.kind(),
            engine.len()
        );

        let journal = JournalWriter::open(&config.journal_path, config.journal_sync_strategy)?;

        Ok(Self {
            config,
            engine: RwLock::new(engine),
            journal: Mutex::new(journal),
        })
    }

    /// Open with a journal path (convenience method)
    ///
    /// Uses the default config otherwise
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().journal_path(path).build())
    }

    /// Replay always upserts: a strict update only ever reaches the journal
    /// when its key existed at the time.
    fn replay_into(engine: &mut dyn IndexEngine, path: &Path) -> Result<(ReplayStats, u64)> {
        let mut skipped = 0u64;
        let stats = Journal::replay(path, |record| {
            match Self::apply(&mut *engine, UpdatePolicy::Upsert, &record) {
                Err(LodeError::KeyNotFound) => {
                    tracing::warn!(
                        "Skipping journal {} of absent key ({} bytes)",
                        record.operation,
                        record.key.len()
                    );
                    skipped += 1;
                    Ok(())
                }
                other => other,
            }
        })?;
        Ok((stats, skipped))
    }

    /// Apply one mutation to an engine
    fn apply(
        engine: &mut dyn IndexEngine,
        policy: UpdatePolicy,
        record: &JournalRecord,
    ) -> Result<()> {
        match record.operation {
            Operation::Set => {
                engine.set(record.key.clone(), record.value.clone());
            }
            Operation::Update => {
                if policy == UpdatePolicy::RequireExisting && !engine.contains(&record.key) {
                    return Err(LodeError::KeyNotFound);
                }
                engine.set(record.key.clone(), record.value.clone());
            }
            Operation::Delete => {
                engine.delete(&record.key)?;
            }
        }
        Ok(())
    }

    /// Mutate the engine, then journal the record.
    ///
    /// A failed append leaves the mutation in memory and reports `Durability`.
    fn mutate(&self, record: JournalRecord) -> Result<()> {
        let mut engine = self.engine.write();
        Self::apply(&mut **engine, self.config.update_policy, &record)?;

        let mut journal = self.journal.lock();
        if let Err(e) = journal.append(&record) {
            tracing::error!(
                "Journal append failed for {} (applied in memory only): {}",
                record.operation,
                e
            );
            return Err(e);
        }
        Ok(())
    }

    // =========================================================================
    // Public API
    // =========================================================================

    /// Get the value stored for `key`
    pub fn get(&self, key: &[u8]) -> Result<Bytes> {
        self.engine
            .read()
            .get(key)
            .cloned()
            .ok_or(LodeError::KeyNotFound)
    }

    /// Insert or overwrite a key
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.mutate(JournalRecord::set(key, value))
    }

    /// Overwrite a key, subject to the configured `UpdatePolicy`
    pub fn update(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.mutate(JournalRecord::update(key, value))
    }

    /// Remove a key; `KeyNotFound` (and nothing journaled) if absent
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.mutate(JournalRecord::delete(key))
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.engine.read().contains(key)
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.engine.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.engine.read().is_empty()
    }

    pub fn engine_kind(&self) -> EngineKind {
        self.engine.read().kind()
    }

    /// Walk the engine and verify its structural invariants
    pub fn check_invariants(&self) -> Result<()> {
        self.engine.read().check_invariants()
    }

    /// Force the journal to disk
    pub fn sync(&self) -> Result<()> {
        self.journal.lock().sync()
    }

    /// Close the store, syncing the journal
    pub fn close(self) -> Result<()> {
        let mut journal = self.journal.into_inner();
        journal.sync()?;
        tracing::debug!(
            "Closed store, {} records appended this session",
            journal.records_written()
        );
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn journal_path(&self) -> &Path {
        &self.config.journal_path
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
