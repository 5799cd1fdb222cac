//! Configuration for LodeKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{LodeError, Result};
use crate::index::EngineKind;

/// Main configuration for a LodeKV store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Journal Configuration
    // -------------------------------------------------------------------------
    /// Path of the append-only journal file. Created on first open.
    pub journal_path: PathBuf,

    /// Sync strategy: how often to fsync the journal
    pub journal_sync_strategy: JournalSyncStrategy,

    // -------------------------------------------------------------------------
    // Engine Configuration
    // -------------------------------------------------------------------------
    /// Which indexing engine backs the store
    pub engine: EngineKind,

    /// Minimum degree `t` of the B-tree engine (>= 2)
    pub btree_order: usize,

    /// Smallest backing size of the hash engine (power of two)
    pub hash_min_size: usize,

    /// Right shift applied to the perturbation on every hash probe (1..=63)
    pub hash_perturb_shift: u32,

    // -------------------------------------------------------------------------
    // Facade Configuration
    // -------------------------------------------------------------------------
    /// Semantics of `Store::update` on an absent key
    pub update_policy: UpdatePolicy,
}

/// Journal sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalSyncStrategy {
    /// fsync after every append (safest, slowest)
    EveryWrite,

    /// Hand every append to the OS, fsync after N appends
    EveryNEntries { count: usize },
}

/// What `update` does when the key is absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdatePolicy {
    /// Identical to `set`: unconditionally overwrite or create
    #[default]
    Upsert,

    /// Fail with `KeyNotFound` and journal nothing
    RequireExisting,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            journal_path: PathBuf::from("./lodekv.journal"),
            journal_sync_strategy: JournalSyncStrategy::EveryWrite,
            engine: EngineKind::BTreeMap,
            btree_order: 3,
            hash_min_size: 8,
            hash_perturb_shift: 5,
            update_policy: UpdatePolicy::Upsert,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the engines cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.btree_order < 2 {
            return Err(LodeError::Config(format!(
                "btree_order must be >= 2, got {}",
                self.btree_order
            )));
        }
        if !self.hash_min_size.is_power_of_two() {
            return Err(LodeError::Config(format!(
                "hash_min_size must be a power of two, got {}",
                self.hash_min_size
            )));
        }
        if !(1..=63).contains(&self.hash_perturb_shift) {
            return Err(LodeError::Config(format!(
                "hash_perturb_shift must be in 1..=63, got {}",
                self.hash_perturb_shift
            )));
        }
        if let JournalSyncStrategy::EveryNEntries { count: 0 } = self.journal_sync_strategy {
            return Err(LodeError::Config(
                "EveryNEntries sync count must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the journal file path
    pub fn journal_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.journal_path = path.into();
        self
    }

    /// Set the journal sync strategy
    pub fn journal_sync_strategy(mut self, strategy: JournalSyncStrategy) -> Self {
        self.config.journal_sync_strategy = strategy;
        self
    }

    /// Select the indexing engine
    pub fn engine(mut self, engine: EngineKind) -> Self {
        self.config.engine = engine;
        self
    }

    /// Set the B-tree minimum degree
    pub fn btree_order(mut self, order: usize) -> Self {
        self.config.btree_order = order;
        self
    }

    /// Set the hash engine's minimum backing size
    pub fn hash_min_size(mut self, size: usize) -> Self {
        self.config.hash_min_size = size;
        self
    }

    /// Set the hash engine's perturbation shift
    pub fn hash_perturb_shift(mut self, shift: u32) -> Self {
        self.config.hash_perturb_shift = shift;
        self
    }

    /// Set the update policy
    pub fn update_policy(mut self, policy: UpdatePolicy) -> Self {
        self.config.update_policy = policy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
