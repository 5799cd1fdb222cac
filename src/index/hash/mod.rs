//! Hash engine
//!
//! Open-addressing hash table with tombstone deletion and dynamic resizing.
//!
//! ## Slots
//! Each slot is empty, a tombstone (a deleted key that keeps probe chains
//! intact until the next rebuild) or a live pair.
//! - `used` = live + tombstone slots written since the last rebuild
//! - `deleted` = tombstones
//!
//! ## Load
//! - after every write: grow to `2 * size` when `used / size > 0.67`
//! - after every delete: shrink to `max(min_size, size / 2)` when
//!   `(used - deleted) / size < 0.16`
//!
//! A rebuild reinserts live pairs only, so tombstones vanish and both
//! counters restart. Sizes are always powers of two, which keeps the probe
//! sequence a permutation of the slots.

mod probe;

use std::borrow::Borrow;
use std::hash::{BuildHasher, BuildHasherDefault, Hash};
use std::mem;

use bytes::Bytes;
use rustc_hash::FxHasher;

use crate::error::{LodeError, Result};

use self::probe::ProbeSeq;
use super::{EngineKind, IndexEngine};

/// Deterministic default hasher
pub type DefaultHashBuilder = BuildHasherDefault<FxHasher>;

const GROW_LOAD_PERCENT: usize = 67;
const SHRINK_LOAD_PERCENT: usize = 16;

#[derive(Debug)]
enum Slot<K, V> {
    Empty,
    Tombstone(K),
    Live(K, V),
}

/// Unordered map using open addressing
#[derive(Debug)]
pub struct HashTable<K, V, S = DefaultHashBuilder> {
    backing: Vec<Slot<K, V>>,
    used: usize,
    deleted: usize,
    min_size: usize,
    perturb_shift: u32,
    hash_builder: S,
}

impl<K: Hash + Eq, V> HashTable<K, V, DefaultHashBuilder> {
    pub const DEFAULT_MIN_SIZE: usize = 8;
    pub const DEFAULT_PERTURB_SHIFT: u32 = 5;

    /// Create an empty table with the default minimum size and shift
    pub fn new() -> Self {
        Self::build(
            Self::DEFAULT_MIN_SIZE,
            Self::DEFAULT_PERTURB_SHIFT,
            DefaultHashBuilder::default(),
        )
    }

    /// Create an empty table with a custom minimum size and perturb shift
    pub fn with_options(min_size: usize, perturb_shift: u32) -> Result<Self> {
        Self::with_hasher(min_size, perturb_shift, DefaultHashBuilder::default())
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> HashTable<K, V, S> {
    /// Create an empty table hashing keys with `hash_builder`
    pub fn with_hasher(min_size: usize, perturb_shift: u32, hash_builder: S) -> Result<Self> {
        if !min_size.is_power_of_two() {
            return Err(LodeError::Config(format!(
                "hash table minimum size must be a power of two, got {}",
                min_size
            )));
        }
        if !(1..=63).contains(&perturb_shift) {
            return Err(LodeError::Config(format!(
                "perturb shift must be in 1..=63, got {}",
                perturb_shift
            )));
        }
        Ok(Self::build(min_size, perturb_shift, hash_builder))
    }

    fn build(min_size: usize, perturb_shift: u32, hash_builder: S) -> Self {
        Self {
            backing: empty_backing(min_size),
            used: 0,
            deleted: 0,
            min_size,
            perturb_shift,
            hash_builder,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.used - self.deleted
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current number of slots
    pub fn capacity(&self) -> usize {
        self.backing.len()
    }

    /// Live + tombstone slots since the last rebuild
    pub fn used(&self) -> usize {
        self.used
    }

    /// Tombstones since the last rebuild
    pub fn deleted(&self) -> usize {
        self.deleted
    }

    pub fn min_size(&self) -> usize {
        self.min_size
    }

    // =========================================================================
    // Operations
    // =========================================================================

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match &self.backing[self.find_slot(key)?] {
            Slot::Live(_, value) => Some(value),
            _ => None,
        }
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Insert or overwrite; returns the previous live value
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let Some(i) = self.find_slot(&key) else {
            // Unreachable while the load bound holds; rebuild bigger and retry
            tracing::warn!(
                "Hash probe exhausted {} slots without a free one, growing",
                self.backing.len()
            );
            self.resize(self.backing.len() * 2);
            return self.insert(key, value);
        };

        let previous = match mem::replace(&mut self.backing[i], Slot::Live(key, value)) {
            Slot::Empty => {
                self.used += 1;
                None
            }
            Slot::Tombstone(_) => {
                self.deleted -= 1;
                None
            }
            Slot::Live(_, old) => Some(old),
        };

        let size = self.backing.len();
        if self.used * 100 > size * GROW_LOAD_PERCENT {
            self.resize(size * 2);
        }
        previous
    }

    /// Remove a live key; absence is an error
    pub fn remove<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let i = self.find_slot(key).ok_or(LodeError::KeyNotFound)?;

        let value = match mem::replace(&mut self.backing[i], Slot::Empty) {
            Slot::Live(k, value) => {
                self.backing[i] = Slot::Tombstone(k);
                self.deleted += 1;
                value
            }
            other => {
                self.backing[i] = other;
                return Err(LodeError::KeyNotFound);
            }
        };

        let size = self.backing.len();
        if self.len() * 100 < size * SHRINK_LOAD_PERCENT {
            self.resize((size / 2).max(self.min_size));
        }
        Ok(value)
    }

    /// Live entries in slot order
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.backing.iter().filter_map(|slot| match slot {
            Slot::Live(key, value) => Some((key, value)),
            _ => None,
        })
    }

    /// Verify counters, load bound, sizing and that every stored key is
    /// reachable through its own probe sequence
    pub fn check_invariants(&self) -> Result<()> {
        let size = self.backing.len();
        if !size.is_power_of_two() || size < self.min_size {
            return Err(LodeError::invariant(format!(
                "table size {} is not a power of two >= {}",
                size, self.min_size
            )));
        }

        let mut live = 0;
        let mut tombstones = 0;
        for (i, slot) in self.backing.iter().enumerate() {
            let key = match slot {
                Slot::Empty => continue,
                Slot::Tombstone(key) => {
                    tombstones += 1;
                    key
                }
                Slot::Live(key, _) => {
                    live += 1;
                    key
                }
            };
            if self.find_slot(key) != Some(i) {
                return Err(LodeError::invariant(format!(
                    "slot {} is not reachable by its key's probe sequence",
                    i
                )));
            }
        }

        if self.used != live + tombstones || self.deleted != tombstones {
            return Err(LodeError::invariant(format!(
                "counters used={} deleted={} but table has {} live and {} tombstones",
                self.used, self.deleted, live, tombstones
            )));
        }
        if self.used * 100 > size * GROW_LOAD_PERCENT {
            return Err(LodeError::invariant(format!(
                "load {}/{} exceeds the growth threshold",
                self.used, size
            )));
        }
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// First slot on the probe path that is empty or holds `key` (live or
    /// tombstone)
    fn find_slot<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_builder.hash_one(key);
        ProbeSeq::new(hash, self.backing.len(), self.perturb_shift).find(|&j| {
            match &self.backing[j] {
                Slot::Empty => true,
                Slot::Tombstone(k) | Slot::Live(k, _) => <K as Borrow<Q>>::borrow(k) == key,
            }
        })
    }

    /// Rebuild into `new_size` slots, dropping tombstones
    fn resize(&mut self, new_size: usize) {
        if new_size == self.backing.len() {
            return;
        }
        tracing::debug!(
            "Resizing hash table: {} -> {} slots ({} live, {} tombstones)",
            self.backing.len(),
            new_size,
            self.len(),
            self.deleted
        );

        let old = mem::replace(&mut self.backing, empty_backing(new_size));
        self.used = 0;
        self.deleted = 0;
        for slot in old {
            if let Slot::Live(key, value) = slot {
                self.insert(key, value);
            }
        }
    }
}

impl<K: Hash + Eq, V> Default for HashTable<K, V, DefaultHashBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

fn empty_backing<K, V>(size: usize) -> Vec<Slot<K, V>> {
    std::iter::repeat_with(|| Slot::Empty).take(size).collect()
}

impl IndexEngine for HashTable<Vec<u8>, Bytes> {
    fn kind(&self) -> EngineKind {
        EngineKind::HashMap
    }

    fn get(&self, key: &[u8]) -> Option<&Bytes> {
        HashTable::get(self, key)
    }

    fn set(&mut self, key: Vec<u8>, value: Bytes) -> Option<Bytes> {
        self.insert(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<Bytes> {
        self.remove(key)
    }

    fn len(&self) -> usize {
        HashTable::len(self)
    }

    fn check_invariants(&self) -> Result<()> {
        HashTable::check_invariants(self)
    }
}
