//! Index Module
//!
//! Interchangeable in-memory indexing engines behind one contract.
//!
//! ## Engines
//! - `BTree`: ordered, O(log n) search/insert/delete via split/merge
//! - `HashTable`: unordered, amortized O(1) via open addressing
//! - `SortedArray`: parallel sorted arrays, O(log n) search, O(n) splices
//! - `MapIndex`: std `BTreeMap`, the reference engine
//!
//! The data structures are generic; `IndexEngine` is implemented for their
//! `Vec<u8>` / `Bytes` instantiations so the store can hold any of them as a
//! `Box<dyn IndexEngine>`.

mod btree;
mod hash;
mod map;
mod sorted_array;

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;

use crate::config::Config;
use crate::error::{LodeError, Result};

pub use btree::{BTree, Iter as BTreeIter, Locator};
pub use hash::{DefaultHashBuilder, HashTable};
pub use map::MapIndex;
pub use sorted_array::SortedArray;

/// The contract every engine offers to the store
///
/// Absent keys are reported through `Option`/`KeyNotFound`, never through an
/// empty value: an empty `Bytes` is a legitimate stored value.
pub trait IndexEngine: Send + Sync {
    /// Which engine this is
    fn kind(&self) -> EngineKind;

    /// Look up the value stored for `key`
    fn get(&self, key: &[u8]) -> Option<&Bytes>;

    /// Insert or overwrite; returns the previous value
    fn set(&mut self, key: Vec<u8>, value: Bytes) -> Option<Bytes>;

    /// Remove `key`, failing with `KeyNotFound` if it is absent
    fn delete(&mut self, key: &[u8]) -> Result<Bytes>;

    fn contains(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Number of live keys
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Walk the whole structure and verify its invariants
    fn check_invariants(&self) -> Result<()>;
}

/// Engine selection by configuration name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    /// Open-addressing hash table ("hashMap")
    HashMap,

    /// B-tree ("bTreeMap")
    BTreeMap,

    /// Sorted parallel arrays ("sortedArrayMap", alias "binarySearchMap")
    SortedArrayMap,

    /// Plain std map ("map", alias "dict")
    Map,
}

impl EngineKind {
    pub const ALL: [EngineKind; 4] = [
        EngineKind::HashMap,
        EngineKind::BTreeMap,
        EngineKind::SortedArrayMap,
        EngineKind::Map,
    ];

    /// The canonical configuration name
    pub fn name(self) -> &'static str {
        match self {
            EngineKind::HashMap => "hashMap",
            EngineKind::BTreeMap => "bTreeMap",
            EngineKind::SortedArrayMap => "sortedArrayMap",
            EngineKind::Map => "map",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EngineKind {
    type Err = LodeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hashMap" => Ok(EngineKind::HashMap),
            "bTreeMap" => Ok(EngineKind::BTreeMap),
            "sortedArrayMap" | "binarySearchMap" => Ok(EngineKind::SortedArrayMap),
            "map" | "dict" => Ok(EngineKind::Map),
            other => Err(LodeError::Config(format!(
                "unknown engine '{}' (expected hashMap, bTreeMap, sortedArrayMap or map)",
                other
            ))),
        }
    }
}

/// Build an empty engine of the configured kind
pub fn create_engine(config: &Config) -> Result<Box<dyn IndexEngine>> {
    config.validate()?;

    let engine: Box<dyn IndexEngine> = match config.engine {
        EngineKind::HashMap => Box::new(HashTable::with_options(
            config.hash_min_size,
            config.hash_perturb_shift,
        )?),
        EngineKind::BTreeMap => Box::new(BTree::with_order(config.btree_order)?),
        EngineKind::SortedArrayMap => Box::new(SortedArray::new()),
        EngineKind::Map => Box::new(MapIndex::new()),
    };

    tracing::debug!("Created {} engine", config.engine);
    Ok(engine)
}
