//! Map engine
//!
//! std `BTreeMap` behind the engine contract. Used as the reference engine
//! the hand-written structures are compared against.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::error::{LodeError, Result};

use super::{EngineKind, IndexEngine};

/// Plain in-memory ordered map
#[derive(Debug, Clone, Default)]
pub struct MapIndex {
    data: BTreeMap<Vec<u8>, Bytes>,
}

impl MapIndex {
    /// Create a new empty map
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
        }
    }

    /// Get an iterator over all entries in sorted key order
    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &Bytes)> + '_ {
        self.data.iter()
    }
}

impl IndexEngine for MapIndex {
    fn kind(&self) -> EngineKind {
        EngineKind::Map
    }

    fn get(&self, key: &[u8]) -> Option<&Bytes> {
        self.data.get(key)
    }

    fn set(&mut self, key: Vec<u8>, value: Bytes) -> Option<Bytes> {
        self.data.insert(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<Bytes> {
        self.data.remove(key).ok_or(LodeError::KeyNotFound)
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn check_invariants(&self) -> Result<()> {
        Ok(())
    }
}
