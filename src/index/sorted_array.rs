//! Sorted-array engine
//!
//! Two parallel vectors, `keys` strictly ascending and `values[i]` belonging
//! to `keys[i]`. Lookups are binary searches; inserts and removes splice both
//! vectors. Meant as a correctness baseline and for small, read-mostly maps.

use std::borrow::Borrow;
use std::cmp::Ordering;

use bytes::Bytes;

use crate::error::{LodeError, Result};

use super::{EngineKind, IndexEngine};

#[derive(Debug, Clone)]
pub struct SortedArray<K, V> {
    keys: Vec<K>,
    values: Vec<V>,
}

impl<K: Ord, V> SortedArray<K, V> {
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Exact-match binary search
    pub fn search<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut low = 0;
        let mut high = self.keys.len();
        while low < high {
            let mid = low + (high - low) / 2;
            match <K as Borrow<Q>>::borrow(&self.keys[mid]).cmp(key) {
                Ordering::Equal => return Some(mid),
                Ordering::Greater => high = mid,
                Ordering::Less => low = mid + 1,
            }
        }
        None
    }

    /// Rightmost index whose key is <= `key`, `None` when every key is greater
    pub fn floor_index<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        // Invariant: keys[..low] <= key < keys[high..]
        let mut low = 0;
        let mut high = self.keys.len();
        while low < high {
            let mid = low + (high - low) / 2;
            if <K as Borrow<Q>>::borrow(&self.keys[mid]) > key {
                high = mid;
            } else {
                low = mid + 1;
            }
        }
        low.checked_sub(1)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.search(key).map(|i| &self.values[i])
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.search(key).is_some()
    }

    /// Insert or overwrite; returns the previous value
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(i) = self.search(&key) {
            return Some(std::mem::replace(&mut self.values[i], value));
        }

        let at = self.floor_index(&key).map_or(0, |i| i + 1);
        self.keys.insert(at, key);
        self.values.insert(at, value);
        None
    }

    /// Remove `key`, returning its value; an absent key is a no-op
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let i = self.search(key)?;
        self.keys.remove(i);
        Some(self.values.remove(i))
    }

    /// Entries in ascending key order
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.keys.iter().zip(self.values.iter())
    }

    pub fn check_invariants(&self) -> Result<()> {
        if self.keys.len() != self.values.len() {
            return Err(LodeError::invariant(format!(
                "{} keys but {} values",
                self.keys.len(),
                self.values.len()
            )));
        }
        if let Some(i) = self.keys.windows(2).position(|pair| pair[0] >= pair[1]) {
            return Err(LodeError::invariant(format!(
                "keys not strictly increasing at index {}",
                i + 1
            )));
        }
        Ok(())
    }
}

impl<K: Ord, V> Default for SortedArray<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexEngine for SortedArray<Vec<u8>, Bytes> {
    fn kind(&self) -> EngineKind {
        EngineKind::SortedArrayMap
    }

    fn get(&self, key: &[u8]) -> Option<&Bytes> {
        SortedArray::get(self, key)
    }

    fn set(&mut self, key: Vec<u8>, value: Bytes) -> Option<Bytes> {
        self.insert(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<Bytes> {
        self.remove(key).ok_or(LodeError::KeyNotFound)
    }

    fn len(&self) -> usize {
        SortedArray::len(self)
    }

    fn check_invariants(&self) -> Result<()> {
        SortedArray::check_invariants(self)
    }
}
