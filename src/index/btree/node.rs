//! B-tree node
//!
//! Node-level split/borrow/merge primitives. Every routine here assumes the
//! caller has already guaranteed the precondition of the top-down algorithms:
//! inserts never enter a full node, removals never enter a non-root node
//! holding only `t - 1` keys.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::mem;

use crate::error::{LodeError, Result};

/// A B-tree node; a node without children is a leaf
#[derive(Debug)]
pub(super) struct Node<K, V> {
    /// Entries, strictly increasing by key (at most 2t - 1)
    pub(super) keys: Vec<(K, V)>,

    /// Exclusively owned subtrees: keys.len() + 1 when internal, empty when leaf
    pub(super) children: Vec<Node<K, V>>,
}

impl<K: Ord, V> Node<K, V> {
    pub(super) fn new() -> Self {
        Self {
            keys: Vec::new(),
            children: Vec::new(),
        }
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// `Ok(i)`: key lives at `keys[i]`. `Err(i)`: key would be in `children[i]`.
    pub(super) fn find<Q>(&self, key: &Q) -> std::result::Result<usize, usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.keys
            .binary_search_by(|(k, _)| <K as Borrow<Q>>::borrow(k).cmp(key))
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Split the full child at `i`; its median moves up into `keys[i]`
    pub(super) fn split_child(&mut self, i: usize, t: usize) {
        let child = &mut self.children[i];

        let mut right_keys = child.keys.split_off(t - 1);
        let median = right_keys.remove(0);
        let right_children = if child.is_leaf() {
            Vec::new()
        } else {
            child.children.split_off(t)
        };

        self.keys.insert(i, median);
        self.children.insert(
            i + 1,
            Node {
                keys: right_keys,
                children: right_children,
            },
        );
    }

    /// Insert into a node known not to be full; returns the replaced value
    /// when the key already exists
    pub(super) fn insert_non_full(&mut self, key: K, value: V, t: usize) -> Option<V> {
        let mut i = match self.find(&key) {
            Ok(i) => return Some(mem::replace(&mut self.keys[i].1, value)),
            Err(i) => i,
        };

        if self.is_leaf() {
            self.keys.insert(i, (key, value));
            return None;
        }

        if self.children[i].keys.len() == 2 * t - 1 {
            self.split_child(i, t);
            match key.cmp(&self.keys[i].0) {
                Ordering::Greater => i += 1,
                Ordering::Equal => return Some(mem::replace(&mut self.keys[i].1, value)),
                Ordering::Less => {}
            }
        }

        self.children[i].insert_non_full(key, value, t)
    }

    // =========================================================================
    // Removal
    // =========================================================================

    pub(super) fn remove<Q>(&mut self, key: &Q, t: usize) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.find(key) {
            Ok(i) if self.is_leaf() => Some(self.keys.remove(i).1),
            Err(_) if self.is_leaf() => None,
            Ok(i) => self.remove_from_internal(i, key, t),
            Err(i) => {
                let i = self.fill_child(i, t);
                self.children[i].remove(key, t)
            }
        }
    }

    /// `keys[i]` matches; replace it by predecessor or successor, or merge
    /// around it when neither neighbour subtree can spare a key
    fn remove_from_internal<Q>(&mut self, i: usize, key: &Q, t: usize) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if self.children[i].keys.len() >= t {
            let predecessor = self.children[i].pop_max(t)?;
            return Some(mem::replace(&mut self.keys[i], predecessor).1);
        }

        if self.children[i + 1].keys.len() >= t {
            let successor = self.children[i + 1].pop_min(t)?;
            return Some(mem::replace(&mut self.keys[i], successor).1);
        }

        self.merge_children(i);
        self.children[i].remove(key, t)
    }

    /// Remove and return the largest entry of this subtree
    fn pop_max(&mut self, t: usize) -> Option<(K, V)> {
        if self.is_leaf() {
            return self.keys.pop();
        }
        let last = self.children.len() - 1;
        let i = self.fill_child(last, t);
        self.children[i].pop_max(t)
    }

    /// Remove and return the smallest entry of this subtree
    fn pop_min(&mut self, t: usize) -> Option<(K, V)> {
        if self.is_leaf() {
            return if self.keys.is_empty() {
                None
            } else {
                Some(self.keys.remove(0))
            };
        }
        let i = self.fill_child(0, t);
        self.children[i].pop_min(t)
    }

    /// Make sure `children[i]` holds at least `t` keys before descending.
    ///
    /// Returns the index of the child now covering the same key range, which
    /// moves left by one when the child is merged into its left sibling.
    fn fill_child(&mut self, i: usize, t: usize) -> usize {
        if self.children[i].keys.len() >= t {
            return i;
        }

        let has_right = i + 1 < self.children.len();
        if i > 0 && self.children[i - 1].keys.len() >= t {
            self.borrow_from_left(i);
            i
        } else if has_right && self.children[i + 1].keys.len() >= t {
            self.borrow_from_right(i);
            i
        } else if has_right {
            self.merge_children(i);
            i
        } else {
            self.merge_children(i - 1);
            i - 1
        }
    }

    /// Rotate right: left sibling's last key goes up, separator comes down
    fn borrow_from_left(&mut self, i: usize) {
        let (left, right) = self.children.split_at_mut(i);
        let donor = &mut left[i - 1];
        let child = &mut right[0];

        if let Some(moved) = donor.keys.pop() {
            let separator = mem::replace(&mut self.keys[i - 1], moved);
            child.keys.insert(0, separator);
        }
        if let Some(subtree) = donor.children.pop() {
            child.children.insert(0, subtree);
        }
    }

    /// Rotate left: right sibling's first key goes up, separator comes down
    fn borrow_from_right(&mut self, i: usize) {
        let (left, right) = self.children.split_at_mut(i + 1);
        let child = &mut left[i];
        let donor = &mut right[0];

        if !donor.keys.is_empty() {
            let moved = donor.keys.remove(0);
            let separator = mem::replace(&mut self.keys[i], moved);
            child.keys.push(separator);
        }
        if !donor.children.is_empty() {
            child.children.push(donor.children.remove(0));
        }
    }

    /// Fold `children[i + 1]` and the separator `keys[i]` into `children[i]`
    fn merge_children(&mut self, i: usize) {
        let right = self.children.remove(i + 1);
        let separator = self.keys.remove(i);

        let left = &mut self.children[i];
        left.keys.push(separator);
        left.keys.extend(right.keys);
        left.children.extend(right.children);
    }

    // =========================================================================
    // Verification
    // =========================================================================

    /// Check this subtree against the B-tree invariants; returns its key count
    pub(super) fn check(
        &self,
        t: usize,
        is_root: bool,
        lower: Option<&K>,
        upper: Option<&K>,
        depth: usize,
        leaf_depth: &mut Option<usize>,
    ) -> Result<usize> {
        let n = self.keys.len();

        if n > 2 * t - 1 {
            return Err(LodeError::invariant(format!(
                "node at depth {} holds {} keys (max {})",
                depth,
                n,
                2 * t - 1
            )));
        }
        if !is_root && n < t - 1 {
            return Err(LodeError::invariant(format!(
                "non-root node at depth {} holds {} keys (min {})",
                depth,
                n,
                t - 1
            )));
        }
        if self.keys.windows(2).any(|pair| pair[0].0 >= pair[1].0) {
            return Err(LodeError::invariant(format!(
                "keys not strictly increasing in node at depth {}",
                depth
            )));
        }
        if let (Some(lo), Some((first, _))) = (lower, self.keys.first()) {
            if first <= lo {
                return Err(LodeError::invariant(format!(
                    "node at depth {} has a key below its separator",
                    depth
                )));
            }
        }
        if let (Some(hi), Some((last, _))) = (upper, self.keys.last()) {
            if last >= hi {
                return Err(LodeError::invariant(format!(
                    "node at depth {} has a key above its separator",
                    depth
                )));
            }
        }

        if self.is_leaf() {
            match *leaf_depth {
                None => *leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    return Err(LodeError::invariant(format!(
                        "leaf at depth {} but other leaves at depth {}",
                        depth, expected
                    )));
                }
                Some(_) => {}
            }
            return Ok(n);
        }

        if n == 0 {
            return Err(LodeError::invariant(format!(
                "internal node at depth {} has no keys",
                depth
            )));
        }
        if self.children.len() != n + 1 {
            return Err(LodeError::invariant(format!(
                "internal node at depth {} has {} keys but {} children",
                depth,
                n,
                self.children.len()
            )));
        }

        let mut count = n;
        for (i, child) in self.children.iter().enumerate() {
            let lo = if i == 0 { lower } else { Some(&self.keys[i - 1].0) };
            let hi = if i == n { upper } else { Some(&self.keys[i].0) };
            count += child.check(t, false, lo, hi, depth + 1, leaf_depth)?;
        }
        Ok(count)
    }
}
