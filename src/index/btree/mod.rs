//! B-tree engine
//!
//! Classic B-tree of minimum degree `t` keeping key/value pairs in every
//! node.
//!
//! ## Invariants
//! - every node holds at most `2t - 1` keys, every non-root node at least `t - 1`
//! - keys inside a node are strictly increasing
//! - all keys of `children[i]` < `keys[i]` < all keys of `children[i + 1]`
//! - all leaves sit at the same depth
//!
//! ## Algorithms
//! Both mutations are single-pass and top-down:
//! - insert splits a full root (height + 1) and any full child before
//!   entering it, so the leaf insert always has room
//! - remove tops up any child holding only `t - 1` keys (rotation from a
//!   sibling, or merge pulling the separator down) before entering it; a key
//!   found in an internal node is swapped for its predecessor or successor
//!
//! After a removal the tree inspects its own root: a keyless internal root
//! hands over to its only child (height - 1).

mod node;

use std::borrow::Borrow;
use std::mem;

use bytes::Bytes;

use crate::error::{LodeError, Result};

use self::node::Node;
use super::{EngineKind, IndexEngine};

/// Where a key was found: depth of the node (root = 0) and slot in it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator {
    pub depth: usize,
    pub index: usize,
}

/// Ordered map backed by a B-tree
#[derive(Debug)]
pub struct BTree<K, V> {
    root: Node<K, V>,

    /// Minimum degree `t`
    order: usize,

    /// Number of live keys
    len: usize,
}

impl<K: Ord, V> BTree<K, V> {
    pub const DEFAULT_ORDER: usize = 3;

    /// Create an empty tree of the default order
    pub fn new() -> Self {
        Self {
            root: Node::new(),
            order: Self::DEFAULT_ORDER,
            len: 0,
        }
    }

    /// Create an empty tree of minimum degree `order` (must be >= 2)
    pub fn with_order(order: usize) -> Result<Self> {
        if order < 2 {
            return Err(LodeError::Config(format!(
                "B-tree order must be >= 2, got {}",
                order
            )));
        }
        Ok(Self {
            root: Node::new(),
            order,
            len: 0,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels (an empty tree has height 1)
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut node = &self.root;
        while let Some(child) = node.children.first() {
            height += 1;
            node = child;
        }
        height
    }

    /// Descend from the root looking for `key`
    pub fn search<Q>(&self, key: &Q) -> Option<(&V, Locator)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut node = &self.root;
        let mut depth = 0;
        loop {
            match node.find(key) {
                Ok(index) => return Some((&node.keys[index].1, Locator { depth, index })),
                Err(_) if node.is_leaf() => return None,
                Err(i) => {
                    node = &node.children[i];
                    depth += 1;
                }
            }
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.search(key).map(|(value, _)| value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.search(key).is_some()
    }

    /// Insert or overwrite; returns the previous value for an existing key
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let t = self.order;

        if self.root.keys.len() == 2 * t - 1 {
            let old_root = mem::replace(&mut self.root, Node::new());
            self.root.children.push(old_root);
            self.root.split_child(0, t);
            tracing::debug!("B-tree root split, height now {}", self.height());
        }

        let previous = self.root.insert_non_full(key, value, t);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    /// Remove `key`, returning its value. An absent key is a no-op.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let removed = self.root.remove(key, self.order);

        if self.root.keys.is_empty() && self.root.children.len() == 1 {
            if let Some(child) = self.root.children.pop() {
                self.root = child;
                tracing::debug!("B-tree root collapsed, height now {}", self.height());
            }
        }

        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// In-order iterator over all entries
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.root, self.len)
    }

    /// Verify node sizes, ordering, separators, leaf depth and the length
    pub fn check_invariants(&self) -> Result<()> {
        let mut leaf_depth = None;
        let count = self
            .root
            .check(self.order, true, None, None, 0, &mut leaf_depth)?;

        if count != self.len {
            return Err(LodeError::invariant(format!(
                "tree holds {} keys but len is {}",
                count, self.len
            )));
        }
        Ok(())
    }
}

impl<K: Ord, V> Default for BTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexEngine for BTree<Vec<u8>, Bytes> {
    fn kind(&self) -> EngineKind {
        EngineKind::BTreeMap
    }

    fn get(&self, key: &[u8]) -> Option<&Bytes> {
        BTree::get(self, key)
    }

    fn set(&mut self, key: Vec<u8>, value: Bytes) -> Option<Bytes> {
        self.insert(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<Bytes> {
        // Checked first so a miss does not rebalance the tree on the way down
        if !self.contains_key(key) {
            return Err(LodeError::KeyNotFound);
        }
        self.remove(key).ok_or(LodeError::KeyNotFound)
    }

    fn len(&self) -> usize {
        BTree::len(self)
    }

    fn check_invariants(&self) -> Result<()> {
        BTree::check_invariants(self)
    }
}

// =============================================================================
// Iteration
// =============================================================================

/// In-order iterator; the stack holds each node on the current path and the
/// next key slot to yield from it
pub struct Iter<'a, K, V> {
    stack: Vec<(&'a Node<K, V>, usize)>,
    remaining: usize,
}

impl<'a, K: Ord, V> Iter<'a, K, V> {
    fn new(root: &'a Node<K, V>, len: usize) -> Self {
        let mut iter = Self {
            stack: Vec::new(),
            remaining: len,
        };
        iter.push_leftmost(root);
        iter
    }

    fn push_leftmost(&mut self, mut node: &'a Node<K, V>) {
        loop {
            self.stack.push((node, 0));
            match node.children.first() {
                Some(child) => node = child,
                None => break,
            }
        }
    }
}

impl<'a, K: Ord, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(top) = self.stack.last_mut() {
            let node = top.0;
            let index = top.1;

            if index < node.keys.len() {
                top.1 += 1;
                if !node.is_leaf() {
                    self.push_leftmost(&node.children[index + 1]);
                }
                self.remaining = self.remaining.saturating_sub(1);
                let (key, value) = &node.keys[index];
                return Some((key, value));
            }

            self.stack.pop();
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
