//! Height-balanced ordered index (AVL tree)
//!
//! Each parent exclusively owns its children through `Option<Box<Node>>`.
//! Mutations descend recursively and hand the (possibly new) subtree root back
//! to the caller, so every node on the touched root-to-leaf path is rebalanced
//! bottom-up before its parent sees it.
//!
//! # Invariants
//!
//! - BST order: left keys < node key < right keys
//! - Balance: `height(left) - height(right)` is in `{-1, 0, 1}` for every node
//! - Height cache: `height == 1 + max(height(left), height(right))`

use std::borrow::Borrow;
use std::cmp::{self, Ordering};
use std::fmt;
use std::mem;

use super::errors::{IndexError, IndexResult};
use crate::observability::{IndexMetrics, MetricsSnapshot};

type Link<K, V> = Option<Box<Node<K, V>>>;

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    left: Link<K, V>,
    right: Link<K, V>,
    /// 1 for a leaf
    height: usize,
}

impl<K, V> Node<K, V> {
    fn leaf(key: K, value: V) -> Box<Self> {
        Box::new(Self {
            key,
            value,
            left: None,
            right: None,
            height: 1,
        })
    }

    fn update_height(&mut self) {
        self.height = 1 + cmp::max(height(&self.left), height(&self.right));
    }

    fn balance_factor(&self) -> isize {
        height(&self.left) as isize - height(&self.right) as isize
    }
}

fn height<K, V>(link: &Link<K, V>) -> usize {
    link.as_ref().map_or(0, |n| n.height)
}

fn balance_factor<K, V>(link: &Link<K, V>) -> isize {
    link.as_ref().map_or(0, |n| n.balance_factor())
}

/// Ordered key-value index with O(log n) insert, search and delete.
pub struct AvlTree<K, V> {
    root: Link<K, V>,
    len: usize,
    metrics: IndexMetrics,
}

impl<K: Ord, V> AvlTree<K, V> {
    /// Creates an empty tree
    pub fn new() -> Self {
        Self {
            root: None,
            len: 0,
            metrics: IndexMetrics::new(),
        }
    }

    /// Insert or update a key.
    ///
    /// Returns the previous value when the key already existed. An update
    /// never changes the tree's shape.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let (root, previous) = Self::insert_at(self.root.take(), key, value, &self.metrics);
        self.root = Some(root);

        if previous.is_some() {
            self.metrics.record_update();
        } else {
            self.len += 1;
            self.metrics.record_insert();
        }
        previous
    }

    /// Look up the value stored under `key`
    pub fn search<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root.as_deref();
        let mut found = None;
        while let Some(node) = current {
            match key.cmp(node.key.borrow()) {
                Ordering::Less => current = node.left.as_deref(),
                Ordering::Greater => current = node.right.as_deref(),
                Ordering::Equal => {
                    found = Some(&node.value);
                    break;
                }
            }
        }
        self.metrics.record_lookup(found.is_some());
        found
    }

    /// Mutable lookup. Only the value is reachable, so ordering can't break.
    pub fn search_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root.as_deref_mut();
        while let Some(node) = current {
            match key.cmp(node.key.borrow()) {
                Ordering::Less => current = node.left.as_deref_mut(),
                Ordering::Greater => current = node.right.as_deref_mut(),
                Ordering::Equal => return Some(&mut node.value),
            }
        }
        None
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.search(key).is_some()
    }

    /// Remove a key, returning its value.
    ///
    /// Absent keys are a silent no-op.
    pub fn delete<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let (root, removed) = Self::delete_at(self.root.take(), key, &self.metrics);
        self.root = root;

        if removed.is_some() {
            self.len -= 1;
            self.metrics.record_delete();
        }
        removed
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Height of the root (0 when empty)
    pub fn height(&self) -> usize {
        height(&self.root)
    }

    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// All entries in ascending key order
    pub fn in_order(&self) -> Vec<(&K, &V)> {
        let mut out = Vec::with_capacity(self.len);
        let mut stack: Vec<&Node<K, V>> = Vec::new();
        let mut current = self.root.as_deref();

        while current.is_some() || !stack.is_empty() {
            while let Some(node) = current {
                stack.push(node);
                current = node.left.as_deref();
            }
            if let Some(node) = stack.pop() {
                out.push((&node.key, &node.value));
                current = node.right.as_deref();
            }
        }
        out
    }

    /// Total rotations performed since construction
    pub fn rotations(&self) -> u64 {
        self.metrics.rotations()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Verify BST order, balance and cached heights over the whole tree.
    pub fn check_invariants(&self) -> IndexResult<()> {
        let mut count = 0;
        Self::check_subtree(&self.root, None, None, &mut count)?;
        if count != self.len {
            return Err(IndexError::InvariantViolated(format!(
                "tree holds {} nodes but len is {}",
                count, self.len
            )));
        }
        Ok(())
    }

    fn check_subtree(
        link: &Link<K, V>,
        lower: Option<&K>,
        upper: Option<&K>,
        count: &mut usize,
    ) -> IndexResult<usize> {
        let node = match link {
            None => return Ok(0),
            Some(node) => node,
        };
        *count += 1;

        if lower.map_or(false, |lo| node.key <= *lo) || upper.map_or(false, |hi| node.key >= *hi) {
            return Err(IndexError::InvariantViolated(
                "key out of order for its position".to_string(),
            ));
        }

        let left = Self::check_subtree(&node.left, lower, Some(&node.key), count)?;
        let right = Self::check_subtree(&node.right, Some(&node.key), upper, count)?;

        let actual = 1 + cmp::max(left, right);
        if node.height != actual {
            return Err(IndexError::InvariantViolated(format!(
                "cached height {} but subtree height is {}",
                node.height, actual
            )));
        }
        if left.abs_diff(right) > 1 {
            return Err(IndexError::InvariantViolated(format!(
                "unbalanced node: left height {}, right height {}",
                left, right
            )));
        }
        Ok(actual)
    }

    fn insert_at(
        link: Link<K, V>,
        key: K,
        value: V,
        metrics: &IndexMetrics,
    ) -> (Box<Node<K, V>>, Option<V>) {
        let mut node = match link {
            None => return (Node::leaf(key, value), None),
            Some(node) => node,
        };

        let previous = match key.cmp(&node.key) {
            Ordering::Less => {
                let (left, previous) = Self::insert_at(node.left.take(), key, value, metrics);
                node.left = Some(left);
                previous
            }
            Ordering::Greater => {
                let (right, previous) = Self::insert_at(node.right.take(), key, value, metrics);
                node.right = Some(right);
                previous
            }
            // Shape unchanged, nothing to rebalance here
            Ordering::Equal => {
                let previous = mem::replace(&mut node.value, value);
                return (node, Some(previous));
            }
        };

        (Self::rebalance(node, metrics), previous)
    }

    fn delete_at<Q>(link: Link<K, V>, key: &Q, metrics: &IndexMetrics) -> (Link<K, V>, Option<V>)
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut node = match link {
            None => return (None, None),
            Some(node) => node,
        };

        let removed = match key.cmp(node.key.borrow()) {
            Ordering::Less => {
                let (left, removed) = Self::delete_at(node.left.take(), key, metrics);
                node.left = left;
                removed
            }
            Ordering::Greater => {
                let (right, removed) = Self::delete_at(node.right.take(), key, metrics);
                node.right = right;
                removed
            }
            Ordering::Equal => match (node.left.take(), node.right.take()) {
                (None, child) | (child, None) => {
                    let Node { value, .. } = *node;
                    return (child, Some(value));
                }
                (Some(left), Some(right)) => {
                    // Reuse this node for the in-order successor's payload
                    let (right, successor) = Self::take_min(right, metrics);
                    let Node {
                        key: succ_key,
                        value: succ_value,
                        ..
                    } = *successor;
                    node.left = Some(left);
                    node.right = right;
                    node.key = succ_key;
                    Some(mem::replace(&mut node.value, succ_value))
                }
            },
        };

        (Some(Self::rebalance(node, metrics)), removed)
    }

    /// Detach the leftmost node of a subtree, rebalancing the path above it.
    fn take_min(mut node: Box<Node<K, V>>, metrics: &IndexMetrics) -> (Link<K, V>, Box<Node<K, V>>) {
        match node.left.take() {
            None => {
                let right = node.right.take();
                (right, node)
            }
            Some(left) => {
                let (left, min) = Self::take_min(left, metrics);
                node.left = left;
                (Some(Self::rebalance(node, metrics)), min)
            }
        }
    }

    fn rebalance(mut node: Box<Node<K, V>>, metrics: &IndexMetrics) -> Box<Node<K, V>> {
        node.update_height();
        let balance = node.balance_factor();

        if balance > 1 {
            // Left-right case
            if balance_factor(&node.left) < 0 {
                node.left = node.left.take().map(|left| Self::rotate_left(left, metrics));
            }
            return Self::rotate_right(node, metrics);
        }

        if balance < -1 {
            // Right-left case
            if balance_factor(&node.right) > 0 {
                node.right = node.right.take().map(|right| Self::rotate_right(right, metrics));
            }
            return Self::rotate_left(node, metrics);
        }

        node
    }

    fn rotate_right(mut top: Box<Node<K, V>>, metrics: &IndexMetrics) -> Box<Node<K, V>> {
        let mut pivot = match top.left.take() {
            Some(pivot) => pivot,
            None => return top,
        };
        top.left = pivot.right.take();
        top.update_height();
        pivot.right = Some(top);
        pivot.update_height();
        metrics.record_rotation();
        pivot
    }

    fn rotate_left(mut top: Box<Node<K, V>>, metrics: &IndexMetrics) -> Box<Node<K, V>> {
        let mut pivot = match top.right.take() {
            Some(pivot) => pivot,
            None => return top,
        };
        top.right = pivot.left.take();
        top.update_height();
        pivot.left = Some(top);
        pivot.update_height();
        metrics.record_rotation();
        pivot
    }
}

impl<K: Ord, V> Default for AvlTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for AvlTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AvlTree")
            .field("len", &self.len)
            .field("height", &height(&self.root))
            .field("root", &self.root)
            .finish()
    }
}
