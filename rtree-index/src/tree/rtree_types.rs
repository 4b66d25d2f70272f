//! Core types and data structures for the R-Tree.
//!
//! This module defines the fundamental types used throughout the tree:
//! - Error types and result types
//! - Node handles, branch payloads and the node record
//! - Statistics structures

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::rect::Rect;

// ============================================================================
// Error Types
// ============================================================================

/// Errors reported by fallible constructors and configuration changes.
///
/// Contract violations inside tree operations (a malformed rectangle handed
/// to `insert`, an out-of-range level) are not errors: they panic, since
/// continuing would corrupt the index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid rectangle: {0}")]
    InvalidRect(String),

    #[error("Fan-out is fixed while the tree holds entries")]
    ConfigurationLocked,
}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Opaque identifier stored in leaf entries. Never interpreted by the tree.
pub type RecordId = u64;

// ============================================================================
// Node Types
// ============================================================================

/// Stable handle of a node inside the tree's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        match u32::try_from(index) {
            Ok(raw) => Self(raw),
            Err(_) => panic!("node arena exceeded {} nodes", u32::MAX),
        }
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a branch points at.
///
/// Internal nodes own their children through `Node`; leaf nodes hold
/// `Record` identifiers that belong to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Child {
    /// Subtree owned by the branch (internal nodes only)
    Node(NodeId),
    /// Caller-supplied record identifier (leaf nodes only)
    Record(RecordId),
}

impl Child {
    /// The child node handle, if this branch points at a subtree.
    pub fn node(self) -> Option<NodeId> {
        match self {
            Child::Node(id) => Some(id),
            Child::Record(_) => None,
        }
    }

    /// The record identifier, if this is a leaf entry.
    pub fn record(self) -> Option<RecordId> {
        match self {
            Child::Record(id) => Some(id),
            Child::Node(_) => None,
        }
    }
}

/// A slot's content: the bounding rectangle and what it covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Branch<const D: usize> {
    pub rect: Rect<D>,
    pub child: Child,
}

impl<const D: usize> Branch<D> {
    pub fn new(rect: Rect<D>, child: Child) -> Self {
        Self { rect, child }
    }
}

/// A tree node: a fixed number of branch slots, the occupied count and the
/// level (0 for leaves, one more per step towards the root).
///
/// Empty slots are `None`; `count` always equals the number of occupied
/// slots. Occupied slots keep their position until disconnected, so slot
/// order is stable between mutations.
#[derive(Debug, Clone)]
pub struct Node<const D: usize> {
    level: u32,
    count: usize,
    slots: Box<[Option<Branch<D>>]>,
}

impl<const D: usize> Node<D> {
    /// Creates an empty node with `capacity` slots.
    pub(crate) fn new(level: u32, capacity: usize) -> Self {
        Self {
            level,
            count: 0,
            slots: vec![None; capacity].into_boxed_slice(),
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn is_leaf(&self) -> bool {
        self.level == 0
    }

    /// Number of occupied slots.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Maximum number of branches (the fan-out for this node's level).
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Minimum number of branches a non-root node must keep.
    pub fn min_fill(&self) -> usize {
        min_fill_for(self.capacity())
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.capacity()
    }

    pub fn is_underfull(&self) -> bool {
        self.count < self.min_fill()
    }

    /// The branch stored in `slot`, if occupied.
    pub fn branch(&self, slot: usize) -> Option<&Branch<D>> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Occupied slots in slot order, with their slot index.
    pub fn branches(&self) -> impl Iterator<Item = (usize, &Branch<D>)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, branch)| branch.as_ref().map(|b| (slot, b)))
    }

    /// Bounding union of all occupied branches; null for an empty node.
    pub fn bounding_rect(&self) -> Rect<D> {
        self.branches()
            .fold(Rect::null(), |cover, (_, branch)| cover.union(&branch.rect))
    }

    /// Puts `branch` in the first empty slot and returns that slot.
    /// A full node hands the branch back so the caller can split.
    pub(crate) fn add_branch(&mut self, branch: Branch<D>) -> Result<usize, Branch<D>> {
        match self.slots.iter().position(Option::is_none) {
            Some(slot) => {
                self.slots[slot] = Some(branch);
                self.count += 1;
                Ok(slot)
            }
            None => Err(branch),
        }
    }

    /// Clears `slot` and returns its branch. The child is not released;
    /// that is the caller's decision.
    ///
    /// # Panics
    ///
    /// Panics if the slot is out of range or already empty.
    pub(crate) fn disconnect_branch(&mut self, slot: usize) -> Branch<D> {
        assert!(slot < self.capacity(), "slot {} out of range", slot);
        match self.slots[slot].take() {
            Some(branch) => {
                self.count -= 1;
                branch
            }
            None => panic!("slot {} is already empty", slot),
        }
    }

    /// Replaces the rectangle of an occupied slot.
    pub(crate) fn set_branch_rect(&mut self, slot: usize, rect: Rect<D>) {
        match self.slots.get_mut(slot).and_then(Option::as_mut) {
            Some(branch) => branch.rect = rect,
            None => panic!("slot {} is empty", slot),
        }
    }

    /// Empties every slot, returning the branches in slot order.
    pub(crate) fn take_branches(&mut self) -> Vec<Branch<D>> {
        self.count = 0;
        self.slots.iter_mut().filter_map(Option::take).collect()
    }

    /// Consumes the node, returning its branches in slot order.
    pub(crate) fn into_branches(self) -> Vec<Branch<D>> {
        self.slots.into_vec().into_iter().flatten().collect()
    }
}

/// Minimum fill for a node of the given capacity: half, but at least one.
pub(crate) fn min_fill_for(capacity: usize) -> usize {
    (capacity / 2).max(1)
}

// ============================================================================
// Statistics
// ============================================================================

/// Statistics about the shape of an R-Tree
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RTreeStats {
    pub total_entries: u64,
    /// Level of the root (0 while the root is a leaf)
    pub tree_height: u32,
    pub node_count: u64,
    pub leaf_count: u64,
    pub leaf_fanout: usize,
    pub internal_fanout: usize,
    pub page_size: usize,
    /// Mean occupied slots per leaf, divided by the leaf fan-out (0.0 - 1.0)
    pub average_leaf_fill: f64,
}
