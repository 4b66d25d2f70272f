//! Node storage for the R-Tree.
//!
//! Nodes live in a slab addressed by [`NodeId`]. A freed slot goes on a free
//! list and is handed out again by the next allocation, the way freed pages
//! are reused in a page file. Ownership stays tree-shaped: the only holder of
//! a `NodeId` is the parent branch (or the tree's root slot).

use super::rtree_types::{Child, Node, NodeId};

#[derive(Debug, Clone, Default)]
pub(crate) struct NodeArena<const D: usize> {
    slots: Vec<Option<Node<D>>>,
    free: Vec<NodeId>,
}

impl<const D: usize> NodeArena<D> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Stores `node` and returns its handle, reusing a freed slot when one
    /// is available.
    pub(crate) fn allocate(&mut self, node: Node<D>) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.slots[id.index()] = Some(node);
            return id;
        }

        let id = NodeId::new(self.slots.len());
        self.slots.push(Some(node));
        id
    }

    /// Releases a single node and returns it. Children referenced by its
    /// branches are left alone.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a live node.
    pub(crate) fn free(&mut self, id: NodeId) -> Node<D> {
        match self.slots.get_mut(id.index()).and_then(Option::take) {
            Some(node) => {
                self.free.push(id);
                node
            }
            None => panic!("node {} is not allocated", id),
        }
    }

    /// Releases `id` and every node below it. Returns the number of nodes
    /// released.
    pub(crate) fn free_recursive(&mut self, id: NodeId) -> usize {
        let mut released = 0;
        let mut pending = vec![id];

        while let Some(next) = pending.pop() {
            let node = self.free(next);
            if !node.is_leaf() {
                pending.extend(node.branches().filter_map(|(_, b)| b.child.node()));
            }
            released += 1;
        }
        released
    }

    /// # Panics
    ///
    /// Panics if `id` is not a live node.
    pub(crate) fn get(&self, id: NodeId) -> &Node<D> {
        match self.slots.get(id.index()).and_then(Option::as_ref) {
            Some(node) => node,
            None => panic!("node {} is not allocated", id),
        }
    }

    /// # Panics
    ///
    /// Panics if `id` is not a live node.
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node<D> {
        match self.slots.get_mut(id.index()).and_then(Option::as_mut) {
            Some(node) => node,
            None => panic!("node {} is not allocated", id),
        }
    }

    /// Child node handle of an internal node's slot.
    ///
    /// # Panics
    ///
    /// Panics if the slot is empty or holds a record.
    pub(crate) fn child_of(&self, id: NodeId, slot: usize) -> NodeId {
        match self.get(id).branch(slot).map(|b| b.child) {
            Some(Child::Node(child)) => child,
            Some(Child::Record(record)) => {
                panic!("node {} slot {} holds record {}, not a subtree", id, slot, record)
            }
            None => panic!("node {} slot {} is empty", id, slot),
        }
    }

    pub(crate) fn is_live(&self, id: NodeId) -> bool {
        matches!(self.slots.get(id.index()), Some(Some(_)))
    }

    /// Number of allocated nodes.
    pub(crate) fn live_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Handles of all allocated nodes.
    pub(crate) fn live_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| NodeId::new(index))
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}
