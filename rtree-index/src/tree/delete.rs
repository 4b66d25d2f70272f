//! Deletion with under-fill elimination and reinsertion.
//!
//! Removing a leaf entry may leave its node, and then its ancestors, below
//! minimum fill. Such nodes are cut out of the tree on the way back up and
//! queued; once the descent has finished, every queued node's branches are
//! reinserted at the node's own level and the emptied node is released.
//! Finally a root left with a single child is replaced by that child.

use super::rtree_impl::RTree;
use super::rtree_types::{Child, NodeId, RecordId};
use super::search::SearchMode;
use super::split::SplitStrategy;
use crate::rect::Rect;

/// How a leaf entry is matched against the rectangle passed to delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LeafMatch {
    /// The stored rectangle overlaps the given one.
    Overlapping,
    /// The stored rectangle equals the given one.
    Exact,
}

impl LeafMatch {
    fn accepts<const D: usize>(self, stored: &Rect<D>, rect: &Rect<D>) -> bool {
        match self {
            LeafMatch::Overlapping => stored.overlaps(rect),
            LeafMatch::Exact => stored == rect,
        }
    }
}

impl<const D: usize, S: SplitStrategy<D>> RTree<D, S> {
    pub(crate) fn delete_entry(&mut self, rect: &Rect<D>, id: RecordId) -> bool {
        self.delete_matching_entry(rect, id, LeafMatch::Overlapping)
    }

    fn delete_matching_entry(
        &mut self,
        rect: &Rect<D>,
        id: RecordId,
        leaf_match: LeafMatch,
    ) -> bool {
        assert!(rect.is_valid(), "cannot remove with malformed rectangle {}", rect);

        let mut evicted = Vec::new();
        if !self.delete_recursive(self.root, rect, id, leaf_match, &mut evicted) {
            return false;
        }
        self.len -= 1;

        if !evicted.is_empty() {
            log::debug!("Reinserting branches of {} evicted nodes", evicted.len());
        }
        while let Some(node_id) = evicted.pop() {
            let node = self.arena.free(node_id);
            let level = node.level();
            for branch in node.into_branches() {
                self.insert_at_level(&branch.rect, branch.child, level);
            }
        }

        self.collapse_root();
        true
    }

    /// Removes the record below `node_id`. Children that drop under minimum
    /// fill are disconnected and pushed onto `evicted`.
    fn delete_recursive(
        &mut self,
        node_id: NodeId,
        rect: &Rect<D>,
        id: RecordId,
        leaf_match: LeafMatch,
        evicted: &mut Vec<NodeId>,
    ) -> bool {
        let node = self.arena.get(node_id);

        if node.is_leaf() {
            let target = Child::Record(id);
            let slot = node
                .branches()
                .find(|(_, branch)| {
                    branch.child == target && leaf_match.accepts(&branch.rect, rect)
                })
                .map(|(slot, _)| slot);
            return match slot {
                Some(slot) => {
                    self.arena.get_mut(node_id).disconnect_branch(slot);
                    true
                }
                None => false,
            };
        }

        let candidates: Vec<usize> = node
            .branches()
            .filter(|(_, branch)| branch.rect.overlaps(rect))
            .map(|(slot, _)| slot)
            .collect();

        for slot in candidates {
            let child_id = self.arena.child_of(node_id, slot);
            if !self.delete_recursive(child_id, rect, id, leaf_match, evicted) {
                continue;
            }

            let child = self.arena.get(child_id);
            if child.is_underfull() {
                log::debug!(
                    "Evicting level {} node {} with {} branches",
                    child.level(),
                    child_id,
                    child.count()
                );
                self.arena.get_mut(node_id).disconnect_branch(slot);
                evicted.push(child_id);
            } else {
                let cover = child.bounding_rect();
                self.arena.get_mut(node_id).set_branch_rect(slot, cover);
            }
            return true;
        }
        false
    }

    /// Replaces an internal root holding one branch by its child, repeatedly.
    fn collapse_root(&mut self) {
        loop {
            let root = self.arena.get(self.root);
            if root.is_leaf() || root.count() != 1 {
                return;
            }

            let only_child = match root.branches().next().map(|(_, branch)| branch.child) {
                Some(Child::Node(child)) => child,
                other => panic!("internal root holds {:?} instead of a subtree", other),
            };
            self.arena.free(self.root);
            self.root = only_child;

            log::debug!("Collapsed root, tree shrank to level {}", self.height());
        }
    }

    /// Removes every entry matching `query` under `mode` and returns their
    /// identifiers. Each entry is removed by its exact rectangle, so other
    /// entries sharing an identifier are left alone.
    pub fn remove_matching(&mut self, mode: SearchMode, query: &Rect<D>) -> Vec<RecordId> {
        let matches = self.collect(mode, query);
        let mut removed = Vec::with_capacity(matches.len());

        for (id, rect) in matches {
            if self.delete_matching_entry(&rect, id, LeafMatch::Exact) {
                removed.push(id);
            }
        }
        removed
    }
}
