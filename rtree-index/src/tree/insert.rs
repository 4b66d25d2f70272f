//! Insertion: branch selection, recursive descent and split propagation.

use super::rtree_impl::RTree;
use super::rtree_types::{Branch, Child, Node, NodeId};
use super::split::SplitStrategy;
use crate::rect::Rect;

/// Slot of the branch of `node` that needs the least enlargement to cover
/// `rect`. Ties go to the smaller branch, then to the lowest slot.
///
/// # Panics
///
/// Panics if the node has no branches.
pub(crate) fn pick_branch<const D: usize>(rect: &Rect<D>, node: &Node<D>) -> usize {
    let mut best: Option<(usize, f64, f64)> = None;

    for (slot, branch) in node.branches() {
        let area = branch.rect.volume_heuristic();
        let increase = branch.rect.enlargement(rect);

        let better = match best {
            None => true,
            Some((_, best_increase, best_area)) => {
                increase < best_increase || (increase == best_increase && area < best_area)
            }
        };
        if better {
            best = Some((slot, increase, area));
        }
    }

    match best {
        Some((slot, increase, _)) => {
            log::trace!("Picked slot {} (enlargement {}) for {}", slot, increase, rect);
            slot
        }
        None => panic!("cannot pick a branch of an empty level {} node", node.level()),
    }
}

impl<const D: usize, S: SplitStrategy<D>> RTree<D, S> {
    /// Inserts `child` under `rect` into a node at `level`, splitting and
    /// growing the root as needed. Level 0 inserts a record; higher levels
    /// re-attach a subtree. Returns true if the root grew.
    ///
    /// # Panics
    ///
    /// Panics if `rect` is malformed, `level` is above the root, or the child
    /// kind does not fit the level.
    pub(crate) fn insert_at_level(&mut self, rect: &Rect<D>, child: Child, level: u32) -> bool {
        assert!(rect.is_valid(), "cannot insert malformed rectangle {}", rect);
        let root_level = self.height();
        assert!(
            level <= root_level,
            "insert level {} above root level {}",
            level,
            root_level
        );
        assert_eq!(
            level == 0,
            matches!(child, Child::Record(_)),
            "records belong at level 0, subtrees above it"
        );

        let sibling = match self.insert_recursive(self.root, rect, child, level) {
            Some(sibling) => sibling,
            None => return false,
        };

        let new_level = root_level + 1;
        let mut new_root = Node::new(new_level, self.fanout.capacity(new_level));
        for id in [self.root, sibling] {
            let cover = self.arena.get(id).bounding_rect();
            if new_root.add_branch(Branch::new(cover, Child::Node(id))).is_err() {
                panic!("internal fan-out cannot hold two branches");
            }
        }
        self.root = self.arena.allocate(new_root);

        log::debug!("Root split, tree grew to level {}", new_level);
        true
    }

    /// Descends from `node_id` to `level` and adds the branch there. Returns
    /// the new sibling if `node_id` itself had to split.
    fn insert_recursive(
        &mut self,
        node_id: NodeId,
        rect: &Rect<D>,
        child: Child,
        level: u32,
    ) -> Option<NodeId> {
        let node = self.arena.get(node_id);
        if node.level() == level {
            return self.add_branch(node_id, Branch::new(*rect, child));
        }

        let slot = pick_branch(rect, node);
        let child_id = self.arena.child_of(node_id, slot);

        match self.insert_recursive(child_id, rect, child, level) {
            None => {
                let node = self.arena.get_mut(node_id);
                let widened = node.branch(slot).map_or(*rect, |b| b.rect.union(rect));
                node.set_branch_rect(slot, widened);
                None
            }
            Some(split_off) => {
                let child_cover = self.arena.get(child_id).bounding_rect();
                self.arena.get_mut(node_id).set_branch_rect(slot, child_cover);

                let sibling_cover = self.arena.get(split_off).bounding_rect();
                self.add_branch(node_id, Branch::new(sibling_cover, Child::Node(split_off)))
            }
        }
    }

    /// Adds `branch` to the node, splitting it when full. Returns the new
    /// sibling on split.
    fn add_branch(&mut self, node_id: NodeId, branch: Branch<D>) -> Option<NodeId> {
        match self.arena.get_mut(node_id).add_branch(branch) {
            Ok(_) => None,
            Err(overflow) => Some(self.split_node(node_id, overflow)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::rtree_types::RecordId;

    fn leaf_with(rects: &[Rect<2>]) -> Node<2> {
        let mut node = Node::new(0, 8);
        for (i, rect) in rects.iter().enumerate() {
            node.add_branch(Branch::new(*rect, Child::Record(i as RecordId)))
                .unwrap();
        }
        node
    }

    #[test]
    fn test_pick_branch_least_enlargement() {
        let node = leaf_with(&[
            Rect::new_2d(0.0, 0.0, 10.0, 10.0),
            Rect::new_2d(20.0, 20.0, 21.0, 21.0),
        ]);
        let rect = Rect::new_2d(21.0, 21.0, 22.0, 22.0);
        assert_eq!(pick_branch(&rect, &node), 1);
    }

    #[test]
    fn test_pick_branch_ties_go_to_smaller_branch() {
        // Both already contain the point: no enlargement, the smaller wins.
        let node = leaf_with(&[
            Rect::new_2d(0.0, 0.0, 10.0, 10.0),
            Rect::new_2d(1.0, 1.0, 3.0, 3.0),
        ]);
        assert_eq!(pick_branch(&Rect::point([2.0, 2.0]), &node), 1);
    }

    #[test]
    fn test_pick_branch_full_tie_goes_to_first_slot() {
        let same = Rect::new_2d(0.0, 0.0, 1.0, 1.0);
        let node = leaf_with(&[same, same, same]);
        assert_eq!(pick_branch(&Rect::point([0.5, 0.5]), &node), 0);
    }

    #[test]
    #[should_panic(expected = "empty")]
    fn test_pick_branch_empty_node_panics() {
        pick_branch(&Rect::point([0.0, 0.0]), &Node::<2>::new(1, 4));
    }

    #[test]
    fn test_ancestor_rects_widen_on_insert() {
        let mut tree = RTree::<2>::builder()
            .leaf_fanout(2)
            .internal_fanout(2)
            .build()
            .unwrap();
        for i in 0..3u64 {
            let c = i as f64;
            tree.insert(&Rect::new_2d(c, c, c + 1.0, c + 1.0), i);
        }
        assert_eq!(tree.height(), 1);

        tree.insert(&Rect::new_2d(-5.0, -5.0, -4.0, -4.0), 10);
        let report = tree.check_integrity();
        assert!(report.is_valid, "{:?}", report.errors);
        assert_eq!(tree.bounds(), Some(Rect::new_2d(-5.0, -5.0, 3.0, 3.0)));
    }

    #[test]
    fn test_splits_propagate_to_new_root_levels() {
        let mut tree = RTree::<2>::builder()
            .leaf_fanout(2)
            .internal_fanout(2)
            .build()
            .unwrap();
        let mut growths = 0;
        for i in 0..64u64 {
            let c = i as f64;
            if tree.insert(&Rect::new_2d(c, 0.0, c + 0.5, 0.5), i) {
                growths += 1;
            }
        }

        assert_eq!(growths, tree.height());
        assert!(tree.height() >= 5);
        assert!(tree.check_integrity().is_valid);
    }

    #[test]
    #[should_panic(expected = "above root level")]
    fn test_insert_above_root_level_panics() {
        let mut tree = RTree::<2>::new();
        tree.insert_at_level(&Rect::point([0.0, 0.0]), Child::Node(NodeId::new(0)), 1);
    }
}
