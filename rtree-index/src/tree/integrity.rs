//! Structural integrity checks.

use std::collections::HashSet;

use super::rtree_impl::RTree;
use super::rtree_types::{Child, NodeId};
use super::split::SplitStrategy;

/// Integrity check report
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrityReport {
    /// Total nodes reached from the root
    pub nodes_checked: u64,
    /// Leaf entries reached from the root
    pub entries_found: u64,
    /// Allocated nodes that are unreachable from the root
    pub orphaned_nodes: Vec<NodeId>,
    /// Summary of findings
    pub is_valid: bool,
    /// Detailed error messages
    pub errors: Vec<String>,
}

impl IntegrityReport {
    pub fn new() -> Self {
        Self {
            nodes_checked: 0,
            entries_found: 0,
            orphaned_nodes: Vec::new(),
            is_valid: true,
            errors: Vec::new(),
        }
    }

    fn fail(&mut self, message: String) {
        self.is_valid = false;
        self.errors.push(message);
    }
}

impl Default for IntegrityReport {
    fn default() -> Self {
        Self::new()
    }
}

impl<const D: usize, S: SplitStrategy<D>> RTree<D, S> {
    /// Walks the whole tree and verifies its invariants:
    ///
    /// - every leaf sits at level 0 and each edge descends exactly one level
    /// - every internal branch rectangle is the exact cover of its child
    /// - leaves hold only records and internal nodes only subtrees
    /// - non-root nodes hold between minimum fill and capacity branches
    /// - an internal root holds at least two branches
    /// - node capacities match the configured fan-outs
    /// - every allocated node is reachable exactly once
    /// - the entry count matches [`RTree::len`]
    pub fn check_integrity(&self) -> IntegrityReport {
        let mut report = IntegrityReport::new();
        let mut visited = HashSet::new();
        let mut pending = vec![(self.root, None::<u32>)];

        let root = self.root_node();
        if !root.is_leaf() && root.count() < 2 {
            report.fail(format!(
                "Internal root {} holds {} branches",
                self.root,
                root.count()
            ));
        }

        while let Some((node_id, expected_level)) = pending.pop() {
            if !visited.insert(node_id) {
                report.fail(format!("Node {} is referenced more than once", node_id));
                continue;
            }
            let node = match self.node(node_id) {
                Some(node) => node,
                None => {
                    report.fail(format!("Node {} is referenced but not allocated", node_id));
                    continue;
                }
            };
            report.nodes_checked += 1;

            if let Some(level) = expected_level {
                if node.level() != level {
                    report.fail(format!(
                        "Node {} is at level {}, expected {}",
                        node_id,
                        node.level(),
                        level
                    ));
                }
                if node.count() < node.min_fill() || node.count() > node.capacity() {
                    report.fail(format!(
                        "Node {} holds {} branches, outside {}..={}",
                        node_id,
                        node.count(),
                        node.min_fill(),
                        node.capacity()
                    ));
                }
            }

            if node.capacity() != self.fanout.capacity(node.level()) {
                report.fail(format!(
                    "Node {} has capacity {}, configured fan-out is {}",
                    node_id,
                    node.capacity(),
                    self.fanout.capacity(node.level())
                ));
            }
            if node.branches().count() != node.count() {
                report.fail(format!(
                    "Node {} counts {} branches but has {} occupied slots",
                    node_id,
                    node.count(),
                    node.branches().count()
                ));
            }

            for (slot, branch) in node.branches() {
                match (node.is_leaf(), branch.child) {
                    (true, Child::Record(_)) => {
                        report.entries_found += 1;
                        if !branch.rect.is_valid() {
                            report.fail(format!(
                                "Leaf {} slot {} holds malformed rectangle {}",
                                node_id, slot, branch.rect
                            ));
                        }
                    }
                    (false, Child::Node(child)) => {
                        if let Some(child_node) = self.node(child) {
                            let cover = child_node.bounding_rect();
                            if cover != branch.rect {
                                report.fail(format!(
                                    "Node {} slot {} bounds {} but child {} covers {}",
                                    node_id, slot, branch.rect, child, cover
                                ));
                            }
                        }
                        pending.push((child, Some(node.level().saturating_sub(1))));
                    }
                    (true, Child::Node(child)) => {
                        report.fail(format!("Leaf {} slot {} points at node {}", node_id, slot, child))
                    }
                    (false, Child::Record(id)) => report.fail(format!(
                        "Internal node {} slot {} holds record {}",
                        node_id, slot, id
                    )),
                }
            }
        }

        for id in self.arena.live_ids() {
            if !visited.contains(&id) {
                report.orphaned_nodes.push(id);
            }
        }
        if !report.orphaned_nodes.is_empty() {
            report.fail(format!("{} orphaned nodes", report.orphaned_nodes.len()));
        }

        if report.entries_found != self.len as u64 {
            report.fail(format!(
                "Found {} entries, tree reports {}",
                report.entries_found, self.len
            ));
        }

        if !report.is_valid {
            log::error!("Integrity check failed: {:?}", report.errors);
        }
        report
    }
}
