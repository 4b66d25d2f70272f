//! Range queries.
//!
//! All queries share one traversal. Internal branches are entered only when
//! the [`SearchMode`] says their cover can hold a match; leaf entries are
//! reported to a visitor, which may stop the traversal by returning
//! [`ControlFlow::Break`]. Entries come back in slot order, which carries no
//! geometric or insertion meaning.

use std::ops::ControlFlow;

use super::node_arena::NodeArena;
use super::rtree_impl::RTree;
use super::rtree_types::{Child, NodeId, RecordId};
use super::split::SplitStrategy;
use crate::rect::Rect;

/// How a query rectangle selects entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchMode {
    /// Entries that share at least one point with the query
    Overlapping,
    /// Entries that lie entirely inside the query
    Within,
    /// Entries that enclose the whole query
    Enclosing,
}

impl SearchMode {
    /// True if a leaf entry with rectangle `entry` is a hit for `query`.
    pub fn matches<const D: usize>(self, entry: &Rect<D>, query: &Rect<D>) -> bool {
        match self {
            SearchMode::Overlapping => entry.overlaps(query),
            SearchMode::Within => entry.contained_by(query),
            SearchMode::Enclosing => entry.contains(query),
        }
    }

    /// True if a subtree covered by `branch` may hold a hit for `query`.
    pub fn descends<const D: usize>(self, branch: &Rect<D>, query: &Rect<D>) -> bool {
        match self {
            // An entry inside the query can sit under a branch that only
            // partly overlaps it.
            SearchMode::Overlapping | SearchMode::Within => branch.overlaps(query),
            SearchMode::Enclosing => branch.contains(query),
        }
    }
}

impl<const D: usize, S: SplitStrategy<D>> RTree<D, S> {
    /// Reports every entry matching `query` under `mode` to `visitor`.
    ///
    /// Returns false if the visitor stopped the traversal early.
    ///
    /// # Panics
    ///
    /// Panics if `query` is null or has a min above its max.
    pub fn search<F>(&self, mode: SearchMode, query: &Rect<D>, mut visitor: F) -> bool
    where
        F: FnMut(RecordId, &Rect<D>) -> ControlFlow<()>,
    {
        assert!(query.is_valid(), "cannot search with malformed rectangle {}", query);
        self.search_node(self.root, mode, query, &mut visitor).is_continue()
    }

    fn search_node<F>(
        &self,
        node_id: NodeId,
        mode: SearchMode,
        query: &Rect<D>,
        visitor: &mut F,
    ) -> ControlFlow<()>
    where
        F: FnMut(RecordId, &Rect<D>) -> ControlFlow<()>,
    {
        for (_, branch) in self.arena.get(node_id).branches() {
            match branch.child {
                Child::Record(id) => {
                    if mode.matches(&branch.rect, query) {
                        visitor(id, &branch.rect)?;
                    }
                }
                Child::Node(child) => {
                    if mode.descends(&branch.rect, query) {
                        self.search_node(child, mode, query, visitor)?;
                    }
                }
            }
        }
        ControlFlow::Continue(())
    }

    pub fn search_overlapping<F>(&self, query: &Rect<D>, visitor: F) -> bool
    where
        F: FnMut(RecordId, &Rect<D>) -> ControlFlow<()>,
    {
        self.search(SearchMode::Overlapping, query, visitor)
    }

    pub fn search_within<F>(&self, query: &Rect<D>, visitor: F) -> bool
    where
        F: FnMut(RecordId, &Rect<D>) -> ControlFlow<()>,
    {
        self.search(SearchMode::Within, query, visitor)
    }

    pub fn search_enclosing<F>(&self, query: &Rect<D>, visitor: F) -> bool
    where
        F: FnMut(RecordId, &Rect<D>) -> ControlFlow<()>,
    {
        self.search(SearchMode::Enclosing, query, visitor)
    }

    /// All matching entries with their rectangles.
    pub fn collect(&self, mode: SearchMode, query: &Rect<D>) -> Vec<(RecordId, Rect<D>)> {
        let mut hits = Vec::new();
        self.search(mode, query, |id, rect| {
            hits.push((id, *rect));
            ControlFlow::Continue(())
        });
        hits
    }

    pub fn collect_overlapping(&self, query: &Rect<D>) -> Vec<(RecordId, Rect<D>)> {
        self.collect(SearchMode::Overlapping, query)
    }

    pub fn collect_within(&self, query: &Rect<D>) -> Vec<(RecordId, Rect<D>)> {
        self.collect(SearchMode::Within, query)
    }

    pub fn collect_enclosing(&self, query: &Rect<D>) -> Vec<(RecordId, Rect<D>)> {
        self.collect(SearchMode::Enclosing, query)
    }

    /// The first matching entry found, if any. Stops at the first hit; which
    /// entry that is depends on the tree layout.
    pub fn first_hit(&self, mode: SearchMode, query: &Rect<D>) -> Option<RecordId> {
        let mut hit = None;
        self.search(mode, query, |id, _| {
            hit = Some(id);
            ControlFlow::Break(())
        });
        hit
    }

    /// Lazily yields the entries overlapping `query`.
    pub fn iter_overlapping(&self, query: &Rect<D>) -> SearchIter<'_, D> {
        self.iter_matching(SearchMode::Overlapping, query)
    }

    /// Lazily yields the entries matching `query` under `mode`.
    ///
    /// # Panics
    ///
    /// Panics if `query` is null or has a min above its max.
    pub fn iter_matching(&self, mode: SearchMode, query: &Rect<D>) -> SearchIter<'_, D> {
        assert!(query.is_valid(), "cannot search with malformed rectangle {}", query);
        SearchIter::new(&self.arena, self.root, Some((mode, *query)))
    }

    /// Lazily yields every entry.
    pub fn iter(&self) -> SearchIter<'_, D> {
        SearchIter::new(&self.arena, self.root, None)
    }
}

/// Iterator over matching entries, walking the tree with an explicit stack
/// of (node, next slot) frames.
#[derive(Debug, Clone)]
pub struct SearchIter<'a, const D: usize> {
    arena: &'a NodeArena<D>,
    filter: Option<(SearchMode, Rect<D>)>,
    stack: Vec<(NodeId, usize)>,
}

impl<'a, const D: usize> SearchIter<'a, D> {
    fn new(arena: &'a NodeArena<D>, root: NodeId, filter: Option<(SearchMode, Rect<D>)>) -> Self {
        Self {
            arena,
            filter,
            stack: vec![(root, 0)],
        }
    }
}

impl<'a, const D: usize> Iterator for SearchIter<'a, D> {
    type Item = (RecordId, Rect<D>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.last_mut() {
            let (node_id, slot) = *frame;
            let node = self.arena.get(node_id);
            if slot >= node.capacity() {
                self.stack.pop();
                continue;
            }
            frame.1 += 1;

            let branch = match node.branch(slot) {
                Some(branch) => branch,
                None => continue,
            };
            match branch.child {
                Child::Record(id) => {
                    let hit = self
                        .filter
                        .map_or(true, |(mode, query)| mode.matches(&branch.rect, &query));
                    if hit {
                        return Some((id, branch.rect));
                    }
                }
                Child::Node(child) => {
                    let enter = self
                        .filter
                        .map_or(true, |(mode, query)| mode.descends(&branch.rect, &query));
                    if enter {
                        self.stack.push((child, 0));
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted_ids(hits: Vec<(RecordId, Rect<2>)>) -> Vec<RecordId> {
        let mut ids: Vec<RecordId> = hits.into_iter().map(|(id, _)| id).collect();
        ids.sort_unstable();
        ids
    }

    fn scattered_tree() -> RTree<2> {
        let mut tree = RTree::<2>::builder()
            .leaf_fanout(4)
            .internal_fanout(4)
            .build()
            .unwrap();
        for i in 0..100u64 {
            let x = (i % 10) as f64 * 10.0;
            let y = (i / 10) as f64 * 10.0;
            tree.insert(&Rect::new_2d(x, y, x + 5.0, y + 5.0), i);
        }
        tree
    }

    #[test]
    fn test_search_modes_on_nested_rects() {
        let mut tree = RTree::<2>::new();
        tree.insert(&Rect::new_2d(0.0, 0.0, 10.0, 10.0), 1);
        tree.insert(&Rect::new_2d(2.0, 2.0, 3.0, 3.0), 2);
        tree.insert(&Rect::new_2d(8.0, 8.0, 12.0, 12.0), 3);

        let query = Rect::new_2d(1.0, 1.0, 5.0, 5.0);
        assert_eq!(sorted_ids(tree.collect_overlapping(&query)), vec![1, 2]);
        assert_eq!(sorted_ids(tree.collect_within(&query)), vec![2]);
        assert_eq!(sorted_ids(tree.collect_enclosing(&query)), vec![1]);
    }

    #[test]
    fn test_touching_edges_overlap() {
        let mut tree = RTree::<2>::new();
        tree.insert(&Rect::new_2d(0.0, 0.0, 1.0, 1.0), 1);
        let hits = tree.collect_overlapping(&Rect::new_2d(1.0, 1.0, 2.0, 2.0));
        assert_eq!(sorted_ids(hits), vec![1]);
    }

    #[test]
    fn test_point_query_is_hit_test() {
        let tree = scattered_tree();
        let hits = tree.collect_overlapping(&Rect::point([12.0, 33.0]));
        assert_eq!(sorted_ids(hits), vec![31]);
        assert!(tree.collect_overlapping(&Rect::point([7.0, 7.0])).is_empty());
    }

    #[test]
    fn test_within_finds_entries_under_partly_overlapping_branches() {
        let tree = scattered_tree();
        let query = Rect::new_2d(15.0, 15.0, 46.0, 26.0);
        assert_eq!(sorted_ids(tree.collect_within(&query)), vec![22, 23, 24]);
    }

    #[test]
    fn test_enclosing_prunes_but_finds() {
        let tree = scattered_tree();
        let query = Rect::new_2d(91.0, 91.0, 92.0, 92.0);
        assert_eq!(sorted_ids(tree.collect_enclosing(&query)), vec![99]);
    }

    #[test]
    fn test_early_stop() {
        let tree = scattered_tree();
        let everything = Rect::new_2d(-1.0, -1.0, 200.0, 200.0);

        let mut seen = Vec::new();
        let completed = tree.search_overlapping(&everything, |id, _| {
            seen.push(id);
            ControlFlow::Break(())
        });
        assert!(!completed);
        assert_eq!(seen.len(), 1);

        let completed = tree.search_overlapping(&everything, |_, _| ControlFlow::Continue(()));
        assert!(completed);
    }

    #[test]
    fn test_first_hit() {
        let tree = scattered_tree();
        assert_eq!(tree.first_hit(SearchMode::Overlapping, &Rect::point([51.0, 61.0])), Some(65));
        assert_eq!(tree.first_hit(SearchMode::Enclosing, &Rect::new_2d(0.0, 0.0, 50.0, 50.0)), None);
    }

    #[test]
    fn test_iterator_matches_visitor() {
        let tree = scattered_tree();
        let query = Rect::new_2d(20.0, 20.0, 60.0, 40.0);

        let mut from_iter: Vec<RecordId> = tree.iter_overlapping(&query).map(|(id, _)| id).collect();
        from_iter.sort_unstable();
        assert_eq!(from_iter, sorted_ids(tree.collect_overlapping(&query)));

        let mut from_within: Vec<RecordId> = tree
            .iter_matching(SearchMode::Within, &query)
            .map(|(id, _)| id)
            .collect();
        from_within.sort_unstable();
        assert_eq!(from_within, sorted_ids(tree.collect_within(&query)));
    }

    #[test]
    fn test_iter_yields_every_entry() {
        let tree = scattered_tree();
        let mut ids: Vec<RecordId> = tree.iter().map(|(id, _)| id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..100).collect::<Vec<_>>());

        assert_eq!(RTree::<2>::new().iter().count(), 0);
    }

    #[test]
    fn test_empty_tree_search_completes() {
        let tree = RTree::<3>::new();
        let completed = tree.search_within(&Rect::new([0.0; 3], [1.0; 3]), |_, _| {
            ControlFlow::Break(())
        });
        assert!(completed);
    }

    #[test]
    fn test_mode_predicates() {
        let outer = Rect::new_2d(0.0, 0.0, 4.0, 4.0);
        let inner = Rect::new_2d(1.0, 1.0, 2.0, 2.0);

        assert!(SearchMode::Within.matches(&inner, &outer));
        assert!(!SearchMode::Within.matches(&outer, &inner));
        assert!(SearchMode::Enclosing.matches(&outer, &inner));
        assert!(SearchMode::Within.descends(&inner, &outer));
        assert!(!SearchMode::Enclosing.descends(&inner, &outer));
    }

    #[test]
    #[should_panic(expected = "malformed")]
    fn test_null_query_panics() {
        let tree = RTree::<2>::new();
        tree.collect_overlapping(&Rect::null());
    }
}
