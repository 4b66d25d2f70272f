//! RTree implementation.

use std::marker::PhantomData;

use super::node_arena::NodeArena;
use super::rtree_config::{Fanout, TreeConfig};
use super::rtree_types::{Child, IndexError, IndexResult, Node, NodeId, RTreeStats, RecordId};
use super::split::{QuadraticSplit, SplitStrategy};
use crate::rect::Rect;

/// In-memory R-Tree over `D`-dimensional rectangles.
///
/// Each entry is a rectangle paired with a caller-owned [`RecordId`]. The tree
/// never interprets the identifier; the same identifier may appear under
/// several rectangles.
///
/// Nodes hold up to a fixed number of branches, derived from a target page
/// size (see [`TreeConfig`]). Splits are delegated to `S`, which defaults to
/// [`QuadraticSplit`].
///
/// The tree is single-threaded: share it behind an external lock when
/// readers and a writer must coexist.
///
/// # Example
/// ```rust
/// use rtree_index::{RTree, Rect};
///
/// let mut tree = RTree::<2>::new();
/// tree.insert(&Rect::new_2d(0.0, 0.0, 1.0, 1.0), 1);
/// tree.insert(&Rect::new_2d(5.0, 5.0, 6.0, 6.0), 2);
///
/// let hits = tree.collect_overlapping(&Rect::new_2d(0.5, 0.5, 2.0, 2.0));
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].0, 1);
/// ```
#[derive(Debug, Clone)]
pub struct RTree<const D: usize, S = QuadraticSplit> {
    pub(crate) arena: NodeArena<D>,
    pub(crate) root: NodeId,
    pub(crate) fanout: Fanout,
    pub(crate) split: S,
    pub(crate) len: usize,
}

impl<const D: usize> RTree<D, QuadraticSplit> {
    /// Creates an empty tree with the default 512-byte page.
    ///
    /// # Panics
    ///
    /// Panics if the default page cannot hold two branches of `D` dimensions
    /// (or `D` is zero). Use [`RTree::builder`] to pick a larger page.
    pub fn new() -> Self {
        match Self::builder().build() {
            Ok(tree) => tree,
            Err(err) => panic!("default configuration unusable for {} dimensions: {}", D, err),
        }
    }

    /// Starts a builder with the default configuration and split strategy.
    pub fn builder() -> RTreeBuilder<D, QuadraticSplit> {
        RTreeBuilder::new()
    }

    /// Creates an empty tree from an explicit configuration.
    pub fn with_config(config: TreeConfig) -> IndexResult<Self> {
        Self::builder().config(config).build()
    }
}

impl<const D: usize> Default for RTree<D, QuadraticSplit> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const D: usize, S: SplitStrategy<D>> RTree<D, S> {
    fn from_parts(fanout: Fanout, split: S) -> Self {
        let mut arena = NodeArena::new();
        let root = arena.allocate(Node::new(0, fanout.leaf()));
        Self {
            arena,
            root,
            fanout,
            split,
            len: 0,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Level of the root: 0 while the root is a leaf.
    pub fn height(&self) -> u32 {
        self.root_node().level()
    }

    /// Maximum branches per leaf node.
    pub fn leaf_fanout(&self) -> usize {
        self.fanout.leaf()
    }

    /// Maximum branches per internal node.
    pub fn internal_fanout(&self) -> usize {
        self.fanout.internal()
    }

    pub fn page_size(&self) -> usize {
        self.fanout.page_size()
    }

    pub fn split_strategy(&self) -> &S {
        &self.split
    }

    /// Smallest rectangle enclosing every entry, or `None` for an empty tree.
    pub fn bounds(&self) -> Option<Rect<D>> {
        if self.is_empty() {
            None
        } else {
            Some(self.root_node().bounding_rect())
        }
    }

    /// Inserts an entry. Returns true if the root split and the tree grew a
    /// level.
    ///
    /// # Panics
    ///
    /// Panics if `rect` is null or has a min above its max in any dimension.
    pub fn insert(&mut self, rect: &Rect<D>, id: RecordId) -> bool {
        let grew = self.insert_at_level(rect, Child::Record(id), 0);
        self.len += 1;
        grew
    }

    /// Removes the entry with identifier `id` found under `rect`. Returns
    /// true if an entry was removed.
    ///
    /// The entry must carry `id` and its stored rectangle must overlap
    /// `rect`. Anything else leaves the tree unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `rect` is null or has a min above its max in any dimension.
    pub fn remove(&mut self, rect: &Rect<D>, id: RecordId) -> bool {
        self.delete_entry(rect, id)
    }

    /// Releases every node and starts over with an empty leaf root.
    pub fn clear(&mut self) {
        let released = self.arena.free_recursive(self.root);
        log::debug!("Cleared tree: released {} nodes, {} entries", released, self.len);

        self.root = self.arena.allocate(Node::new(0, self.fanout.leaf()));
        self.len = 0;
    }

    /// Changes the leaf fan-out. Only allowed while the tree is empty.
    pub fn set_leaf_fanout(&mut self, fanout: usize) -> IndexResult<()> {
        let config = TreeConfig {
            page_size: self.fanout.page_size(),
            leaf_fanout: Some(fanout),
            internal_fanout: Some(self.fanout.internal()),
        };
        self.reconfigure(config)
    }

    /// Changes the internal fan-out. Only allowed while the tree is empty.
    pub fn set_internal_fanout(&mut self, fanout: usize) -> IndexResult<()> {
        let config = TreeConfig {
            page_size: self.fanout.page_size(),
            leaf_fanout: Some(self.fanout.leaf()),
            internal_fanout: Some(fanout),
        };
        self.reconfigure(config)
    }

    fn reconfigure(&mut self, config: TreeConfig) -> IndexResult<()> {
        if !self.is_empty() {
            return Err(IndexError::ConfigurationLocked);
        }

        self.fanout = config.resolve::<D>()?;
        self.arena.clear();
        self.root = self.arena.allocate(Node::new(0, self.fanout.leaf()));
        Ok(())
    }

    /// Handle of the root node.
    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn root_node(&self) -> &Node<D> {
        self.arena.get(self.root)
    }

    /// The node behind `id`, if it is part of this tree.
    pub fn node(&self, id: NodeId) -> Option<&Node<D>> {
        if self.arena.is_live(id) {
            Some(self.arena.get(id))
        } else {
            None
        }
    }

    /// Get shape statistics
    pub fn stats(&self) -> RTreeStats {
        let mut leaf_count = 0u64;
        let mut node_count = 0u64;
        for id in self.arena.live_ids() {
            node_count += 1;
            if self.arena.get(id).is_leaf() {
                leaf_count += 1;
            }
        }

        let average_leaf_fill = if leaf_count == 0 {
            0.0
        } else {
            self.len as f64 / (leaf_count as f64 * self.fanout.leaf() as f64)
        };

        RTreeStats {
            total_entries: self.len as u64,
            tree_height: self.height(),
            node_count,
            leaf_count,
            leaf_fanout: self.fanout.leaf(),
            internal_fanout: self.fanout.internal(),
            page_size: self.fanout.page_size(),
            average_leaf_fill,
        }
    }
}

/// Builder for [`RTree`].
///
/// # Example
/// ```rust
/// use rtree_index::{LinearSplit, RTree};
///
/// let tree = RTree::<2>::builder()
///     .page_size(1024)
///     .leaf_fanout(8)
///     .split_strategy(LinearSplit)
///     .build()
///     .unwrap();
///
/// assert_eq!(tree.leaf_fanout(), 8);
/// assert_eq!(tree.internal_fanout(), (1024 - 8) / 36);
/// ```
#[derive(Debug, Clone)]
pub struct RTreeBuilder<const D: usize, S = QuadraticSplit> {
    config: TreeConfig,
    split: S,
    _dims: PhantomData<[f64; D]>,
}

impl<const D: usize> RTreeBuilder<D, QuadraticSplit> {
    pub fn new() -> Self {
        Self {
            config: TreeConfig::new(),
            split: QuadraticSplit,
            _dims: PhantomData,
        }
    }
}

impl<const D: usize> Default for RTreeBuilder<D, QuadraticSplit> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const D: usize, S> RTreeBuilder<D, S> {
    /// Replaces the whole configuration.
    pub fn config(mut self, config: TreeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.config.page_size = page_size;
        self
    }

    pub fn leaf_fanout(mut self, fanout: usize) -> Self {
        self.config.leaf_fanout = Some(fanout);
        self
    }

    pub fn internal_fanout(mut self, fanout: usize) -> Self {
        self.config.internal_fanout = Some(fanout);
        self
    }

    /// Swaps the split strategy.
    pub fn split_strategy<T: SplitStrategy<D>>(self, split: T) -> RTreeBuilder<D, T> {
        RTreeBuilder {
            config: self.config,
            split,
            _dims: PhantomData,
        }
    }

    /// Validates the configuration and creates an empty tree.
    pub fn build(self) -> IndexResult<RTree<D, S>>
    where
        S: SplitStrategy<D>,
    {
        let fanout = self.config.resolve::<D>()?;
        log::debug!(
            "Building {}-dimensional R-Tree: page {} bytes, leaf fan-out {}, internal fan-out {}",
            D,
            fanout.page_size(),
            fanout.leaf(),
            fanout.internal()
        );
        Ok(RTree::from_parts(fanout, self.split))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::split::LinearSplit;

    fn small_tree() -> RTree<2> {
        RTree::builder().leaf_fanout(4).internal_fanout(4).build().unwrap()
    }

    fn unit_square(i: u64) -> Rect<2> {
        let x = (i % 10) as f64 * 2.0;
        let y = (i / 10) as f64 * 2.0;
        Rect::new_2d(x, y, x + 1.0, y + 1.0)
    }

    #[test]
    fn test_new_tree_is_empty_leaf() {
        let tree = RTree::<2>::new();
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 0);
        assert!(tree.root_node().is_leaf());
        assert_eq!(tree.bounds(), None);
        assert_eq!(tree.leaf_fanout(), 12);
        assert_eq!(tree.internal_fanout(), 14);
        assert_eq!(tree.page_size(), 512);
    }

    #[test]
    fn test_insert_and_bounds() {
        let mut tree = small_tree();
        tree.insert(&Rect::new_2d(0.0, 0.0, 1.0, 1.0), 1);
        tree.insert(&Rect::new_2d(5.0, -2.0, 6.0, 6.0), 2);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.bounds(), Some(Rect::new_2d(0.0, -2.0, 6.0, 6.0)));
    }

    #[test]
    fn test_insert_reports_root_growth() {
        let mut tree = small_tree();
        let grew: Vec<bool> = (0..5).map(|i| tree.insert(&unit_square(i), i)).collect();

        assert_eq!(grew, vec![false, false, false, false, true]);
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.root_node().count(), 2);
    }

    #[test]
    fn test_remove_then_reinsert() {
        let mut tree = small_tree();
        for i in 0..40 {
            tree.insert(&unit_square(i), i);
        }
        assert!(tree.height() >= 2);

        for i in 0..40 {
            assert!(tree.remove(&unit_square(i), i), "entry {} should be removable", i);
        }
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 0);
        assert!(tree.check_integrity().is_valid);

        tree.insert(&unit_square(3), 3);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_remove_missing_entry() {
        let mut tree = small_tree();
        tree.insert(&unit_square(1), 1);

        assert!(!tree.remove(&unit_square(1), 2));
        assert!(!tree.remove(&unit_square(50), 1));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_clear_releases_nodes() {
        let mut tree = small_tree();
        for i in 0..30 {
            tree.insert(&unit_square(i), i);
        }
        tree.clear();

        assert!(tree.is_empty());
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.stats().node_count, 1);
        assert!(tree.check_integrity().is_valid);
    }

    #[test]
    fn test_fanout_locked_while_populated() {
        let mut tree = small_tree();
        tree.insert(&unit_square(0), 0);

        assert_eq!(tree.set_leaf_fanout(6), Err(IndexError::ConfigurationLocked));
        assert_eq!(tree.set_internal_fanout(6), Err(IndexError::ConfigurationLocked));
        assert_eq!(tree.leaf_fanout(), 4);

        tree.remove(&unit_square(0), 0);
        tree.set_leaf_fanout(6).unwrap();
        assert_eq!(tree.leaf_fanout(), 6);
        assert_eq!(tree.root_node().capacity(), 6);
    }

    #[test]
    fn test_set_fanout_validates() {
        let mut tree = RTree::<2>::new();
        assert!(matches!(
            tree.set_internal_fanout(1),
            Err(IndexError::InvalidConfiguration(_))
        ));
        assert!(tree.set_leaf_fanout(13).is_err());
        assert_eq!(tree.leaf_fanout(), 12);
    }

    #[test]
    fn test_builder_rejects_tiny_page() {
        let err = RTree::<2>::builder().page_size(32).build().unwrap_err();
        assert!(matches!(err, IndexError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_builder_with_linear_split() {
        let mut tree = RTree::<2>::builder()
            .leaf_fanout(4)
            .internal_fanout(4)
            .split_strategy(LinearSplit)
            .build()
            .unwrap();
        for i in 0..50 {
            tree.insert(&unit_square(i), i);
        }
        assert_eq!(tree.len(), 50);
        assert_eq!(*tree.split_strategy(), LinearSplit);
        assert!(tree.check_integrity().is_valid);
    }

    #[test]
    fn test_stats() {
        let mut tree = small_tree();
        for i in 0..20 {
            tree.insert(&unit_square(i), i);
        }

        let stats = tree.stats();
        assert_eq!(stats.total_entries, 20);
        assert_eq!(stats.tree_height, tree.height());
        assert_eq!(stats.leaf_fanout, 4);
        assert!(stats.leaf_count >= 5);
        assert!(stats.node_count > stats.leaf_count);
        assert!(stats.average_leaf_fill >= 0.5 && stats.average_leaf_fill <= 1.0);
    }

    #[test]
    fn test_node_lookup() {
        let tree = small_tree();
        assert!(tree.node(tree.root_id()).is_some());
        assert!(tree.node(NodeId::new(99)).is_none());
    }

    #[test]
    #[should_panic(expected = "malformed")]
    fn test_insert_null_rect_panics() {
        let mut tree = small_tree();
        tree.insert(&Rect::null(), 1);
    }

    #[test]
    fn test_high_dimensional_tree() {
        let mut tree = RTree::<4>::builder().page_size(2048).build().unwrap();
        for i in 0..100u64 {
            let c = i as f64;
            tree.insert(&Rect::new([c, c, 0.0, 0.0], [c + 1.0, c + 1.0, 1.0, 1.0]), i);
        }
        assert_eq!(tree.len(), 100);
        assert!(tree.check_integrity().is_valid);
    }
}
