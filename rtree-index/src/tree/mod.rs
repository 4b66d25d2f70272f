//! Guttman R-Tree over fixed-dimension rectangles.
//!
//! This module provides the tree engine:
//! - Node storage in an arena addressed by stable handles, with freed nodes
//!   reused by later allocations
//! - Fan-outs derived from a target page size, separately for leaf and
//!   internal nodes
//! - Least-enlargement branch selection and pluggable node splitting
//!   (quadratic by default, linear as an alternative)
//! - Deletion that eliminates under-filled nodes and reinserts their branches
//! - Overlap, within and enclosing searches with early termination

pub mod integrity;
pub mod rtree_config;
pub mod rtree_constants;
pub mod rtree_types;
pub mod search;
pub mod split;

mod delete;
mod insert;
mod node_arena;
mod rtree_impl;

pub use integrity::IntegrityReport;
pub use rtree_config::{Fanout, TreeConfig};
pub use rtree_constants::{DEFAULT_PAGE_SIZE, MIN_FANOUT};
pub use rtree_impl::{RTree, RTreeBuilder};
pub use rtree_types::{
    Branch, Child, IndexError, IndexResult, Node, NodeId, RTreeStats, RecordId,
};
pub use search::{SearchIter, SearchMode};
pub use split::{Group, LinearSplit, QuadraticSplit, SplitStrategy};
