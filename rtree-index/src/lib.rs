//! # RTree Index - Guttman R-Tree for Rectangle Indexing
//!
//! This crate provides a balanced spatial index over axis-aligned rectangles
//! in a fixed number of dimensions. Each entry pairs a rectangle with an
//! opaque record identifier owned by the caller.
//!
//! ## Features
//!
//! - **Page-Sized Nodes**: Leaf and internal fan-outs derived from a target page size
//! - **Tight Bounds**: Least-enlargement branch selection keeps covers small
//! - **Pluggable Splits**: Quadratic split by default, linear split on request
//! - **Rebalancing Deletes**: Under-filled nodes are dissolved and their branches reinserted
//! - **Three Query Modes**: Overlapping, within and enclosing, with early termination
//! - **Integrity Checks**: Full structural verification of a live tree
//!
//! ## Quick Start
//!
//! ```rust
//! use std::ops::ControlFlow;
//! use rtree_index::{RTree, Rect};
//!
//! let mut tree = RTree::<2>::new();
//! tree.insert(&Rect::new_2d(0.0, 0.0, 1.0, 1.0), 1);
//! tree.insert(&Rect::new_2d(5.0, 5.0, 6.0, 6.0), 2);
//! tree.insert(&Rect::new_2d(0.5, 0.5, 1.5, 1.5), 3);
//!
//! let mut hits = Vec::new();
//! tree.search_overlapping(&Rect::new_2d(0.0, 0.0, 1.0, 1.0), |id, _| {
//!     hits.push(id);
//!     ControlFlow::Continue(())
//! });
//! hits.sort();
//! assert_eq!(hits, vec![1, 3]);
//!
//! assert!(tree.remove(&Rect::new_2d(0.0, 0.0, 1.0, 1.0), 1));
//! assert_eq!(tree.len(), 2);
//! ```
//!
//! ## Concurrency
//!
//! The tree does no internal locking. Readers and a writer sharing one tree
//! must wrap it in a lock of their own, such as `parking_lot::RwLock`.

pub mod rect;
pub mod spatial_index;
pub mod tree;

pub use rect::Rect;
pub use spatial_index::SpatialIndex;
pub use tree::{
    Branch, Child, Fanout, Group, IndexError, IndexResult, IntegrityReport, LinearSplit, Node,
    NodeId, QuadraticSplit, RTree, RTreeBuilder, RTreeStats, RecordId, SearchIter, SearchMode,
    SplitStrategy, TreeConfig, DEFAULT_PAGE_SIZE, MIN_FANOUT,
};
