//! Fan-out configuration derived from a target page size.

use std::mem::size_of;

use serde::{Deserialize, Serialize};

use super::rtree_constants::{DEFAULT_PAGE_SIZE, MIN_FANOUT, NODE_HEADER_SIZE};
use super::rtree_types::{min_fill_for, IndexError, IndexResult, NodeId, RecordId};
use crate::rect::Rect;

/// User-facing tree configuration.
///
/// Fan-outs are derived from `page_size`: the bytes left after the node
/// header, divided by the size of one branch. Leaf branches carry a
/// [`RecordId`] and internal branches a [`NodeId`], so the two fan-outs can
/// differ. Either one may be lowered explicitly, but never raised past what
/// the page holds.
///
/// Missing fields fall back to their defaults when deserializing:
///
/// ```rust
/// use rtree_index::TreeConfig;
///
/// let config: TreeConfig = serde_json::from_str(r#"{ "leaf_fanout": 8 }"#).unwrap();
/// assert_eq!(config.page_size, 512);
/// assert_eq!(config.leaf_fanout, Some(8));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Target page size in bytes
    pub page_size: usize,
    /// Leaf fan-out override
    pub leaf_fanout: Option<usize>,
    /// Internal fan-out override
    pub internal_fanout: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeConfig {
    pub fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            leaf_fanout: None,
            internal_fanout: None,
        }
    }

    /// Largest leaf fan-out the page size allows in `D` dimensions.
    pub fn max_leaf_fanout<const D: usize>(&self) -> usize {
        derived_fanout(self.page_size, leaf_branch_size::<D>())
    }

    /// Largest internal fan-out the page size allows in `D` dimensions.
    pub fn max_internal_fanout<const D: usize>(&self) -> usize {
        derived_fanout(self.page_size, internal_branch_size::<D>())
    }

    /// Validates the configuration for `D` dimensions and fixes both fan-outs.
    pub fn resolve<const D: usize>(&self) -> IndexResult<Fanout> {
        if D == 0 {
            return Err(IndexError::InvalidConfiguration(
                "dimension count must be at least 1".into(),
            ));
        }

        let leaf = resolve_one("leaf", self.leaf_fanout, self.max_leaf_fanout::<D>(), self.page_size)?;
        let internal = resolve_one(
            "internal",
            self.internal_fanout,
            self.max_internal_fanout::<D>(),
            self.page_size,
        )?;

        Ok(Fanout {
            leaf,
            internal,
            page_size: self.page_size,
        })
    }
}

/// Resolved, validated fan-outs of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fanout {
    pub(crate) leaf: usize,
    pub(crate) internal: usize,
    pub(crate) page_size: usize,
}

impl Fanout {
    pub fn leaf(&self) -> usize {
        self.leaf
    }

    pub fn internal(&self) -> usize {
        self.internal
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Slot count of a node at `level`.
    pub fn capacity(&self, level: u32) -> usize {
        if level == 0 {
            self.leaf
        } else {
            self.internal
        }
    }

    /// Minimum fill of a non-root node at `level`.
    pub fn min_fill(&self, level: u32) -> usize {
        min_fill_for(self.capacity(level))
    }
}

/// Bytes taken by one leaf branch: rectangle plus record identifier.
pub const fn leaf_branch_size<const D: usize>() -> usize {
    size_of::<Rect<D>>() + size_of::<RecordId>()
}

/// Bytes taken by one internal branch: rectangle plus node handle.
pub const fn internal_branch_size<const D: usize>() -> usize {
    size_of::<Rect<D>>() + size_of::<NodeId>()
}

fn derived_fanout(page_size: usize, branch_size: usize) -> usize {
    page_size.saturating_sub(NODE_HEADER_SIZE) / branch_size
}

fn resolve_one(
    kind: &str,
    requested: Option<usize>,
    max: usize,
    page_size: usize,
) -> IndexResult<usize> {
    if max < MIN_FANOUT {
        return Err(IndexError::InvalidConfiguration(format!(
            "page size {} holds only {} {} branches, need at least {}",
            page_size, max, kind, MIN_FANOUT
        )));
    }

    match requested {
        None => Ok(max),
        Some(fanout) if (MIN_FANOUT..=max).contains(&fanout) => Ok(fanout),
        Some(fanout) => Err(IndexError::InvalidConfiguration(format!(
            "{} fan-out {} outside {}..={} for page size {}",
            kind, fanout, MIN_FANOUT, max, page_size
        ))),
    }
}
