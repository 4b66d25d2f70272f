//! Constants for the page-oriented R-Tree.

use std::mem::size_of;

/// Default page size in bytes, the natural page size the fan-outs derive from
pub const DEFAULT_PAGE_SIZE: usize = 512;

/// Bytes of node bookkeeping per page (occupied count and level, one 32-bit word each)
pub const NODE_HEADER_SIZE: usize = 2 * size_of::<u32>();

/// Smallest fan-out a node may be configured with
pub const MIN_FANOUT: usize = 2;
