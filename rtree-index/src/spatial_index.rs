//! SpatialIndex trait definition.

use crate::rect::Rect;
use crate::tree::{IndexError, IndexResult, RTree, RecordId, SearchMode, SplitStrategy};

/// Key-oriented view of a spatial index.
///
/// Unlike the inherent [`RTree`] methods, which treat a malformed rectangle
/// as a programming error, every method here validates its rectangle and
/// reports [`IndexError::InvalidRect`] instead of panicking.
pub trait SpatialIndex<const D: usize> {
    /// Adds a key to the index.
    fn add(&mut self, key: &Rect<D>, id: RecordId) -> IndexResult<()>;

    /// Removes a key from the index. Returns true if it was present.
    fn remove(&mut self, key: &Rect<D>, id: RecordId) -> IndexResult<bool>;

    /// Finds the keys overlapping `key`.
    fn find_intersecting_keys(&self, key: &Rect<D>) -> IndexResult<Vec<RecordId>>;

    /// Finds the keys lying entirely inside `key`.
    fn find_contained_keys(&self, key: &Rect<D>) -> IndexResult<Vec<RecordId>>;

    /// Finds the keys that enclose `key`.
    fn find_enclosing_keys(&self, key: &Rect<D>) -> IndexResult<Vec<RecordId>>;

    /// Gets the number of keys.
    fn size(&self) -> u64;

    /// Removes all keys.
    fn clear(&mut self);
}

fn validate<const D: usize>(key: &Rect<D>) -> IndexResult<()> {
    if key.is_valid() {
        Ok(())
    } else {
        Err(IndexError::InvalidRect(format!("{} has a min above its max", key)))
    }
}

impl<const D: usize, S: SplitStrategy<D>> RTree<D, S> {
    fn find_keys(&self, mode: SearchMode, key: &Rect<D>) -> IndexResult<Vec<RecordId>> {
        validate(key)?;
        Ok(self.collect(mode, key).into_iter().map(|(id, _)| id).collect())
    }
}

impl<const D: usize, S: SplitStrategy<D>> SpatialIndex<D> for RTree<D, S> {
    fn add(&mut self, key: &Rect<D>, id: RecordId) -> IndexResult<()> {
        validate(key)?;
        self.insert(key, id);
        Ok(())
    }

    fn remove(&mut self, key: &Rect<D>, id: RecordId) -> IndexResult<bool> {
        validate(key)?;
        Ok(RTree::remove(self, key, id))
    }

    fn find_intersecting_keys(&self, key: &Rect<D>) -> IndexResult<Vec<RecordId>> {
        self.find_keys(SearchMode::Overlapping, key)
    }

    fn find_contained_keys(&self, key: &Rect<D>) -> IndexResult<Vec<RecordId>> {
        self.find_keys(SearchMode::Within, key)
    }

    fn find_enclosing_keys(&self, key: &Rect<D>) -> IndexResult<Vec<RecordId>> {
        self.find_keys(SearchMode::Enclosing, key)
    }

    fn size(&self) -> u64 {
        self.len() as u64
    }

    fn clear(&mut self) {
        RTree::clear(self);
    }
}
