use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rtree_index::{RTree, Rect, RecordId, SearchMode, SplitStrategy};

/// Installs `env_logger` once for the test binary. Later calls are no-ops.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Seeded generator so failures reproduce.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// A rectangle somewhere inside `[0, extent)` on both axes, at most
/// `max_side` wide and tall. Zero-width sides are allowed.
pub fn random_rect(rng: &mut StdRng, extent: f64, max_side: f64) -> Rect<2> {
    let x = rng.gen_range(0.0..extent);
    let y = rng.gen_range(0.0..extent);
    let w = rng.gen_range(0.0..max_side);
    let h = rng.gen_range(0.0..max_side);
    Rect::new_2d(x, y, x + w, y + h)
}

pub fn random_rects(seed: u64, count: usize) -> Vec<Rect<2>> {
    let mut rng = seeded_rng(seed);
    (0..count).map(|_| random_rect(&mut rng, 100.0, 10.0)).collect()
}

/// A tree with tiny nodes so that a few dozen entries already build
/// several levels.
pub fn small_tree() -> RTree<2> {
    RTree::<2>::builder()
        .leaf_fanout(4)
        .internal_fanout(4)
        .build()
        .expect("fan-out 4 fits the default page")
}

pub fn small_tree_with<S: SplitStrategy<2>>(split: S) -> RTree<2, S> {
    RTree::<2>::builder()
        .leaf_fanout(4)
        .internal_fanout(4)
        .split_strategy(split)
        .build()
        .expect("fan-out 4 fits the default page")
}

/// Panics with the integrity report's errors if the tree is inconsistent.
pub fn assert_valid<const D: usize, S: SplitStrategy<D>>(tree: &RTree<D, S>) {
    let report = tree.check_integrity();
    assert!(report.is_valid, "integrity errors: {:#?}", report.errors);
}

pub fn sorted_ids(hits: impl IntoIterator<Item = (RecordId, Rect<2>)>) -> Vec<RecordId> {
    let mut ids: Vec<RecordId> = hits.into_iter().map(|(id, _)| id).collect();
    ids.sort_unstable();
    ids
}

/// Brute-force reference: a flat list of entries scanned on every query.
#[derive(Debug, Default, Clone)]
pub struct Oracle {
    entries: Vec<(RecordId, Rect<2>)>,
}

impl Oracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, rect: Rect<2>, id: RecordId) {
        self.entries.push((id, rect));
    }

    /// Removes the first entry with `id`. Returns true if one was present.
    pub fn remove(&mut self, id: RecordId) -> bool {
        match self.entries.iter().position(|(entry_id, _)| *entry_id == id) {
            Some(index) => {
                self.entries.swap_remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(RecordId, Rect<2>)] {
        &self.entries
    }

    /// Sorted identifiers of every entry matching `query`.
    pub fn query(&self, mode: SearchMode, query: &Rect<2>) -> Vec<RecordId> {
        let mut ids: Vec<RecordId> = self
            .entries
            .iter()
            .filter(|(_, rect)| brute_force_match(mode, rect, query))
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

fn brute_force_match(mode: SearchMode, rect: &Rect<2>, query: &Rect<2>) -> bool {
    let (lo, hi) = (rect.min(), rect.max());
    let (qlo, qhi) = (query.min(), query.max());
    (0..2).all(|d| match mode {
        SearchMode::Overlapping => lo[d] <= qhi[d] && qlo[d] <= hi[d],
        SearchMode::Within => qlo[d] <= lo[d] && hi[d] <= qhi[d],
        SearchMode::Enclosing => lo[d] <= qlo[d] && qhi[d] <= hi[d],
    })
}
