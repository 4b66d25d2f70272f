//! Node splitting.
//!
//! When a branch is added to a full node, the node's branches plus the
//! overflow branch are divided into two groups by a [`SplitStrategy`]. The
//! first group is rebuilt in place and the second goes to a freshly
//! allocated sibling on the same level.
//!
//! Two strategies are provided:
//! - [`QuadraticSplit`] (default): Guttman's quadratic-cost split. Seeds are
//!   the pair wasting the most space when combined; the remaining branches
//!   are assigned one at a time, strongest preference first.
//! - [`LinearSplit`]: Guttman's linear-cost split. Seeds are the pair with
//!   the greatest normalized separation along any dimension; the remaining
//!   branches are assigned in order.
//!
//! Both guarantee each group receives at least `min_fill` branches.

use std::fmt;

use super::rtree_impl::RTree;
use super::rtree_types::{Branch, Node, NodeId};
use crate::rect::Rect;

/// Which side of a split a branch goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    /// Stays in the node being split
    First,
    /// Moves to the new sibling
    Second,
}

/// Divides an overflowing set of rectangles into two groups.
///
/// Implementations must return exactly one [`Group`] per input rectangle,
/// with at least `min_fill` rectangles in each group. `rects.len()` is always
/// at least `2 * min_fill`.
pub trait SplitStrategy<const D: usize>: fmt::Debug {
    fn partition(&self, rects: &[Rect<D>], min_fill: usize) -> Vec<Group>;
}

impl<const D: usize, T: SplitStrategy<D> + ?Sized> SplitStrategy<D> for Box<T> {
    fn partition(&self, rects: &[Rect<D>], min_fill: usize) -> Vec<Group> {
        (**self).partition(rects, min_fill)
    }
}

/// Guttman's quadratic-cost split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuadraticSplit;

/// Guttman's linear-cost split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinearSplit;

/// Running state of the two groups while a split is assigned.
struct Partition<const D: usize> {
    groups: Vec<Option<Group>>,
    cover: [Rect<D>; 2],
    area: [f64; 2],
    count: [usize; 2],
    assigned: usize,
    min_fill: usize,
}

impl<const D: usize> Partition<D> {
    fn new(total: usize, min_fill: usize) -> Self {
        assert!(
            total >= 2 && total >= 2 * min_fill,
            "cannot split {} branches with minimum fill {}",
            total,
            min_fill
        );
        Self {
            groups: vec![None; total],
            cover: [Rect::null(); 2],
            area: [0.0; 2],
            count: [0; 2],
            assigned: 0,
            min_fill,
        }
    }

    fn classify(&mut self, index: usize, rect: &Rect<D>, group: Group) {
        debug_assert!(self.groups[index].is_none(), "branch {} assigned twice", index);
        let side = side(group);
        self.groups[index] = Some(group);
        self.cover[side] = self.cover[side].union(rect);
        self.area[side] = self.cover[side].volume_heuristic();
        self.count[side] += 1;
        self.assigned += 1;
    }

    fn total(&self) -> usize {
        self.groups.len()
    }

    /// Both groups can still accept branches without starving the other.
    fn open(&self) -> bool {
        let limit = self.total() - self.min_fill;
        self.assigned < self.total() && self.count[0] < limit && self.count[1] < limit
    }

    /// Group the rest must go to once one side has taken all it may.
    fn starving_group(&self) -> Option<Group> {
        let limit = self.total() - self.min_fill;
        if self.count[0] >= limit {
            Some(Group::Second)
        } else if self.count[1] >= limit {
            Some(Group::First)
        } else {
            None
        }
    }

    /// Growth of each group's cover if `rect` joined it.
    fn growth(&self, rect: &Rect<D>) -> [f64; 2] {
        [
            self.cover[0].union(rect).volume_heuristic() - self.area[0],
            self.cover[1].union(rect).volume_heuristic() - self.area[1],
        ]
    }

    /// Cheaper group for a branch with the given growths: least growth, then
    /// smaller cover, then fewer members, then the first group.
    fn cheaper_group(&self, growth: [f64; 2]) -> Group {
        if growth[0] != growth[1] {
            return if growth[0] < growth[1] { Group::First } else { Group::Second };
        }
        if self.area[0] != self.area[1] {
            return if self.area[0] < self.area[1] { Group::First } else { Group::Second };
        }
        if self.count[1] < self.count[0] {
            Group::Second
        } else {
            Group::First
        }
    }

    fn assign_rest(&mut self, rects: &[Rect<D>], group: Group) {
        for (index, rect) in rects.iter().enumerate() {
            if self.groups[index].is_none() {
                self.classify(index, rect, group);
            }
        }
    }

    fn finish(self) -> Vec<Group> {
        self.groups
            .into_iter()
            .map(|group| group.unwrap_or(Group::First))
            .collect()
    }
}

fn side(group: Group) -> usize {
    match group {
        Group::First => 0,
        Group::Second => 1,
    }
}

impl<const D: usize> SplitStrategy<D> for QuadraticSplit {
    fn partition(&self, rects: &[Rect<D>], min_fill: usize) -> Vec<Group> {
        let mut partition = Partition::new(rects.len(), min_fill);

        let (first, second) = quadratic_seeds(rects);
        partition.classify(first, &rects[first], Group::First);
        partition.classify(second, &rects[second], Group::Second);

        while partition.open() {
            let mut best: Option<(usize, Group, f64)> = None;

            for (index, rect) in rects.iter().enumerate() {
                if partition.groups[index].is_some() {
                    continue;
                }
                let growth = partition.growth(rect);
                let preference = (growth[1] - growth[0]).abs();

                if best.map_or(true, |(_, _, strongest)| preference > strongest) {
                    best = Some((index, partition.cheaper_group(growth), preference));
                }
            }

            match best {
                Some((index, group, _)) => partition.classify(index, &rects[index], group),
                None => break,
            }
        }

        if let Some(group) = partition.starving_group() {
            partition.assign_rest(rects, group);
        }
        partition.finish()
    }
}

/// The pair that would waste the most space if put in the same group.
fn quadratic_seeds<const D: usize>(rects: &[Rect<D>]) -> (usize, usize) {
    let volumes: Vec<f64> = rects.iter().map(Rect::volume_heuristic).collect();
    let mut seeds = (0, 1);
    let mut worst = f64::NEG_INFINITY;

    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            let waste = rects[i].union(&rects[j]).volume_heuristic() - volumes[i] - volumes[j];
            if waste > worst {
                worst = waste;
                seeds = (i, j);
            }
        }
    }
    seeds
}

impl<const D: usize> SplitStrategy<D> for LinearSplit {
    fn partition(&self, rects: &[Rect<D>], min_fill: usize) -> Vec<Group> {
        let mut partition = Partition::new(rects.len(), min_fill);

        let (first, second) = linear_seeds(rects);
        partition.classify(first, &rects[first], Group::First);
        partition.classify(second, &rects[second], Group::Second);

        for (index, rect) in rects.iter().enumerate() {
            if partition.groups[index].is_some() {
                continue;
            }
            let group = match partition.starving_group() {
                Some(group) => group,
                None => partition.cheaper_group(partition.growth(rect)),
            };
            partition.classify(index, rect, group);
        }
        partition.finish()
    }
}

/// Per dimension, the rectangle with the highest low side and the one with
/// the lowest high side; the dimension whose pair is furthest apart
/// (relative to the total width) provides the seeds.
fn linear_seeds<const D: usize>(rects: &[Rect<D>]) -> (usize, usize) {
    let mut seeds = (0, 1);
    let mut best_separation = f64::NEG_INFINITY;

    for dim in 0..D {
        let mut highest_low = 0;
        let mut lowest_high = 0;
        let mut width_min = f64::INFINITY;
        let mut width_max = f64::NEG_INFINITY;

        for (index, rect) in rects.iter().enumerate() {
            if rect.min()[dim] > rects[highest_low].min()[dim] {
                highest_low = index;
            }
            if rect.max()[dim] < rects[lowest_high].max()[dim] {
                lowest_high = index;
            }
            width_min = width_min.min(rect.min()[dim]);
            width_max = width_max.max(rect.max()[dim]);
        }

        if highest_low == lowest_high {
            lowest_high = lowest_high_excluding(rects, dim, highest_low);
        }

        let width = width_max - width_min;
        let gap = rects[highest_low].min()[dim] - rects[lowest_high].max()[dim];
        let separation = if width > 0.0 { gap / width } else { 0.0 };

        if separation > best_separation {
            best_separation = separation;
            seeds = (lowest_high, highest_low);
        }
    }
    seeds
}

fn lowest_high_excluding<const D: usize>(rects: &[Rect<D>], dim: usize, excluded: usize) -> usize {
    let mut lowest: Option<usize> = None;
    for (index, rect) in rects.iter().enumerate() {
        if index == excluded {
            continue;
        }
        if lowest.map_or(true, |l| rect.max()[dim] < rects[l].max()[dim]) {
            lowest = Some(index);
        }
    }
    lowest.unwrap_or(if excluded == 0 { 1 } else { 0 })
}

impl<const D: usize, S: SplitStrategy<D>> RTree<D, S> {
    /// Splits the full node `node_id` to make room for `extra`.
    ///
    /// The node keeps the first group in place; the second group goes to a
    /// new sibling on the same level, whose handle is returned.
    pub(crate) fn split_node(&mut self, node_id: NodeId, extra: Branch<D>) -> NodeId {
        let (level, capacity, min_fill, mut branches) = {
            let node = self.arena.get_mut(node_id);
            (node.level(), node.capacity(), node.min_fill(), node.take_branches())
        };
        branches.push(extra);

        let rects: Vec<Rect<D>> = branches.iter().map(|b| b.rect).collect();
        let groups = self.split.partition(&rects, min_fill);
        assert_eq!(
            groups.len(),
            branches.len(),
            "split strategy returned {} groups for {} branches",
            groups.len(),
            branches.len()
        );

        let mut sibling = Node::new(level, capacity);
        {
            let node = self.arena.get_mut(node_id);
            for (branch, group) in branches.into_iter().zip(groups) {
                let target = match group {
                    Group::First => &mut *node,
                    Group::Second => &mut sibling,
                };
                if target.add_branch(branch).is_err() {
                    panic!("split strategy overfilled a group beyond capacity {}", capacity);
                }
            }
            assert!(
                node.count() >= min_fill && sibling.count() >= min_fill,
                "split left groups of {} and {} below minimum fill {}",
                node.count(),
                sibling.count(),
                min_fill
            );
            log::debug!(
                "Split level {} node {} into {} + {} branches",
                level,
                node_id,
                node.count(),
                sibling.count()
            );
        }

        self.arena.allocate(sibling)
    }
}
