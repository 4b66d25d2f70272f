//! Axis-aligned bounding rectangles of a fixed dimension count.

use std::f64::consts::PI;
use std::fmt;

use crate::tree::rtree_types::{IndexError, IndexResult};

/// An axis-aligned bounding rectangle in `D` dimensions.
///
/// `Rect` stores the per-dimension minimum and maximum coordinates. A valid
/// rectangle has `min <= max` in every dimension; a degenerate rectangle
/// (zero extent in some dimension) is still valid and is how points are
/// represented.
///
/// The *null* rectangle has `min > max` in every dimension. It carries no
/// content: it overlaps nothing, has zero area, and is the identity element
/// of [`Rect::union`].
///
/// # Examples
///
/// ```rust
/// use rtree_index::Rect;
///
/// let a = Rect::new_2d(0.0, 0.0, 1.0, 1.0);
/// let b = Rect::new_2d(0.5, 0.5, 1.5, 1.5);
///
/// assert!(a.overlaps(&b));
/// assert_eq!(a.union(&b), Rect::new_2d(0.0, 0.0, 1.5, 1.5));
/// assert_eq!(Rect::null().union(&a), a);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect<const D: usize> {
    min: [f64; D],
    max: [f64; D],
}

impl<const D: usize> Rect<D> {
    /// Creates a rectangle from its minimum and maximum corners.
    ///
    /// # Panics
    ///
    /// Panics if `min > max` in any dimension or a coordinate is NaN.
    /// Use [`Rect::try_new`] to validate untrusted input.
    pub fn new(min: [f64; D], max: [f64; D]) -> Self {
        match Self::try_new(min, max) {
            Ok(rect) => rect,
            Err(err) => panic!("{}", err),
        }
    }

    /// Creates a rectangle, rejecting inverted or NaN bounds.
    pub fn try_new(min: [f64; D], max: [f64; D]) -> IndexResult<Self> {
        let rect = Self { min, max };
        if rect.is_valid() {
            Ok(rect)
        } else {
            Err(IndexError::InvalidRect(format!(
                "min {:?} must not exceed max {:?} in any dimension",
                min, max
            )))
        }
    }

    /// Creates a degenerate rectangle covering a single point.
    pub fn point(coords: [f64; D]) -> Self {
        Self::new(coords, coords)
    }

    /// Returns the null rectangle, the identity of [`Rect::union`].
    pub fn null() -> Self {
        Self {
            min: [f64::INFINITY; D],
            max: [f64::NEG_INFINITY; D],
        }
    }

    /// Builds a rectangle from the flat `[min_0, .., min_{D-1}, max_0, .., max_{D-1}]`
    /// layout.
    pub fn from_flat(boundary: &[f64]) -> IndexResult<Self> {
        if boundary.len() != 2 * D {
            return Err(IndexError::InvalidRect(format!(
                "expected {} boundary values, got {}",
                2 * D,
                boundary.len()
            )));
        }

        let mut min = [0.0; D];
        let mut max = [0.0; D];
        min.copy_from_slice(&boundary[..D]);
        max.copy_from_slice(&boundary[D..]);
        Self::try_new(min, max)
    }

    /// Returns the flat `[mins.., maxes..]` layout of this rectangle.
    pub fn to_flat(&self) -> Vec<f64> {
        self.min.iter().chain(self.max.iter()).copied().collect()
    }

    /// Minimum coordinate per dimension.
    pub fn min(&self) -> &[f64; D] {
        &self.min
    }

    /// Maximum coordinate per dimension.
    pub fn max(&self) -> &[f64; D] {
        &self.max
    }

    /// True if `min <= max` in every dimension (NaN fails the comparison).
    pub fn is_valid(&self) -> bool {
        self.min.iter().zip(self.max.iter()).all(|(lo, hi)| lo <= hi)
    }

    /// True if this is a null rectangle (`min > max` in every dimension).
    pub fn is_null(&self) -> bool {
        D > 0 && self.min.iter().zip(self.max.iter()).all(|(lo, hi)| lo > hi)
    }

    /// Extent of the rectangle along dimension `dim`.
    pub fn extent(&self, dim: usize) -> f64 {
        self.max[dim] - self.min[dim]
    }

    /// Bounding union: the smallest rectangle enclosing both operands.
    ///
    /// The null rectangle is the identity: `null.union(r) == r`.
    pub fn union(&self, other: &Self) -> Self {
        let mut out = *self;
        for dim in 0..D {
            out.min[dim] = self.min[dim].min(other.min[dim]);
            out.max[dim] = self.max[dim].max(other.max[dim]);
        }
        out
    }

    /// Widens this rectangle in place to enclose `other`.
    pub fn expand(&mut self, other: &Self) {
        *self = self.union(other);
    }

    /// True if the closed intervals intersect in every dimension.
    /// Touching edges count as overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        (0..D).all(|dim| self.min[dim] <= other.max[dim] && other.min[dim] <= self.max[dim])
    }

    /// True if every interval of `other` lies within this rectangle's.
    pub fn contains(&self, other: &Self) -> bool {
        (0..D).all(|dim| self.min[dim] <= other.min[dim] && other.max[dim] <= self.max[dim])
    }

    /// True if this rectangle lies entirely within `other`.
    pub fn contained_by(&self, other: &Self) -> bool {
        other.contains(self)
    }

    /// Product of the per-dimension extents. Zero for degenerate and null
    /// rectangles.
    pub fn area(&self) -> f64 {
        if self.is_null() {
            return 0.0;
        }
        (0..D).map(|dim| self.extent(dim)).product()
    }

    /// Size measure used by branch selection and splitting.
    ///
    /// Up to three dimensions this is the exact volume. Beyond that it is the
    /// volume of the n-sphere whose diameter is the rectangle's diagonal,
    /// which grows monotonically with the box and avoids the degenerate
    /// products that thin high-dimensional boxes produce.
    pub fn volume_heuristic(&self) -> f64 {
        if self.is_null() {
            return 0.0;
        }
        if D <= 3 {
            return self.area();
        }

        let radius_squared: f64 = (0..D)
            .map(|dim| {
                let half = self.extent(dim) / 2.0;
                half * half
            })
            .sum();
        unit_sphere_volume(D) * radius_squared.sqrt().powi(D as i32)
    }

    /// Growth of [`Rect::volume_heuristic`] needed to also enclose `other`.
    pub fn enlargement(&self, other: &Self) -> f64 {
        self.union(other).volume_heuristic() - self.volume_heuristic()
    }
}

impl Rect<2> {
    /// Convenience constructor for the common two-dimensional case.
    ///
    /// # Panics
    ///
    /// Panics if `min_x > max_x` or `min_y > max_y`.
    pub fn new_2d(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new([min_x, min_y], [max_x, max_y])
    }
}

impl<const D: usize> Default for Rect<D> {
    fn default() -> Self {
        Self::null()
    }
}

impl<const D: usize> fmt::Display for Rect<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return write!(f, "Rect(null)");
        }
        write!(f, "Rect({:?} .. {:?})", self.min, self.max)
    }
}

/// Volume of the unit ball in `dims` dimensions.
fn unit_sphere_volume(dims: usize) -> f64 {
    // V(0) = 1, V(1) = 2, V(n) = V(n - 2) * 2π / n
    let mut even = 1.0;
    let mut odd = 2.0;
    for n in 2..=dims {
        if n % 2 == 0 {
            even *= 2.0 * PI / n as f64;
        } else {
            odd *= 2.0 * PI / n as f64;
        }
    }
    if dims % 2 == 0 {
        even
    } else {
        odd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_union_with_null_is_identity() {
        let r = Rect::new_2d(1.0, 2.0, 3.0, 4.0);
        assert_eq!(Rect::null().union(&r), r);
        assert_eq!(r.union(&Rect::null()), r);
        assert!(Rect::<2>::null().union(&Rect::null()).is_null());
    }

    #[test]
    fn test_union_takes_outer_bounds() {
        let a = Rect::new_2d(0.0, 5.0, 2.0, 6.0);
        let b = Rect::new_2d(1.0, -1.0, 4.0, 5.5);
        assert_eq!(a.union(&b), Rect::new_2d(0.0, -1.0, 4.0, 6.0));
    }

    #[test]
    fn test_overlap_counts_touching_edges() {
        let a = Rect::new_2d(0.0, 0.0, 1.0, 1.0);
        let touching = Rect::new_2d(1.0, 0.0, 2.0, 1.0);
        let corner = Rect::new_2d(1.0, 1.0, 2.0, 2.0);
        let apart = Rect::new_2d(1.0001, 0.0, 2.0, 1.0);

        assert!(a.overlaps(&touching));
        assert!(a.overlaps(&corner));
        assert!(!a.overlaps(&apart));
        assert!(!a.overlaps(&Rect::null()));
    }

    #[test]
    fn test_overlap_needs_every_dimension() {
        let a = Rect::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let b = Rect::new([0.5, 0.5, 2.0], [1.5, 1.5, 3.0]);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_containment_is_dual() {
        let outer = Rect::new_2d(0.0, 0.0, 10.0, 10.0);
        let inner = Rect::new_2d(2.0, 2.0, 3.0, 3.0);
        let straddling = Rect::new_2d(8.0, 8.0, 12.0, 9.0);

        assert!(outer.contains(&inner));
        assert!(inner.contained_by(&outer));
        assert!(!inner.contains(&outer));
        assert!(!outer.contains(&straddling));
        assert!(outer.contains(&outer));
    }

    #[test]
    fn test_area() {
        assert!(approx_eq(Rect::new_2d(0.0, 0.0, 2.0, 3.0).area(), 6.0));
        assert!(approx_eq(Rect::new_2d(1.0, 1.0, 1.0, 5.0).area(), 0.0));
        assert!(approx_eq(Rect::<2>::null().area(), 0.0));
        assert!(approx_eq(Rect::new([0.0; 3], [1.0, 2.0, 3.0]).area(), 6.0));
    }

    #[test]
    fn test_volume_heuristic_is_exact_in_low_dimensions() {
        let r = Rect::new([0.0; 3], [2.0, 2.0, 2.0]);
        assert!(approx_eq(r.volume_heuristic(), r.area()));
    }

    #[test]
    fn test_volume_heuristic_uses_sphere_in_high_dimensions() {
        // Unit ball in 4D has volume π²/2; a box with diagonal 2 encloses it.
        let r = Rect::new([0.0; 4], [1.0; 4]);
        assert!(approx_eq(r.volume_heuristic(), PI * PI / 2.0));

        let bigger = Rect::new([0.0; 4], [2.0, 1.0, 1.0, 1.0]);
        assert!(bigger.volume_heuristic() > r.volume_heuristic());
    }

    #[test]
    fn test_unit_sphere_volume() {
        assert!(approx_eq(unit_sphere_volume(1), 2.0));
        assert!(approx_eq(unit_sphere_volume(2), PI));
        assert!(approx_eq(unit_sphere_volume(3), 4.0 * PI / 3.0));
    }

    #[test]
    fn test_enlargement() {
        let r = Rect::new_2d(0.0, 0.0, 1.0, 1.0);
        assert!(approx_eq(r.enlargement(&Rect::new_2d(0.2, 0.2, 0.8, 0.8)), 0.0));
        assert!(approx_eq(r.enlargement(&Rect::new_2d(1.0, 0.0, 2.0, 1.0)), 1.0));
    }

    #[test]
    fn test_flat_layout() {
        let r = Rect::from_flat(&[0.0, 1.0, 2.0, 3.0]).unwrap();
        assert_eq!(r, Rect::new_2d(0.0, 1.0, 2.0, 3.0));
        assert_eq!(r.to_flat(), vec![0.0, 1.0, 2.0, 3.0]);

        assert!(Rect::<2>::from_flat(&[0.0, 1.0, 2.0]).is_err());
        assert!(Rect::<2>::from_flat(&[3.0, 0.0, 2.0, 1.0]).is_err());
    }

    #[test]
    fn test_try_new_rejects_inverted_and_nan() {
        assert!(matches!(
            Rect::try_new([1.0, 0.0], [0.0, 1.0]),
            Err(IndexError::InvalidRect(_))
        ));
        assert!(Rect::try_new([f64::NAN, 0.0], [1.0, 1.0]).is_err());
        assert!(Rect::try_new([0.0, 0.0], [0.0, 0.0]).is_ok());
    }

    #[test]
    #[should_panic(expected = "must not exceed")]
    fn test_new_panics_on_inverted_bounds() {
        let _ = Rect::new_2d(2.0, 0.0, 1.0, 1.0);
    }

    #[test]
    fn test_point_is_degenerate_but_valid() {
        let p = Rect::point([3.0, 4.0]);
        assert!(p.is_valid());
        assert!(!p.is_null());
        assert!(approx_eq(p.area(), 0.0));
        assert!(Rect::new_2d(0.0, 0.0, 5.0, 5.0).contains(&p));
    }

    #[test]
    fn test_display() {
        assert_eq!(Rect::new_2d(0.0, 1.0, 2.0, 3.0).to_string(), "Rect([0.0, 1.0] .. [2.0, 3.0])");
        assert_eq!(Rect::<2>::null().to_string(), "Rect(null)");
    }
}
