//! Oriented boundary fragments.
//!
//! A facet is a flat piece of a body's boundary: a segment in 2D, a triangle
//! or polygon in 3D. Its two sides are tagged with whether they face the
//! inside of the body's volume.

pub mod division;
pub mod polygon;
pub mod segment;
pub mod segment_3d;
pub mod triangle;

pub use division::{divide_facets, Divisible, DivisionLimits, DivisionResult};
pub use polygon::PolygonFacet;
pub use segment::SegmentFacet;
pub use segment_3d::SegmentFacet3D;
pub use triangle::TriangleFacet;

/// Which sides of a facet face the inside of the volume.
///
/// The front side is the one the underlying normal points to: the left
/// normal of a 2D segment, the plane normal of a 3D facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sides {
    pub front_inside: bool,
    pub back_inside: bool,
}

impl Sides {
    /// Neither side inside: a wire or a sheet.
    pub const NONE: Self = Self::new(false, false);
    /// Front outside, back inside: the underlying normal points outward.
    pub const FRONT_OUTSIDE: Self = Self::new(false, true);
    /// Front inside, back outside.
    pub const FRONT_INSIDE: Self = Self::new(true, false);
    /// Both sides inside: an internal seam.
    pub const BOTH: Self = Self::new(true, true);

    #[must_use]
    pub const fn new(front_inside: bool, back_inside: bool) -> Self {
        Self {
            front_inside,
            back_inside,
        }
    }

    #[must_use]
    pub fn is_outer(self) -> bool {
        self.front_inside != self.back_inside
    }

    /// Sign to apply to the underlying normal to get the normal to outside,
    /// `None` unless exactly one side is inside.
    #[must_use]
    pub fn outside_sign(self) -> Option<f64> {
        match (self.front_inside, self.back_inside) {
            (true, false) => Some(-1.0),
            (false, true) => Some(1.0),
            _ => None,
        }
    }

    #[must_use]
    pub fn reversed(self) -> Self {
        Self::new(self.back_inside, self.front_inside)
    }

    /// Outer boundaries become inner boundaries; other kinds are unchanged.
    #[must_use]
    pub fn as_inner(self) -> Self {
        if self.is_outer() {
            Self::BOTH
        } else {
            self
        }
    }
}

/// Kind of a 2D segment facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeType {
    Wire,
    InnerBoundary,
    OuterBoundary,
}

impl From<Sides> for EdgeType {
    fn from(sides: Sides) -> Self {
        match (sides.front_inside, sides.back_inside) {
            (false, false) => Self::Wire,
            (true, true) => Self::InnerBoundary,
            _ => Self::OuterBoundary,
        }
    }
}

/// Kind of a 3D triangle or polygon facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceType {
    Sheet,
    InnerBoundary,
    OuterBoundary,
}

impl From<Sides> for FaceType {
    fn from(sides: Sides) -> Self {
        match (sides.front_inside, sides.back_inside) {
            (false, false) => Self::Sheet,
            (true, true) => Self::InnerBoundary,
            _ => Self::OuterBoundary,
        }
    }
}

/// Groups the triangle facets that came from one original face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceId(usize);

impl FaceId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Hands out fresh face ids. Each 3D body owns one.
#[derive(Debug, Clone, Default)]
pub struct FaceIdAllocator {
    next: usize,
}

impl FaceIdAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> FaceId {
        let id = FaceId(self.next);
        self.next += 1;
        id
    }
}

/// Behavior shared by every facet kind.
pub trait Facet: Clone {
    fn sides(&self) -> Sides;

    fn set_sides(&mut self, sides: Sides);

    /// Length in 2D, area in 3D.
    fn measure(&self) -> f64;

    fn reverse_normal(&mut self) {
        self.set_sides(self.sides().reversed());
    }

    fn change_from_outer_to_inner(&mut self) {
        self.set_sides(self.sides().as_inner());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn sides_determine_types() {
        assert_eq!(EdgeType::from(Sides::NONE), EdgeType::Wire);
        assert_eq!(EdgeType::from(Sides::BOTH), EdgeType::InnerBoundary);
        assert_eq!(EdgeType::from(Sides::FRONT_INSIDE), EdgeType::OuterBoundary);
        assert_eq!(FaceType::from(Sides::NONE), FaceType::Sheet);
        assert_eq!(FaceType::from(Sides::FRONT_OUTSIDE), FaceType::OuterBoundary);
    }

    #[test]
    fn outside_sign_only_for_outer() {
        assert_eq!(Sides::FRONT_INSIDE.outside_sign(), Some(-1.0));
        assert_eq!(Sides::FRONT_OUTSIDE.outside_sign(), Some(1.0));
        assert_eq!(Sides::NONE.outside_sign(), None);
        assert_eq!(Sides::BOTH.outside_sign(), None);
    }

    #[test]
    fn reverse_and_inner() {
        assert_eq!(Sides::FRONT_INSIDE.reversed(), Sides::FRONT_OUTSIDE);
        assert_eq!(Sides::FRONT_INSIDE.as_inner(), Sides::BOTH);
        assert_eq!(Sides::NONE.as_inner(), Sides::NONE);
    }

    #[test]
    fn allocator_hands_out_fresh_ids() {
        let mut ids = FaceIdAllocator::new();
        let a = ids.allocate();
        let b = ids.allocate();
        assert_ne!(a, b);
        assert_eq!(b.index(), a.index() + 1);
    }
}
