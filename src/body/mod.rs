mod body_2d;
mod body_3d;
mod facet_group;
mod in_out;

pub use body_2d::FacetBody2D;
pub use body_3d::FacetBody3D;
pub use facet_group::{NonRegularFacetGroup, RegularFacetGroup};
pub use in_out::{InOutChecker2D, InOutChecker3D};

/// Kind of point set a facet body bounds, derived from its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Empty,
    DotSet,
    WireSet,
    SheetSet,
    Volume,
    Other,
}

/// Per-type counts of a body's top-dimensional facets.
#[derive(Debug, Clone, Copy, Default)]
struct FacetCounts {
    open: usize,
    outer: usize,
    inner: usize,
}

impl FacetCounts {
    fn total(self) -> usize {
        self.open + self.outer + self.inner
    }
}

impl BodyType {
    /// `open_kind` is what a body of only open facets is: wires in 2D,
    /// sheets in 3D. `lower` counts facets one dimension down (3D edges).
    fn derive(vertices: usize, lower: usize, counts: FacetCounts, open_kind: Self) -> Self {
        if counts.total() == 0 {
            return if lower > 0 {
                Self::WireSet
            } else if vertices > 0 {
                Self::DotSet
            } else {
                Self::Empty
            };
        }
        if counts.outer == 0 && counts.inner == 0 {
            open_kind
        } else if counts.open == 0 && counts.inner == 0 {
            Self::Volume
        } else {
            Self::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(open: usize, outer: usize, inner: usize) -> FacetCounts {
        FacetCounts { open, outer, inner }
    }

    #[test]
    fn counts_map_to_body_types() {
        let sheet = BodyType::SheetSet;
        assert_eq!(BodyType::derive(0, 0, counts(0, 0, 0), sheet), BodyType::Empty);
        assert_eq!(BodyType::derive(3, 0, counts(0, 0, 0), sheet), BodyType::DotSet);
        assert_eq!(BodyType::derive(3, 2, counts(0, 0, 0), sheet), BodyType::WireSet);
        assert_eq!(BodyType::derive(0, 0, counts(0, 6, 0), sheet), BodyType::Volume);
        assert_eq!(BodyType::derive(0, 0, counts(1, 6, 0), sheet), BodyType::Other);
        assert_eq!(BodyType::derive(0, 0, counts(0, 6, 1), sheet), BodyType::Other);
        assert_eq!(BodyType::derive(0, 4, counts(2, 0, 0), sheet), BodyType::SheetSet);
        assert_eq!(
            BodyType::derive(2, 0, counts(2, 0, 0), BodyType::WireSet),
            BodyType::WireSet
        );
    }
}
