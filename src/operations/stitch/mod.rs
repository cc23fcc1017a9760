//! Stitching of non-regular bodies.
//!
//! A stitch merges two bodies without classifying volumes: each body's
//! facets are divided at the other body's vertices and edges, and where the
//! two bodies overlap one copy of the overlap survives.

mod stitch_2d;
mod stitch_3d;

pub use stitch_2d::Stitcher2D;
pub use stitch_3d::{DividedBody3D, Stitcher3D};

use crate::body::BodyType;
use crate::error::{OperationError, Result};
use crate::facet::{EdgeType, FaceType, Facet};

use super::boolean::FacetSource;

/// Boundary role of an overlapping facet, common to 2D edges and 3D faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    /// A wire or a sheet.
    Open,
    Outer,
    Inner,
}

impl From<EdgeType> for Role {
    fn from(edge_type: EdgeType) -> Self {
        match edge_type {
            EdgeType::Wire => Self::Open,
            EdgeType::OuterBoundary => Self::Outer,
            EdgeType::InnerBoundary => Self::Inner,
        }
    }
}

impl From<FaceType> for Role {
    fn from(face_type: FaceType) -> Self {
        match face_type {
            FaceType::Sheet => Self::Open,
            FaceType::OuterBoundary => Self::Outer,
            FaceType::InnerBoundary => Self::Inner,
        }
    }
}

/// What happens to a facet that overlaps a facet of the other body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overlap {
    Keep,
    KeepAsInner,
    Drop,
}

impl Overlap {
    fn apply<F: Facet>(self, facet: &F) -> Option<F> {
        match self {
            Self::Keep => Some(facet.clone()),
            Self::KeepAsInner => {
                let mut inner = facet.clone();
                inner.change_from_outer_to_inner();
                Some(inner)
            }
            Self::Drop => None,
        }
    }
}

/// Decides the fate of a facet overlapping a facet of the other body.
///
/// | own   | other | from body0    | from body1 |
/// |-------|-------|---------------|------------|
/// | open  | outer | drop          | drop       |
/// | outer | open  | keep          | keep       |
/// | outer | outer | keep as inner | drop       |
/// | any   | any   | keep          | drop       |
#[allow(clippy::match_same_arms)]
fn resolve_overlap(source: FacetSource, own: Role, other: Role) -> Overlap {
    match (source, own, other) {
        (_, Role::Open, Role::Outer) => Overlap::Drop,
        (_, Role::Outer, Role::Open) => Overlap::Keep,
        (FacetSource::Body0, Role::Outer, Role::Outer) => Overlap::KeepAsInner,
        (FacetSource::Body0, _, _) => Overlap::Keep,
        (FacetSource::Body1, _, _) => Overlap::Drop,
    }
}

fn require_stitchable(role: &'static str, is_regular: bool, found: BodyType) -> Result<()> {
    if is_regular || found == BodyType::Empty {
        return Err(OperationError::UnexpectedBodyType {
            role,
            expected: "a non-regular, non-empty body",
            found,
        }
        .into());
    }
    Ok(())
}

fn require_empty_result(is_regular: bool, found: BodyType) -> Result<()> {
    if is_regular || found != BodyType::Empty {
        return Err(OperationError::UnexpectedBodyType {
            role: "result",
            expected: "a non-regular empty body",
            found,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_facets_give_way_to_outer_boundaries() {
        for source in [FacetSource::Body0, FacetSource::Body1] {
            assert_eq!(resolve_overlap(source, Role::Open, Role::Outer), Overlap::Drop);
            assert_eq!(resolve_overlap(source, Role::Outer, Role::Open), Overlap::Keep);
        }
    }

    #[test]
    fn body0_wins_between_equals() {
        assert_eq!(resolve_overlap(FacetSource::Body0, Role::Open, Role::Open), Overlap::Keep);
        assert_eq!(resolve_overlap(FacetSource::Body1, Role::Open, Role::Open), Overlap::Drop);
        assert_eq!(
            resolve_overlap(FacetSource::Body0, Role::Outer, Role::Outer),
            Overlap::KeepAsInner
        );
        assert_eq!(resolve_overlap(FacetSource::Body1, Role::Outer, Role::Outer), Overlap::Drop);
        assert_eq!(resolve_overlap(FacetSource::Body0, Role::Inner, Role::Outer), Overlap::Keep);
        assert_eq!(resolve_overlap(FacetSource::Body1, Role::Open, Role::Inner), Overlap::Drop);
    }
}
