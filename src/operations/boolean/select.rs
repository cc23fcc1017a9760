use super::classify::FacetClass;

/// The type of boolean operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Union,
    Subtract,
    Intersect,
}

/// Which input body a divided facet came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacetSource {
    Body0,
    Body1,
}

/// Determines whether a divided facet goes into the result.
///
/// Subtraction runs as an intersection with the complement of body1, so it
/// shares the intersection column.
///
/// | Facet      | vs other body | Union   | Subtract / Intersect |
/// |------------|---------------|---------|----------------------|
/// | from body0 | INSIDE        | discard | keep                 |
/// | from body0 | OUTSIDE       | keep    | discard              |
/// | from body0 | ON (either)   | discard | discard              |
/// | from body1 | INSIDE        | discard | keep                 |
/// | from body1 | OUTSIDE       | keep    | discard              |
/// | from body1 | ON-OUT        | keep    | keep                 |
/// | from body1 | ON-IN         | discard | discard              |
#[allow(clippy::match_same_arms)]
#[must_use]
pub fn should_keep_facet(source: FacetSource, class: FacetClass, op: BooleanOp) -> bool {
    match (source, class, op) {
        (_, FacetClass::Outside, BooleanOp::Union) => true,
        (_, FacetClass::Inside, BooleanOp::Union) => false,
        (_, FacetClass::Outside, BooleanOp::Subtract | BooleanOp::Intersect) => false,
        (_, FacetClass::Inside, BooleanOp::Subtract | BooleanOp::Intersect) => true,

        // Coincident boundary: one copy from body1, none from body0.
        (FacetSource::Body1, FacetClass::OnOutside, _) => true,
        (FacetSource::Body0, FacetClass::OnOutside, _) => false,
        (_, FacetClass::OnInside, _) => false,
    }
}
