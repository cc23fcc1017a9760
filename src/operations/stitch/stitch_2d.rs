use tracing::debug;

use crate::body::FacetBody2D;
use crate::error::{OperationError, Result};
use crate::facet::{divide_facets, DivisionLimits, EdgeType, SegmentFacet};
use crate::math::{Point2, Segment2};
use crate::operations::boolean::FacetSource;

use super::{require_empty_result, require_stitchable, resolve_overlap, Overlap};

/// Stitches two non-regular 2D bodies into one.
pub struct Stitcher2D<'a> {
    body0: &'a FacetBody2D,
    body1: &'a FacetBody2D,
    limits: DivisionLimits,
}

impl<'a> Stitcher2D<'a> {
    /// # Errors
    ///
    /// Returns `OperationError::UnexpectedBodyType` if an input is regular
    /// or empty, or `OperationError::AliasedBodies` if both inputs are the
    /// same body.
    pub fn new(body0: &'a FacetBody2D, body1: &'a FacetBody2D) -> Result<Self> {
        if std::ptr::eq(body0, body1) {
            return Err(OperationError::AliasedBodies.into());
        }
        require_stitchable("body0", body0.is_regular(), body0.body_type())?;
        require_stitchable("body1", body1.is_regular(), body1.body_type())?;
        Ok(Self {
            body0,
            body1,
            limits: DivisionLimits::default(),
        })
    }

    #[must_use]
    pub fn with_limits(mut self, limits: DivisionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Divides every facet of each body at the other body's vertex points,
    /// and wire facets also at the other body's wires.
    ///
    /// # Errors
    ///
    /// Returns a division error or `OperationError::LimitExceeded`.
    pub fn divide_body_by_body(&self) -> Result<(Vec<SegmentFacet>, Vec<SegmentFacet>)> {
        Ok((
            divide_by(self.body0, self.body1, &self.limits)?,
            divide_by(self.body1, self.body0, &self.limits)?,
        ))
    }

    /// Points where a wire of body0 crosses a wire of body1, away from both
    /// wires' ends.
    #[must_use]
    pub fn explicit_vertex_points(&self) -> Vec<Point2> {
        let wires1 = wire_segments(self.body1);
        let mut points = Vec::new();
        for w0 in wire_segments(self.body0) {
            for w1 in &wires1 {
                if let Some(x) = w0.crossing_point(w1) {
                    if w0.just_contains(&x) && w1.just_contains(&x) {
                        points.push(x);
                    }
                }
            }
        }
        points
    }

    /// Runs the stitch into `result`, which must be a non-regular empty body.
    /// On error `result` is left as it was.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::UnexpectedBodyType` for a bad result body,
    /// or a division error.
    pub fn perform(&self, result: &mut FacetBody2D) -> Result<()> {
        require_empty_result(result.is_regular(), result.body_type())?;

        let (facets0, facets1) = self.divide_body_by_body()?;
        let explicit = self.explicit_vertex_points();
        let kept0 = resolve_duplicates(FacetSource::Body0, &facets0, &facets1);
        let kept1 = resolve_duplicates(FacetSource::Body1, &facets1, &facets0);
        debug!(
            divided0 = facets0.len(),
            divided1 = facets1.len(),
            kept0 = kept0.len(),
            kept1 = kept1.len(),
            explicit = explicit.len(),
            "segment facets stitched"
        );

        let mut built = FacetBody2D::new(false);
        for facet in kept0.into_iter().chain(kept1) {
            built.add_segment_facet(facet)?;
        }
        let points = self
            .body0
            .vertex_points()
            .iter()
            .chain(self.body1.vertex_points())
            .chain(&explicit);
        for p in points {
            built.add_vertex_point(*p)?;
        }
        *result = built;
        Ok(())
    }
}

fn wire_segments(body: &FacetBody2D) -> Vec<Segment2> {
    body.segment_facets()
        .iter()
        .filter(|f| f.edge_type() == EdgeType::Wire)
        .map(|f| *f.segment())
        .collect()
}

fn divide_by(
    from: &FacetBody2D,
    by: &FacetBody2D,
    limits: &DivisionLimits,
) -> Result<Vec<SegmentFacet>> {
    let wires_by = wire_segments(by);
    let mut divided = Vec::with_capacity(from.segment_facets().len());
    for facet in from.segment_facets() {
        let mut pieces = vec![facet.clone()];
        divide_facets(by.vertex_points(), &mut pieces, limits)?;
        if facet.edge_type() == EdgeType::Wire {
            divide_facets(&wires_by, &mut pieces, limits)?;
        }
        divided.extend(pieces);
    }
    Ok(divided)
}

/// Facets of `facets` that survive against the equal or reversed facets of
/// `others`. Both lists are read unmodified, so reclassifications on one
/// side never affect the other side's decisions.
fn resolve_duplicates(
    source: FacetSource,
    facets: &[SegmentFacet],
    others: &[SegmentFacet],
) -> Vec<SegmentFacet> {
    facets
        .iter()
        .filter_map(|facet| {
            let decision = others
                .iter()
                .find(|o| o.segment().coincides_with(facet.segment()))
                .map_or(Overlap::Keep, |o| {
                    resolve_overlap(source, facet.edge_type().into(), o.edge_type().into())
                });
            decision.apply(facet)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::body::BodyType;
    use crate::facet::Sides;
    use crate::math::Near;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn wire_body(segments: &[(Point2, Point2)]) -> FacetBody2D {
        let mut body = FacetBody2D::new(false);
        for &(a, b) in segments {
            body.add_segment_facet(SegmentFacet::new(a, b, Sides::NONE).unwrap())
                .unwrap();
        }
        body
    }

    fn square_body(x0: f64, x1: f64) -> FacetBody2D {
        let c = [p(x0, 0.0), p(x1, 0.0), p(x1, 1.0), p(x0, 1.0)];
        let mut body = FacetBody2D::new(false);
        for i in 0..4 {
            let edge = SegmentFacet::new(c[i], c[(i + 1) % 4], Sides::FRONT_INSIDE).unwrap();
            body.add_segment_facet(edge).unwrap();
        }
        body
    }

    fn stitch(a: &FacetBody2D, b: &FacetBody2D) -> FacetBody2D {
        let mut result = FacetBody2D::new(false);
        Stitcher2D::new(a, b).unwrap().perform(&mut result).unwrap();
        result
    }

    #[test]
    fn crossing_wires_are_split_at_the_crossing() {
        let a = wire_body(&[(p(0.0, 0.0), p(2.0, 0.0))]);
        let b = wire_body(&[(p(1.0, -1.0), p(1.0, 1.0))]);
        let result = stitch(&a, &b);
        assert_eq!(result.body_type(), BodyType::WireSet);
        assert_eq!(result.segment_facets().len(), 4);
        assert_eq!(result.vertex_points().len(), 1);
        assert!(result.vertex_points()[0].near(&p(1.0, 0.0)));
    }

    #[test]
    fn stitching_a_copy_changes_nothing() {
        let mut a = wire_body(&[(p(0.0, 0.0), p(1.0, 0.0)), (p(1.0, 0.0), p(1.0, 1.0))]);
        a.add_vertex_point(p(3.0, 3.0)).unwrap();
        let b = a.clone();
        let result = stitch(&a, &b);
        assert_eq!(result, a);
    }

    #[test]
    fn shared_outer_edge_becomes_inner() {
        let a = square_body(0.0, 1.0);
        let b = square_body(1.0, 2.0);
        let result = stitch(&a, &b);
        assert_eq!(result.segment_facets().len(), 7);
        let inner: Vec<_> = result
            .segment_facets()
            .iter()
            .filter(|f| f.edge_type() == EdgeType::InnerBoundary)
            .collect();
        assert_eq!(inner.len(), 1);
        assert!(inner[0].segment().coincides_with(&Segment2::new(p(1.0, 0.0), p(1.0, 1.0))));
        assert_eq!(result.body_type(), BodyType::Other);
    }

    #[test]
    fn wire_on_an_outer_edge_is_absorbed() {
        let a = wire_body(&[(p(1.0, 0.0), p(0.0, 0.0))]);
        let b = square_body(0.0, 1.0);
        let result = stitch(&a, &b);
        assert_eq!(result.segment_facets().len(), 4);
        assert!(result
            .segment_facets()
            .iter()
            .all(|f| f.edge_type() == EdgeType::OuterBoundary));
    }

    #[test]
    fn outer_edges_are_not_split_by_wires() {
        let a = wire_body(&[(p(0.5, 0.5), p(0.5, 2.0))]);
        let b = square_body(0.0, 1.0);
        let result = stitch(&a, &b);
        assert_eq!(result.segment_facets().len(), 5);
    }

    #[test]
    fn preconditions_are_checked() {
        let a = wire_body(&[(p(0.0, 0.0), p(1.0, 0.0))]);
        assert!(Stitcher2D::new(&a, &a).is_err());
        let empty = FacetBody2D::new(false);
        assert!(Stitcher2D::new(&a, &empty).is_err());
        let b = wire_body(&[(p(0.0, 1.0), p(1.0, 1.0))]);
        let mut regular = FacetBody2D::new(true);
        assert!(Stitcher2D::new(&a, &b).unwrap().perform(&mut regular).is_err());
    }
}
