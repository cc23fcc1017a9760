use tracing::{debug, warn};

use crate::body::{BodyType, FacetBody2D, FacetBody3D};
use crate::connector::Connector;
use crate::error::{OperationError, Result};
use crate::facet::{DivisionLimits, PolygonFacet, SegmentFacet, SegmentFacet3D, Sides};
use crate::math::{polygon_2d, Plane, Point2};

use super::select::BooleanOp;
use super::set_2d::SetOperator2D;

/// Boolean operation on two sheet bodies lying on one plane.
///
/// The sheets are mapped to 2D regular bodies in the parameter space of
/// body0's first face, combined with [`SetOperator2D`], and the resulting
/// regions are lifted back to sheet faces.
pub struct SheetSetOperator<'a> {
    op: BooleanOp,
    body0: &'a FacetBody3D,
    body1: &'a FacetBody3D,
    limits: DivisionLimits,
}

impl<'a> SheetSetOperator<'a> {
    /// # Errors
    ///
    /// Returns `OperationError::UnexpectedBodyType` if an input is not a
    /// sheet set, or `OperationError::AliasedBodies` if both inputs are the
    /// same body.
    pub fn new(op: BooleanOp, body0: &'a FacetBody3D, body1: &'a FacetBody3D) -> Result<Self> {
        if std::ptr::eq(body0, body1) {
            return Err(OperationError::AliasedBodies.into());
        }
        for (role, body) in [("body0", body0), ("body1", body1)] {
            let found = body.body_type();
            if found != BodyType::SheetSet {
                return Err(OperationError::UnexpectedBodyType {
                    role,
                    expected: "a sheet set",
                    found,
                }
                .into());
            }
        }
        Ok(Self {
            op,
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

    fn base_plane(&self) -> Option<Plane> {
        self.body0.boundary_faces().first().map(|f| *f.plane())
    }

    /// Every face of both bodies, loose triangles included, is regular and
    /// lies on the base plane, in either orientation.
    #[must_use]
    pub fn can_perform(&self) -> bool {
        let Some(base) = self.base_plane() else {
            return false;
        };
        let (faces0, faces1) = (self.body0.boundary_faces(), self.body1.boundary_faces());
        faces0
            .iter()
            .chain(faces1.iter())
            .all(|f| f.is_regular() && f.plane().is_coplanar_with(&base))
    }

    /// Runs the operation into `result`, which must be a non-regular empty
    /// body. On error `result` is left as it was.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` if the sheets are not coplanar,
    /// `OperationError::UnexpectedBodyType` for a bad result body, or any
    /// error of the underlying 2D operation.
    pub fn perform(&self, result: &mut FacetBody3D) -> Result<()> {
        let found = result.body_type();
        if result.is_regular() || found != BodyType::Empty {
            return Err(OperationError::UnexpectedBodyType {
                role: "result",
                expected: "a non-regular empty body",
                found,
            }
            .into());
        }
        let base = match self.base_plane() {
            Some(plane) if self.can_perform() => plane,
            _ => {
                warn!("sheet bodies are not regular faces on one plane");
                let reason = "sheets must be regular and coplanar".to_owned();
                return Err(OperationError::InvalidInput(reason).into());
            }
        };

        let param0 = parameter_body(self.body0, &base)?;
        let param1 = parameter_body(self.body1, &base)?;
        let mut param_result = FacetBody2D::new(true);
        SetOperator2D::new(self.op, &param0, &param1)?
            .with_limits(self.limits)
            .perform(&mut param_result)?;
        if param_result.body_type() != BodyType::Volume {
            debug!(op = ?self.op, "sheet operation produced nothing");
            return Ok(());
        }

        let mut built = FacetBody3D::new(false);
        let mut connector = Connector::new();
        for facet in param_result.segment_facets() {
            connector.add_node(*facet.segment());
        }
        connector.connect()?;
        connector.identify_clusters();
        connector.sort_clusters()?;
        connector.identify_loops()?;

        let boundaries = connector.outer_loop_boundaries()?;
        for boundary in &boundaries {
            let mut polygon = PolygonFacet::new(base, boundary.outer.clone(), Sides::NONE)?;
            for inner in &boundary.inners {
                polygon.add_inner_loop(inner.clone())?;
            }
            for lp in std::iter::once(&boundary.outer).chain(&boundary.inners) {
                for edge in polygon_2d::edges(lp) {
                    built.add_segment_facet(SegmentFacet3D::new(
                        base.position_at(&edge.p0),
                        base.position_at(&edge.p1),
                        false,
                    )?)?;
                }
                for q in lp {
                    built.add_vertex_point(base.position_at(q))?;
                }
            }
            built.add_polygon_facet(polygon)?;
        }
        debug!(op = ?self.op, faces = boundaries.len(), "sheet faces lifted");
        built.generate_triangle_facets(&self.limits)?;
        *result = built;
        Ok(())
    }
}

/// Maps a sheet body into a regular 2D body on `base`. Outer loops bound the
/// region on their inside, inner loops on their outside. Edges shared by two
/// adjacent faces cancel out.
fn parameter_body(body: &FacetBody3D, base: &Plane) -> Result<FacetBody2D> {
    let mut facets: Vec<SegmentFacet> = Vec::new();
    for polygon in body.boundary_faces().iter() {
        let outer: Vec<Point2> = polygon
            .outer_loop_points()
            .iter()
            .map(|p| base.parameter_at(p))
            .collect();
        add_loop(&mut facets, &outer, true)?;
        for inner in polygon.inner_loop_points() {
            let inner: Vec<Point2> = inner.iter().map(|p| base.parameter_at(p)).collect();
            add_loop(&mut facets, &inner, false)?;
        }
    }

    let mut param = FacetBody2D::new(true);
    for facet in facets {
        param.add_segment_facet(facet)?;
    }
    param.regularize_facets()?;
    Ok(param)
}

fn add_loop(facets: &mut Vec<SegmentFacet>, points: &[Point2], is_outer: bool) -> Result<()> {
    // Inside on the left of a counter-clockwise outer loop.
    let sides = if polygon_2d::is_clockwise(points) == is_outer {
        Sides::FRONT_OUTSIDE
    } else {
        Sides::FRONT_INSIDE
    };
    for edge in polygon_2d::edges(points) {
        cancel_or_push(facets, SegmentFacet::new(edge.p0, edge.p1, sides)?);
    }
    Ok(())
}

/// Drops `facet` together with an existing facet bounding the region from
/// the other side of the same segment.
fn cancel_or_push(facets: &mut Vec<SegmentFacet>, facet: SegmentFacet) {
    let shared = facets.iter().position(|f| {
        f.segment().coincides_with(facet.segment())
            && f.normal_to_outside()
                .zip(facet.normal_to_outside())
                .is_some_and(|(a, b)| a.dot(&b) < 0.0)
    });
    match shared {
        Some(i) => {
            facets.swap_remove(i);
        }
        None => facets.push(facet),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;

    fn square_sheet(x0: f64, y0: f64, x1: f64, y1: f64) -> FacetBody3D {
        let mut body = FacetBody3D::new(false);
        let points = [
            Point3::new(x0, y0, 0.0),
            Point3::new(x1, y0, 0.0),
            Point3::new(x1, y1, 0.0),
            Point3::new(x0, y1, 0.0),
        ];
        body.add_polygon_facet(PolygonFacet::from_points(&points, Sides::NONE).unwrap())
            .unwrap();
        body
    }

    fn sheet_area(body: &FacetBody3D) -> f64 {
        body.polygon_facets().iter().map(PolygonFacet::area).sum()
    }

    fn run(op: BooleanOp, a: &FacetBody3D, b: &FacetBody3D) -> FacetBody3D {
        let mut result = FacetBody3D::new(false);
        SheetSetOperator::new(op, a, b).unwrap().perform(&mut result).unwrap();
        result
    }

    #[test]
    fn overlapping_sheets() {
        let a = square_sheet(0.0, 0.0, 2.0, 2.0);
        let b = square_sheet(1.0, 1.0, 3.0, 3.0);

        let union = run(BooleanOp::Union, &a, &b);
        assert_eq!(union.body_type(), BodyType::SheetSet);
        assert_eq!(union.polygon_facets().len(), 1);
        approx::assert_relative_eq!(sheet_area(&union), 7.0, epsilon = 1e-9);
        assert_eq!(union.segment_facets().len(), 8);
        assert!(!union.polygon_facets()[0].triangle_facets().is_empty());

        let intersection = run(BooleanOp::Intersect, &a, &b);
        approx::assert_relative_eq!(sheet_area(&intersection), 1.0, epsilon = 1e-9);

        let difference = run(BooleanOp::Subtract, &a, &b);
        approx::assert_relative_eq!(sheet_area(&difference), 3.0, epsilon = 1e-9);
    }

    #[test]
    fn reversed_sheet_is_handled() {
        let a = square_sheet(0.0, 0.0, 2.0, 2.0);
        let mut b = FacetBody3D::new(false);
        let points = [
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(3.0, 2.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
        ];
        b.add_polygon_facet(PolygonFacet::from_points(&points, Sides::NONE).unwrap())
            .unwrap();
        let union = run(BooleanOp::Union, &a, &b);
        approx::assert_relative_eq!(sheet_area(&union), 6.0, epsilon = 1e-9);
    }

    #[test]
    fn hole_is_an_inner_loop() {
        let a = square_sheet(0.0, 0.0, 4.0, 4.0);
        let b = square_sheet(1.0, 1.0, 2.0, 2.0);
        let difference = run(BooleanOp::Subtract, &a, &b);
        assert_eq!(difference.polygon_facets().len(), 1);
        assert_eq!(difference.polygon_facets()[0].inner_loops().len(), 1);
        approx::assert_relative_eq!(sheet_area(&difference), 15.0, epsilon = 1e-9);
    }

    #[test]
    fn adjacent_faces_merge_across_their_shared_edge() {
        let mut a = square_sheet(0.0, 0.0, 1.0, 1.0);
        let points = [
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        a.add_polygon_facet(PolygonFacet::from_points(&points, Sides::NONE).unwrap())
            .unwrap();
        let b = square_sheet(5.0, 5.0, 6.0, 6.0);
        let union = run(BooleanOp::Union, &a, &b);
        assert_eq!(union.polygon_facets().len(), 2);
        approx::assert_relative_eq!(sheet_area(&union), 3.0, epsilon = 1e-9);
    }

    #[test]
    fn non_coplanar_sheets_are_rejected() {
        let a = square_sheet(0.0, 0.0, 1.0, 1.0);
        let mut b = FacetBody3D::new(false);
        let points = [
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
        ];
        b.add_polygon_facet(PolygonFacet::from_points(&points, Sides::NONE).unwrap())
            .unwrap();
        let op = SheetSetOperator::new(BooleanOp::Union, &a, &b).unwrap();
        assert!(!op.can_perform());
        assert!(op.perform(&mut FacetBody3D::new(false)).is_err());
    }
}
