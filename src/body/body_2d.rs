use tracing::debug;

use crate::connector::Connector;
use crate::error::{OperationError, Result, TopologyError};
use crate::facet::{EdgeType, Facet, SegmentFacet};
use crate::math::tolerance::contains_point;
use crate::math::{Point2, Segment2};

use super::in_out::InOutChecker2D;
use super::{BodyType, FacetCounts};

/// A 2D body bounded by segment facets.
///
/// A regular body is the boundary of an area: outer-boundary facets only and
/// no free vertex points. A non-regular body may hold any mix of wires,
/// boundaries and isolated points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetBody2D {
    is_regular: bool,
    vertex_points: Vec<Point2>,
    segment_facets: Vec<SegmentFacet>,
}

impl FacetBody2D {
    #[must_use]
    pub fn new(is_regular: bool) -> Self {
        Self {
            is_regular,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_regular(&self) -> bool {
        self.is_regular
    }

    #[must_use]
    pub fn vertex_points(&self) -> &[Point2] {
        &self.vertex_points
    }

    #[must_use]
    pub fn segment_facets(&self) -> &[SegmentFacet] {
        &self.segment_facets
    }

    /// Adds an isolated point. Points already present are ignored.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` for a regular body.
    pub fn add_vertex_point(&mut self, p: Point2) -> Result<()> {
        if self.is_regular {
            let reason = "regular bodies have no vertex points".to_owned();
            return Err(OperationError::InvalidInput(reason).into());
        }
        if !contains_point(&self.vertex_points, &p) {
            self.vertex_points.push(p);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` when a regular body is given a
    /// facet that is not an outer boundary.
    pub fn add_segment_facet(&mut self, facet: SegmentFacet) -> Result<()> {
        if self.is_regular && facet.edge_type() != EdgeType::OuterBoundary {
            return Err(OperationError::InvalidInput(format!(
                "regular bodies take outer boundaries only, got {:?}",
                facet.edge_type()
            ))
            .into());
        }
        self.segment_facets.push(facet);
        Ok(())
    }

    #[must_use]
    pub fn body_type(&self) -> BodyType {
        let mut counts = FacetCounts::default();
        for facet in &self.segment_facets {
            match facet.edge_type() {
                EdgeType::Wire => counts.open += 1,
                EdgeType::OuterBoundary => counts.outer += 1,
                EdgeType::InnerBoundary => counts.inner += 1,
            }
        }
        BodyType::derive(self.vertex_points.len(), 0, counts, BodyType::WireSet)
    }

    /// Containment checker over this body's outer boundary.
    #[must_use]
    pub fn in_out_checker(&self) -> InOutChecker2D {
        InOutChecker2D::new(&self.segment_facets)
    }

    /// The facet lying exactly on `segment`, in either direction.
    #[must_use]
    pub fn find_segment_facet(&self, segment: &Segment2) -> Option<&SegmentFacet> {
        self.segment_facets
            .iter()
            .find(|f| f.segment().coincides_with(segment))
    }

    /// The facet whose closed segment holds `p`.
    #[must_use]
    pub fn find_segment_facet_containing(&self, p: &Point2) -> Option<&SegmentFacet> {
        self.segment_facets.iter().find(|f| f.contains(p))
    }

    /// Replaces chains of colinear facets by single facets.
    ///
    /// Each merged facet copies the sides of the last facet of its run and
    /// keeps that facet's direction.
    ///
    /// # Errors
    ///
    /// Returns a topology error if the facets meet more than two at a point.
    pub fn regularize_facets(&mut self) -> Result<()> {
        let mut connector = Connector::new();
        for facet in &self.segment_facets {
            connector.add_node(*facet.segment());
        }
        connector.connect()?;
        connector.identify_clusters();
        connector.sort_clusters()?;

        let mut regularized = Vec::with_capacity(self.segment_facets.len());
        for &cluster_id in connector.cluster_ids() {
            let walk = connector.cluster(cluster_id)?.nodes();
            let (merged, end_indices) = connector.regularized_segments(cluster_id)?;
            for (segment, &end) in merged.iter().zip(&end_indices) {
                let node_id = walk.get(end).copied().ok_or_else(|| {
                    TopologyError::InvalidTopology("walk position out of range".into())
                })?;
                let source = &self.segment_facets[connector.node(node_id)?.index()];
                let facet = if source.segment().vector().dot(&segment.vector()) < 0.0 {
                    source.copy_between(segment.p1, segment.p0)?
                } else {
                    source.copy_between(segment.p0, segment.p1)?
                };
                regularized.push(facet);
            }
        }
        debug!(
            before = self.segment_facets.len(),
            after = regularized.len(),
            "segment facets regularized"
        );
        self.segment_facets = regularized;
        Ok(())
    }

    /// Flips every facet's sides.
    pub fn reverse_normal(&mut self) {
        for facet in &mut self.segment_facets {
            facet.reverse_normal();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::facet::Sides;
    use crate::math::Containment;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn polygon_body(points: &[Point2]) -> FacetBody2D {
        let mut body = FacetBody2D::new(true);
        for i in 0..points.len() {
            let next = points[(i + 1) % points.len()];
            let facet = SegmentFacet::new(points[i], next, Sides::FRONT_INSIDE).unwrap();
            body.add_segment_facet(facet).unwrap();
        }
        body
    }

    #[test]
    fn body_types() {
        assert_eq!(FacetBody2D::new(false).body_type(), BodyType::Empty);

        let mut dots = FacetBody2D::new(false);
        dots.add_vertex_point(p(0.0, 0.0)).unwrap();
        dots.add_vertex_point(p(0.0, 0.0)).unwrap();
        assert_eq!(dots.vertex_points().len(), 1);
        assert_eq!(dots.body_type(), BodyType::DotSet);

        let mut wires = FacetBody2D::new(false);
        wires
            .add_segment_facet(SegmentFacet::new(p(0.0, 0.0), p(1.0, 0.0), Sides::NONE).unwrap())
            .unwrap();
        assert_eq!(wires.body_type(), BodyType::WireSet);

        let square = polygon_body(&[p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)]);
        assert_eq!(square.body_type(), BodyType::Volume);

        let boundary = SegmentFacet::new(p(0.0, 1.0), p(1.0, 1.0), Sides::FRONT_INSIDE).unwrap();
        wires.add_segment_facet(boundary).unwrap();
        assert_eq!(wires.body_type(), BodyType::Other);
    }

    #[test]
    fn regular_body_rejects_wires_and_points() {
        let mut body = FacetBody2D::new(true);
        assert!(body.add_vertex_point(p(0.0, 0.0)).is_err());
        let wire = SegmentFacet::new(p(0.0, 0.0), p(1.0, 0.0), Sides::NONE).unwrap();
        assert!(body.add_segment_facet(wire).is_err());
    }

    #[test]
    fn regularize_merges_colinear_runs() {
        // Square with every side split in two, starting mid-edge so one run
        // wraps past the end of the walk.
        let mut body = polygon_body(&[
            p(1.0, 0.0),
            p(2.0, 0.0),
            p(2.0, 1.0),
            p(2.0, 2.0),
            p(1.0, 2.0),
            p(0.0, 2.0),
            p(0.0, 1.0),
            p(0.0, 0.0),
        ]);
        body.regularize_facets().unwrap();
        assert_eq!(body.segment_facets().len(), 4);
        assert_eq!(body.body_type(), BodyType::Volume);
        let total: f64 = body.segment_facets().iter().map(Facet::measure).sum();
        approx::assert_relative_eq!(total, 8.0, epsilon = 1e-9);

        let checker = body.in_out_checker();
        assert_eq!(checker.containment(&p(1.0, 1.0)).unwrap(), Containment::In);
        assert_eq!(checker.containment(&p(3.0, 1.0)).unwrap(), Containment::Out);
    }

    #[test]
    fn regularize_keeps_orientation() {
        let mut body =
            polygon_body(&[p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0), p(2.0, 2.0), p(0.0, 2.0)]);
        body.regularize_facets().unwrap();
        let bottom = body
            .find_segment_facet(&Segment2::new(p(0.0, 0.0), p(2.0, 0.0)))
            .unwrap();
        assert!(bottom.p0().x < bottom.p1().x);
        assert_eq!(bottom.sides(), Sides::FRONT_INSIDE);
    }

    #[test]
    fn find_facet_in_either_direction() {
        let body = polygon_body(&[p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)]);
        assert!(body
            .find_segment_facet(&Segment2::new(p(1.0, 0.0), p(0.0, 0.0)))
            .is_some());
        assert!(body.find_segment_facet_containing(&p(0.5, 0.0)).is_some());
        assert!(body.find_segment_facet_containing(&p(0.5, 0.7)).is_none());
    }
}
