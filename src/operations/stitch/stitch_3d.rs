use std::collections::HashMap;

use tracing::debug;

use crate::body::FacetBody3D;
use crate::error::{OperationError, Result};
use crate::facet::{
    divide_facets, DivisionLimits, FaceId, PolygonFacet, SegmentFacet3D, TriangleFacet,
};
use crate::math::Point3;
use crate::operations::boolean::FacetSource;

use super::{require_empty_result, require_stitchable, resolve_overlap, Overlap};

/// Facets of one body after division by the other body.
#[derive(Debug, Clone, Default)]
pub struct DividedBody3D {
    pub segment_facets: Vec<SegmentFacet3D>,
    pub triangle_facets: Vec<TriangleFacet>,
}

/// Stitches two non-regular 3D bodies into one.
///
/// Edges of one body running across a face of the other become explicit
/// seams, so the stitched faces are split along them when polygon facets
/// are regenerated.
pub struct Stitcher3D<'a> {
    body0: &'a FacetBody3D,
    body1: &'a FacetBody3D,
    limits: DivisionLimits,
}

impl<'a> Stitcher3D<'a> {
    /// # Errors
    ///
    /// Returns `OperationError::UnexpectedBodyType` if an input is regular
    /// or empty, or `OperationError::AliasedBodies` if both inputs are the
    /// same body.
    pub fn new(body0: &'a FacetBody3D, body1: &'a FacetBody3D) -> Result<Self> {
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

    /// Divides the segment facets of each body at the other body's vertex
    /// points and segment facets, and its triangles at the other body's
    /// segment facets.
    ///
    /// # Errors
    ///
    /// Returns a tessellation or division error.
    pub fn divide_body_by_body(&self) -> Result<(DividedBody3D, DividedBody3D)> {
        Ok((
            divide_by(self.body0, self.body1, &self.limits)?,
            divide_by(self.body1, self.body0, &self.limits)?,
        ))
    }

    /// Points where a segment facet of body0 crosses one of body1, away
    /// from both segments' ends.
    #[must_use]
    pub fn explicit_vertex_points(&self) -> Vec<Point3> {
        let mut points = Vec::new();
        for s0 in self.body0.segment_facets() {
            for s1 in self.body1.segment_facets() {
                let (a, b) = (s0.segment(), s1.segment());
                if let Some(x) = a.crossing_point(b) {
                    if a.just_contains(&x) && b.just_contains(&x) {
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
    /// Returns `OperationError::UnexpectedBodyType` for a bad result body, or
    /// a division or face generation error.
    pub fn perform(&self, result: &mut FacetBody3D) -> Result<()> {
        require_empty_result(result.is_regular(), result.body_type())?;

        let (mut divided0, mut divided1) = self.divide_body_by_body()?;
        let explicit = self.explicit_vertex_points();
        let (faces0, faces1) = (self.body0.boundary_faces(), self.body1.boundary_faces());

        mark_seams(&mut divided0.segment_facets, &faces1);
        mark_seams(&mut divided1.segment_facets, &faces0);
        let segments1: Vec<SegmentFacet3D> = divided1
            .segment_facets
            .into_iter()
            .filter(|s| {
                let mid = s.midpoint();
                !self
                    .body0
                    .segment_facets()
                    .iter()
                    .any(|by| by.segment().just_contains(&mid))
            })
            .collect();

        let triangles0 = resolve_triangles(FacetSource::Body0, &divided0.triangle_facets, &faces1);
        let triangles1 = resolve_triangles(FacetSource::Body1, &divided1.triangle_facets, &faces0);
        debug!(
            triangles0 = triangles0.len(),
            triangles1 = triangles1.len(),
            segments0 = divided0.segment_facets.len(),
            segments1 = segments1.len(),
            explicit = explicit.len(),
            "facets stitched"
        );

        let mut built = FacetBody3D::new(false);
        let mut face_ids: HashMap<(FacetSource, Option<FaceId>), FaceId> = HashMap::new();
        let tagged = triangles0
            .into_iter()
            .map(|t| (FacetSource::Body0, t))
            .chain(triangles1.into_iter().map(|t| (FacetSource::Body1, t)));
        for (source, mut t) in tagged {
            let id = *face_ids
                .entry((source, t.face_id()))
                .or_insert_with(|| built.allocate_face_id());
            t.set_face_id(Some(id));
            built.add_triangle_facet(t)?;
        }
        for s in divided0.segment_facets.into_iter().chain(segments1) {
            built.add_segment_facet(s)?;
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
        built.generate_polygon_facets(&self.limits)?;
        *result = built;
        Ok(())
    }
}

fn divide_by(
    from: &FacetBody3D,
    by: &FacetBody3D,
    limits: &DivisionLimits,
) -> Result<DividedBody3D> {
    let mut segment_facets = from.segment_facets().to_vec();
    divide_facets(by.vertex_points(), &mut segment_facets, limits)?;
    divide_facets(by.segment_facets(), &mut segment_facets, limits)?;
    let mut triangle_facets = from.collect_triangle_facets(limits)?;
    divide_facets(by.segment_facets(), &mut triangle_facets, limits)?;
    Ok(DividedBody3D {
        segment_facets,
        triangle_facets,
    })
}

/// Segment facets running through the interior of one of `faces` become
/// explicit.
fn mark_seams(segments: &mut [SegmentFacet3D], faces: &[PolygonFacet]) {
    for s in segments.iter_mut().filter(|s| !s.is_explicit()) {
        let mid = s.midpoint();
        if faces.iter().any(|f| f.just_contains(&mid)) {
            s.change_as_explicit();
        }
    }
}

fn resolve_triangles(
    source: FacetSource,
    triangles: &[TriangleFacet],
    faces: &[PolygonFacet],
) -> Vec<TriangleFacet> {
    triangles
        .iter()
        .filter_map(|t| {
            let centroid = t.centroid();
            let decision = faces
                .iter()
                .find(|f| f.just_contains(&centroid))
                .map_or(Overlap::Keep, |f| {
                    resolve_overlap(source, t.face_type().into(), f.face_type().into())
                });
            decision.apply(t)
        })
        .collect()
}
