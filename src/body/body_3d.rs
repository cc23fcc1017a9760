use std::borrow::Cow;

use tracing::debug;

use crate::error::{OperationError, Result};
use crate::facet::{
    DivisionLimits, FaceId, FaceIdAllocator, FaceType, Facet, PolygonFacet, SegmentFacet3D,
    TriangleFacet,
};
use crate::math::tolerance::contains_point;
use crate::math::{Point3, Segment3};

use super::facet_group::{NonRegularFacetGroup, RegularFacetGroup};
use super::in_out::InOutChecker3D;
use super::{BodyType, FacetCounts};

/// A 3D body bounded by planar polygon facets.
///
/// Besides its faces a non-regular body may carry isolated vertex points
/// and segment facets. Triangle facets added directly are held loose until
/// [`generate_polygon_facets`](Self::generate_polygon_facets) merges them
/// into faces.
#[derive(Debug, Clone, Default)]
pub struct FacetBody3D {
    is_regular: bool,
    vertex_points: Vec<Point3>,
    segment_facets: Vec<SegmentFacet3D>,
    polygon_facets: Vec<PolygonFacet>,
    triangle_facets: Vec<TriangleFacet>,
    face_ids: FaceIdAllocator,
}

impl FacetBody3D {
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
    pub fn vertex_points(&self) -> &[Point3] {
        &self.vertex_points
    }

    #[must_use]
    pub fn segment_facets(&self) -> &[SegmentFacet3D] {
        &self.segment_facets
    }

    #[must_use]
    pub fn polygon_facets(&self) -> &[PolygonFacet] {
        &self.polygon_facets
    }

    /// Triangles not yet merged into polygon faces.
    #[must_use]
    pub fn triangle_facets(&self) -> &[TriangleFacet] {
        &self.triangle_facets
    }

    /// Hands out a face id that is unique within this body.
    pub fn allocate_face_id(&mut self) -> FaceId {
        self.face_ids.allocate()
    }

    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` for a regular body.
    pub fn add_vertex_point(&mut self, p: Point3) -> Result<()> {
        self.require_non_regular("vertex points")?;
        if !contains_point(&self.vertex_points, &p) {
            self.vertex_points.push(p);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` for a regular body.
    pub fn add_segment_facet(&mut self, facet: SegmentFacet3D) -> Result<()> {
        self.require_non_regular("segment facets")?;
        self.segment_facets.push(facet);
        Ok(())
    }

    /// Adds a face under a fresh face id, which is returned.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` when a regular body is given a
    /// face that is not an outer boundary.
    pub fn add_polygon_facet(&mut self, mut facet: PolygonFacet) -> Result<FaceId> {
        self.require_outer(facet.face_type())?;
        let id = self.face_ids.allocate();
        facet.set_face_id(Some(id));
        self.polygon_facets.push(facet);
        Ok(id)
    }

    /// Adds a loose triangle, keeping its face id.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` when a regular body is given a
    /// triangle that is not an outer boundary.
    pub fn add_triangle_facet(&mut self, facet: TriangleFacet) -> Result<()> {
        self.require_outer(facet.face_type())?;
        self.triangle_facets.push(facet);
        Ok(())
    }

    fn require_non_regular(&self, what: &str) -> Result<()> {
        if self.is_regular {
            let reason = format!("regular bodies have no {what}");
            return Err(OperationError::InvalidInput(reason).into());
        }
        Ok(())
    }

    fn require_outer(&self, face_type: FaceType) -> Result<()> {
        if self.is_regular && face_type != FaceType::OuterBoundary {
            return Err(OperationError::InvalidInput(format!(
                "regular bodies take outer boundaries only, got {face_type:?}"
            ))
            .into());
        }
        Ok(())
    }

    #[must_use]
    pub fn body_type(&self) -> BodyType {
        let mut counts = FacetCounts::default();
        let face_types = self
            .polygon_facets
            .iter()
            .map(PolygonFacet::face_type)
            .chain(self.triangle_facets.iter().map(TriangleFacet::face_type));
        for face_type in face_types {
            match face_type {
                FaceType::Sheet => counts.open += 1,
                FaceType::OuterBoundary => counts.outer += 1,
                FaceType::InnerBoundary => counts.inner += 1,
            }
        }
        BodyType::derive(
            self.vertex_points.len(),
            self.segment_facets.len(),
            counts,
            BodyType::SheetSet,
        )
    }

    /// Triangulates every polygon face.
    ///
    /// # Errors
    ///
    /// Returns a tessellation or division error.
    pub fn generate_triangle_facets(&mut self, limits: &DivisionLimits) -> Result<()> {
        for polygon in &mut self.polygon_facets {
            polygon.generate_triangle_facets(limits)?;
        }
        Ok(())
    }

    /// Every triangle of the body: the loose ones, then each face's.
    /// Faces not yet triangulated are triangulated on a copy.
    ///
    /// # Errors
    ///
    /// Returns a tessellation or division error.
    pub fn collect_triangle_facets(&self, limits: &DivisionLimits) -> Result<Vec<TriangleFacet>> {
        let mut triangles = self.triangle_facets.clone();
        for polygon in &self.polygon_facets {
            if polygon.triangle_facets().is_empty() {
                let mut copy = polygon.clone();
                copy.generate_triangle_facets(limits)?;
                triangles.extend_from_slice(copy.triangle_facets());
            } else {
                triangles.extend_from_slice(polygon.triangle_facets());
            }
        }
        Ok(triangles)
    }

    /// Merges the loose triangles into polygon faces.
    ///
    /// A regular body groups coplanar triangles facing the same way; a
    /// non-regular body groups them per original face and keeps explicit
    /// segment facets as seams. New faces get fresh ids.
    ///
    /// # Errors
    ///
    /// Returns a topology error if a group's boundary is not closed, or a
    /// division error.
    pub fn generate_polygon_facets(&mut self, limits: &DivisionLimits) -> Result<()> {
        let triangles = std::mem::take(&mut self.triangle_facets);
        let count = triangles.len();
        let polygons = if self.is_regular {
            let mut groups: Vec<RegularFacetGroup> = Vec::new();
            for t in triangles {
                match groups.iter_mut().find(|g| g.accepts(&t)) {
                    Some(group) => group.add(t),
                    None => groups.push(RegularFacetGroup::new(t)),
                }
            }
            let mut polygons = Vec::new();
            for group in &groups {
                polygons.extend(group.generate_polygon_facets(limits)?);
            }
            polygons
        } else {
            let mut groups: Vec<NonRegularFacetGroup> = Vec::new();
            for t in triangles {
                match groups.iter_mut().find(|g| g.accepts(&t)) {
                    Some(group) => group.add(t),
                    None => groups.push(NonRegularFacetGroup::new(t)),
                }
            }
            let explicit: Vec<Segment3> = self
                .segment_facets
                .iter()
                .filter(|s| s.is_explicit())
                .map(|s| *s.segment())
                .collect();
            let mut polygons = Vec::new();
            for group in &groups {
                let faces = group.generate_polygon_facets(&explicit, &self.vertex_points, limits)?;
                polygons.extend(faces);
            }
            polygons
        };
        debug!(triangles = count, polygons = polygons.len(), "polygon facets generated");
        for polygon in polygons {
            self.add_polygon_facet(polygon)?;
        }
        Ok(())
    }

    /// The polygon faces followed by every loose triangle as a face of its
    /// own. Borrows when there are no loose triangles.
    #[must_use]
    pub fn boundary_faces(&self) -> Cow<'_, [PolygonFacet]> {
        if self.triangle_facets.is_empty() {
            return Cow::Borrowed(&self.polygon_facets);
        }
        let loose = self.triangle_facets.iter().map(PolygonFacet::from_triangle);
        Cow::Owned(self.polygon_facets.iter().cloned().chain(loose).collect())
    }

    /// Containment checker over this body's outer-boundary faces and loose
    /// triangles.
    #[must_use]
    pub fn in_out_checker(&self) -> InOutChecker3D {
        InOutChecker3D::new(self.boundary_faces().iter())
    }

    /// The segment facet lying exactly on `segment`, in either direction.
    #[must_use]
    pub fn find_segment_facet(&self, segment: &Segment3) -> Option<&SegmentFacet3D> {
        self.segment_facets
            .iter()
            .find(|f| f.segment().coincides_with(segment))
    }

    /// The face whose closed region holds `p`.
    #[must_use]
    pub fn find_polygon_facet(&self, p: &Point3) -> Option<&PolygonFacet> {
        self.polygon_facets.iter().find(|f| f.contains(p))
    }

    /// Flips every face's sides.
    pub fn reverse_normal(&mut self) {
        for polygon in &mut self.polygon_facets {
            polygon.reverse_normal();
        }
        for t in &mut self.triangle_facets {
            t.reverse_normal();
        }
    }
}
