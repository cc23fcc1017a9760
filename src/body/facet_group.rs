use tracing::debug;

use crate::connector::{Connector, LoopBoundary, NonRegularTriangleConnector};
use crate::error::Result;
use crate::facet::{
    divide_facets, DivisionLimits, FaceId, Facet, PolygonFacet, Sides, TriangleFacet,
};
use crate::math::tolerance::push_unique;
use crate::math::{Plane, Point3, Segment2, Segment3, Triangle2};

/// Sides of `t` restated against `plane`'s normal.
fn sides_on(plane: &Plane, t: &TriangleFacet) -> Sides {
    if t.plane().plane_normal().dot(plane.plane_normal()) < 0.0 {
        t.sides().reversed()
    } else {
        t.sides()
    }
}

fn param_triangle_on(plane: &Plane, t: &TriangleFacet) -> Triangle2 {
    let [a, b, c] = t.vertices().map(|v| plane.parameter_at(&v));
    Triangle2::new(a, b, c)
}

/// Splits triangles at the vertices of their neighbours so that every
/// shared edge is shared whole.
fn remove_t_junctions(triangles: &mut Vec<TriangleFacet>, limits: &DivisionLimits) -> Result<()> {
    let mut vertices = Vec::new();
    for t in triangles.iter() {
        for v in t.vertices() {
            push_unique(&mut vertices, v);
        }
    }
    divide_facets(&vertices, triangles, limits)?;
    Ok(())
}

fn polygon_from_loops(
    plane: &Plane,
    sides: Sides,
    boundary: &LoopBoundary,
) -> Result<PolygonFacet> {
    let mut polygon = PolygonFacet::new(*plane, boundary.outer.clone(), sides)?;
    for inner in &boundary.inners {
        polygon.add_inner_loop(inner.clone())?;
    }
    Ok(polygon)
}

/// Coplanar triangles of a regular body that face the same way, merged
/// into polygon faces regardless of which face they came from.
#[derive(Debug, Clone)]
pub struct RegularFacetGroup {
    plane: Plane,
    sides: Sides,
    triangles: Vec<TriangleFacet>,
}

impl RegularFacetGroup {
    #[must_use]
    pub fn new(first: TriangleFacet) -> Self {
        Self {
            plane: *first.plane(),
            sides: first.sides(),
            triangles: vec![first],
        }
    }

    /// `t` is coplanar with the group and bounds the volume on the same side.
    #[must_use]
    pub fn accepts(&self, t: &TriangleFacet) -> bool {
        self.plane.is_coplanar_with(t.plane()) && sides_on(&self.plane, t) == self.sides
    }

    pub fn add(&mut self, t: TriangleFacet) {
        self.triangles.push(t);
    }

    #[must_use]
    pub fn triangle_facets(&self) -> &[TriangleFacet] {
        &self.triangles
    }

    /// One polygon per outer loop of each connected patch of triangles.
    ///
    /// Loop vertices dropped because they sit on a straight run are put
    /// back, so that the faces still meet their neighbours vertex to vertex.
    ///
    /// # Errors
    ///
    /// Returns a topology error if a patch boundary is not made of closed
    /// loops, or a division error.
    pub fn generate_polygon_facets(&self, limits: &DivisionLimits) -> Result<Vec<PolygonFacet>> {
        let mut triangles = self.triangles.clone();
        remove_t_junctions(&mut triangles, limits)?;

        let mut connector = Connector::new();
        for t in &triangles {
            connector.add_node(param_triangle_on(&self.plane, t));
        }
        connector.connect()?;
        connector.identify_clusters();

        let mut polygons = Vec::new();
        for &cluster in connector.cluster_ids() {
            let boundary = connector.extract_boundary(cluster)?;
            for loops in boundary.outer_loop_boundaries()? {
                polygons.push(polygon_from_loops(&self.plane, self.sides, &loops)?);
            }
        }

        for t in &triangles {
            for v in t.vertices() {
                for polygon in &mut polygons {
                    polygon.insert_vertex_point_on_loop(&v);
                }
            }
        }
        debug!(
            triangles = triangles.len(),
            polygons = polygons.len(),
            "regular facet group merged"
        );
        Ok(polygons)
    }
}

/// Coplanar triangles that came from one face of a non-regular body.
///
/// Explicit segments lying in the face stay as boundaries between the
/// polygons rebuilt from the group.
#[derive(Debug, Clone)]
pub struct NonRegularFacetGroup {
    face_id: Option<FaceId>,
    plane: Plane,
    sides: Sides,
    triangles: Vec<TriangleFacet>,
}

impl NonRegularFacetGroup {
    #[must_use]
    pub fn new(first: TriangleFacet) -> Self {
        Self {
            face_id: first.face_id(),
            plane: *first.plane(),
            sides: first.sides(),
            triangles: vec![first],
        }
    }

    #[must_use]
    pub fn face_id(&self) -> Option<FaceId> {
        self.face_id
    }

    /// `t` came from the same face and has the same sides.
    #[must_use]
    pub fn accepts(&self, t: &TriangleFacet) -> bool {
        t.face_id() == self.face_id
            && self.plane.is_coplanar_with(t.plane())
            && sides_on(&self.plane, t) == self.sides
    }

    pub fn add(&mut self, t: TriangleFacet) {
        self.triangles.push(t);
    }

    #[must_use]
    pub fn triangle_facets(&self) -> &[TriangleFacet] {
        &self.triangles
    }

    /// Polygons of the group, split along `explicit_segments` and carrying
    /// the segments and `vertex_points` that fall inside them.
    ///
    /// # Errors
    ///
    /// Returns a topology error if a patch boundary is not made of closed
    /// loops, or a division error.
    pub fn generate_polygon_facets(
        &self,
        explicit_segments: &[Segment3],
        vertex_points: &[Point3],
        limits: &DivisionLimits,
    ) -> Result<Vec<PolygonFacet>> {
        let mut triangles = self.triangles.clone();
        remove_t_junctions(&mut triangles, limits)?;

        let on_plane: Vec<&Segment3> = explicit_segments
            .iter()
            .filter(|s| self.plane.contains(&s.p0) && self.plane.contains(&s.p1))
            .collect();
        let seams: Vec<Segment2> = on_plane
            .iter()
            .map(|s| Segment2::new(self.plane.parameter_at(&s.p0), self.plane.parameter_at(&s.p1)))
            .collect();

        let mut connector = NonRegularTriangleConnector::new(seams);
        for t in &triangles {
            connector.add_node(param_triangle_on(&self.plane, t));
        }
        connector.connect()?;
        connector.identify_clusters();

        let mut polygons = Vec::new();
        for &cluster in connector.cluster_ids() {
            let boundary = connector.extract_boundary(cluster)?;
            for loops in boundary.outer_loop_boundaries()? {
                let mut polygon = polygon_from_loops(&self.plane, self.sides, &loops)?;
                polygon.set_face_id(self.face_id);
                polygons.push(polygon);
            }
        }

        for polygon in &mut polygons {
            for s in &on_plane {
                polygon.insert_edge_segment(s);
            }
            for t in &triangles {
                for v in t.vertices() {
                    polygon.insert_vertex_point_on_loop(&v);
                }
            }
            for p in vertex_points {
                polygon.insert_vertex_point(p);
            }
        }
        debug!(
            face = ?self.face_id.map(FaceId::index),
            triangles = triangles.len(),
            polygons = polygons.len(),
            "non-regular facet group merged"
        );
        Ok(polygons)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::facet::FaceType;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    fn grid(cells: &[(f64, f64)], sides: Sides) -> Vec<TriangleFacet> {
        cells
            .iter()
            .flat_map(|&(x, y)| {
                let (a, b, c, d) = (p(x, y), p(x + 1.0, y), p(x + 1.0, y + 1.0), p(x, y + 1.0));
                [
                    TriangleFacet::from_points(a, b, c, sides).unwrap(),
                    TriangleFacet::from_points(a, c, d, sides).unwrap(),
                ]
            })
            .collect()
    }

    #[test]
    fn regular_group_merges_a_patch_into_one_face() {
        let mut triangles = grid(&[(0.0, 0.0), (1.0, 0.0)], Sides::FRONT_OUTSIDE).into_iter();
        let mut group = RegularFacetGroup::new(triangles.next().unwrap());
        for t in triangles {
            assert!(group.accepts(&t));
            group.add(t);
        }
        let polygons = group.generate_polygon_facets(&DivisionLimits::default()).unwrap();
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].face_type(), FaceType::OuterBoundary);
        approx::assert_relative_eq!(polygons[0].area(), 2.0, epsilon = 1e-9);
        // The straight-run vertices at (1, 0) and (1, 1) are kept.
        assert_eq!(polygons[0].outer_loop().len(), 6);
    }

    #[test]
    fn regular_group_rejects_the_other_side() {
        let group = RegularFacetGroup::new(grid(&[(0.0, 0.0)], Sides::FRONT_OUTSIDE).remove(0));
        let flipped = grid(&[(1.0, 0.0)], Sides::FRONT_INSIDE).remove(0);
        assert!(!group.accepts(&flipped));
        let off_plane = TriangleFacet::from_points(
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
            Sides::FRONT_OUTSIDE,
        )
        .unwrap();
        assert!(!group.accepts(&off_plane));
    }

    #[test]
    fn regular_group_resolves_t_junctions() {
        // A large triangle next to two small ones whose shared vertex sits on
        // the large triangle's edge.
        let sides = Sides::FRONT_OUTSIDE;
        let big = TriangleFacet::from_points(p(0.0, 0.0), p(2.0, 0.0), p(0.0, 2.0), sides).unwrap();
        let small_a =
            TriangleFacet::from_points(p(2.0, 0.0), p(2.0, 2.0), p(1.0, 1.0), sides).unwrap();
        let small_b =
            TriangleFacet::from_points(p(1.0, 1.0), p(2.0, 2.0), p(0.0, 2.0), sides).unwrap();
        let mut group = RegularFacetGroup::new(big);
        group.add(small_a);
        group.add(small_b);
        let polygons = group.generate_polygon_facets(&DivisionLimits::default()).unwrap();
        assert_eq!(polygons.len(), 1);
        approx::assert_relative_eq!(polygons[0].area(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn non_regular_group_keeps_explicit_seams() {
        let sides = Sides::NONE;
        let mut triangles = grid(&[(0.0, 0.0), (1.0, 0.0)], sides);
        let mut ids = crate::facet::FaceIdAllocator::new();
        let id = ids.allocate();
        for t in &mut triangles {
            t.set_face_id(Some(id));
        }
        let mut iter = triangles.into_iter();
        let mut group = NonRegularFacetGroup::new(iter.next().unwrap());
        for t in iter {
            assert!(group.accepts(&t));
            group.add(t);
        }
        let seam = Segment3::new(p(1.0, 0.0), p(1.0, 1.0));
        let polygons = group
            .generate_polygon_facets(&[seam], &[], &DivisionLimits::default())
            .unwrap();
        assert_eq!(polygons.len(), 2);
        assert!(polygons.iter().all(|f| f.face_id() == Some(id)));
        assert!(polygons.iter().all(|f| f.face_type() == FaceType::Sheet));
    }

    #[test]
    fn non_regular_group_carries_interior_points_and_edges() {
        let cells = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)];
        let mut triangles = grid(&cells, Sides::NONE).into_iter();
        let mut group = NonRegularFacetGroup::new(triangles.next().unwrap());
        for t in triangles {
            group.add(t);
        }
        let dangling = Segment3::new(p(0.0, 1.0), p(0.5, 1.0));
        let polygons = group
            .generate_polygon_facets(&[dangling], &[p(1.5, 0.5)], &DivisionLimits::default())
            .unwrap();
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].edge_segments().len(), 1);
        assert_eq!(polygons[0].vertex_points().len(), 1);
        assert!(!polygons[0].is_regular());
    }
}
