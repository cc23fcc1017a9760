use spade::handles::FixedVertexHandle;
use spade::{ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation};
use tracing::trace;

use crate::error::{GeometryError, Result, TessellationError};
use crate::math::polygon_2d;
use crate::math::tolerance::contains_point;
use crate::math::{Containment, Plane, Point2, Point3, Segment2, Segment3, Triangle2, Vector3};

use super::division::{divide_facets, DivisionLimits};
use super::triangle::TriangleFacet;
use super::{FaceId, FaceType, Facet, Sides};

/// A planar face with holes, the regularized form of a group of coplanar
/// triangle facets.
///
/// Loops are kept in the parameter space of the plane. Edges and vertices
/// that lie inside the face but on no loop are carried separately until the
/// face is triangulated.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonFacet {
    plane: Plane,
    outer_loop: Vec<Point2>,
    inner_loops: Vec<Vec<Point2>>,
    edge_segments: Vec<Segment2>,
    vertex_points: Vec<Point2>,
    sides: Sides,
    face_id: Option<FaceId>,
    triangles: Vec<TriangleFacet>,
}

impl PolygonFacet {
    /// Creates a polygon from an outer loop in the parameter space of `plane`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if the loop has fewer than three
    /// points or zero area.
    pub fn new(plane: Plane, outer_loop: Vec<Point2>, sides: Sides) -> Result<Self> {
        check_loop(&outer_loop)?;
        Ok(Self {
            plane,
            outer_loop,
            inner_loops: Vec::new(),
            edge_segments: Vec::new(),
            vertex_points: Vec::new(),
            sides,
            face_id: None,
            triangles: Vec::new(),
        })
    }

    /// Creates a polygon whose plane is fitted to `points` and oriented by
    /// their winding.
    ///
    /// # Errors
    ///
    /// Returns an error if the points are degenerate or not coplanar.
    pub fn from_points(points: &[Point3], sides: Sides) -> Result<Self> {
        let plane = Plane::from_loop(points)?;
        Self::on_plane(plane, points, sides)
    }

    /// Creates a polygon on a given plane from spatial loop points.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NotCoplanar` if a point is off the plane.
    pub fn on_plane(plane: Plane, points: &[Point3], sides: Sides) -> Result<Self> {
        let outer = project_loop(&plane, points)?;
        Self::new(plane, outer, sides)
    }

    /// The face covered by a single triangle, which is also its only
    /// triangle facet.
    #[must_use]
    pub fn from_triangle(triangle: &TriangleFacet) -> Self {
        Self {
            plane: *triangle.plane(),
            outer_loop: triangle.param_triangle().vertices.to_vec(),
            inner_loops: Vec::new(),
            edge_segments: Vec::new(),
            vertex_points: Vec::new(),
            sides: triangle.sides(),
            face_id: triangle.face_id(),
            triangles: vec![triangle.clone()],
        }
    }

    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` for a degenerate loop.
    pub fn add_inner_loop(&mut self, inner_loop: Vec<Point2>) -> Result<()> {
        check_loop(&inner_loop)?;
        self.inner_loops.push(inner_loop);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if a point is off the plane or the loop is degenerate.
    pub fn add_inner_loop_points(&mut self, points: &[Point3]) -> Result<()> {
        let inner = project_loop(&self.plane, points)?;
        self.add_inner_loop(inner)
    }

    #[must_use]
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    #[must_use]
    pub fn outer_loop(&self) -> &[Point2] {
        &self.outer_loop
    }

    #[must_use]
    pub fn inner_loops(&self) -> &[Vec<Point2>] {
        &self.inner_loops
    }

    #[must_use]
    pub fn outer_loop_points(&self) -> Vec<Point3> {
        self.lift_loop(&self.outer_loop)
    }

    #[must_use]
    pub fn inner_loop_points(&self) -> Vec<Vec<Point3>> {
        self.inner_loops.iter().map(|l| self.lift_loop(l)).collect()
    }

    fn lift_loop(&self, params: &[Point2]) -> Vec<Point3> {
        params.iter().map(|q| self.plane.position_at(q)).collect()
    }

    /// Off-loop edges, in parameter space.
    #[must_use]
    pub fn edge_segments(&self) -> &[Segment2] {
        &self.edge_segments
    }

    /// Off-loop vertices, in parameter space.
    #[must_use]
    pub fn vertex_points(&self) -> &[Point2] {
        &self.vertex_points
    }

    #[must_use]
    pub fn face_id(&self) -> Option<FaceId> {
        self.face_id
    }

    pub fn set_face_id(&mut self, face_id: Option<FaceId>) {
        self.face_id = face_id;
        for t in &mut self.triangles {
            t.set_face_id(face_id);
        }
    }

    #[must_use]
    pub fn face_type(&self) -> FaceType {
        self.sides.into()
    }

    #[must_use]
    pub fn normal_to_outside(&self) -> Option<Vector3> {
        self.sides
            .outside_sign()
            .map(|s| self.plane.plane_normal() * s)
    }

    /// Triangles produced by the last call to
    /// [`generate_triangle_facets`](Self::generate_triangle_facets).
    #[must_use]
    pub fn triangle_facets(&self) -> &[TriangleFacet] {
        &self.triangles
    }

    /// No off-loop edges or vertices are pending.
    #[must_use]
    pub fn is_regular(&self) -> bool {
        self.edge_segments.is_empty() && self.vertex_points.is_empty()
    }

    /// Classifies a parameter point against the face: holes are outside,
    /// every loop is `On`.
    #[must_use]
    pub fn containment_at(&self, q: &Point2) -> Containment {
        match polygon_2d::containment(q, &self.outer_loop) {
            Containment::In => {}
            other => return other,
        }
        for inner in &self.inner_loops {
            match polygon_2d::containment(q, inner) {
                Containment::In => return Containment::Out,
                Containment::On => return Containment::On,
                Containment::Out => {}
            }
        }
        Containment::In
    }

    /// `p` lies on the closed face.
    #[must_use]
    pub fn contains(&self, p: &Point3) -> bool {
        self.plane.contains(p)
            && self.containment_at(&self.plane.parameter_at(p)) != Containment::Out
    }

    /// `p` lies in the face's interior, off every loop.
    #[must_use]
    pub fn just_contains(&self, p: &Point3) -> bool {
        self.plane.contains(p)
            && self.containment_at(&self.plane.parameter_at(p)) == Containment::In
    }

    /// Adds `p` to the face: on a loop it becomes a new loop vertex, in the
    /// interior an off-loop vertex. Returns whether anything changed.
    pub fn insert_vertex_point(&mut self, p: &Point3) -> bool {
        if !self.plane.contains(p) {
            return false;
        }
        let q = self.plane.parameter_at(p);
        match self.containment_at(&q) {
            Containment::On => self.insert_on_loops(&q),
            Containment::In => {
                if contains_point(&self.vertex_points, &q)
                    || self.edge_segments.iter().any(|e| e.has_vertex_at(&q))
                {
                    return false;
                }
                self.vertex_points.push(q);
                true
            }
            Containment::Out => false,
        }
    }

    /// Adds `p` only if it splits a loop edge.
    pub fn insert_vertex_point_on_loop(&mut self, p: &Point3) -> bool {
        if !self.plane.contains(p) {
            return false;
        }
        self.insert_on_loops(&self.plane.parameter_at(p))
    }

    fn insert_on_loops(&mut self, q: &Point2) -> bool {
        if polygon_2d::insert_on_loop(&mut self.outer_loop, q) {
            return true;
        }
        self.inner_loops
            .iter_mut()
            .any(|inner| polygon_2d::insert_on_loop(inner, q))
    }

    /// Adds a coplanar segment running through the interior as an off-loop
    /// edge. Its endpoints on a loop become loop vertices.
    pub fn insert_edge_segment(&mut self, s: &Segment3) -> bool {
        if !self.plane.contains(&s.p0) || !self.plane.contains(&s.p1) {
            return false;
        }
        let seg = Segment2::new(self.plane.parameter_at(&s.p0), self.plane.parameter_at(&s.p1));
        if seg.is_degenerate()
            || self.containment_at(&seg.midpoint()) != Containment::In
            || self.edge_segments.iter().any(|e| e.coincides_with(&seg))
        {
            return false;
        }
        for end in [seg.p0, seg.p1] {
            self.insert_on_loops(&end);
        }
        self.edge_segments.push(seg);
        true
    }

    /// Area of the face minus its holes.
    #[must_use]
    pub fn area(&self) -> f64 {
        let holes: f64 = self
            .inner_loops
            .iter()
            .map(|l| polygon_2d::signed_area(l).abs())
            .sum();
        polygon_2d::signed_area(&self.outer_loop).abs() - holes
    }

    /// Triangulates the face: a constrained Delaunay triangulation of the
    /// loops and off-loop vertices, then division by the off-loop edges.
    ///
    /// # Errors
    ///
    /// Returns `TessellationError::Failed` if the loops cannot be inserted as
    /// constraints, or a division error.
    pub fn generate_triangle_facets(&mut self, limits: &DivisionLimits) -> Result<()> {
        let mut cdt = Cdt::new();
        for lp in std::iter::once(&self.outer_loop).chain(&self.inner_loops) {
            constrain_loop(&mut cdt, lp)?;
        }
        let loose = self
            .vertex_points
            .iter()
            .chain(self.edge_segments.iter().flat_map(|s| [&s.p0, &s.p1]));
        for q in loose {
            insert_vertex(&mut cdt, q)?;
        }

        let mut triangles = Vec::new();
        for face in cdt.inner_faces() {
            let [a, b, c] = face.vertices().map(|v| {
                let pos = v.position();
                Point2::new(pos.x, pos.y)
            });
            let param = Triangle2::new(a, b, c);
            if param.is_degenerate() {
                trace!("skipping sliver from triangulation");
                continue;
            }
            // No triangle crosses a constrained loop, so its centroid is
            // never on one.
            if self.containment_at(&param.centroid()) != Containment::In {
                continue;
            }
            triangles.push(TriangleFacet::new(self.plane, param, self.sides, self.face_id)?);
        }

        let edges: Vec<Segment3> = self
            .edge_segments
            .iter()
            .map(|s| Segment3::new(self.plane.position_at(&s.p0), self.plane.position_at(&s.p1)))
            .collect();
        divide_facets(&edges, &mut triangles, limits)?;

        trace!(triangles = triangles.len(), "polygon triangulated");
        self.triangles = triangles;
        Ok(())
    }
}

impl Facet for PolygonFacet {
    fn sides(&self) -> Sides {
        self.sides
    }

    fn set_sides(&mut self, sides: Sides) {
        self.sides = sides;
        for t in &mut self.triangles {
            t.set_sides(sides);
        }
    }

    fn measure(&self) -> f64 {
        self.area()
    }
}

fn check_loop(points: &[Point2]) -> Result<()> {
    if points.len() < 3 {
        return Err(GeometryError::Degenerate("polygon loop needs three points".into()).into());
    }
    if polygon_2d::signed_area(points).abs() < crate::math::TOLERANCE {
        return Err(GeometryError::Degenerate("polygon loop has zero area".into()).into());
    }
    Ok(())
}

fn project_loop(plane: &Plane, points: &[Point3]) -> Result<Vec<Point2>> {
    points
        .iter()
        .map(|p| {
            if plane.contains(p) {
                Ok(plane.parameter_at(p))
            } else {
                Err(GeometryError::NotCoplanar(format!(
                    "loop point ({}, {}, {}) is off the polygon plane",
                    p.x, p.y, p.z
                ))
                .into())
            }
        })
        .collect()
}

type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

fn insert_vertex(cdt: &mut Cdt, q: &Point2) -> Result<FixedVertexHandle> {
    Ok(cdt
        .insert(SpadePoint2::new(q.x, q.y))
        .map_err(|e: InsertionError| TessellationError::Failed(format!("CDT insert: {e}")))?)
}

/// Inserts the loop's vertices and constrains every loop edge.
fn constrain_loop(cdt: &mut Cdt, points: &[Point2]) -> Result<()> {
    let handles = points
        .iter()
        .map(|q| insert_vertex(cdt, q))
        .collect::<Result<Vec<_>>>()?;
    for (&from, &to) in handles.iter().zip(handles.iter().cycle().skip(1)) {
        if from == to {
            continue;
        }
        if !cdt.can_add_constraint(from, to) {
            return Err(TessellationError::Failed("polygon loops intersect".into()).into());
        }
        cdt.add_constraint(from, to);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{Near, TOLERANCE};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn square(z: f64, size: f64) -> Vec<Point3> {
        vec![p(0.0, 0.0, z), p(size, 0.0, z), p(size, size, z), p(0.0, size, z)]
    }

    fn triangulated_area(poly: &PolygonFacet) -> f64 {
        poly.triangle_facets().iter().map(Facet::measure).sum()
    }

    #[test]
    fn square_produces_2_triangles() {
        let mut poly = PolygonFacet::from_points(&square(1.0, 2.0), Sides::FRONT_OUTSIDE).unwrap();
        poly.generate_triangle_facets(&DivisionLimits::default()).unwrap();
        assert_eq!(poly.triangle_facets().len(), 2);
        assert!((triangulated_area(&poly) - 4.0).abs() < TOLERANCE);
        for t in poly.triangle_facets() {
            assert_eq!(t.sides(), Sides::FRONT_OUTSIDE);
            assert!(t.plane().same_as(poly.plane()));
        }
    }

    #[test]
    fn face_with_hole_excludes_interior() {
        let mut poly = PolygonFacet::from_points(&square(0.0, 4.0), Sides::FRONT_OUTSIDE).unwrap();
        let hole = [p(1.0, 1.0, 0.0), p(1.0, 3.0, 0.0), p(3.0, 3.0, 0.0), p(3.0, 1.0, 0.0)];
        poly.add_inner_loop_points(&hole).unwrap();
        assert!((poly.area() - 12.0).abs() < TOLERANCE);
        assert!(!poly.contains(&p(2.0, 2.0, 0.0)));
        assert!(poly.contains(&p(1.0, 2.0, 0.0)));
        assert!(!poly.just_contains(&p(1.0, 2.0, 0.0)));
        assert!(poly.just_contains(&p(0.5, 2.0, 0.0)));

        poly.generate_triangle_facets(&DivisionLimits::default()).unwrap();
        assert!((triangulated_area(&poly) - 12.0).abs() < 1e-9);
        assert!(poly.triangle_facets().iter().all(|t| !t.contains(&p(2.0, 2.0, 0.0))));
    }

    #[test]
    fn vertex_on_loop_is_inserted_into_the_loop() {
        let mut poly = PolygonFacet::from_points(&square(0.0, 2.0), Sides::NONE).unwrap();
        assert!(poly.insert_vertex_point(&p(2.0, 1.0, 0.0)));
        assert_eq!(poly.outer_loop().len(), 5);
        assert!(poly.is_regular());
        assert!(!poly.insert_vertex_point_on_loop(&p(2.0, 1.0, 0.0)));
        assert!(!poly.insert_vertex_point(&p(5.0, 1.0, 0.0)));
    }

    #[test]
    fn interior_vertex_becomes_a_triangle_vertex() {
        let mut poly = PolygonFacet::from_points(&square(0.0, 2.0), Sides::NONE).unwrap();
        assert!(poly.insert_vertex_point(&p(0.7, 0.9, 0.0)));
        assert!(!poly.insert_vertex_point(&p(0.7, 0.9, 0.0)));
        assert!(!poly.is_regular());
        poly.generate_triangle_facets(&DivisionLimits::default()).unwrap();
        let target = p(0.7, 0.9, 0.0);
        assert!(poly
            .triangle_facets()
            .iter()
            .any(|t| t.vertices().iter().any(|v| v.near(&target))));
        assert!((triangulated_area(&poly) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn off_loop_edge_divides_the_triangulation() {
        let mut poly = PolygonFacet::from_points(&square(0.0, 2.0), Sides::NONE).unwrap();
        let seam = Segment3::new(p(1.0, 0.0, 0.0), p(1.0, 2.0, 0.0));
        assert!(poly.insert_edge_segment(&seam));
        assert!(!poly.insert_edge_segment(&Segment3::new(seam.p1, seam.p0)));
        assert_eq!(poly.outer_loop().len(), 6);
        poly.generate_triangle_facets(&DivisionLimits::default()).unwrap();
        assert!((triangulated_area(&poly) - 4.0).abs() < 1e-9);
        // No triangle straddles the seam.
        for t in poly.triangle_facets() {
            let xs = t.vertices().map(|v| v.x);
            let min = xs.iter().copied().fold(f64::INFINITY, f64::min);
            let max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            assert!(max <= 1.0 + 1e-9 || min >= 1.0 - 1e-9);
        }
    }

    #[test]
    fn edge_on_the_boundary_is_not_off_loop() {
        let mut poly = PolygonFacet::from_points(&square(0.0, 2.0), Sides::NONE).unwrap();
        assert!(!poly.insert_edge_segment(&Segment3::new(p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0))));
        assert!(poly.is_regular());
    }

    #[test]
    fn non_planar_points_are_rejected() {
        let pts = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 1.0), p(0.0, 1.0, 0.0)];
        assert!(PolygonFacet::from_points(&pts, Sides::NONE).is_err());
    }

    #[test]
    fn reversing_updates_triangles() {
        let mut poly = PolygonFacet::from_points(&square(0.0, 1.0), Sides::FRONT_OUTSIDE).unwrap();
        poly.generate_triangle_facets(&DivisionLimits::default()).unwrap();
        poly.reverse_normal();
        assert!(poly.normal_to_outside().unwrap().near(&Vector3::new(0.0, 0.0, -1.0)));
        assert!(poly.triangle_facets().iter().all(|t| t.sides() == Sides::FRONT_INSIDE));
    }

    #[test]
    fn single_triangle_face() {
        let (a, b, c) = (p(0.0, 0.0, 2.0), p(2.0, 0.0, 2.0), p(0.0, 2.0, 2.0));
        let t = TriangleFacet::from_points(a, b, c, Sides::FRONT_OUTSIDE).unwrap();
        let face = PolygonFacet::from_triangle(&t);
        approx::assert_relative_eq!(face.area(), 2.0, epsilon = 1e-9);
        assert_eq!(face.triangle_facets(), &[t.clone()]);
        assert!(face.just_contains(&t.centroid()));
        assert!(face.contains(&p(1.0, 0.0, 2.0)));
        assert!(!face.contains(&p(1.5, 1.5, 2.0)));
        assert_eq!(face.normal_to_outside(), t.normal_to_outside());
    }
}
