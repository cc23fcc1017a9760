use tracing::trace;

use crate::error::{GeometryError, Result};
use crate::math::tolerance::push_unique;
use crate::math::{
    Aabb3, Near, Plane, Point2, Point3, Segment2, Segment3, Triangle2, Triangle3,
    TriangleContainment, Vector3, TOLERANCE,
};

use super::division::{divide_facets, DivisionLimits, DivisionResult, Divisible};
use super::segment_3d::SegmentFacet3D;
use super::{FaceId, FaceType, Facet, Sides};

/// A triangular piece of a 3D boundary.
///
/// Geometry is held as a triangle in the parameter space of its plane; the
/// spatial triangle and its bounding box are cached.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleFacet {
    plane: Plane,
    param: Triangle2,
    sides: Sides,
    face_id: Option<FaceId>,
    triangle: Triangle3,
    aabb: Aabb3,
}

/// Where another triangle meets this facet's plane.
enum Trace {
    Point(Point3),
    Segment(Segment3),
}

impl TriangleFacet {
    /// Creates a facet from a parameter triangle on `plane`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if the triangle has zero area.
    pub fn new(
        plane: Plane,
        param: Triangle2,
        sides: Sides,
        face_id: Option<FaceId>,
    ) -> Result<Self> {
        if param.is_degenerate() {
            return Err(GeometryError::Degenerate("zero-area triangle facet".into()).into());
        }
        Ok(Self::build(plane, param, sides, face_id))
    }

    /// Creates a facet through three points. The plane normal follows the
    /// vertex order.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if the points are colinear.
    pub fn from_points(a: Point3, b: Point3, c: Point3, sides: Sides) -> Result<Self> {
        let plane = Plane::from_loop(&[a, b, c])?;
        let param = Triangle2::new(
            plane.parameter_at(&a),
            plane.parameter_at(&b),
            plane.parameter_at(&c),
        );
        Self::new(plane, param, sides, None)
    }

    fn build(plane: Plane, param: Triangle2, sides: Sides, face_id: Option<FaceId>) -> Self {
        let triangle = Triangle3::new(
            plane.position_at(&param.vertices[0]),
            plane.position_at(&param.vertices[1]),
            plane.position_at(&param.vertices[2]),
        );
        Self {
            plane,
            param,
            sides,
            face_id,
            aabb: triangle.aabb(),
            triangle,
        }
    }

    fn child(&self, a: Point2, b: Point2, c: Point2) -> Self {
        Self::build(self.plane, Triangle2::new(a, b, c), self.sides, self.face_id)
    }

    #[must_use]
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    #[must_use]
    pub fn param_triangle(&self) -> &Triangle2 {
        &self.param
    }

    #[must_use]
    pub fn triangle(&self) -> &Triangle3 {
        &self.triangle
    }

    #[must_use]
    pub fn vertices(&self) -> [Point3; 3] {
        self.triangle.vertices
    }

    #[must_use]
    pub fn aabb(&self) -> &Aabb3 {
        &self.aabb
    }

    #[must_use]
    pub fn face_id(&self) -> Option<FaceId> {
        self.face_id
    }

    pub fn set_face_id(&mut self, face_id: Option<FaceId>) {
        self.face_id = face_id;
    }

    #[must_use]
    pub fn face_type(&self) -> FaceType {
        self.sides.into()
    }

    /// Unit normal pointing away from the volume, outer boundaries only.
    #[must_use]
    pub fn normal_to_outside(&self) -> Option<Vector3> {
        self.sides
            .outside_sign()
            .map(|s| self.plane.plane_normal() * s)
    }

    #[must_use]
    pub fn centroid(&self) -> Point3 {
        self.triangle.centroid()
    }

    #[must_use]
    pub fn contains(&self, p: &Point3) -> bool {
        self.aabb.contains(p) && self.triangle.contains(p)
    }

    /// Divides at a parameter point: three children when it is inside,
    /// two when it is on an edge.
    fn divide_at(&self, q: &Point2) -> DivisionResult<Self> {
        match self.param.containment(q) {
            TriangleContainment::Inside => DivisionResult::Split(self.split_inside(q)),
            TriangleContainment::OnEdge(e) => DivisionResult::Split(self.split_on_edge(e, q)),
            TriangleContainment::AtVertex(_) | TriangleContainment::Outside => {
                DivisionResult::Unchanged
            }
        }
    }

    fn split_inside(&self, q: &Point2) -> Vec<Self> {
        let [v0, v1, v2] = self.param.vertices;
        vec![
            self.child(v0, v1, *q),
            self.child(v1, v2, *q),
            self.child(v2, v0, *q),
        ]
    }

    fn split_on_edge(&self, edge: usize, q: &Point2) -> Vec<Self> {
        let [a, b, c] = self.param.rotated(edge);
        vec![self.child(a, *q, c), self.child(*q, b, c)]
    }

    /// Both points strictly inside the same edge.
    fn split_on_edge_twice(&self, edge: usize, p: Point2, q: Point2) -> Vec<Self> {
        let [v0, v1, v2] = self.param.rotated(edge);
        let (p0, p1) = if (q - v0).norm() < (p - v0).norm() {
            (q, p)
        } else {
            (p, q)
        };
        vec![
            self.child(v0, p0, v2),
            self.child(p0, p1, v2),
            self.child(p1, v1, v2),
        ]
    }

    /// Points on two different edges: cuts off the corner they share.
    fn split_across_corner(&self, e0: usize, p: Point2, e1: usize, q: Point2) -> Vec<Self> {
        let (corner_edge, p0, p1) = if (e0 + 1) % 3 == e1 { (e0, p, q) } else { (e1, q, p) };
        let [v0, v1, v2] = self.param.rotated(corner_edge);
        vec![
            self.child(v0, p0, v2),
            self.child(p0, v1, p1),
            self.child(p1, v2, p0),
        ]
    }

    /// `on_edge` inside `edge`, `inside` strictly inside the triangle.
    fn split_edge_inside(&self, edge: usize, on_edge: Point2, inside: Point2) -> Vec<Self> {
        let [v0, v1, v2] = self.param.rotated(edge);
        vec![
            self.child(v0, on_edge, inside),
            self.child(on_edge, v1, inside),
            self.child(v1, v2, inside),
            self.child(v2, v0, inside),
        ]
    }

    /// Both points strictly inside: fan at the first, then split the fan
    /// triangle(s) holding the second.
    fn split_inside_twice(&self, p: &Point2, q: &Point2) -> Vec<Self> {
        let mut pieces = Vec::with_capacity(5);
        for fan in self.split_inside(p) {
            match fan.divide_at(q) {
                DivisionResult::Split(children) => pieces.extend(children),
                DivisionResult::Unchanged => pieces.push(fan),
            }
        }
        pieces
    }

    /// Divides along the chord `a`-`b`, both on the closed triangle.
    fn divide_by_chord(&self, a: Point2, b: Point2) -> DivisionResult<Self> {
        use TriangleContainment::{AtVertex, Inside, OnEdge, Outside};

        let pieces = match (self.param.containment(&a), self.param.containment(&b)) {
            (AtVertex(_), AtVertex(_)) | (Outside, Outside) => return DivisionResult::Unchanged,
            (Outside | AtVertex(_), _) => return self.divide_at(&b),
            (_, Outside | AtVertex(_)) => return self.divide_at(&a),
            (OnEdge(e0), OnEdge(e1)) if e0 == e1 => self.split_on_edge_twice(e0, a, b),
            (OnEdge(e0), OnEdge(e1)) => self.split_across_corner(e0, a, e1, b),
            (OnEdge(e), Inside) => self.split_edge_inside(e, a, b),
            (Inside, OnEdge(e)) => self.split_edge_inside(e, b, a),
            (Inside, Inside) => self.split_inside_twice(&a, &b),
        };
        DivisionResult::Split(pieces)
    }

    /// Divides by a segment lying in the parameter plane.
    fn divide_by_coplanar(&self, seg: &Segment2) -> DivisionResult<Self> {
        let Some((t0, t1)) = self.param.clip(seg) else {
            return DivisionResult::Unchanged;
        };
        let (a, b) = (seg.point_at(t0), seg.point_at(t1));
        if a.near(&b) {
            self.divide_at(&a)
        } else {
            self.divide_by_chord(a, b)
        }
    }

    fn divide_by_point(&self, p: &Point3) -> DivisionResult<Self> {
        if !self.aabb.contains(p) || !self.plane.contains(p) {
            return DivisionResult::Unchanged;
        }
        self.divide_at(&self.plane.parameter_at(p))
    }

    fn divide_by_segment(&self, s: &Segment3) -> DivisionResult<Self> {
        if !self.aabb.overlaps(&s.aabb()) {
            return DivisionResult::Unchanged;
        }
        let d0 = self.plane.signed_distance(&s.p0);
        let d1 = self.plane.signed_distance(&s.p1);
        match (d0.abs() < TOLERANCE, d1.abs() < TOLERANCE) {
            (true, true) => self.divide_by_coplanar(&Segment2::new(
                self.plane.parameter_at(&s.p0),
                self.plane.parameter_at(&s.p1),
            )),
            (true, false) => self.divide_by_point(&s.p0),
            (false, true) => self.divide_by_point(&s.p1),
            (false, false) if d0 * d1 < 0.0 => self.divide_by_point(&s.point_at(d0 / (d0 - d1))),
            (false, false) => DivisionResult::Unchanged,
        }
    }

    /// Intersection of this triangle with a plane it crosses or touches.
    fn trace_on(&self, plane: &Plane) -> Option<Trace> {
        let v = self.triangle.vertices;
        let d = v.map(|p| plane.signed_distance(&p));
        let mut points = Vec::with_capacity(3);
        for i in 0..3 {
            if d[i].abs() < TOLERANCE {
                push_unique(&mut points, v[i]);
            }
        }
        for i in 0..3 {
            let j = (i + 1) % 3;
            if d[i].abs() >= TOLERANCE && d[j].abs() >= TOLERANCE && d[i] * d[j] < 0.0 {
                push_unique(&mut points, v[i] + (v[j] - v[i]) * (d[i] / (d[i] - d[j])));
            }
        }
        match points.as_slice() {
            [] => None,
            [p] => Some(Trace::Point(*p)),
            [p, q, ..] => Some(Trace::Segment(Segment3::new(*p, *q))),
        }
    }
}

impl Facet for TriangleFacet {
    fn sides(&self) -> Sides {
        self.sides
    }

    fn set_sides(&mut self, sides: Sides) {
        self.sides = sides;
    }

    fn measure(&self) -> f64 {
        self.triangle.area()
    }
}

impl Divisible<Point3> for TriangleFacet {
    fn divide_by(&self, point: &Point3) -> Result<DivisionResult<Self>> {
        Ok(self.divide_by_point(point))
    }
}

impl Divisible<Segment3> for TriangleFacet {
    fn divide_by(&self, divider: &Segment3) -> Result<DivisionResult<Self>> {
        if divider.is_degenerate() {
            return Err(GeometryError::Degenerate(format!(
                "zero-length divider at ({}, {}, {})",
                divider.p0.x, divider.p0.y, divider.p0.z
            ))
            .into());
        }
        Ok(self.divide_by_segment(divider))
    }
}

impl Divisible<SegmentFacet3D> for TriangleFacet {
    fn divide_by(&self, divider: &SegmentFacet3D) -> Result<DivisionResult<Self>> {
        Ok(self.divide_by_segment(divider.segment()))
    }
}

impl Divisible<TriangleFacet> for TriangleFacet {
    fn divide_by(&self, other: &TriangleFacet) -> Result<DivisionResult<Self>> {
        self.divide_within(other, &DivisionLimits::default())
    }

    fn divide_within(
        &self,
        other: &TriangleFacet,
        limits: &DivisionLimits,
    ) -> Result<DivisionResult<Self>> {
        if !self.aabb.overlaps(&other.aabb) {
            return Ok(DivisionResult::Unchanged);
        }
        if self.plane.is_coplanar_with(&other.plane) {
            let edges: Vec<Segment3> = (0..3).map(|i| other.triangle.edge(i)).collect();
            let mut pieces = vec![self.clone()];
            divide_facets(&edges, &mut pieces, limits)?;
            if pieces.len() > 1 {
                trace!(pieces = pieces.len(), "coplanar triangle division");
            }
            return Ok(DivisionResult::from_pieces(pieces));
        }
        Ok(match other.trace_on(&self.plane) {
            None => DivisionResult::Unchanged,
            Some(Trace::Point(p)) => self.divide_by_point(&p),
            Some(Trace::Segment(s)) => self.divide_by_segment(&s),
        })
    }
}
