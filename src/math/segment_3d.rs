use super::tolerance::Near;
use super::{Aabb3, Point3, Vector3, TOLERANCE};

/// A straight segment in space, directed from `p0` to `p1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment3 {
    pub p0: Point3,
    pub p1: Point3,
}

impl Segment3 {
    #[must_use]
    pub fn new(p0: Point3, p1: Point3) -> Self {
        Self { p0, p1 }
    }

    #[must_use]
    pub fn vector(&self) -> Vector3 {
        self.p1 - self.p0
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.vector().norm()
    }

    #[must_use]
    pub fn midpoint(&self) -> Point3 {
        nalgebra::center(&self.p0, &self.p1)
    }

    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.length() < TOLERANCE
    }

    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3 {
        self.p0 + self.vector() * t
    }

    #[must_use]
    pub fn aabb(&self) -> Aabb3 {
        Aabb3::from_points(&[self.p0, self.p1])
    }

    #[must_use]
    pub fn parameter_of(&self, p: &Point3) -> f64 {
        let v = self.vector();
        let len2 = v.norm_squared();
        if len2 < TOLERANCE * TOLERANCE {
            return 0.0;
        }
        (p - self.p0).dot(&v) / len2
    }

    #[must_use]
    pub fn distance_to(&self, p: &Point3) -> f64 {
        let t = self.parameter_of(p).clamp(0.0, 1.0);
        (p - self.point_at(t)).norm()
    }

    /// Distance from `p` to the infinite carrier line.
    #[must_use]
    pub fn line_distance_to(&self, p: &Point3) -> f64 {
        let t = self.parameter_of(p);
        (p - self.point_at(t)).norm()
    }

    #[must_use]
    pub fn contains(&self, p: &Point3) -> bool {
        self.distance_to(p) < TOLERANCE
    }

    #[must_use]
    pub fn has_vertex_at(&self, p: &Point3) -> bool {
        self.p0.near(p) || self.p1.near(p)
    }

    #[must_use]
    pub fn just_contains(&self, p: &Point3) -> bool {
        self.contains(p) && !self.has_vertex_at(p)
    }

    #[must_use]
    pub fn reversed(&self) -> Self {
        Self::new(self.p1, self.p0)
    }

    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        self.p0.near(&other.p0) && self.p1.near(&other.p1)
    }

    #[must_use]
    pub fn is_reverse_of(&self, other: &Self) -> bool {
        self.p0.near(&other.p1) && self.p1.near(&other.p0)
    }

    /// Same endpoints in either order.
    #[must_use]
    pub fn coincides_with(&self, other: &Self) -> bool {
        self.same_as(other) || self.is_reverse_of(other)
    }

    #[must_use]
    pub fn is_parallel_to(&self, other: &Self) -> bool {
        let (a, b) = (self.vector(), other.vector());
        let scale = a.norm() * b.norm();
        if scale < TOLERANCE * TOLERANCE {
            return true;
        }
        a.cross(&b).norm() / scale < TOLERANCE
    }

    #[must_use]
    pub fn is_colinear_with(&self, other: &Self) -> bool {
        self.line_distance_to(&other.p0) < TOLERANCE && self.line_distance_to(&other.p1) < TOLERANCE
    }

    /// Meeting point of the two carrier lines, `None` when they are parallel
    /// or skew.
    #[must_use]
    pub fn line_crossing(&self, other: &Self) -> Option<Point3> {
        if self.is_parallel_to(other) {
            return None;
        }
        let d1 = self.vector();
        let d2 = other.vector();
        let r = self.p0 - other.p0;
        let a = d1.dot(&d1);
        let b = d1.dot(&d2);
        let c = d2.dot(&d2);
        let d = d1.dot(&r);
        let e = d2.dot(&r);
        let denom = a * c - b * b;
        let s = (b * e - c * d) / denom;
        let t = (a * e - b * d) / denom;
        let on_self = self.point_at(s);
        let on_other = other.point_at(t);
        on_self.near(&on_other).then(|| nalgebra::center(&on_self, &on_other))
    }

    /// Single crossing point lying on both closed segments.
    #[must_use]
    pub fn crossing_point(&self, other: &Self) -> Option<Point3> {
        self.line_crossing(other)
            .filter(|x| self.contains(x) && other.contains(x))
    }
}
