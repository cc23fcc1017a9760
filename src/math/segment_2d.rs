use crate::error::{GeometryError, Result};

use super::tolerance::Near;
use super::{Aabb2, Point2, Vector2, TOLERANCE};

/// A straight segment in the plane, directed from `p0` to `p1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment2 {
    pub p0: Point2,
    pub p1: Point2,
}

impl Segment2 {
    #[must_use]
    pub fn new(p0: Point2, p1: Point2) -> Self {
        Self { p0, p1 }
    }

    #[must_use]
    pub fn vector(&self) -> Vector2 {
        self.p1 - self.p0
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.vector().norm()
    }

    #[must_use]
    pub fn midpoint(&self) -> Point2 {
        nalgebra::center(&self.p0, &self.p1)
    }

    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.length() < TOLERANCE
    }

    #[must_use]
    pub fn reversed(&self) -> Self {
        Self::new(self.p1, self.p0)
    }

    #[must_use]
    pub fn point_at(&self, t: f64) -> Point2 {
        self.p0 + self.vector() * t
    }

    #[must_use]
    pub fn aabb(&self) -> Aabb2 {
        Aabb2::from_points(&[self.p0, self.p1])
    }

    /// Unit direction from `p0` to `p1`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` for a zero-length segment.
    pub fn direction(&self) -> Result<Vector2> {
        let len = self.length();
        if len < TOLERANCE {
            return Err(GeometryError::Degenerate(format!(
                "zero-length segment at ({}, {})",
                self.p0.x, self.p0.y
            ))
            .into());
        }
        Ok(self.vector() / len)
    }

    /// Unit normal pointing to the left of the direction. This side is the
    /// segment's front side.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` for a zero-length segment.
    pub fn normal(&self) -> Result<Vector2> {
        let d = self.direction()?;
        Ok(Vector2::new(-d.y, d.x))
    }

    /// Parameter of the projection of `p` onto the carrier line
    /// (0 at `p0`, 1 at `p1`).
    #[must_use]
    pub fn parameter_of(&self, p: &Point2) -> f64 {
        let v = self.vector();
        let len2 = v.norm_squared();
        if len2 < TOLERANCE * TOLERANCE {
            return 0.0;
        }
        (p - self.p0).dot(&v) / len2
    }

    /// Euclidean distance from `p` to the closed segment.
    #[must_use]
    pub fn distance_to(&self, p: &Point2) -> f64 {
        let t = self.parameter_of(p).clamp(0.0, 1.0);
        (p - self.point_at(t)).norm()
    }

    /// Distance from `p` to the infinite carrier line.
    #[must_use]
    pub fn line_distance_to(&self, p: &Point2) -> f64 {
        let v = self.vector();
        let len = v.norm();
        if len < TOLERANCE {
            return (p - self.p0).norm();
        }
        let w = p - self.p0;
        (v.x * w.y - v.y * w.x).abs() / len
    }

    /// `p` lies on the closed segment.
    #[must_use]
    pub fn contains(&self, p: &Point2) -> bool {
        self.distance_to(p) < TOLERANCE
    }

    #[must_use]
    pub fn has_vertex_at(&self, p: &Point2) -> bool {
        self.p0.near(p) || self.p1.near(p)
    }

    /// `p` lies on the segment but not at either endpoint.
    #[must_use]
    pub fn just_contains(&self, p: &Point2) -> bool {
        self.contains(p) && !self.has_vertex_at(p)
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
        (a.x * b.y - a.y * b.x).abs() / scale < TOLERANCE
    }

    /// Both segments lie on one carrier line.
    #[must_use]
    pub fn is_colinear_with(&self, other: &Self) -> bool {
        self.line_distance_to(&other.p0) < TOLERANCE && self.line_distance_to(&other.p1) < TOLERANCE
    }

    /// Crossing point of the two carrier lines, `None` when parallel.
    #[must_use]
    pub fn line_crossing(&self, other: &Self) -> Option<Point2> {
        if self.is_parallel_to(other) {
            return None;
        }
        let da = self.vector();
        let db = other.vector();
        let denom = da.x * db.y - da.y * db.x;
        let w = other.p0 - self.p0;
        let t = (w.x * db.y - w.y * db.x) / denom;
        Some(self.point_at(t))
    }

    /// Single crossing point lying on both closed segments.
    #[must_use]
    pub fn crossing_point(&self, other: &Self) -> Option<Point2> {
        self.line_crossing(other)
            .filter(|x| self.contains(x) && other.contains(x))
    }
}
