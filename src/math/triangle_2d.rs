use super::tolerance::Near;
use super::{Aabb2, Point2, Segment2, Vector2, TOLERANCE};

/// A triangle in the plane. Edge `i` runs from vertex `i` to vertex `i + 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle2 {
    pub vertices: [Point2; 3],
}

/// Where a point lies relative to a closed triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriangleContainment {
    Outside,
    Inside,
    /// In the interior of edge `i`.
    OnEdge(usize),
    /// At vertex `i`.
    AtVertex(usize),
}

impl Triangle2 {
    #[must_use]
    pub fn new(a: Point2, b: Point2, c: Point2) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }

    #[must_use]
    pub fn vertex(&self, i: usize) -> Point2 {
        self.vertices[i % 3]
    }

    #[must_use]
    pub fn edge(&self, i: usize) -> Segment2 {
        Segment2::new(self.vertex(i), self.vertex(i + 1))
    }

    /// Positive for counter-clockwise vertex order.
    #[must_use]
    pub fn signed_area(&self) -> f64 {
        let [a, b, c] = self.vertices;
        let (u, v) = (b - a, c - a);
        0.5 * (u.x * v.y - u.y * v.x)
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Zero area within tolerance: some vertex lies on the opposite edge's
    /// line.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        let longest = (0..3).map(|i| self.edge(i).length()).fold(0.0, f64::max);
        longest < TOLERANCE || 2.0 * self.area() / longest < TOLERANCE
    }

    #[must_use]
    pub fn centroid(&self) -> Point2 {
        let [a, b, c] = self.vertices;
        Point2::from((a.coords + b.coords + c.coords) / 3.0)
    }

    #[must_use]
    pub fn aabb(&self) -> Aabb2 {
        Aabb2::from_points(&self.vertices)
    }

    /// Vertices starting at vertex `k`, keeping the cyclic order.
    #[must_use]
    pub fn rotated(&self, k: usize) -> [Point2; 3] {
        [self.vertex(k), self.vertex(k + 1), self.vertex(k + 2)]
    }

    #[must_use]
    pub fn vertex_at(&self, p: &Point2) -> Option<usize> {
        self.vertices.iter().position(|v| v.near(p))
    }

    #[must_use]
    pub fn containment(&self, p: &Point2) -> TriangleContainment {
        if let Some(i) = self.vertex_at(p) {
            return TriangleContainment::AtVertex(i);
        }
        if let Some(i) = (0..3).find(|&i| self.edge(i).contains(p)) {
            return TriangleContainment::OnEdge(i);
        }
        let orientation = self.signed_area().signum();
        let inside = (0..3).all(|i| {
            let e = self.edge(i).vector();
            let w = p - self.vertex(i);
            (e.x * w.y - e.y * w.x) * orientation > 0.0
        });
        if inside {
            TriangleContainment::Inside
        } else {
            TriangleContainment::Outside
        }
    }

    /// Parameter range `[t0, t1]` of the part of `seg` lying in the closed
    /// triangle, or `None` if they do not meet.
    #[must_use]
    pub fn clip(&self, seg: &Segment2) -> Option<(f64, f64)> {
        let orientation = self.signed_area().signum();
        let d = seg.vector();
        let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
        for i in 0..3 {
            let e = self.edge(i).vector();
            let len = e.norm();
            if len < TOLERANCE {
                return None;
            }
            let inward = Vector2::new(-e.y, e.x) * (orientation / len);
            let num = inward.dot(&(seg.p0 - self.vertex(i)));
            let den = inward.dot(&d);
            if den.abs() < TOLERANCE * TOLERANCE {
                if num < -TOLERANCE {
                    return None;
                }
                continue;
            }
            let t = -num / den;
            if den > 0.0 {
                t0 = t0.max(t);
            } else {
                t1 = t1.min(t);
            }
        }
        let slack = TOLERANCE / d.norm().max(TOLERANCE);
        (t0 <= t1 + slack).then_some((t0, t1.max(t0)))
    }
}
