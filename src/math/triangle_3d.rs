use super::{Aabb3, Point3, Segment3, Vector3, TOLERANCE};

/// A triangle in space. Edge `i` runs from vertex `i` to vertex `i + 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle3 {
    pub vertices: [Point3; 3],
}

impl Triangle3 {
    #[must_use]
    pub fn new(a: Point3, b: Point3, c: Point3) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }

    #[must_use]
    pub fn vertex(&self, i: usize) -> Point3 {
        self.vertices[i % 3]
    }

    #[must_use]
    pub fn edge(&self, i: usize) -> Segment3 {
        Segment3::new(self.vertex(i), self.vertex(i + 1))
    }

    /// Unnormalized normal following the vertex order.
    #[must_use]
    pub fn area_vector(&self) -> Vector3 {
        let [a, b, c] = self.vertices;
        (b - a).cross(&(c - a)) * 0.5
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.area_vector().norm()
    }

    #[must_use]
    pub fn centroid(&self) -> Point3 {
        let [a, b, c] = self.vertices;
        Point3::from((a.coords + b.coords + c.coords) / 3.0)
    }

    #[must_use]
    pub fn aabb(&self) -> Aabb3 {
        Aabb3::from_points(&self.vertices)
    }

    /// `p` lies on the closed triangle.
    #[must_use]
    pub fn contains(&self, p: &Point3) -> bool {
        let n = self.area_vector();
        let len = n.norm();
        if len < TOLERANCE * TOLERANCE {
            return false;
        }
        let n = n / len;
        if (p - self.vertices[0]).dot(&n).abs() >= TOLERANCE {
            return false;
        }
        if (0..3).any(|i| self.edge(i).contains(p)) {
            return true;
        }
        (0..3).all(|i| {
            let e = self.edge(i).vector();
            e.cross(&(p - self.vertex(i))).dot(&n) > 0.0
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn contains_interior_and_boundary() {
        let t = Triangle3::new(
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(2.0, 0.0, 1.0),
            Point3::new(0.0, 2.0, 1.0),
        );
        assert!(t.contains(&Point3::new(0.5, 0.5, 1.0)));
        assert!(t.contains(&Point3::new(1.0, 0.0, 1.0)));
        assert!(!t.contains(&Point3::new(0.5, 0.5, 1.1)));
        assert!(!t.contains(&Point3::new(1.5, 1.5, 1.0)));
        assert!((t.area() - 2.0).abs() < TOLERANCE);
    }
}
