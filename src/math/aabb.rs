use super::tolerance::{le, lt};
use super::{Point2, Point3};

/// Axis-aligned bounding box in the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb2 {
    pub min: Point2,
    pub max: Point2,
}

impl Aabb2 {
    /// Smallest box enclosing `points`. An empty slice gives an inverted box
    /// that overlaps nothing.
    #[must_use]
    pub fn from_points(points: &[Point2]) -> Self {
        let mut min = Point2::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Self { min, max }
    }

    /// Tolerant overlap test (touching boxes overlap).
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        !(lt(self.max.x, other.min.x)
            || lt(other.max.x, self.min.x)
            || lt(self.max.y, other.min.y)
            || lt(other.max.y, self.min.y))
    }

    /// Tolerant point-inside-box test.
    #[must_use]
    pub fn contains(&self, p: &Point2) -> bool {
        le(self.min.x, p.x) && le(p.x, self.max.x) && le(self.min.y, p.y) && le(p.y, self.max.y)
    }
}

/// Axis-aligned bounding box in space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3 {
    pub min: Point3,
    pub max: Point3,
}

impl Aabb3 {
    /// Smallest box enclosing `points`.
    #[must_use]
    pub fn from_points(points: &[Point3]) -> Self {
        let mut min = Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        let mut max = Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in points {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }
        Self { min, max }
    }

    /// Tolerant overlap test (touching boxes overlap).
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        (0..3).all(|i| le(self.min[i], other.max[i]) && le(other.min[i], self.max[i]))
    }

    /// Tolerant point-inside-box test.
    #[must_use]
    pub fn contains(&self, p: &Point3) -> bool {
        (0..3).all(|i| le(self.min[i], p[i]) && le(p[i], self.max[i]))
    }
}
