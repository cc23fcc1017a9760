use tracing::{trace, warn};

use crate::error::{OperationError, Result};
use crate::facet::{PolygonFacet, SegmentFacet};
use crate::math::{Aabb2, Aabb3, Containment, Point2, Point3, Vector2, Vector3, TOLERANCE};

/// Ray directions tried in order. None is axis-aligned, so rays from points
/// on grid-aligned boundaries rarely graze a vertex or edge.
const RAY_DIRECTIONS_2D: [(f64, f64); 4] =
    [(1.0, 0.3719), (-0.4127, 1.0), (-1.0, -0.2903), (0.5311, -1.0)];

const RAY_DIRECTIONS_3D: [(f64, f64, f64); 4] = [
    (1.0, 0.3719, 0.1573),
    (-0.2311, 1.0, 0.4127),
    (0.2903, -0.3761, 1.0),
    (0.7109, 0.5311, -0.4673),
];

enum RayCastResult {
    Clear(Containment),
    Degenerate,
}

/// A ray hit: distance along the ray, whether it grazed the boundary of the
/// hit fragment, and the outward normal's component along the ray.
struct Hit {
    t: f64,
    grazing: bool,
    facing: f64,
}

/// Picks the nearest hit. Its outward normal tells which side the ray
/// started on.
fn resolve(hits: &[Hit]) -> RayCastResult {
    let Some(nearest) = hits.iter().map(|h| h.t).reduce(f64::min) else {
        return RayCastResult::Clear(Containment::Out);
    };
    let mut facing = 0.0;
    for hit in hits.iter().filter(|h| h.t < nearest + TOLERANCE) {
        if hit.grazing || hit.facing.abs() < TOLERANCE {
            return RayCastResult::Degenerate;
        }
        facing = hit.facing;
    }
    if facing > 0.0 {
        RayCastResult::Clear(Containment::In)
    } else {
        RayCastResult::Clear(Containment::Out)
    }
}

fn apply_negation(c: Containment, negated: bool) -> Containment {
    if negated {
        c.negated()
    } else {
        c
    }
}

/// Point containment against the outer boundary of a 2D body.
#[derive(Debug, Clone)]
pub struct InOutChecker2D {
    facets: Vec<SegmentFacet>,
    aabb: Aabb2,
    negated: bool,
}

impl InOutChecker2D {
    /// Builds a checker over the outer-boundary facets among `facets`.
    #[must_use]
    pub fn new<'a>(facets: impl IntoIterator<Item = &'a SegmentFacet>) -> Self {
        let facets: Vec<SegmentFacet> = facets
            .into_iter()
            .filter(|f| f.normal_to_outside().is_some())
            .cloned()
            .collect();
        let points: Vec<Point2> = facets.iter().flat_map(|f| [f.p0(), f.p1()]).collect();
        Self {
            aabb: Aabb2::from_points(&points),
            facets,
            negated: false,
        }
    }

    /// Answers for the complement of the body: `In` and `Out` swap.
    #[must_use]
    pub fn negated(mut self, negated: bool) -> Self {
        self.negated = negated;
        self
    }

    /// Classifies `p` against the body.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::Failed` if every ray direction grazes the
    /// boundary.
    pub fn containment(&self, p: &Point2) -> Result<Containment> {
        if !self.aabb.contains(p) {
            return Ok(apply_negation(Containment::Out, self.negated));
        }
        if self.facets.iter().any(|f| f.contains(p)) {
            return Ok(Containment::On);
        }
        for (dx, dy) in RAY_DIRECTIONS_2D {
            let dir = Vector2::new(dx, dy).normalize();
            if let RayCastResult::Clear(c) = resolve(&self.ray_hits(p, &dir)) {
                return Ok(apply_negation(c, self.negated));
            }
            trace!(x = p.x, y = p.y, "degenerate ray, retrying");
        }
        warn!(x = p.x, y = p.y, "every ray grazes the boundary");
        Err(OperationError::Failed("point containment is undecidable".into()).into())
    }

    fn ray_hits(&self, p: &Point2, dir: &Vector2) -> Vec<Hit> {
        let mut hits = Vec::new();
        for facet in &self.facets {
            let seg = facet.segment();
            let v = seg.vector();
            let len = v.norm();
            let denom = dir.x * v.y - dir.y * v.x;
            let w = seg.p0 - p;
            if denom.abs() < TOLERANCE * len {
                // Ray runs along the facet's line.
                let (t0, t1) = (w.dot(dir), (seg.p1 - p).dot(dir));
                if seg.line_distance_to(p) < TOLERANCE && t0.max(t1) > 0.0 {
                    hits.push(Hit {
                        t: t0.min(t1).max(0.0),
                        grazing: true,
                        facing: 0.0,
                    });
                }
                continue;
            }
            let t = (w.x * v.y - w.y * v.x) / denom;
            let u = (w.x * dir.y - w.y * dir.x) / denom;
            if t < TOLERANCE || u * len < -TOLERANCE || (u - 1.0) * len > TOLERANCE {
                continue;
            }
            let grazing = u * len < TOLERANCE || (1.0 - u) * len < TOLERANCE;
            let facing = facet.normal_to_outside().map_or(0.0, |n| n.dot(dir));
            hits.push(Hit { t, grazing, facing });
        }
        hits
    }
}

/// Point containment against the outer boundary of a 3D body.
#[derive(Debug, Clone)]
pub struct InOutChecker3D {
    facets: Vec<PolygonFacet>,
    aabb: Aabb3,
    negated: bool,
}

impl InOutChecker3D {
    /// Builds a checker over the outer-boundary polygons among `facets`.
    #[must_use]
    pub fn new<'a>(facets: impl IntoIterator<Item = &'a PolygonFacet>) -> Self {
        let facets: Vec<PolygonFacet> = facets
            .into_iter()
            .filter(|f| f.normal_to_outside().is_some())
            .cloned()
            .collect();
        let points: Vec<Point3> = facets.iter().flat_map(PolygonFacet::outer_loop_points).collect();
        Self {
            aabb: Aabb3::from_points(&points),
            facets,
            negated: false,
        }
    }

    /// Answers for the complement of the body: `In` and `Out` swap.
    #[must_use]
    pub fn negated(mut self, negated: bool) -> Self {
        self.negated = negated;
        self
    }

    /// Classifies `p` against the body.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::Failed` if every ray direction grazes the
    /// boundary.
    pub fn containment(&self, p: &Point3) -> Result<Containment> {
        if !self.aabb.contains(p) {
            return Ok(apply_negation(Containment::Out, self.negated));
        }
        if self.facets.iter().any(|f| f.contains(p)) {
            return Ok(Containment::On);
        }
        for (dx, dy, dz) in RAY_DIRECTIONS_3D {
            let dir = Vector3::new(dx, dy, dz).normalize();
            let result = self.ray_hits(p, &dir).map(|hits| resolve(&hits));
            if let Some(RayCastResult::Clear(c)) = result {
                return Ok(apply_negation(c, self.negated));
            }
            trace!(x = p.x, y = p.y, z = p.z, "degenerate ray, retrying");
        }
        warn!(x = p.x, y = p.y, z = p.z, "every ray grazes the boundary");
        Err(OperationError::Failed("point containment is undecidable".into()).into())
    }

    /// Hits along the ray, or `None` if the ray runs inside a facet's plane.
    fn ray_hits(&self, p: &Point3, dir: &Vector3) -> Option<Vec<Hit>> {
        let mut hits = Vec::new();
        for facet in &self.facets {
            let plane = facet.plane();
            let n = plane.plane_normal();
            let denom = n.dot(dir);
            if denom.abs() < TOLERANCE {
                if plane.contains(p) {
                    return None;
                }
                continue;
            }
            let t = n.dot(&(plane.origin() - p)) / denom;
            if t < TOLERANCE {
                continue;
            }
            let hit = p + dir * t;
            let grazing = match facet.containment_at(&plane.parameter_at(&hit)) {
                Containment::Out => continue,
                Containment::On => true,
                Containment::In => false,
            };
            let facing = facet.normal_to_outside().map_or(0.0, |n| n.dot(dir));
            hits.push(Hit { t, grazing, facing });
        }
        Some(hits)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::facet::Sides;

    fn p2(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn square(size: f64) -> Vec<SegmentFacet> {
        let c = [p2(0.0, 0.0), p2(size, 0.0), p2(size, size), p2(0.0, size)];
        (0..4)
            .map(|i| SegmentFacet::new(c[i], c[(i + 1) % 4], Sides::FRONT_INSIDE).unwrap())
            .collect()
    }

    #[test]
    fn square_classification() {
        let checker = InOutChecker2D::new(&square(2.0));
        assert_eq!(checker.containment(&p2(1.0, 1.0)).unwrap(), Containment::In);
        assert_eq!(checker.containment(&p2(1.0, 0.0)).unwrap(), Containment::On);
        assert_eq!(checker.containment(&p2(3.0, 1.0)).unwrap(), Containment::Out);
        assert_eq!(checker.containment(&p2(0.5, 1.7)).unwrap(), Containment::In);
    }

    #[test]
    fn negated_checker_swaps_in_and_out() {
        let checker = InOutChecker2D::new(&square(2.0)).negated(true);
        assert_eq!(checker.containment(&p2(1.0, 1.0)).unwrap(), Containment::Out);
        assert_eq!(checker.containment(&p2(5.0, 5.0)).unwrap(), Containment::In);
        assert_eq!(checker.containment(&p2(0.0, 1.0)).unwrap(), Containment::On);
    }

    #[test]
    fn wires_are_ignored() {
        let wire = SegmentFacet::new(p2(0.0, 0.0), p2(1.0, 0.0), Sides::NONE).unwrap();
        let checker = InOutChecker2D::new([&wire]);
        assert_eq!(checker.containment(&p2(0.5, 0.0)).unwrap(), Containment::Out);
    }

    fn cube() -> Vec<PolygonFacet> {
        let p = |x: f64, y: f64, z: f64| Point3::new(x, y, z);
        let faces = [
            [p(0.0, 0.0, 0.0), p(0.0, 1.0, 0.0), p(1.0, 1.0, 0.0), p(1.0, 0.0, 0.0)],
            [p(0.0, 0.0, 1.0), p(1.0, 0.0, 1.0), p(1.0, 1.0, 1.0), p(0.0, 1.0, 1.0)],
            [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 0.0, 1.0), p(0.0, 0.0, 1.0)],
            [p(0.0, 1.0, 0.0), p(0.0, 1.0, 1.0), p(1.0, 1.0, 1.0), p(1.0, 1.0, 0.0)],
            [p(0.0, 0.0, 0.0), p(0.0, 0.0, 1.0), p(0.0, 1.0, 1.0), p(0.0, 1.0, 0.0)],
            [p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(1.0, 1.0, 1.0), p(1.0, 0.0, 1.0)],
        ];
        faces
            .iter()
            .map(|f| PolygonFacet::from_points(f, Sides::FRONT_OUTSIDE).unwrap())
            .collect()
    }

    #[test]
    fn cube_classification() {
        let faces = cube();
        let checker = InOutChecker3D::new(&faces);
        let p = |x: f64, y: f64, z: f64| Point3::new(x, y, z);
        assert_eq!(checker.containment(&p(0.5, 0.5, 0.5)).unwrap(), Containment::In);
        assert_eq!(checker.containment(&p(0.5, 0.5, 1.0)).unwrap(), Containment::On);
        assert_eq!(checker.containment(&p(0.5, 0.5, 2.0)).unwrap(), Containment::Out);
        assert_eq!(checker.containment(&p(0.9, 0.9, 0.1)).unwrap(), Containment::In);
    }
}
