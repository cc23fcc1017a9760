//! Helpers for closed point loops in the plane.
//!
//! A loop is a slice of vertices with an implicit closing edge from the last
//! vertex back to the first.

use super::tolerance::contains_point;
use super::{Containment, Point2, Segment2};

/// Computes the signed area of a loop (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

#[must_use]
pub fn is_clockwise(points: &[Point2]) -> bool {
    signed_area(points) < 0.0
}

/// Edges of the loop in order, including the closing edge.
pub fn edges(points: &[Point2]) -> impl Iterator<Item = Segment2> + '_ {
    let n = points.len();
    (0..n).map(move |i| Segment2::new(points[i], points[(i + 1) % n]))
}

/// Winding number of `p` with respect to the loop.
///
/// Non-zero => inside, zero => outside.
#[must_use]
pub fn winding_number(p: &Point2, points: &[Point2]) -> i32 {
    let mut winding = 0i32;
    for edge in edges(points) {
        let (a, b) = (edge.p0, edge.p1);
        let side = cross_2d(b.x - a.x, b.y - a.y, p.x - a.x, p.y - a.y);
        if a.y <= p.y {
            if b.y > p.y && side > 0.0 {
                winding += 1;
            }
        } else if b.y <= p.y && side < 0.0 {
            winding -= 1;
        }
    }
    winding
}

/// Classifies `p` against the region bounded by the loop.
///
/// Points on an edge (within tolerance) are `On`; otherwise the winding
/// number decides.
#[must_use]
pub fn containment(p: &Point2, points: &[Point2]) -> Containment {
    if edges(points).any(|e| e.contains(p)) {
        Containment::On
    } else if winding_number(p, points) != 0 {
        Containment::In
    } else {
        Containment::Out
    }
}

/// Inserts `p` as a new vertex of the edge whose interior holds it.
///
/// Returns `false` when `p` is already a vertex or lies on no edge.
pub fn insert_on_loop(points: &mut Vec<Point2>, p: &Point2) -> bool {
    if contains_point(points, p) {
        return false;
    }
    let Some(i) = edges(points).position(|e| e.just_contains(p)) else {
        return false;
    };
    points.insert(i + 1, *p);
    true
}

/// 2D cross product: `(ax * by - ay * bx)`.
#[inline]
fn cross_2d(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ax * by - ay * bx
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{Near, TOLERANCE};

    fn square() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ]
    }

    #[test]
    fn signed_area_follows_winding() {
        let mut pts = square();
        assert!((signed_area(&pts) - 4.0).abs() < TOLERANCE);
        assert!(!is_clockwise(&pts));
        pts.reverse();
        assert!((signed_area(&pts) + 4.0).abs() < TOLERANCE);
        assert!(is_clockwise(&pts));
    }

    #[test]
    fn signed_area_degenerate() {
        assert!(signed_area(&[Point2::new(0.0, 0.0)]).abs() < TOLERANCE);
        assert!(signed_area(&[]).abs() < TOLERANCE);
    }

    #[test]
    fn containment_in_on_out() {
        let pts = square();
        assert_eq!(containment(&Point2::new(1.0, 1.0), &pts), Containment::In);
        assert_eq!(containment(&Point2::new(2.0, 1.0), &pts), Containment::On);
        assert_eq!(containment(&Point2::new(0.0, 0.0), &pts), Containment::On);
        assert_eq!(containment(&Point2::new(3.0, 1.0), &pts), Containment::Out);
    }

    #[test]
    fn containment_ignores_orientation() {
        let mut pts = square();
        pts.reverse();
        assert_eq!(containment(&Point2::new(1.0, 1.0), &pts), Containment::In);
    }

    #[test]
    fn insert_splits_the_holding_edge() {
        let mut pts = square();
        assert!(insert_on_loop(&mut pts, &Point2::new(2.0, 1.0)));
        assert_eq!(pts.len(), 5);
        assert!(pts[2].near(&Point2::new(2.0, 1.0)));
        assert!(!insert_on_loop(&mut pts, &Point2::new(2.0, 1.0)));
        assert!(!insert_on_loop(&mut pts, &Point2::new(1.0, 1.0)));
    }
}
