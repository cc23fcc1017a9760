//! Tolerance-based comparisons.
//!
//! Every geometric predicate in the kernel goes through these helpers so that
//! equality and ordering are consistently stated modulo [`TOLERANCE`].

use super::{Point2, Point3, Vector2, Vector3, TOLERANCE};

/// Equality within [`TOLERANCE`].
pub trait Near {
    fn near(&self, other: &Self) -> bool;
}

impl Near for f64 {
    fn near(&self, other: &Self) -> bool {
        (self - other).abs() < TOLERANCE
    }
}

impl Near for Point2 {
    fn near(&self, other: &Self) -> bool {
        (self - other).norm() < TOLERANCE
    }
}

impl Near for Point3 {
    fn near(&self, other: &Self) -> bool {
        (self - other).norm() < TOLERANCE
    }
}

impl Near for Vector2 {
    fn near(&self, other: &Self) -> bool {
        (self - other).norm() < TOLERANCE
    }
}

impl Near for Vector3 {
    fn near(&self, other: &Self) -> bool {
        (self - other).norm() < TOLERANCE
    }
}

/// `a < b` by more than the tolerance.
#[must_use]
pub fn lt(a: f64, b: f64) -> bool {
    a < b - TOLERANCE
}

/// `a <= b` allowing for the tolerance.
#[must_use]
pub fn le(a: f64, b: f64) -> bool {
    a <= b + TOLERANCE
}

/// `min <= value <= max` allowing for the tolerance.
#[must_use]
pub fn between(value: f64, min: f64, max: f64) -> bool {
    le(min, value) && le(value, max)
}

/// Returns `true` if `points` already holds a point near `point`.
#[must_use]
pub fn contains_point<P: Near>(points: &[P], point: &P) -> bool {
    points.iter().any(|p| p.near(point))
}

/// Pushes `point` unless a near-equal point is already present.
pub fn push_unique<P: Near>(points: &mut Vec<P>, point: P) {
    if !contains_point(points, &point) {
        points.push(point);
    }
}
