use crate::error::{GeometryError, Result};
use crate::math::tolerance::push_unique;
use crate::math::{Near, Point2, Segment2, Vector2};

use super::division::{DivisionResult, Divisible};
use super::{EdgeType, Facet, Sides};

/// A boundary segment of a 2D body.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentFacet {
    segment: Segment2,
    normal: Vector2,
    sides: Sides,
}

impl SegmentFacet {
    /// Creates a facet from `p0` to `p1`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if the endpoints coincide.
    pub fn new(p0: Point2, p1: Point2, sides: Sides) -> Result<Self> {
        let segment = Segment2::new(p0, p1);
        let normal = segment.normal()?;
        Ok(Self {
            segment,
            normal,
            sides,
        })
    }

    /// A facet on part of this one's line, with the same sides.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if the endpoints coincide.
    pub fn copy_between(&self, p0: Point2, p1: Point2) -> Result<Self> {
        Self::new(p0, p1, self.sides)
    }

    #[must_use]
    pub fn segment(&self) -> &Segment2 {
        &self.segment
    }

    #[must_use]
    pub fn p0(&self) -> Point2 {
        self.segment.p0
    }

    #[must_use]
    pub fn p1(&self) -> Point2 {
        self.segment.p1
    }

    /// Left unit normal of the segment; points to the front side.
    #[must_use]
    pub fn normal(&self) -> Vector2 {
        self.normal
    }

    #[must_use]
    pub fn edge_type(&self) -> EdgeType {
        self.sides.into()
    }

    /// Unit normal pointing away from the volume, outer boundaries only.
    #[must_use]
    pub fn normal_to_outside(&self) -> Option<Vector2> {
        self.sides.outside_sign().map(|s| self.normal * s)
    }

    #[must_use]
    pub fn midpoint(&self) -> Point2 {
        self.segment.midpoint()
    }

    #[must_use]
    pub fn contains(&self, p: &Point2) -> bool {
        self.segment.contains(p)
    }

    #[must_use]
    pub fn just_contains(&self, p: &Point2) -> bool {
        self.segment.just_contains(p)
    }

    /// Splits at `cuts`, which must lie strictly inside and be ordered
    /// from `p0`.
    fn split_at(&self, cuts: &[Point2]) -> Result<DivisionResult<Self>> {
        let mut pieces = Vec::with_capacity(cuts.len() + 1);
        let mut start = self.segment.p0;
        for end in cuts.iter().copied().chain(std::iter::once(self.segment.p1)) {
            if !start.near(&end) {
                pieces.push(self.copy_between(start, end)?);
                start = end;
            }
        }
        Ok(DivisionResult::from_pieces(pieces))
    }
}

impl Facet for SegmentFacet {
    fn sides(&self) -> Sides {
        self.sides
    }

    fn set_sides(&mut self, sides: Sides) {
        self.sides = sides;
    }

    fn measure(&self) -> f64 {
        self.segment.length()
    }
}

impl Divisible<Point2> for SegmentFacet {
    fn divide_by(&self, point: &Point2) -> Result<DivisionResult<Self>> {
        if !self.segment.just_contains(point) {
            return Ok(DivisionResult::Unchanged);
        }
        self.split_at(&[*point])
    }
}

impl Divisible<Segment2> for SegmentFacet {
    fn divide_by(&self, divider: &Segment2) -> Result<DivisionResult<Self>> {
        if divider.is_degenerate() {
            return Err(GeometryError::Degenerate(format!(
                "zero-length divider at ({}, {})",
                divider.p0.x, divider.p0.y
            ))
            .into());
        }
        if !self.segment.aabb().overlaps(&divider.aabb()) {
            return Ok(DivisionResult::Unchanged);
        }

        if self.segment.is_parallel_to(divider) {
            if !self.segment.is_colinear_with(divider) {
                return Ok(DivisionResult::Unchanged);
            }
            let mut cuts = Vec::with_capacity(2);
            for p in [divider.p0, divider.p1] {
                if self.segment.just_contains(&p) {
                    push_unique(&mut cuts, p);
                }
            }
            cuts.sort_by(|a, b| {
                self.segment
                    .parameter_of(a)
                    .total_cmp(&self.segment.parameter_of(b))
            });
            return self.split_at(&cuts);
        }

        match self.segment.line_crossing(divider) {
            Some(x) if self.segment.just_contains(&x) && divider.contains(&x) => {
                self.split_at(&[x])
            }
            _ => Ok(DivisionResult::Unchanged),
        }
    }
}

impl Divisible<SegmentFacet> for SegmentFacet {
    fn divide_by(&self, divider: &SegmentFacet) -> Result<DivisionResult<Self>> {
        self.divide_by(&divider.segment)
    }
}
