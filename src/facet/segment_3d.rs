use crate::error::{GeometryError, Result};
use crate::math::tolerance::push_unique;
use crate::math::{Near, Point3, Segment3};

use super::division::{DivisionResult, Divisible};

/// A wire segment of a 3D body.
///
/// Explicit segments are seams the body declares on purpose; they survive
/// face regeneration as internal boundaries or off-loop edges.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentFacet3D {
    segment: Segment3,
    is_explicit: bool,
}

impl SegmentFacet3D {
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if the endpoints coincide.
    pub fn new(p0: Point3, p1: Point3, is_explicit: bool) -> Result<Self> {
        let segment = Segment3::new(p0, p1);
        if segment.is_degenerate() {
            return Err(GeometryError::Degenerate(format!(
                "zero-length segment at ({}, {}, {})",
                p0.x, p0.y, p0.z
            ))
            .into());
        }
        Ok(Self {
            segment,
            is_explicit,
        })
    }

    #[must_use]
    pub fn segment(&self) -> &Segment3 {
        &self.segment
    }

    #[must_use]
    pub fn is_explicit(&self) -> bool {
        self.is_explicit
    }

    pub fn change_as_explicit(&mut self) {
        self.is_explicit = true;
    }

    #[must_use]
    pub fn midpoint(&self) -> Point3 {
        self.segment.midpoint()
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.segment.length()
    }

    fn split_at(&self, cuts: &[Point3]) -> Result<DivisionResult<Self>> {
        let mut pieces = Vec::with_capacity(cuts.len() + 1);
        let mut start = self.segment.p0;
        for end in cuts.iter().copied().chain(std::iter::once(self.segment.p1)) {
            if !start.near(&end) {
                pieces.push(Self::new(start, end, self.is_explicit)?);
                start = end;
            }
        }
        Ok(DivisionResult::from_pieces(pieces))
    }
}

impl Divisible<Point3> for SegmentFacet3D {
    fn divide_by(&self, point: &Point3) -> Result<DivisionResult<Self>> {
        if !self.segment.just_contains(point) {
            return Ok(DivisionResult::Unchanged);
        }
        self.split_at(&[*point])
    }
}

impl Divisible<Segment3> for SegmentFacet3D {
    fn divide_by(&self, divider: &Segment3) -> Result<DivisionResult<Self>> {
        if divider.is_degenerate() {
            return Err(GeometryError::Degenerate(format!(
                "zero-length divider at ({}, {}, {})",
                divider.p0.x, divider.p0.y, divider.p0.z
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

impl Divisible<SegmentFacet3D> for SegmentFacet3D {
    fn divide_by(&self, divider: &SegmentFacet3D) -> Result<DivisionResult<Self>> {
        self.divide_by(&divider.segment)
    }
}
