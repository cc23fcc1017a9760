use tracing::debug;

use crate::body::{BodyType, FacetBody2D};
use crate::error::{OperationError, Result};
use crate::facet::{divide_facets, DivisionLimits, Facet, SegmentFacet};

use super::classify::{classify_facets, Classified};
use super::select::{BooleanOp, FacetSource};

/// Checks that `body` is a regular volume.
pub(super) fn require_regular_volume_2d(role: &'static str, body: &FacetBody2D) -> Result<()> {
    let found = body.body_type();
    if !body.is_regular() || found != BodyType::Volume {
        return Err(OperationError::UnexpectedBodyType {
            role,
            expected: "a regular volume",
            found,
        }
        .into());
    }
    Ok(())
}

/// Boolean union, intersection or subtraction of two 2D regular bodies.
///
/// Neither input is modified; subtraction reverses divided copies of body1
/// and classifies against its complement.
pub struct SetOperator2D<'a> {
    op: BooleanOp,
    body0: &'a FacetBody2D,
    body1: &'a FacetBody2D,
    limits: DivisionLimits,
}

impl<'a> SetOperator2D<'a> {
    /// Creates a new operation on two regular volume bodies.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::UnexpectedBodyType` if an input is not a
    /// regular volume, or `OperationError::AliasedBodies` if both inputs are
    /// the same body.
    pub fn new(op: BooleanOp, body0: &'a FacetBody2D, body1: &'a FacetBody2D) -> Result<Self> {
        if std::ptr::eq(body0, body1) {
            return Err(OperationError::AliasedBodies.into());
        }
        require_regular_volume_2d("body0", body0)?;
        require_regular_volume_2d("body1", body1)?;
        Ok(Self {
            op,
            body0,
            body1,
            limits: DivisionLimits::default(),
        })
    }

    #[must_use]
    pub fn with_limits(mut self, limits: DivisionLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn op(&self) -> BooleanOp {
        self.op
    }

    /// Divides each body's facets by the other's, so that every piece lies
    /// entirely inside, on or outside the other body. For subtraction the
    /// pieces of body1 come back reversed.
    ///
    /// # Errors
    ///
    /// Returns a division error or `OperationError::LimitExceeded`.
    pub fn divide_body_by_body(&self) -> Result<(Vec<SegmentFacet>, Vec<SegmentFacet>)> {
        let mut facets0 = self.body0.segment_facets().to_vec();
        divide_facets(self.body1.segment_facets(), &mut facets0, &self.limits)?;
        let mut facets1 = self.body1.segment_facets().to_vec();
        divide_facets(self.body0.segment_facets(), &mut facets1, &self.limits)?;
        if self.op == BooleanOp::Subtract {
            for facet in &mut facets1 {
                facet.reverse_normal();
            }
        }
        Ok((facets0, facets1))
    }

    /// Classifies the divided facets of each body against the other body.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NoContainingFacet` if a boundary piece has no
    /// counterpart, or `OperationError::Failed` if containment is
    /// undecidable.
    pub fn classify(
        &self,
        facets0: Vec<SegmentFacet>,
        facets1: Vec<SegmentFacet>,
    ) -> Result<(Classified<SegmentFacet>, Classified<SegmentFacet>)> {
        let checker0 = self.body0.in_out_checker();
        let checker1 = self
            .body1
            .in_out_checker()
            .negated(self.op == BooleanOp::Subtract);
        let classified0 = classify_facets(facets0, &facets1, |p| checker1.containment(p))?;
        let pieces0 = all_facets(&classified0);
        let classified1 = classify_facets(facets1, &pieces0, |p| checker0.containment(p))?;
        Ok((classified0, classified1))
    }

    /// Runs the operation into `result`, which must be a regular empty body.
    /// On error `result` is left as it was.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::UnexpectedBodyType` for a bad result body, or
    /// any error of division, classification or regularization.
    pub fn perform(&self, result: &mut FacetBody2D) -> Result<()> {
        let found = result.body_type();
        if !result.is_regular() || found != BodyType::Empty {
            return Err(OperationError::UnexpectedBodyType {
                role: "result",
                expected: "a regular empty body",
                found,
            }
            .into());
        }

        let (facets0, facets1) = self.divide_body_by_body()?;
        let (classified0, classified1) = self.classify(facets0, facets1)?;
        debug!(
            op = ?self.op,
            inside0 = classified0.inside.len(),
            on0 = classified0.on_len(),
            outside0 = classified0.outside.len(),
            inside1 = classified1.inside.len(),
            on1 = classified1.on_len(),
            outside1 = classified1.outside.len(),
            "segment facets classified"
        );

        let kept = classified0
            .into_selected(FacetSource::Body0, self.op)
            .into_iter()
            .chain(classified1.into_selected(FacetSource::Body1, self.op));
        let mut built = FacetBody2D::new(true);
        for facet in kept {
            built.add_segment_facet(facet)?;
        }

        match built.body_type() {
            BodyType::Volume => built.regularize_facets()?,
            BodyType::Empty => {}
            other => return Err(OperationError::Failed(format!("result body is {other:?}")).into()),
        }
        *result = built;
        Ok(())
    }
}

/// All facets of a classification, in bucket order.
pub(super) fn all_facets<F: Clone>(classified: &Classified<F>) -> Vec<F> {
    classified
        .inside
        .iter()
        .chain(&classified.on_inside)
        .chain(&classified.on_outside)
        .chain(&classified.outside)
        .cloned()
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::facet::Sides;
    use crate::math::{Containment, Point2};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> FacetBody2D {
        let c = [
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ];
        let mut body = FacetBody2D::new(true);
        for i in 0..4 {
            let edge = SegmentFacet::new(c[i], c[(i + 1) % 4], Sides::FRONT_INSIDE).unwrap();
            body.add_segment_facet(edge).unwrap();
        }
        body
    }

    fn area(body: &FacetBody2D) -> f64 {
        // Shoelace over the oriented facets; inside is on the left.
        body.segment_facets()
            .iter()
            .map(|f| {
                let (a, b) = (f.p0(), f.p1());
                let sign = if f.sides() == Sides::FRONT_INSIDE { 1.0 } else { -1.0 };
                sign * (a.x * b.y - b.x * a.y) / 2.0
            })
            .sum()
    }

    fn run(op: BooleanOp, a: &FacetBody2D, b: &FacetBody2D) -> FacetBody2D {
        let mut result = FacetBody2D::new(true);
        SetOperator2D::new(op, a, b).unwrap().perform(&mut result).unwrap();
        result
    }

    #[test]
    fn overlapping_squares() {
        let a = rect(0.0, 0.0, 2.0, 2.0);
        let b = rect(1.0, 1.0, 3.0, 3.0);

        let union = run(BooleanOp::Union, &a, &b);
        assert_eq!(union.body_type(), BodyType::Volume);
        assert_eq!(union.segment_facets().len(), 8);
        approx::assert_relative_eq!(area(&union), 7.0, epsilon = 1e-9);

        let intersection = run(BooleanOp::Intersect, &a, &b);
        assert_eq!(intersection.segment_facets().len(), 4);
        approx::assert_relative_eq!(area(&intersection), 1.0, epsilon = 1e-9);

        let difference = run(BooleanOp::Subtract, &a, &b);
        assert_eq!(difference.segment_facets().len(), 6);
        approx::assert_relative_eq!(area(&difference), 3.0, epsilon = 1e-9);
        let checker = difference.in_out_checker();
        assert_eq!(checker.containment(&Point2::new(1.5, 1.5)).unwrap(), Containment::Out);
        assert_eq!(checker.containment(&Point2::new(0.5, 0.5)).unwrap(), Containment::In);
    }

    #[test]
    fn subtraction_leaves_inputs_untouched() {
        let a = rect(0.0, 0.0, 2.0, 2.0);
        let b = rect(1.0, 1.0, 3.0, 3.0);
        let before = b.clone();
        run(BooleanOp::Subtract, &a, &b);
        assert_eq!(b, before);
    }

    #[test]
    fn disjoint_intersection_is_empty() {
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let b = rect(2.0, 0.0, 3.0, 1.0);
        let result = run(BooleanOp::Intersect, &a, &b);
        assert_eq!(result.body_type(), BodyType::Empty);
    }

    #[test]
    fn shared_edge_union_merges_the_edge_away() {
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let b = rect(1.0, 0.0, 2.0, 1.0);
        let result = run(BooleanOp::Union, &a, &b);
        assert_eq!(result.segment_facets().len(), 4);
        approx::assert_relative_eq!(area(&result), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn hole_by_subtraction() {
        let a = rect(0.0, 0.0, 4.0, 4.0);
        let b = rect(1.0, 1.0, 2.0, 2.0);
        let result = run(BooleanOp::Subtract, &a, &b);
        assert_eq!(result.segment_facets().len(), 8);
        approx::assert_relative_eq!(area(&result), 15.0, epsilon = 1e-9);
    }

    #[test]
    fn classification_partitions_the_divided_facets() {
        let a = rect(0.0, 0.0, 2.0, 2.0);
        let b = rect(0.0, 1.0, 2.0, 3.0);
        let op = SetOperator2D::new(BooleanOp::Union, &a, &b).unwrap();
        let (f0, f1) = op.divide_body_by_body().unwrap();
        let (n0, n1) = (f0.len(), f1.len());
        let (c0, c1) = op.classify(f0, f1).unwrap();
        assert_eq!(c0.len(), n0);
        assert_eq!(c1.len(), n1);
        assert_eq!(c0.on_len(), c0.on_inside.len() + c0.on_outside.len());
        assert_eq!(c0.on_outside.len(), 2);
    }

    #[test]
    fn rejects_bad_inputs() {
        let a = rect(0.0, 0.0, 1.0, 1.0);
        assert!(SetOperator2D::new(BooleanOp::Union, &a, &a).is_err());
        let empty = FacetBody2D::new(true);
        assert!(SetOperator2D::new(BooleanOp::Union, &a, &empty).is_err());
        let b = rect(2.0, 0.0, 3.0, 1.0);
        let mut non_regular = FacetBody2D::new(false);
        let op = SetOperator2D::new(BooleanOp::Union, &a, &b).unwrap();
        assert!(op.perform(&mut non_regular).is_err());
    }
}
