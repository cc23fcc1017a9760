use tracing::debug;

use crate::body::{BodyType, FacetBody3D};
use crate::error::{OperationError, Result};
use crate::facet::{divide_facets, DivisionLimits, Facet, TriangleFacet};

use super::classify::{classify_facets, Classified};
use super::select::{BooleanOp, FacetSource};
use super::set_2d::all_facets;

fn require_regular_volume_3d(role: &'static str, body: &FacetBody3D) -> Result<()> {
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

/// Boolean union, intersection or subtraction of two 3D regular bodies.
///
/// Both bodies are triangulated, cut against each other, classified by the
/// centroid of each piece, and the kept triangles are merged back into
/// polygon faces of the result.
pub struct SetOperator3D<'a> {
    op: BooleanOp,
    body0: &'a FacetBody3D,
    body1: &'a FacetBody3D,
    limits: DivisionLimits,
}

impl<'a> SetOperator3D<'a> {
    /// Creates a new operation on two regular volume bodies.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::UnexpectedBodyType` if an input is not a
    /// regular volume, or `OperationError::AliasedBodies` if both inputs are
    /// the same body.
    pub fn new(op: BooleanOp, body0: &'a FacetBody3D, body1: &'a FacetBody3D) -> Result<Self> {
        if std::ptr::eq(body0, body1) {
            return Err(OperationError::AliasedBodies.into());
        }
        require_regular_volume_3d("body0", body0)?;
        require_regular_volume_3d("body1", body1)?;
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

    /// Triangulates both bodies and divides each body's triangles by the
    /// other's. For subtraction the pieces of body1 come back reversed.
    ///
    /// # Errors
    ///
    /// Returns a tessellation or division error, or
    /// `OperationError::LimitExceeded`.
    pub fn divide_body_by_body(&self) -> Result<(Vec<TriangleFacet>, Vec<TriangleFacet>)> {
        let triangles0 = self.body0.collect_triangle_facets(&self.limits)?;
        let triangles1 = self.body1.collect_triangle_facets(&self.limits)?;

        let mut facets0 = triangles0.clone();
        let splits0 = divide_facets(&triangles1, &mut facets0, &self.limits)?;
        let mut facets1 = triangles1;
        let splits1 = divide_facets(&triangles0, &mut facets1, &self.limits)?;
        debug!(splits0, splits1, "bodies divided");

        if self.op == BooleanOp::Subtract {
            for facet in &mut facets1 {
                facet.reverse_normal();
            }
        }
        Ok((facets0, facets1))
    }

    /// Classifies the divided triangles of each body against the other body.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NoContainingFacet` if a boundary piece has no
    /// counterpart, or `OperationError::Failed` if containment is
    /// undecidable.
    pub fn classify(
        &self,
        facets0: Vec<TriangleFacet>,
        facets1: Vec<TriangleFacet>,
    ) -> Result<(Classified<TriangleFacet>, Classified<TriangleFacet>)> {
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
    /// any error of division, classification or face generation.
    pub fn perform(&self, result: &mut FacetBody3D) -> Result<()> {
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
            "triangle facets classified"
        );

        let kept = classified0
            .into_selected(FacetSource::Body0, self.op)
            .into_iter()
            .chain(classified1.into_selected(FacetSource::Body1, self.op));
        let mut built = FacetBody3D::new(true);
        for facet in kept {
            built.add_triangle_facet(facet)?;
        }
        built.generate_polygon_facets(&self.limits)?;

        match built.body_type() {
            BodyType::Volume | BodyType::Empty => {
                *result = built;
                Ok(())
            }
            other => Err(OperationError::Failed(format!("result body is {other:?}")).into()),
        }
    }
}
