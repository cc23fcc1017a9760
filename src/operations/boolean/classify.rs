use tracing::error;

use crate::error::{Result, TopologyError};
use crate::facet::{SegmentFacet, TriangleFacet};
use crate::math::{Containment, Point2, Point3};

use super::select::{should_keep_facet, BooleanOp, FacetSource};

/// Position of a divided facet relative to the other body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetClass {
    Inside,
    /// On the other body's boundary, facing the opposite way.
    OnInside,
    /// On the other body's boundary, facing the same way.
    OnOutside,
    Outside,
}

/// Divided facets of one body bucketed by [`FacetClass`].
#[derive(Debug, Clone, PartialEq)]
pub struct Classified<F> {
    pub inside: Vec<F>,
    pub on_inside: Vec<F>,
    pub on_outside: Vec<F>,
    pub outside: Vec<F>,
}

impl<F> Default for Classified<F> {
    fn default() -> Self {
        Self {
            inside: Vec::new(),
            on_inside: Vec::new(),
            on_outside: Vec::new(),
            outside: Vec::new(),
        }
    }
}

impl<F> Classified<F> {
    pub fn push(&mut self, class: FacetClass, facet: F) {
        match class {
            FacetClass::Inside => self.inside.push(facet),
            FacetClass::OnInside => self.on_inside.push(facet),
            FacetClass::OnOutside => self.on_outside.push(facet),
            FacetClass::Outside => self.outside.push(facet),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inside.len() + self.on_len() + self.outside.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn on_len(&self) -> usize {
        self.on_inside.len() + self.on_outside.len()
    }

    /// The facets `op` keeps from a body in the role `source`.
    #[must_use]
    pub fn into_selected(self, source: FacetSource, op: BooleanOp) -> Vec<F> {
        let buckets = [
            (FacetClass::Inside, self.inside),
            (FacetClass::OnInside, self.on_inside),
            (FacetClass::OnOutside, self.on_outside),
            (FacetClass::Outside, self.outside),
        ];
        buckets
            .into_iter()
            .filter(|(class, _)| should_keep_facet(source, *class, op))
            .flat_map(|(_, facets)| facets)
            .collect()
    }
}

/// A boundary facet that can be located against another body.
pub trait Classify {
    type Point;

    /// Point whose position decides the whole facet's class.
    fn sample_point(&self) -> Self::Point;

    fn holds(&self, p: &Self::Point) -> bool;

    /// Both facets bound their volumes on the same side.
    fn faces_same_way(&self, other: &Self) -> bool;
}

impl Classify for SegmentFacet {
    type Point = Point2;

    fn sample_point(&self) -> Point2 {
        self.midpoint()
    }

    fn holds(&self, p: &Point2) -> bool {
        self.contains(p)
    }

    fn faces_same_way(&self, other: &Self) -> bool {
        match (self.normal_to_outside(), other.normal_to_outside()) {
            (Some(a), Some(b)) => a.dot(&b) > 0.0,
            _ => false,
        }
    }
}

impl Classify for TriangleFacet {
    type Point = Point3;

    fn sample_point(&self) -> Point3 {
        self.centroid()
    }

    fn holds(&self, p: &Point3) -> bool {
        self.contains(p)
    }

    fn faces_same_way(&self, other: &Self) -> bool {
        match (self.normal_to_outside(), other.normal_to_outside()) {
            (Some(a), Some(b)) => a.dot(&b) > 0.0,
            _ => false,
        }
    }
}

/// Buckets `facets` by `containment` of their sample points. A facet on the
/// boundary is compared with the facet of `others` that holds its sample
/// point.
///
/// # Errors
///
/// Returns `TopologyError::NoContainingFacet` when no facet of `others`
/// holds the sample point of an ON facet, or the containment error.
pub fn classify_facets<F, C>(facets: Vec<F>, others: &[F], containment: C) -> Result<Classified<F>>
where
    F: Classify,
    C: Fn(&F::Point) -> Result<Containment>,
{
    let mut classified = Classified::default();
    for facet in facets {
        let sample = facet.sample_point();
        let class = match containment(&sample)? {
            Containment::In => FacetClass::Inside,
            Containment::Out => FacetClass::Outside,
            Containment::On => {
                let Some(containing) = others.iter().find(|o| o.holds(&sample)) else {
                    error!("boundary facet has no counterpart in the other body");
                    return Err(TopologyError::NoContainingFacet("ON facet".into()).into());
                };
                if facet.faces_same_way(containing) {
                    FacetClass::OnOutside
                } else {
                    FacetClass::OnInside
                }
            }
        };
        classified.push(class, facet);
    }
    Ok(classified)
}
