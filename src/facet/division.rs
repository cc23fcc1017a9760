use tracing::trace;

use crate::error::{OperationError, Result};

/// Outcome of dividing one facet by one divider.
#[derive(Debug, Clone, PartialEq)]
pub enum DivisionResult<F> {
    /// The divider does not cross the facet's interior.
    Unchanged,
    /// Children that exactly tile the parent.
    Split(Vec<F>),
}

impl<F> DivisionResult<F> {
    /// `Split` when there are at least two children, `Unchanged` otherwise.
    #[must_use]
    pub fn from_pieces(pieces: Vec<F>) -> Self {
        if pieces.len() < 2 {
            Self::Unchanged
        } else {
            Self::Split(pieces)
        }
    }

    #[must_use]
    pub fn is_split(&self) -> bool {
        matches!(self, Self::Split(_))
    }
}

/// A facet that can be split by dividers of type `D`.
pub trait Divisible<D: ?Sized>: Sized {
    /// Divides `self` once by `divider`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if the divider has zero extent.
    fn divide_by(&self, divider: &D) -> Result<DivisionResult<Self>>;

    /// Divides `self` once by `divider`, keeping any nested division within
    /// `limits`. [`divide_facets`] calls this.
    ///
    /// # Errors
    ///
    /// As [`divide_by`](Self::divide_by), or `OperationError::LimitExceeded`.
    fn divide_within(&self, divider: &D, _limits: &DivisionLimits) -> Result<DivisionResult<Self>> {
        self.divide_by(divider)
    }
}

/// Resource limits for facet division.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DivisionLimits {
    /// Largest facet count a single division worklist may reach.
    pub max_facets: usize,
}

impl Default for DivisionLimits {
    fn default() -> Self {
        Self {
            max_facets: 200_000,
        }
    }
}

/// Divides every facet by every divider, replacing each split facet with its
/// children.
///
/// Dividers are applied in order; each facet is divided at most once per
/// divider. Returns the number of splits performed.
///
/// # Errors
///
/// Returns `OperationError::LimitExceeded` when the facet count grows past
/// `limits.max_facets`, or the divider's error for a degenerate divider.
pub fn divide_facets<F, D>(
    dividers: &[D],
    facets: &mut Vec<F>,
    limits: &DivisionLimits,
) -> Result<usize>
where
    F: Divisible<D>,
{
    let mut splits = 0;
    for (i, divider) in dividers.iter().enumerate() {
        let mut next = Vec::with_capacity(facets.len());
        for facet in facets.drain(..) {
            match facet.divide_within(divider, limits)? {
                DivisionResult::Unchanged => next.push(facet),
                DivisionResult::Split(children) => {
                    trace!(divider = i, children = children.len(), "facet divided");
                    splits += 1;
                    next.extend(children);
                }
            }
        }
        *facets = next;
        if facets.len() > limits.max_facets {
            return Err(OperationError::LimitExceeded {
                limit: limits.max_facets,
            }
            .into());
        }
    }
    Ok(splits)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// An interval on the number line divided by cut values.
    #[derive(Debug, Clone, PartialEq)]
    struct Interval(f64, f64);

    impl Divisible<f64> for Interval {
        fn divide_by(&self, cut: &f64) -> Result<DivisionResult<Self>> {
            if *cut > self.0 && *cut < self.1 {
                Ok(DivisionResult::Split(vec![
                    Interval(self.0, *cut),
                    Interval(*cut, self.1),
                ]))
            } else {
                Ok(DivisionResult::Unchanged)
            }
        }
    }

    #[test]
    fn applies_every_divider() {
        let mut facets = vec![Interval(0.0, 4.0)];
        let limits = DivisionLimits::default();
        let splits = divide_facets(&[1.0, 3.0, 2.0, 5.0], &mut facets, &limits).unwrap();
        assert_eq!(splits, 3);
        assert_eq!(facets.len(), 4);
        let total: f64 = facets.iter().map(|f| f.1 - f.0).sum();
        assert!((total - 4.0).abs() < 1e-12);
    }

    #[test]
    fn limit_is_enforced() {
        let mut facets = vec![Interval(0.0, 4.0)];
        let limits = DivisionLimits { max_facets: 2 };
        let err = divide_facets(&[1.0, 2.0], &mut facets, &limits).unwrap_err();
        assert!(matches!(
            err,
            crate::error::GeofacetError::Operation(OperationError::LimitExceeded { limit: 2 })
        ));
    }

    #[test]
    fn from_pieces_needs_two() {
        assert_eq!(DivisionResult::from_pieces(vec![1]), DivisionResult::Unchanged);
        assert!(DivisionResult::from_pieces(vec![1, 2]).is_split());
    }
}
