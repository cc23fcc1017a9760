use thiserror::Error;

use crate::body::BodyType;

/// Top-level error type for the Geofacet kernel.
#[derive(Debug, Error)]
pub enum GeofacetError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Tessellation(#[from] TessellationError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,

    #[error("geometry is not coplanar: {0}")]
    NotCoplanar(String),
}

/// Internal consistency failures detected while rebuilding boundary structure.
///
/// These indicate inconsistent upstream geometry; callers should treat them
/// as fatal for the current operation.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("port {port} of node {node} matches more than one partner")]
    AmbiguousConnection { node: usize, port: usize },

    #[error("no containing facet found for {0}")]
    NoContainingFacet(String),

    #[error("boundary loop is not closed")]
    OpenLoop,

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

/// Caller contract violations reported by operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{role} must be {expected}, found {found:?}")]
    UnexpectedBodyType {
        role: &'static str,
        expected: &'static str,
        found: BodyType,
    },

    #[error("input bodies must be distinct")]
    AliasedBodies,

    #[error("facet division exceeded the limit of {limit} facets")]
    LimitExceeded { limit: usize },

    #[error("operation failed: {0}")]
    Failed(String),
}

/// Errors related to triangulating polygon facets.
#[derive(Debug, Error)]
pub enum TessellationError {
    #[error("tessellation failed: {0}")]
    Failed(String),
}

/// Convenience type alias for results using [`GeofacetError`].
pub type Result<T> = std::result::Result<T, GeofacetError>;
