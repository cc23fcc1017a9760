pub mod aabb;
pub mod plane;
pub mod polygon_2d;
pub mod segment_2d;
pub mod segment_3d;
pub mod tolerance;
pub mod triangle_2d;
pub mod triangle_3d;

pub use aabb::{Aabb2, Aabb3};
pub use plane::Plane;
pub use segment_2d::Segment2;
pub use segment_3d::Segment3;
pub use tolerance::Near;
pub use triangle_2d::{Triangle2, TriangleContainment};
pub use triangle_3d::Triangle3;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-9;

/// Where a point lies relative to a closed region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    In,
    On,
    Out,
}

impl Containment {
    /// Swaps `In` and `Out`, leaving `On` untouched.
    #[must_use]
    pub fn negated(self) -> Self {
        match self {
            Self::In => Self::Out,
            Self::Out => Self::In,
            Self::On => Self::On,
        }
    }
}
