use crate::error::{GeometryError, Result};

use super::tolerance::Near;
use super::{Point2, Point3, Vector3, TOLERANCE};

/// An infinite plane in 3D space.
///
/// Defined by an origin point and two orthonormal direction vectors
/// (`u_dir`, `v_dir`). The normal is `u_dir × v_dir`; it points to the front
/// side of every facet lying on the plane.
///
/// Parametric form: `P(u, v) = origin + u * u_dir + v * v_dir`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    origin: Point3,
    u_dir: Vector3,
    v_dir: Vector3,
    normal: Vector3,
}

impl Plane {
    /// Creates a new plane from an origin and two direction vectors.
    ///
    /// `v_dir` is made orthogonal to `u_dir` so parameters are Euclidean.
    ///
    /// # Errors
    ///
    /// Returns an error if the direction vectors are zero-length
    /// or parallel (degenerate plane).
    pub fn new(origin: Point3, u_dir: Vector3, v_dir: Vector3) -> Result<Self> {
        let u_len = u_dir.norm();
        if u_len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let u_dir = u_dir / u_len;

        let v_dir = v_dir - u_dir * v_dir.dot(&u_dir);
        let v_len = v_dir.norm();
        if v_len < TOLERANCE {
            return Err(
                GeometryError::Degenerate("plane directions are parallel".into()).into(),
            );
        }
        let v_dir = v_dir / v_len;

        Ok(Self {
            origin,
            u_dir,
            v_dir,
            normal: u_dir.cross(&v_dir),
        })
    }

    /// Creates a plane from an origin and a normal vector.
    ///
    /// The U and V directions are computed automatically.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal vector is zero-length.
    pub fn from_normal(origin: Point3, normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let normal = normal / len;

        // Choose a reference vector not parallel to the normal
        let reference = if normal.x.abs() < 0.9 {
            Vector3::new(1.0, 0.0, 0.0)
        } else {
            Vector3::new(0.0, 1.0, 0.0)
        };

        let v_dir = normal.cross(&reference).normalize();
        let u_dir = v_dir.cross(&normal);

        Ok(Self {
            origin,
            u_dir,
            v_dir,
            normal,
        })
    }

    /// Plane through a planar point loop, oriented by the loop's winding
    /// (Newell normal), with `u_dir` along the first edge.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if the loop has zero area and
    /// `GeometryError::NotCoplanar` if a point is off the plane.
    pub fn from_loop(points: &[Point3]) -> Result<Self> {
        if points.len() < 3 {
            return Err(GeometryError::Degenerate("loop needs three points".into()).into());
        }
        let mut normal = Vector3::zeros();
        for (i, a) in points.iter().enumerate() {
            let b = points[(i + 1) % points.len()];
            normal.x += (a.y - b.y) * (a.z + b.z);
            normal.y += (a.z - b.z) * (a.x + b.x);
            normal.z += (a.x - b.x) * (a.y + b.y);
        }
        if normal.norm() < TOLERANCE {
            return Err(GeometryError::Degenerate("loop has zero area".into()).into());
        }
        let normal = normal.normalize();
        let u_dir = points
            .iter()
            .skip(1)
            .map(|p| p - points[0])
            .find(|d| d.norm() >= TOLERANCE)
            .ok_or_else(|| GeometryError::Degenerate("loop points coincide".into()))?;
        let plane = Self::new(points[0], u_dir, normal.cross(&u_dir))?;
        if let Some(off) = points.iter().find(|p| !plane.contains(p)) {
            return Err(GeometryError::NotCoplanar(format!(
                "({}, {}, {}) is off the loop plane",
                off.x, off.y, off.z
            ))
            .into());
        }
        Ok(plane)
    }

    /// Returns the origin point of the plane.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the U direction vector.
    #[must_use]
    pub fn u_dir(&self) -> &Vector3 {
        &self.u_dir
    }

    /// Returns the V direction vector.
    #[must_use]
    pub fn v_dir(&self) -> &Vector3 {
        &self.v_dir
    }

    /// Returns the normal vector of the plane.
    #[must_use]
    pub fn plane_normal(&self) -> &Vector3 {
        &self.normal
    }

    #[must_use]
    pub fn position_at(&self, param: &Point2) -> Point3 {
        self.origin + self.u_dir * param.x + self.v_dir * param.y
    }

    #[must_use]
    pub fn parameter_at(&self, point: &Point3) -> Point2 {
        let d = point - self.origin;
        Point2::new(d.dot(&self.u_dir), d.dot(&self.v_dir))
    }

    #[must_use]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        (point - self.origin).dot(&self.normal)
    }

    #[must_use]
    pub fn contains(&self, point: &Point3) -> bool {
        self.signed_distance(point).abs() < TOLERANCE
    }

    /// Same geometric plane with the same orientation.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        self.normal.near(&other.normal) && self.contains(&other.origin)
    }

    /// Same geometric plane with the opposite orientation.
    #[must_use]
    pub fn is_reverse_of(&self, other: &Self) -> bool {
        self.normal.near(&-other.normal) && self.contains(&other.origin)
    }

    #[must_use]
    pub fn is_coplanar_with(&self, other: &Self) -> bool {
        self.same_as(other) || self.is_reverse_of(other)
    }
}
