#![warn(missing_docs)]

//! Math types for the densemesh reconstruction core.
//!
//! Thin wrappers around nalgebra: points, vectors, directions, the
//! tolerance constants shared by every geometric predicate, and a few
//! NaN-safe helpers for the degenerate cases dense meshes are full of.

use nalgebra::{Unit, Vector2, Vector3};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A point in 2D image space.
pub type Point2 = nalgebra::Point2<f64>;

/// A vector in 2D space.
pub type Vec2 = Vector2<f64>;

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance.
    pub linear: f64,
    /// Angular tolerance in radians.
    pub angular: f64,
}

impl Tolerance {
    /// Default tolerances (1e-9 linear, 1e-9 rad angular).
    pub const DEFAULT: Self = Self {
        linear: 1e-9,
        angular: 1e-9,
    };

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }

    /// Check if two 2D points are coincident within tolerance.
    pub fn points2_equal(&self, a: &Point2, b: &Point2) -> bool {
        (a - b).norm() < self.linear
    }

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Normalize `v`, or `None` when it is zero-length or not finite.
pub fn try_normalize(v: &Vec3) -> Option<Vec3> {
    let n = v.norm();
    if n > f64::EPSILON && n.is_finite() {
        Some(v / n)
    } else {
        None
    }
}

/// Normalize `v`, substituting the zero vector for degenerate input.
pub fn normalize_or_zero(v: &Vec3) -> Vec3 {
    try_normalize(v).unwrap_or_else(Vec3::zeros)
}

/// True when every component of `v` is finite.
pub fn is_finite(v: &Vec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

/// Angle between two vectors in radians, `None` if either is degenerate.
pub fn angle_between(a: &Vec3, b: &Vec3) -> Option<f64> {
    let a = try_normalize(a)?;
    let b = try_normalize(b)?;
    Some(a.dot(&b).clamp(-1.0, 1.0).acos())
}

/// Triangle area from its three side lengths (Heron's formula).
///
/// Slightly negative radicands from rounding clamp to zero.
pub fn heron_area(a: f64, b: f64, c: f64) -> f64 {
    let s = (a + b + c) * 0.5;
    (s * (s - a) * (s - b) * (s - c)).max(0.0).sqrt()
}
