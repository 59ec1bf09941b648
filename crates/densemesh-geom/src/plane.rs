//! Infinite planes and point-plane distances.

use densemesh_math::{try_normalize, Dir3, Point3, Vec3};

/// An infinite plane through `origin` with unit `normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// A point on the plane.
    pub origin: Point3,
    /// Unit normal.
    pub normal: Dir3,
}

impl Plane {
    /// Plane through `origin` with the given normal, `None` if the normal is degenerate.
    pub fn new(origin: Point3, normal: Vec3) -> Option<Self> {
        let n = try_normalize(&normal)?;
        Some(Self {
            origin,
            normal: Dir3::new_unchecked(n),
        })
    }

    /// Supporting plane of triangle `(a, b, c)`, oriented by its winding.
    ///
    /// The edge vectors are normalized before the cross product so long and
    /// short edges weigh the same. Returns `None` for collapsed triangles.
    pub fn from_triangle(a: &Point3, b: &Point3, c: &Point3) -> Option<Self> {
        let ab = try_normalize(&(b - a))?;
        let ac = try_normalize(&(c - a))?;
        Self::new(*a, ab.cross(&ac))
    }

    /// Signed distance of `p`, positive on the side the normal points to.
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        (p - self.origin).dot(self.normal.as_ref())
    }

    /// Unsigned distance of `p` to the plane.
    pub fn distance(&self, p: &Point3) -> f64 {
        self.signed_distance(p).abs()
    }

    /// Orthogonal projection of `p` onto the plane.
    pub fn project(&self, p: &Point3) -> Point3 {
        p - self.signed_distance(p) * self.normal.as_ref()
    }

    /// Intersection of the infinite line `origin + t * direction` with the plane.
    ///
    /// Returns `None` when the line is parallel to the plane or `direction` is zero.
    pub fn intersect_line(&self, origin: &Point3, direction: &Vec3) -> Option<Point3> {
        let denom = direction.dot(self.normal.as_ref());
        if denom.abs() < 1e-12 {
            return None;
        }
        let t = (self.origin - origin).dot(self.normal.as_ref()) / denom;
        let p = origin + t * direction;
        if p.coords.iter().all(|c| c.is_finite()) {
            Some(p)
        } else {
            None
        }
    }
}

/// Signed distance from `p` to the plane through `plane_point` with unit `plane_normal`.
pub fn oriented_point_plane_distance(p: &Point3, plane_point: &Point3, plane_normal: &Vec3) -> f64 {
    (p - plane_point).dot(plane_normal)
}

/// Unsigned distance from `p` to the plane through `plane_point` with unit `plane_normal`.
pub fn point_plane_distance(p: &Point3, plane_point: &Point3, plane_normal: &Vec3) -> f64 {
    oriented_point_plane_distance(p, plane_point, plane_normal).abs()
}
