//! Ray representation and ray-plane / ray-triangle tests.

use densemesh_math::{try_normalize, Dir3, Point3, Vec3};

use crate::plane::Plane;

/// A ray in 3D space defined by origin and unit direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Point3,
    /// Unit direction of the ray.
    pub direction: Dir3,
}

impl Ray {
    /// Create a new ray from origin and direction.
    ///
    /// The direction is normalized; a zero or non-finite direction yields `None`.
    pub fn new(origin: Point3, direction: Vec3) -> Option<Self> {
        let dir = try_normalize(&direction)?;
        Some(Self {
            origin,
            direction: Dir3::new_unchecked(dir),
        })
    }

    /// Ray from `from` towards `to`, `None` if the two coincide.
    pub fn through(from: Point3, to: &Point3) -> Option<Self> {
        Self::new(from, to - from)
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + t * self.direction.as_ref()
    }

    /// Intersect the ray with a plane.
    ///
    /// Returns the ray parameter of the hit, or `None` if the ray is parallel
    /// to the plane or the hit lies behind the origin.
    pub fn intersect_plane(&self, plane: &Plane) -> Option<f64> {
        let normal = plane.normal.as_ref();
        let denom = self.direction.as_ref().dot(normal);

        // Ray is parallel to plane
        if denom.abs() < 1e-12 {
            return None;
        }

        let t = (plane.origin - self.origin).dot(normal) / denom;
        if t < 0.0 || !t.is_finite() {
            return None;
        }
        Some(t)
    }

    /// Intersect the ray with triangle `(a, b, c)` (Möller-Trumbore).
    ///
    /// Both faces count. Returns the ray parameter, `None` on a miss or for a
    /// degenerate triangle.
    pub fn intersect_triangle(&self, a: &Point3, b: &Point3, c: &Point3) -> Option<f64> {
        let e1 = b - a;
        let e2 = c - a;
        let dir = self.direction.as_ref();
        let pvec = dir.cross(&e2);
        let det = e1.dot(&pvec);
        if det.abs() < 1e-12 {
            return None;
        }
        let inv_det = 1.0 / det;
        let tvec = self.origin - a;
        let u = tvec.dot(&pvec) * inv_det;
        if !(-1e-12..=1.0 + 1e-12).contains(&u) {
            return None;
        }
        let qvec = tvec.cross(&e1);
        let v = dir.dot(&qvec) * inv_det;
        if v < -1e-12 || u + v > 1.0 + 1e-12 {
            return None;
        }
        let t = e2.dot(&qvec) * inv_det;
        if t < 0.0 || !t.is_finite() {
            return None;
        }
        Some(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)).unwrap();
        let p = ray.at(5.0);
        assert_relative_eq!(p, Point3::new(5.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_ray_degenerate_direction() {
        assert!(Ray::new(Point3::origin(), Vec3::zeros()).is_none());
        assert!(Ray::through(Point3::origin(), &Point3::origin()).is_none());
    }

    #[test]
    fn test_ray_plane_perpendicular() {
        let plane = Plane::new(Point3::origin(), Vec3::z()).unwrap();
        let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0)).unwrap();
        let t = ray.intersect_plane(&plane).unwrap();
        assert_relative_eq!(t, 5.0, epsilon = 1e-10);
    }

    #[test]
    fn test_ray_plane_parallel_and_behind() {
        let plane = Plane::new(Point3::origin(), Vec3::z()).unwrap();
        let parallel = Ray::new(Point3::new(0.0, 0.0, 5.0), Vec3::x()).unwrap();
        assert!(parallel.intersect_plane(&plane).is_none());
        let away = Ray::new(Point3::new(0.0, 0.0, 5.0), Vec3::z()).unwrap();
        assert!(away.intersect_plane(&plane).is_none());
    }

    #[test]
    fn test_ray_triangle_hit_and_miss() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);
        let hit = Ray::new(Point3::new(0.25, 0.25, 3.0), -Vec3::z()).unwrap();
        let t = hit.intersect_triangle(&a, &b, &c).unwrap();
        assert_relative_eq!(t, 3.0, epsilon = 1e-12);

        let miss = Ray::new(Point3::new(0.75, 0.75, 3.0), -Vec3::z()).unwrap();
        assert!(miss.intersect_triangle(&a, &b, &c).is_none());

        // Back face still hits
        let below = Ray::new(Point3::new(0.25, 0.25, -1.0), Vec3::z()).unwrap();
        assert!(below.intersect_triangle(&a, &b, &c).is_some());
    }

    #[test]
    fn test_ray_triangle_degenerate() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let ray = Ray::new(Point3::new(0.5, 0.0, 1.0), -Vec3::z()).unwrap();
        assert!(ray.intersect_triangle(&a, &b, &b).is_none());
    }
}
