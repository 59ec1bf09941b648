//! Line-line, line-plane and segment-triangle intersection.

use densemesh_math::{Point3, Vec3};

use crate::plane::Plane;
use crate::ray::Ray;

/// Closest points between two infinite 3D lines.
#[derive(Debug, Clone, Copy)]
pub struct LineLineIntersection {
    /// Closest point on the first line.
    pub on_first: Point3,
    /// Closest point on the second line.
    pub on_second: Point3,
    /// Parameter of `on_first` along `p1 + mua * (p2 - p1)`.
    pub mua: f64,
    /// Parameter of `on_second` along `p3 + mub * (p4 - p3)`.
    pub mub: f64,
}

impl LineLineIntersection {
    /// Midpoint of the shortest connecting segment.
    pub fn midpoint(&self) -> Point3 {
        nalgebra::center(&self.on_first, &self.on_second)
    }

    /// Length of the shortest connecting segment (0 for a true intersection).
    pub fn gap(&self) -> f64 {
        (self.on_second - self.on_first).norm()
    }
}

/// Closest points between line `p1 p2` and line `p3 p4`.
///
/// Returns `None` when either line is degenerate (coincident defining points)
/// or the lines are parallel.
pub fn line_line_intersect(
    p1: &Point3,
    p2: &Point3,
    p3: &Point3,
    p4: &Point3,
) -> Option<LineLineIntersection> {
    let p13 = p1 - p3;
    let p43 = p4 - p3;
    let p21 = p2 - p1;

    let d4343 = p43.dot(&p43);
    let d2121 = p21.dot(&p21);
    if d4343 < 1e-24 || d2121 < 1e-24 {
        return None;
    }

    let d1343 = p13.dot(&p43);
    let d4321 = p43.dot(&p21);
    let d1321 = p13.dot(&p21);

    let denom = d2121 * d4343 - d4321 * d4321;
    if denom.abs() < 1e-12 * d2121 * d4343 {
        return None;
    }

    let mua = (d1343 * d4321 - d1321 * d4343) / denom;
    let mub = (d1343 + d4321 * mua) / d4343;

    Some(LineLineIntersection {
        on_first: p1 + mua * p21,
        on_second: p3 + mub * p43,
        mua,
        mub,
    })
}

/// Intersection of the line `origin + t * direction` with the plane through
/// `plane_point` with normal `plane_normal`.
///
/// `None` for a degenerate normal, a zero direction, or a parallel line.
pub fn line_plane_intersect(
    origin: &Point3,
    direction: &Vec3,
    plane_point: &Point3,
    plane_normal: &Vec3,
) -> Option<Point3> {
    Plane::new(*plane_point, *plane_normal)?.intersect_line(origin, direction)
}

/// Intersection point of segment `p q` with triangle `(a, b, c)`, if any.
pub fn segment_triangle_intersection(
    p: &Point3,
    q: &Point3,
    a: &Point3,
    b: &Point3,
    c: &Point3,
) -> Option<Point3> {
    let ray = Ray::through(*p, q)?;
    let t = ray.intersect_triangle(a, b, c)?;
    if t <= (q - p).norm() {
        Some(ray.at(t))
    } else {
        None
    }
}

/// Triangulate a 3D point from two camera rays given by centers and directions.
///
/// Returns the midpoint of the rays' closest points, `None` for parallel rays.
pub fn triangulate_rays(c1: &Point3, d1: &Vec3, c2: &Point3, d2: &Vec3) -> Option<Point3> {
    line_line_intersect(c1, &(c1 + d1), c2, &(c2 + d2)).map(|i| i.midpoint())
}
