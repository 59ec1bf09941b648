//! Triangle-triangle intersection with the shared intersection segment.
//!
//! Each triangle's boundary is clipped against the other's supporting plane,
//! and the clipped points that fall inside the other triangle bound the
//! intersection segment.

use densemesh_math::{Point2, Point3, Vec3};

use crate::planar::{point_in_triangle_2d, triangles_overlap_2d};
use crate::plane::Plane;

/// Outcome of a triangle-triangle test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriTriIntersection {
    /// The triangles do not touch, or one of them is degenerate.
    None,
    /// The triangles cross along a segment. Both endpoints coincide when
    /// they only touch at a point.
    Segment(Point3, Point3),
    /// The triangles are coplanar and overlap. No segment is reported.
    Coplanar,
}

impl TriTriIntersection {
    /// True for any kind of contact.
    pub fn is_hit(&self) -> bool {
        !matches!(self, TriTriIntersection::None)
    }
}

/// Drop the dominant axis of `normal` to get a well-conditioned 2D frame.
fn project_dominant(p: &Point3, normal: &Vec3) -> Point2 {
    let (ax, ay, az) = (normal.x.abs(), normal.y.abs(), normal.z.abs());
    if az >= ax && az >= ay {
        Point2::new(p.x, p.y)
    } else if ay >= ax {
        Point2::new(p.z, p.x)
    } else {
        Point2::new(p.y, p.z)
    }
}

fn inside(p: &Point3, tri: &[Point3; 3], normal: &Vec3) -> bool {
    let q = project_dominant(p, normal);
    let t = tri.map(|v| project_dominant(&v, normal));
    point_in_triangle_2d(&q, &t[0], &t[1], &t[2])
}

/// Signed distances of `tri`'s vertices to `plane`, snapped to zero within `eps`.
fn plane_distances(tri: &[Point3; 3], plane: &Plane, eps: f64) -> [f64; 3] {
    tri.map(|v| {
        let d = plane.signed_distance(&v);
        if d.abs() < eps {
            0.0
        } else {
            d
        }
    })
}

/// Points where `tri`'s boundary meets the plane with distances `d`.
fn boundary_crossings(tri: &[Point3; 3], d: &[f64; 3], out: &mut Vec<Point3>) {
    for i in 0..3 {
        let j = (i + 1) % 3;
        if d[i] == 0.0 {
            out.push(tri[i]);
        }
        if d[i] * d[j] < 0.0 {
            let s = d[i] / (d[i] - d[j]);
            out.push(tri[i] + (tri[j] - tri[i]) * s);
        }
    }
}

/// Intersect triangles `t1` and `t2`.
pub fn triangle_triangle_intersection(t1: &[Point3; 3], t2: &[Point3; 3]) -> TriTriIntersection {
    let (Some(plane1), Some(plane2)) = (
        Plane::from_triangle(&t1[0], &t1[1], &t1[2]),
        Plane::from_triangle(&t2[0], &t2[1], &t2[2]),
    ) else {
        return TriTriIntersection::None;
    };

    let scale = t1
        .iter()
        .chain(t2.iter())
        .map(|p| p.coords.abs().max())
        .fold(1.0_f64, f64::max);
    let eps = 1e-10 * scale;

    let d1 = plane_distances(t1, &plane2, eps);
    if d1.iter().all(|&d| d > 0.0) || d1.iter().all(|&d| d < 0.0) {
        return TriTriIntersection::None;
    }
    let d2 = plane_distances(t2, &plane1, eps);
    if d2.iter().all(|&d| d > 0.0) || d2.iter().all(|&d| d < 0.0) {
        return TriTriIntersection::None;
    }

    let n1 = plane1.normal.into_inner();
    if d1.iter().all(|&d| d == 0.0) {
        let a = t1.map(|v| project_dominant(&v, &n1));
        let b = t2.map(|v| project_dominant(&v, &n1));
        return if triangles_overlap_2d(&a, &b) {
            TriTriIntersection::Coplanar
        } else {
            TriTriIntersection::None
        };
    }
    let n2 = plane2.normal.into_inner();

    let mut from1 = Vec::with_capacity(4);
    boundary_crossings(t1, &d1, &mut from1);
    let mut from2 = Vec::with_capacity(4);
    boundary_crossings(t2, &d2, &mut from2);

    let mut pts: Vec<Point3> = Vec::with_capacity(8);
    for p in from1.iter().filter(|p| inside(p, t2, &n2)) {
        pts.push(*p);
    }
    for p in from2.iter().filter(|p| inside(p, t1, &n1)) {
        pts.push(*p);
    }

    let Some(&first) = pts.first() else {
        return TriTriIntersection::None;
    };
    let mut best = (first, first, 0.0);
    for i in 0..pts.len() {
        for j in (i + 1)..pts.len() {
            let d = (pts[j] - pts[i]).norm_squared();
            if d > best.2 {
                best = (pts[i], pts[j], d);
            }
        }
    }
    TriTriIntersection::Segment(best.0, best.1)
}

/// True if triangles `t1` and `t2` touch in any way.
pub fn triangles_intersect(t1: &[Point3; 3], t2: &[Point3; 3]) -> bool {
    triangle_triangle_intersection(t1, t2).is_hit()
}
