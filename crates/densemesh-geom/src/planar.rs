//! 2D predicates in image space.

use densemesh_math::{heron_area, Point2, Vec2};

fn cross2(a: &Vec2, b: &Vec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Test whether `p` lies inside or on triangle `(a, b, c)`.
///
/// Barycentric test with a small negative slack so points on an edge count
/// as inside. Degenerate (zero-area) triangles contain nothing.
pub fn point_in_triangle_2d(p: &Point2, a: &Point2, b: &Point2, c: &Point2) -> bool {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;

    let d00 = v0.dot(&v0);
    let d01 = v0.dot(&v1);
    let d11 = v1.dot(&v1);
    let d20 = v2.dot(&v0);
    let d21 = v2.dot(&v1);

    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < 1e-10 {
        return false;
    }

    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    let u = 1.0 - v - w;

    // Allow small negative values for numerical stability at edges
    let eps = -1e-8;
    u >= eps && v >= eps && w >= eps
}

/// Intersection point of segments `a1 a2` and `b1 b2`.
///
/// Parallel and collinear segments return `None`.
pub fn segments_intersect_2d(a1: &Point2, a2: &Point2, b1: &Point2, b2: &Point2) -> Option<Point2> {
    let r = a2 - a1;
    let s = b2 - b1;
    let denom = cross2(&r, &s);
    if denom.abs() < 1e-12 {
        return None;
    }
    let qp = b1 - a1;
    let t = cross2(&qp, &s) / denom;
    let u = cross2(&qp, &r) / denom;
    let slack = 1e-12;
    if (-slack..=1.0 + slack).contains(&t) && (-slack..=1.0 + slack).contains(&u) {
        Some(a1 + t * r)
    } else {
        None
    }
}

/// Test whether two 2D triangles share any area or boundary point.
pub fn triangles_overlap_2d(t1: &[Point2; 3], t2: &[Point2; 3]) -> bool {
    for i in 0..3 {
        let (a1, a2) = (&t1[i], &t1[(i + 1) % 3]);
        for j in 0..3 {
            if segments_intersect_2d(a1, a2, &t2[j], &t2[(j + 1) % 3]).is_some() {
                return true;
            }
        }
    }
    t1.iter().any(|p| point_in_triangle_2d(p, &t2[0], &t2[1], &t2[2]))
        || t2.iter().any(|p| point_in_triangle_2d(p, &t1[0], &t1[1], &t1[2]))
}

/// Area of a 2D triangle from its side lengths.
pub fn triangle_area_2d(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    heron_area((b - a).norm(), (c - b).norm(), (a - c).norm())
}

/// Clip the infinite line through `p` with direction `dir` to the image
/// rectangle `[0, width] x [0, height]`.
///
/// Returns the entry and exit points, or `None` if the line misses the image
/// or `dir` is zero.
pub fn clip_line_to_image(p: &Point2, dir: &Vec2, width: f64, height: f64) -> Option<(Point2, Point2)> {
    if dir.norm() < 1e-12 {
        return None;
    }
    let mut t_min = f64::NEG_INFINITY;
    let mut t_max = f64::INFINITY;
    for (origin, d, lo, hi) in [(p.x, dir.x, 0.0, width), (p.y, dir.y, 0.0, height)] {
        if d.abs() < 1e-12 {
            if origin < lo || origin > hi {
                return None;
            }
            continue;
        }
        let t0 = (lo - origin) / d;
        let t1 = (hi - origin) / d;
        t_min = t_min.max(t0.min(t1));
        t_max = t_max.min(t0.max(t1));
    }
    if t_min > t_max {
        return None;
    }
    Some((p + t_min * dir, p + t_max * dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn test_point_in_triangle() {
        let (a, b, c) = (p(0.0, 0.0), p(10.0, 0.0), p(5.0, 10.0));
        assert!(point_in_triangle_2d(&p(5.0, 3.0), &a, &b, &c));
        assert!(point_in_triangle_2d(&p(5.0, 0.0), &a, &b, &c));
        assert!(!point_in_triangle_2d(&p(-1.0, 0.0), &a, &b, &c));
        assert!(!point_in_triangle_2d(&p(5.0, 15.0), &a, &b, &c));
    }

    #[test]
    fn test_point_in_degenerate_triangle() {
        let (a, b) = (p(0.0, 0.0), p(1.0, 1.0));
        assert!(!point_in_triangle_2d(&p(0.5, 0.5), &a, &b, &p(2.0, 2.0)));
    }

    #[test]
    fn test_segments_intersect() {
        let x = segments_intersect_2d(&p(0.0, 0.0), &p(2.0, 2.0), &p(0.0, 2.0), &p(2.0, 0.0)).unwrap();
        assert!((x - p(1.0, 1.0)).norm() < 1e-12);
        assert!(segments_intersect_2d(&p(0.0, 0.0), &p(1.0, 0.0), &p(2.0, -1.0), &p(2.0, 1.0)).is_none());
        // Parallel
        assert!(segments_intersect_2d(&p(0.0, 0.0), &p(1.0, 0.0), &p(0.0, 1.0), &p(1.0, 1.0)).is_none());
    }

    #[test]
    fn test_triangles_overlap() {
        let t1 = [p(0.0, 0.0), p(4.0, 0.0), p(0.0, 4.0)];
        let crossing = [p(1.0, -1.0), p(2.0, 3.0), p(3.0, -1.0)];
        let inside = [p(0.5, 0.5), p(1.0, 0.5), p(0.5, 1.0)];
        let apart = [p(5.0, 5.0), p(6.0, 5.0), p(5.0, 6.0)];
        assert!(triangles_overlap_2d(&t1, &crossing));
        assert!(triangles_overlap_2d(&t1, &inside));
        assert!(triangles_overlap_2d(&inside, &t1));
        assert!(!triangles_overlap_2d(&t1, &apart));
    }

    #[test]
    fn test_triangle_area_2d() {
        assert!((triangle_area_2d(&p(0.0, 0.0), &p(4.0, 0.0), &p(0.0, 3.0)) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_clip_line_to_image() {
        let (a, b) = clip_line_to_image(&p(5.0, 5.0), &Vec2::new(1.0, 0.0), 10.0, 8.0).unwrap();
        assert!((a - p(0.0, 5.0)).norm() < 1e-12);
        assert!((b - p(10.0, 5.0)).norm() < 1e-12);

        let (a, b) = clip_line_to_image(&p(0.0, 0.0), &Vec2::new(1.0, 1.0), 10.0, 8.0).unwrap();
        assert!((a - p(0.0, 0.0)).norm() < 1e-12);
        assert!((b - p(8.0, 8.0)).norm() < 1e-12);

        assert!(clip_line_to_image(&p(0.0, 20.0), &Vec2::new(1.0, 0.0), 10.0, 8.0).is_none());
        assert!(clip_line_to_image(&p(0.0, 0.0), &Vec2::zeros(), 10.0, 8.0).is_none());
    }
}
