//! Hexahedra: eight-corner convex cells such as camera frusta and crop boxes.
//!
//! Corners `0..4` form the front face and `4..8` the back face, with corner
//! `i` connected to corner `i + 4`.

use densemesh_math::{try_normalize, Point3};
use serde::{Deserialize, Serialize};

use crate::bbox::Aabb3;
use crate::line::segment_triangle_intersection;
use crate::plane::oriented_point_plane_distance;
use crate::tri_tri::{triangle_triangle_intersection, TriTriIntersection};

/// Split of the six quadrilateral faces into twelve triangles.
pub const FACE_TRIANGLES: [[usize; 3]; 12] = [
    [0, 4, 1],
    [1, 4, 5],
    [1, 5, 6],
    [1, 6, 2],
    [2, 6, 7],
    [2, 7, 3],
    [3, 7, 4],
    [3, 4, 0],
    [0, 1, 3],
    [1, 2, 3],
    [7, 5, 4],
    [7, 6, 5],
];

/// Containment tests: `(a, b, c)` span a face plane and `d` is a corner
/// known to lie on the inner side of it.
const FACE_TESTS: [[usize; 4]; 6] = [
    [0, 1, 3, 4],
    [0, 1, 4, 3],
    [1, 2, 5, 0],
    [2, 6, 3, 1],
    [0, 4, 3, 1],
    [4, 5, 7, 0],
];

/// A convex hexahedron given by its eight corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hexahedron {
    /// Corner points; see the module docs for the ordering.
    pub corners: [Point3; 8],
}

impl Hexahedron {
    /// Hexahedron from explicit corners.
    pub fn new(corners: [Point3; 8]) -> Self {
        Self { corners }
    }

    /// Axis-aligned box as a hexahedron.
    pub fn from_aabb(b: &Aabb3) -> Self {
        let (lo, hi) = (b.min, b.max);
        Self::new([
            Point3::new(lo.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(lo.x, hi.y, lo.z),
            Point3::new(lo.x, lo.y, hi.z),
            Point3::new(hi.x, lo.y, hi.z),
            Point3::new(hi.x, hi.y, hi.z),
            Point3::new(lo.x, hi.y, hi.z),
        ])
    }

    /// Bounding box of the corners.
    pub fn aabb(&self) -> Aabb3 {
        Aabb3::from_points(self.corners.iter())
    }

    /// Mean of the eight corners.
    pub fn centroid(&self) -> Point3 {
        let sum = self
            .corners
            .iter()
            .fold(nalgebra::Vector3::zeros(), |acc, c| acc + c.coords);
        Point3::from(sum / 8.0)
    }

    /// The twelve boundary triangles.
    pub fn triangles(&self) -> [[Point3; 3]; 12] {
        FACE_TRIANGLES.map(|[a, b, c]| [self.corners[a], self.corners[b], self.corners[c]])
    }

    /// Six-plane containment test. Points on the boundary are inside.
    ///
    /// A hexahedron with a collapsed face contains nothing.
    pub fn contains_point(&self, p: &Point3) -> bool {
        let eps = 1e-9 * (1.0 + self.aabb().diagonal());
        for [a, b, c, d] in FACE_TESTS {
            let (a, b, c, d) = (
                &self.corners[a],
                &self.corners[b],
                &self.corners[c],
                &self.corners[d],
            );
            let Some(n) = try_normalize(&(a - b).cross(&(b - c))) else {
                return false;
            };
            let d1 = oriented_point_plane_distance(p, a, &n);
            let d2 = oriented_point_plane_distance(d, a, &n);
            if d1.abs() > eps && d1 * d2 < 0.0 {
                return false;
            }
        }
        true
    }

    /// True if the two hexahedra touch: some pair of boundary triangles
    /// intersects, or a corner of one lies inside the other.
    pub fn intersects(&self, other: &Hexahedron) -> bool {
        if !self.aabb().overlaps(&other.aabb()) {
            return false;
        }
        let mine = self.triangles();
        let theirs = other.triangles();
        for t1 in &mine {
            for t2 in &theirs {
                if triangle_triangle_intersection(t1, t2).is_hit() {
                    return true;
                }
            }
        }
        other.corners.iter().any(|c| self.contains_point(c))
            || self.corners.iter().any(|c| other.contains_point(c))
    }

    /// Endpoints of every segment where triangle `(a, b, c)` crosses a
    /// boundary triangle. Coplanar contacts contribute no points.
    pub fn triangle_intersection(&self, a: &Point3, b: &Point3, c: &Point3) -> Vec<Point3> {
        let tri = [*a, *b, *c];
        let mut out = Vec::new();
        for face in &self.triangles() {
            if let TriTriIntersection::Segment(p, q) = triangle_triangle_intersection(&tri, face) {
                out.push(p);
                out.push(q);
            }
        }
        out
    }

    /// Points where segment `p q` crosses the boundary triangles.
    pub fn segment_intersection(&self, p: &Point3, q: &Point3) -> Vec<Point3> {
        self.triangles()
            .iter()
            .filter_map(|[a, b, c]| segment_triangle_intersection(p, q, a, b, c))
            .collect()
    }

    /// Scale the corners about the centroid.
    pub fn inflate(&self, scale: f64) -> Hexahedron {
        let cg = self.centroid();
        Hexahedron::new(self.corners.map(|c| cg + (c - cg) * scale))
    }

    /// Trilinear point at parameters `(u, v, w)` in `[0, 1]^3`.
    ///
    /// `u` runs from corner 0 to 1, `v` from 0 to 3, `w` from front to back.
    pub fn lerp(&self, u: f64, v: f64, w: f64) -> Point3 {
        let c = &self.corners;
        let face = |o: usize| {
            let bottom = c[o] + (c[o + 1] - c[o]) * u;
            let top = c[o + 3] + (c[o + 2] - c[o + 3]) * u;
            bottom + (top - bottom) * v
        };
        let front = face(0);
        let back = face(4);
        front + (back - front) * w
    }

    /// Split into a `dims[0] x dims[1] x dims[2]` grid of voxels, x outermost.
    ///
    /// Any zero dimension yields no voxels.
    pub fn voxels(&self, dims: [usize; 3]) -> Vec<Hexahedron> {
        let [nx, ny, nz] = dims;
        let mut out = Vec::with_capacity(nx * ny * nz);
        for x in 0..nx {
            for y in 0..ny {
                for z in 0..nz {
                    let (u0, u1) = (x as f64 / nx as f64, (x + 1) as f64 / nx as f64);
                    let (v0, v1) = (y as f64 / ny as f64, (y + 1) as f64 / ny as f64);
                    let (w0, w1) = (z as f64 / nz as f64, (z + 1) as f64 / nz as f64);
                    out.push(Hexahedron::new([
                        self.lerp(u0, v0, w0),
                        self.lerp(u1, v0, w0),
                        self.lerp(u1, v1, w0),
                        self.lerp(u0, v1, w0),
                        self.lerp(u0, v0, w1),
                        self.lerp(u1, v0, w1),
                        self.lerp(u1, v1, w1),
                        self.lerp(u0, v1, w1),
                    ]));
                }
            }
        }
        out
    }
}
