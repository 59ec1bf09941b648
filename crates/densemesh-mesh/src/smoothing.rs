//! Per-point normals and Laplacian smoothing.

use densemesh_math::{is_finite, normalize_or_zero, Point3, Vec3};
use rayon::prelude::*;

use crate::error::{MeshError, MeshResult};
use crate::mesh::Mesh;

impl Mesh {
    /// Unit normal at every point, averaged over its incident triangles.
    ///
    /// Degenerate triangles are skipped; a point whose incident triangles
    /// are all degenerate (or that has none) gets the zero vector.
    pub fn point_normals(&self) -> Vec<Vec3> {
        let incident = self.point_neighbor_triangles();
        self.point_normals_with(&incident)
    }

    /// [`Mesh::point_normals`] from a precomputed incidence table.
    pub fn point_normals_with(&self, incident: &[Vec<usize>]) -> Vec<Vec3> {
        incident
            .par_iter()
            .map(|tris| {
                let sum = tris
                    .iter()
                    .filter_map(|&t| self.triangle_normal(t))
                    .fold(Vec3::zeros(), |acc, n| acc + n);
                normalize_or_zero(&sum)
            })
            .collect()
    }

    /// One smoothing pass over `normals` using the ordered neighbour rings.
    ///
    /// Each normal becomes the renormalized mean of itself and its ring.
    /// Points without neighbours, or whose mean degenerates, get zero.
    pub fn smooth_normals(&self, normals: &mut [Vec3], rings: &[Vec<usize>]) -> MeshResult<()> {
        self.check_per_point("normals", normals.len())?;
        self.check_per_point("neighbour rings", rings.len())?;

        let smoothed: Vec<Vec3> = rings
            .par_iter()
            .enumerate()
            .map(|(p, ring)| {
                if ring.is_empty() {
                    return Vec3::zeros();
                }
                let sum = ring
                    .iter()
                    .fold(normals[p], |acc, &q| acc + normals[q]);
                normalize_or_zero(&(sum / ring.len() as f64))
            })
            .collect();
        normals.copy_from_slice(&smoothed);
        Ok(())
    }

    /// Displacement that moves each point onto the centroid of its ring.
    ///
    /// The displacement is zero for points without neighbours, when it is
    /// not finite, or when `max_neighbor_distance` is given and some ring
    /// point lies farther than that.
    pub fn laplacian_vectors(&self, rings: &[Vec<usize>], max_neighbor_distance: Option<f64>) -> Vec<Vec3> {
        let points = self.points();
        rings
            .par_iter()
            .enumerate()
            .map(|(p, ring)| {
                if ring.is_empty() {
                    return Vec3::zeros();
                }
                let here = points[p];
                let mut sum = Vec3::zeros();
                let mut farthest: f64 = 0.0;
                for &q in ring {
                    sum += points[q].coords;
                    farthest = farthest.max((points[q] - here).norm());
                }
                if let Some(limit) = max_neighbor_distance {
                    if limit > 0.0 && farthest > limit {
                        return Vec3::zeros();
                    }
                }
                let d = sum / ring.len() as f64 - here.coords;
                if is_finite(&d) {
                    d
                } else {
                    Vec3::zeros()
                }
            })
            .collect()
    }

    /// Move every point by its Laplacian vector.
    pub fn laplacian_smooth_points(&mut self, max_neighbor_distance: Option<f64>) {
        let rings = self.point_neighbor_points_ordered();
        self.laplacian_smooth_points_with(&rings, max_neighbor_distance);
    }

    /// [`Mesh::laplacian_smooth_points`] with precomputed rings.
    pub fn laplacian_smooth_points_with(&mut self, rings: &[Vec<usize>], max_neighbor_distance: Option<f64>) {
        let shift = self.laplacian_vectors(rings, max_neighbor_distance);
        for (p, d) in self.points_mut().iter_mut().zip(shift) {
            *p += d;
        }
    }

    /// Repeat [`Mesh::laplacian_smooth_points`]. Topology does not change
    /// between passes so the rings are built once.
    pub fn laplacian_smooth_iterations(&mut self, iterations: usize, max_neighbor_distance: Option<f64>) {
        let rings = self.point_neighbor_points_ordered();
        for _ in 0..iterations {
            self.laplacian_smooth_points_with(&rings, max_neighbor_distance);
        }
    }

    /// Point at the centroid of its ring, or itself when the ring is empty.
    pub fn ring_centroid(&self, p: usize, ring: &[usize]) -> Point3 {
        if ring.is_empty() {
            return self.points()[p];
        }
        let sum = ring
            .iter()
            .fold(Vec3::zeros(), |acc, &q| acc + self.points()[q].coords);
        Point3::from(sum / ring.len() as f64)
    }

    pub(crate) fn check_per_point(&self, what: &'static str, len: usize) -> MeshResult<()> {
        if len == self.point_count() {
            Ok(())
        } else {
            Err(MeshError::SizeMismatch {
                what,
                expected: self.point_count(),
                found: len,
            })
        }
    }
}
