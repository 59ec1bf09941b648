//! Triangle-set filters. Every filter keeps points in place and returns the
//! number of triangles it dropped; compact afterwards with
//! [`Mesh::remove_free_points`].

use densemesh_geom::Hexahedron;
use rayon::prelude::*;
use tracing::debug;

use crate::mesh::Mesh;

impl Mesh {
    /// Keep the triangles for which `keep` holds, preserving order.
    pub fn retain_triangles_where<F>(&mut self, keep: F) -> usize
    where
        F: Fn(&Mesh, usize) -> bool + Sync,
    {
        let flags: Vec<bool> = (0..self.triangle_count())
            .into_par_iter()
            .map(|t| keep(self, t))
            .collect();
        let ids: Vec<usize> = flags
            .iter()
            .enumerate()
            .filter(|(_, &k)| k)
            .map(|(t, _)| t)
            .collect();
        let removed = self.triangle_count() - ids.len();
        let triangles = ids.iter().map(|&t| *self.triangle(t)).collect();
        self.replace_triangles(triangles);
        removed
    }

    /// Drop triangles whose longest edge is not below `ratio` times the mean
    /// longest edge over the whole mesh.
    pub fn filter_triangles_with_excessive_edge_length(&mut self, ratio: f64) -> usize {
        let limit = self.average_max_edge_length() * ratio;
        let removed = self.retain_triangles_where(|m, t| m.triangle_max_edge_length(t) < limit);
        debug!(limit, removed, "filtered long-edge triangles");
        removed
    }

    /// Drop triangles whose three points each lie inside at least one of
    /// `hexahedra`. The points need not share a hexahedron.
    pub fn remove_triangles_in_hexahedra(&mut self, hexahedra: &[Hexahedron]) -> usize {
        if hexahedra.is_empty() {
            return 0;
        }
        let removed = self.retain_triangles_where(|m, t| {
            !m.triangle(t).v.iter().all(|&p| {
                let p = &m.points()[p];
                hexahedra.iter().any(|h| h.contains_point(p))
            })
        });
        debug!(hexahedra = hexahedra.len(), removed, "removed triangles inside hexahedra");
        removed
    }

    /// Drop triangles with any point outside `hexahedron`.
    pub fn remove_triangles_outside_hexahedron(&mut self, hexahedron: &Hexahedron) -> usize {
        let removed = self.retain_triangles_where(|m, t| {
            m.triangle(t)
                .v
                .iter()
                .all(|&p| hexahedron.contains_point(&m.points()[p]))
        });
        debug!(removed, "removed triangles outside hexahedron");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::tests::unit_quad;
    use densemesh_geom::Aabb3;
    use densemesh_math::Point3;

    fn cube(min: [f64; 3], max: [f64; 3]) -> Hexahedron {
        Hexahedron::from_aabb(&Aabb3::new(
            Point3::new(min[0], min[1], min[2]),
            Point3::new(max[0], max[1], max[2]),
        ))
    }

    /// Strip of unit squares along x: triangles 2k and 2k+1 cover [k, k+1].
    fn strip(n: usize) -> Mesh {
        let mut points = Vec::new();
        for i in 0..=n {
            points.push(Point3::new(i as f64, 0.0, 0.0));
            points.push(Point3::new(i as f64, 1.0, 0.0));
        }
        let mut faces = Vec::new();
        for i in 0..n {
            let (a, b, c, d) = (2 * i, 2 * i + 2, 2 * i + 3, 2 * i + 1);
            faces.push([a, b, c]);
            faces.push([a, c, d]);
        }
        Mesh::from_indexed(points, &faces).unwrap()
    }

    #[test]
    fn test_filter_excessive_edges() {
        let mut m = strip(3);
        // Stretch the last square to four units
        let n = m.point_count();
        m.points_mut()[n - 2].x = 6.0;
        m.points_mut()[n - 1].x = 6.0;
        let removed = m.filter_triangles_with_excessive_edge_length(1.2);
        assert_eq!(removed, 2);
        assert_eq!(m.triangle_count(), 4);
        assert_eq!(m.point_count(), n);
    }

    #[test]
    fn test_filter_keeps_equal_edges_strictly_below() {
        // Every triangle equals the mean, so ratio 1 drops all of them
        let mut m = unit_quad();
        assert_eq!(m.filter_triangles_with_excessive_edge_length(1.0), 2);
        let mut m = unit_quad();
        assert_eq!(m.filter_triangles_with_excessive_edge_length(1.01), 0);
    }

    #[test]
    fn test_remove_in_hexahedra_needs_all_points() {
        let mut m = strip(2);
        // Covers the first square fully, the second only along x = 1
        let h = cube([-0.5, -0.5, -0.5], [1.5, 1.5, 0.5]);
        assert_eq!(m.remove_triangles_in_hexahedra(&[h]), 2);
        assert_eq!(m.triangle_count(), 2);
        assert!(m.triangles().iter().all(|t| t.v.contains(&4) || t.v.contains(&5)));
    }

    #[test]
    fn test_remove_in_union_of_hexahedra() {
        let mut m = strip(1);
        // Each box holds one side of the square; neither holds a whole triangle
        let left = cube([-0.5, -0.5, -0.5], [0.5, 1.5, 0.5]);
        let right = cube([0.5, -0.5, -0.5], [1.5, 1.5, 0.5]);
        assert_eq!(m.remove_triangles_in_hexahedra(&[left]), 0);
        assert_eq!(m.remove_triangles_in_hexahedra(&[left, right]), 2);
        assert_eq!(m.triangle_count(), 0);
    }

    #[test]
    fn test_remove_outside_hexahedron() {
        let mut m = strip(2);
        let h = cube([-0.5, -0.5, -0.5], [1.5, 1.5, 0.5]);
        assert_eq!(m.remove_triangles_outside_hexahedron(&h), 2);
        assert_eq!(m.triangle_count(), 2);
        for t in m.triangles() {
            assert!(t.v.iter().all(|&p| p < 4));
        }
    }

    #[test]
    fn test_no_hexahedra_is_noop() {
        let mut m = unit_quad();
        assert_eq!(m.remove_triangles_in_hexahedra(&[]), 0);
        assert_eq!(m.triangle_count(), 2);
    }
}
