//! Derived adjacency: point fans, ordered neighbour rings and undirected edges.
//!
//! Nothing here is cached on the mesh. Every table is rebuilt from the raw
//! index triples with a sort over a composite key followed by a run scan.

use std::collections::HashSet;

use crate::error::{MeshError, MeshResult};
use crate::mesh::Mesh;

/// Undirected edges with their incident triangles.
///
/// Edge ids are dense and follow the `(min, max)` point-pair order, so
/// `edge_points` is sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeAdjacency {
    /// `(min, max)` point indices of each edge.
    pub edge_points: Vec<[usize; 2]>,
    /// Triangles incident to each edge, ascending.
    pub edge_triangles: Vec<Vec<usize>>,
}

impl EdgeAdjacency {
    /// Number of edges.
    pub fn len(&self) -> usize {
        self.edge_points.len()
    }

    /// True if there are no edges.
    pub fn is_empty(&self) -> bool {
        self.edge_points.is_empty()
    }

    /// Id of the edge joining `a` and `b`, in either order.
    pub fn find(&self, a: usize, b: usize) -> Option<usize> {
        let key = [a.min(b), a.max(b)];
        self.edge_points.binary_search(&key).ok()
    }

    /// Edges with exactly one incident triangle.
    pub fn boundary_edge_count(&self) -> usize {
        self.edge_triangles.iter().filter(|t| t.len() == 1).count()
    }

    /// Ids of edges shared by more than two triangles.
    pub fn non_manifold_edges(&self) -> impl Iterator<Item = usize> + '_ {
        self.edge_triangles
            .iter()
            .enumerate()
            .filter(|(_, t)| t.len() > 2)
            .map(|(e, _)| e)
    }
}

impl Mesh {
    /// Triangles incident to each point, ascending. Free points get an empty list.
    pub fn point_neighbor_triangles(&self) -> Vec<Vec<usize>> {
        let mut pairs: Vec<(usize, usize)> = Vec::with_capacity(self.triangle_count() * 3);
        for (t, tri) in self.triangles().iter().enumerate() {
            for &p in &tri.v {
                pairs.push((p, t));
            }
        }
        pairs.sort_unstable();

        let mut out: Vec<Vec<usize>> = vec![Vec::new(); self.point_count()];
        for run in pairs.chunk_by(|a, b| a.0 == b.0) {
            let p = run[0].0;
            out[p] = run.iter().map(|&(_, t)| t).collect();
        }
        out
    }

    /// Ordered ring of neighbour points around every point.
    pub fn point_neighbor_points_ordered(&self) -> Vec<Vec<usize>> {
        let incident = self.point_neighbor_triangles();
        self.point_neighbor_points_ordered_with(&incident)
    }

    /// Ordered rings from a precomputed [`Mesh::point_neighbor_triangles`] table.
    pub fn point_neighbor_points_ordered_with(&self, incident: &[Vec<usize>]) -> Vec<Vec<usize>> {
        incident
            .iter()
            .enumerate()
            .map(|(p, tris)| self.ordered_ring(p, tris))
            .collect()
    }

    /// Walk the fan of `center` starting from its first usable neighbour.
    ///
    /// Open fans are walked in both directions; a closed fan drops the
    /// repeated start point. Every step consumes a triangle, so the walk
    /// ends after at most `incident.len()` steps even on non-manifold fans,
    /// which then yield a partial ring.
    fn ordered_ring(&self, center: usize, incident: &[usize]) -> Vec<usize> {
        let Some(start) = incident
            .iter()
            .flat_map(|&t| self.triangle(t).v)
            .find(|&q| self.is_ring_candidate(center, q))
        else {
            return Vec::new();
        };

        let mut remaining = incident.to_vec();
        let mut ring = vec![start];
        self.walk_fan(center, start, &mut remaining, &mut ring);

        if ring.len() > 1 && ring.last() == Some(&start) {
            ring.pop();
        } else {
            let mut back = Vec::new();
            self.walk_fan(center, start, &mut remaining, &mut back);
            back.reverse();
            back.append(&mut ring);
            ring = back;
        }

        let mut seen = HashSet::with_capacity(ring.len());
        ring.retain(|&q| seen.insert(q));
        ring
    }

    fn is_ring_candidate(&self, center: usize, q: usize) -> bool {
        if q == center {
            return false;
        }
        let d = (self.points()[q] - self.points()[center]).norm();
        d > 0.0 && d.is_finite()
    }

    /// Extend `out` by repeatedly crossing to the next triangle that shares
    /// the edge `(center, current)`. Stops on returning to `from`.
    fn walk_fan(&self, center: usize, from: usize, remaining: &mut Vec<usize>, out: &mut Vec<usize>) {
        let mut current = from;
        let bound = remaining.len();
        for _ in 0..bound {
            let next = remaining.iter().enumerate().find_map(|(k, &t)| {
                let tri = self.triangle(t);
                if !tri.contains(current) {
                    return None;
                }
                tri.v
                    .iter()
                    .copied()
                    .find(|&q| q != current && self.is_ring_candidate(center, q))
                    .map(|q| (k, q))
            });
            let Some((k, q)) = next else {
                break;
            };
            remaining.remove(k);
            out.push(q);
            if q == from {
                break;
            }
            current = q;
        }
    }

    /// Group the undirected edges of every triangle.
    ///
    /// Tolerates non-manifold edges; they simply carry more than two triangles.
    pub fn extract_undirected_edges(&self) -> EdgeAdjacency {
        let mut triples: Vec<(usize, usize, usize)> = Vec::with_capacity(self.triangle_count() * 3);
        for (t, tri) in self.triangles().iter().enumerate() {
            for (a, b) in tri.edges() {
                triples.push((a.min(b), a.max(b), t));
            }
        }
        triples.sort_unstable();

        let mut adjacency = EdgeAdjacency::default();
        for run in triples.chunk_by(|x, y| (x.0, x.1) == (y.0, y.1)) {
            adjacency.edge_points.push([run[0].0, run[0].1]);
            adjacency
                .edge_triangles
                .push(run.iter().map(|&(_, _, t)| t).collect());
        }
        adjacency
    }

    /// Edge id of each triangle side, indexed by slot: side `k` joins
    /// vertices `k` and `(k + 1) % 3`.
    ///
    /// Fails on the first triangle that does not resolve to three distinct
    /// edges of `edges`.
    pub fn triangle_edge_ids(&self, edges: &EdgeAdjacency) -> MeshResult<Vec<[usize; 3]>> {
        let mut slots: Vec<[Option<usize>; 3]> = vec![[None; 3]; self.triangle_count()];
        for (e, tris) in edges.edge_triangles.iter().enumerate() {
            let [a, b] = edges.edge_points[e];
            for &t in tris {
                let Some(entry) = slots.get_mut(t) else {
                    return Err(MeshError::TriangleIndexOutOfRange {
                        triangle: t,
                        triangle_count: self.triangle_count(),
                    });
                };
                for (k, (p, q)) in self.triangle(t).edges().into_iter().enumerate() {
                    if p.min(q) == a && p.max(q) == b && entry[k].is_none() {
                        entry[k] = Some(e);
                        break;
                    }
                }
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(t, s)| match s {
                [Some(x), Some(y), Some(z)] if x != y && y != z && x != z => Ok([x, y, z]),
                _ => {
                    let mut distinct: Vec<usize> = s.iter().flatten().copied().collect();
                    distinct.sort_unstable();
                    distinct.dedup();
                    Err(MeshError::MalformedEdges {
                        triangle: t,
                        resolved: distinct.len(),
                    })
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::tests::{octahedron, unit_quad};
    use densemesh_math::Point3;

    #[test]
    fn test_point_neighbor_triangles() {
        let m = unit_quad();
        let n = m.point_neighbor_triangles();
        assert_eq!(n, vec![vec![0, 1], vec![0], vec![0, 1], vec![1]]);
    }

    #[test]
    fn test_free_point_has_no_neighbors() {
        let mut m = unit_quad();
        m.add_point(Point3::new(5.0, 5.0, 5.0));
        let n = m.point_neighbor_triangles();
        assert!(n[4].is_empty());
        assert!(m.point_neighbor_points_ordered()[4].is_empty());
    }

    fn is_cyclic_rotation(ring: &[usize], expected: &[usize]) -> bool {
        if ring.len() != expected.len() {
            return false;
        }
        let n = ring.len();
        (0..n).any(|s| (0..n).all(|i| ring[(s + i) % n] == expected[i]))
            || (0..n).any(|s| (0..n).all(|i| ring[(s + n - i) % n] == expected[i]))
    }

    #[test]
    fn test_closed_fan_ring() {
        let m = octahedron();
        let rings = m.point_neighbor_points_ordered();
        // Apex 4 is surrounded by the equator 0, 2, 1, 3
        assert!(is_cyclic_rotation(&rings[4], &[0, 2, 1, 3]), "{:?}", rings[4]);
        for ring in &rings {
            assert_eq!(ring.len(), 4);
        }
    }

    #[test]
    fn test_open_fan_ring_is_complete() {
        // Fan of three triangles around point 0, open on both sides
        let m = Mesh::from_indexed(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(-1.0, 1.0, 0.0),
            ],
            &[[0, 2, 3], [0, 1, 2], [0, 3, 4]],
        )
        .unwrap();
        let ring = &m.point_neighbor_points_ordered()[0];
        assert!(
            ring == &vec![1, 2, 3, 4] || ring == &vec![4, 3, 2, 1],
            "{ring:?}"
        );
    }

    #[test]
    fn test_non_manifold_fan_terminates() {
        // Three triangles share edge (0, 1)
        let m = Mesh::from_indexed(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.5, 1.0, 0.0),
                Point3::new(0.5, -1.0, 0.0),
                Point3::new(0.5, 0.0, 1.0),
            ],
            &[[0, 1, 2], [1, 0, 3], [0, 1, 4]],
        )
        .unwrap();
        let rings = m.point_neighbor_points_ordered();
        assert!(!rings[0].is_empty());
        assert!(rings[0].len() <= 4);
        let unique: HashSet<_> = rings[0].iter().collect();
        assert_eq!(unique.len(), rings[0].len());
    }

    #[test]
    fn test_coincident_points_are_skipped() {
        let m = Mesh::from_indexed(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
            ],
            &[[0, 1, 2]],
        )
        .unwrap();
        let rings = m.point_neighbor_points_ordered();
        assert_eq!(rings[0], vec![2]);
        assert_eq!(rings[1], vec![2]);
    }

    #[test]
    fn test_extract_edges_quad() {
        let m = unit_quad();
        let edges = m.extract_undirected_edges();
        assert_eq!(
            edges.edge_points,
            vec![[0, 1], [0, 2], [0, 3], [1, 2], [2, 3]]
        );
        assert_eq!(edges.edge_triangles[1], vec![0, 1]);
        assert_eq!(edges.boundary_edge_count(), 4);
        assert_eq!(edges.find(2, 0), Some(1));
        assert_eq!(edges.find(1, 3), None);
        assert_eq!(edges.non_manifold_edges().count(), 0);
    }

    #[test]
    fn test_edge_triangle_consistency_closed_mesh() {
        let m = octahedron();
        let edges = m.extract_undirected_edges();
        let ids = m.triangle_edge_ids(&edges).unwrap();
        assert_eq!(ids.len(), m.triangle_count());
        for (t, e) in ids.iter().enumerate() {
            assert!(e[0] != e[1] && e[1] != e[2] && e[0] != e[2]);
            for (k, (a, b)) in m.triangle(t).edges().into_iter().enumerate() {
                assert_eq!(edges.edge_points[e[k]], [a.min(b), a.max(b)]);
            }
        }
        assert_eq!(edges.boundary_edge_count(), 0);
        assert_eq!(
            2 * edges.len() - edges.boundary_edge_count(),
            3 * m.triangle_count()
        );
    }

    #[test]
    fn test_edge_count_identity_open_mesh() {
        let m = unit_quad();
        let edges = m.extract_undirected_edges();
        assert_eq!(
            2 * edges.len() - edges.boundary_edge_count(),
            3 * m.triangle_count()
        );
    }

    #[test]
    fn test_non_manifold_edge_is_tolerated() {
        let m = Mesh::from_indexed(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.5, 1.0, 0.0),
                Point3::new(0.5, -1.0, 0.0),
                Point3::new(0.5, 0.0, 1.0),
            ],
            &[[0, 1, 2], [1, 0, 3], [0, 1, 4]],
        )
        .unwrap();
        let edges = m.extract_undirected_edges();
        let shared: Vec<usize> = edges.non_manifold_edges().collect();
        assert_eq!(shared, vec![edges.find(0, 1).unwrap()]);
        assert!(m.triangle_edge_ids(&edges).is_ok());
    }

    #[test]
    fn test_triangle_edge_ids_reports_malformed() {
        let m = unit_quad();
        let mut edges = m.extract_undirected_edges();
        // Drop triangle 1 from the diagonal
        edges.edge_triangles[1] = vec![0];
        assert!(matches!(
            m.triangle_edge_ids(&edges),
            Err(MeshError::MalformedEdges { triangle: 1, resolved: 2 })
        ));
    }
}
