//! Connected components over the point neighbour graph.

use tracing::debug;

use crate::mesh::Mesh;

impl Mesh {
    /// Component label of every point, flood-filled over the ordered rings.
    ///
    /// Labels are dense and assigned in ascending order of each component's
    /// lowest point index. Returns the labels and the size of each component.
    pub fn point_components(&self, rings: &[Vec<usize>]) -> (Vec<usize>, Vec<usize>) {
        const UNSEEN: usize = usize::MAX;
        let mut labels = vec![UNSEEN; self.point_count()];
        let mut sizes = Vec::new();
        let mut stack = Vec::new();

        for seed in 0..self.point_count() {
            if labels[seed] != UNSEEN {
                continue;
            }
            let label = sizes.len();
            let mut size = 0;
            stack.push(seed);
            while let Some(p) = stack.pop() {
                if labels[p] != UNSEEN {
                    continue;
                }
                labels[p] = label;
                size += 1;
                stack.extend(rings[p].iter().copied().filter(|&q| labels[q] == UNSEEN));
            }
            sizes.push(size);
        }
        (labels, sizes)
    }

    /// Ids of the live triangles whose three points all belong to the
    /// component with the most points. Ties go to the lowest label.
    pub fn largest_connected_component_triangle_ids(&self) -> Vec<usize> {
        let rings = self.point_neighbor_points_ordered();
        let (labels, sizes) = self.point_components(&rings);

        let mut best: Option<(usize, usize)> = None;
        for (label, &size) in sizes.iter().enumerate() {
            if best.map_or(true, |(_, s)| size > s) {
                best = Some((label, size));
            }
        }
        let Some((best, best_size)) = best else {
            return Vec::new();
        };
        debug!(
            components = sizes.len(),
            points = best_size,
            "largest connected component"
        );

        self.triangles()
            .iter()
            .enumerate()
            .filter(|(_, tri)| tri.alive && tri.v.iter().all(|&p| labels[p] == best))
            .map(|(t, _)| t)
            .collect()
    }
}
