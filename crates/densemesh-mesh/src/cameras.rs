//! Per-point and per-triangle camera sets.
//!
//! Lists are plain `Vec<Vec<usize>>` indexed by object id holding camera
//! ids (or the reverse after [`invert_object_camera_lists`]).

use tracing::warn;

use crate::error::MeshResult;
use crate::mesh::Mesh;

impl Mesh {
    /// Camera set of each triangle: the distinct union of its three points'
    /// sets, in first-seen order.
    pub fn triangle_cameras_from_point_cameras(&self, point_cameras: &[Vec<usize>]) -> MeshResult<Vec<Vec<usize>>> {
        self.check_per_point("point cameras", point_cameras.len())?;
        Ok(self
            .triangles()
            .iter()
            .map(|tri| {
                let mut cams: Vec<usize> = Vec::with_capacity(tri.v.iter().map(|&p| point_cameras[p].len()).sum());
                for &p in &tri.v {
                    for &c in &point_cameras[p] {
                        if !cams.contains(&c) {
                            cams.push(c);
                        }
                    }
                }
                cams
            })
            .collect())
    }
}

/// Turn object-to-cameras lists into camera-to-objects lists.
///
/// The result has `camera_count` entries, each holding object ids in
/// ascending order. Camera ids outside `0..camera_count` are skipped with a
/// warning. Applying it twice (with the object count) restores sorted lists.
pub fn invert_object_camera_lists(object_cameras: &[Vec<usize>], camera_count: usize) -> Vec<Vec<usize>> {
    let mut counts = vec![0usize; camera_count];
    let mut skipped = 0usize;
    for cams in object_cameras {
        for &c in cams {
            match counts.get_mut(c) {
                Some(n) => *n += 1,
                None => skipped += 1,
            }
        }
    }
    if skipped > 0 {
        warn!(skipped, camera_count, "ignoring out-of-range camera ids");
    }

    let mut out: Vec<Vec<usize>> = counts.into_iter().map(Vec::with_capacity).collect();
    for (object, cams) in object_cameras.iter().enumerate() {
        for &c in cams {
            if let Some(list) = out.get_mut(c) {
                list.push(object);
            }
        }
    }
    out
}
