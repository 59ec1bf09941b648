//! Mesh initialisation from a single depth map.

use densemesh_camera::{CameraModel, DepthMap};
use densemesh_math::{Point2, Point3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MeshError, MeshResult};
use crate::mesh::{Mesh, Triangle};

/// Parameters for [`Mesh::from_depth_map`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthMeshSettings {
    /// Native pixels per depth-map cell.
    pub scale_step: usize,
    /// Cells between the corners of one quad.
    pub step_detail: usize,
    /// Quad corners must be closer than `alpha` pixel footprints.
    pub alpha: f64,
}

impl Default for DepthMeshSettings {
    fn default() -> Self {
        Self {
            scale_step: 1,
            step_detail: 1,
            alpha: 2.0,
        }
    }
}

impl DepthMeshSettings {
    /// Check the settings are usable.
    pub fn validate(&self) -> MeshResult<()> {
        if self.scale_step == 0 || self.step_detail == 0 {
            return Err(MeshError::InvalidSettings(
                "scale_step and step_detail must be > 0".into(),
            ));
        }
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(MeshError::InvalidSettings(format!(
                "alpha must be positive, got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

impl Mesh {
    /// Triangulate the valid cells of `depth`, seen from `camera`.
    ///
    /// `depth` must be the camera image downscaled by `scale_step`. Cells
    /// with a positive depth become points along the cell's viewing ray.
    /// Each quad of `step_detail` cells whose four corners are valid and
    /// pairwise close (relative to the pixel footprint at its first corner)
    /// becomes two triangles. Unused points are dropped.
    pub fn from_depth_map<C: CameraModel + ?Sized>(
        camera: &C,
        depth: &DepthMap,
        settings: &DepthMeshSettings,
    ) -> MeshResult<Mesh> {
        settings.validate()?;
        let s = settings.scale_step;
        let (w, h) = (camera.width() as usize / s, camera.height() as usize / s);
        if depth.width() != w || depth.height() != h {
            return Err(MeshError::SizeMismatch {
                what: "depth map",
                expected: w * h,
                found: depth.width() * depth.height(),
            });
        }

        let center = camera.center();
        let mut points = Vec::with_capacity(w * h);
        let mut valid = Vec::with_capacity(w * h);
        for x in 0..w {
            for y in 0..h {
                let d = depth.as_slice()[depth.index(x, y)];
                if d > 0.0 {
                    let ray = camera.unproject(&Point2::new((x * s) as f64, (y * s) as f64));
                    points.push(center + ray * f64::from(d));
                    valid.push(true);
                } else {
                    points.push(Point3::origin());
                    valid.push(false);
                }
            }
        }

        let sd = settings.step_detail;
        let mut triangles = Vec::new();
        let mut x = 0;
        while x + sd + 1 < w {
            let mut y = 0;
            while y + sd + 1 < h {
                let i1 = x * h + y;
                let i2 = (x + sd) * h + y;
                let i3 = (x + sd) * h + y + sd;
                let i4 = x * h + y + sd;
                if [i1, i2, i3, i4].iter().all(|&i| valid[i]) {
                    let (p1, p2, p3, p4) = (points[i1], points[i2], points[i3], points[i4]);
                    let limit = camera.pixel_footprint(&p1) * settings.alpha;
                    let close = [(p1, p2), (p1, p3), (p1, p4), (p2, p3), (p3, p4)]
                        .iter()
                        .all(|(a, b)| (a - b).norm() < limit);
                    if close {
                        triangles.push(Triangle::new(i4, i2, i1));
                        triangles.push(Triangle::new(i4, i3, i2));
                    }
                }
                y += sd;
            }
            x += sd;
        }

        let mut mesh = Mesh::from_parts_unchecked(points, triangles);
        mesh.remove_free_points();
        debug!(
            points = mesh.point_count(),
            triangles = mesh.triangle_count(),
            "mesh from depth map"
        );
        Ok(mesh)
    }
}
