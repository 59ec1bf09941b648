//! Visible-triangle sets against a depth map.

use densemesh_camera::{CameraModel, DepthMap};
use densemesh_math::Point2;
use densemesh_mesh::Mesh;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coverage::TriangleCoverage;
use crate::error::{VisibilityError, VisibilityResult};
use crate::projection::{PixelSquare, RasterSettings, TriangleProjection};

/// Tolerances of the visibility tests, in pixel footprints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilitySettings {
    /// Depth agreement required by [`visible_triangle_ids`].
    pub depth_tolerance_factor: f64,
    /// Depth agreement required by [`visible_triangles_by_centroid`].
    pub centroid_tolerance_factor: f64,
}

impl Default for VisibilitySettings {
    fn default() -> Self {
        Self {
            depth_tolerance_factor: 2.0,
            centroid_tolerance_factor: 6.0,
        }
    }
}

impl VisibilitySettings {
    /// Check the settings are usable.
    pub fn validate(&self) -> VisibilityResult<()> {
        for (name, v) in [
            ("depth_tolerance_factor", self.depth_tolerance_factor),
            ("centroid_tolerance_factor", self.centroid_tolerance_factor),
        ] {
            if !(v.is_finite() && v > 0.0) {
                return Err(VisibilityError::InvalidSettings(format!("{name} must be positive, got {v}")));
            }
        }
        Ok(())
    }
}

fn check_same_raster(coverage: &TriangleCoverage, depth: &DepthMap) -> VisibilityResult<()> {
    if coverage.width() != depth.width() || coverage.height() != depth.height() {
        return Err(VisibilityError::RasterMismatch {
            what: "depth map",
            expected_width: coverage.width(),
            expected_height: coverage.height(),
            found_width: depth.width(),
            found_height: depth.height(),
        });
    }
    Ok(())
}

/// Whether triangle `t` is the surface recorded at pixel `(x, y)`.
fn matches_depth<C: CameraModel + ?Sized>(
    mesh: &Mesh,
    t: usize,
    (x, y): (usize, usize),
    depth: f32,
    camera: &C,
    raster: &RasterSettings,
    factor: f64,
) -> bool {
    let Some(projection) = TriangleProjection::of(mesh, t, camera, raster) else {
        return false;
    };
    let Some(inner) = projection.interior_point(&PixelSquare::new(x, y)) else {
        return false;
    };
    let Some(plane) = mesh.triangle_plane(t) else {
        return false;
    };
    let center = camera.center();
    let dir = camera.unproject(&raster.to_native(camera, &inner));
    let Some(hit) = plane.intersect_line(&center, &dir) else {
        return false;
    };
    let hit_depth = (center - hit).norm();
    (f64::from(depth) - hit_depth).abs() < camera.pixel_footprint(&hit) * factor
}

/// Ids, ascending, of the triangles that are the recorded surface at one or
/// more of the pixels they cover.
///
/// At each covering pixel the triangle's plane is hit along the ray through
/// a point shared by the triangle and the pixel; the triangle is visible when
/// that depth is within `depth_tolerance_factor` pixel footprints of the
/// depth map.
pub fn visible_triangle_ids<C: CameraModel + ?Sized>(
    mesh: &Mesh,
    coverage: &TriangleCoverage,
    depth: &DepthMap,
    camera: &C,
    settings: &VisibilitySettings,
) -> VisibilityResult<Vec<usize>> {
    settings.validate()?;
    check_same_raster(coverage, depth)?;
    let raster = RasterSettings {
        width: coverage.width(),
        height: coverage.height(),
        margin: 0,
    };
    raster.validate()?;

    let mut visible = vec![false; mesh.triangle_count()];
    for (x, y, tris) in coverage.grid().iter_cells() {
        let d = depth.as_slice()[depth.index(x, y)];
        for &t in tris {
            let Some(flag) = visible.get_mut(t) else {
                return Err(VisibilityError::TriangleOutOfRange {
                    triangle: t,
                    triangle_count: mesh.triangle_count(),
                });
            };
            if !*flag && matches_depth(mesh, t, (x, y), d, camera, &raster, settings.depth_tolerance_factor) {
                *flag = true;
            }
        }
    }

    let ids: Vec<usize> = visible
        .iter()
        .enumerate()
        .filter_map(|(t, &v)| v.then_some(t))
        .collect();
    debug!(visible = ids.len(), triangles = mesh.triangle_count(), "visible triangles");
    Ok(ids)
}

/// Ids, ascending, of the live triangles whose center of gravity agrees with
/// the depth map within `centroid_tolerance_factor` pixel footprints.
///
/// The centroid must project at least one native pixel inside the image
/// border. `depth` may be a downscaled raster of the camera image.
pub fn visible_triangles_by_centroid<C: CameraModel + ?Sized>(
    mesh: &Mesh,
    depth: &DepthMap,
    camera: &C,
    settings: &VisibilitySettings,
) -> VisibilityResult<Vec<usize>> {
    settings.validate()?;
    let raster = RasterSettings {
        width: depth.width(),
        height: depth.height(),
        margin: 0,
    };
    raster.validate()?;
    let (ow, oh) = (f64::from(camera.width()), f64::from(camera.height()));
    let center = camera.center();

    let ids: Vec<usize> = (0..mesh.triangle_count())
        .filter(|&t| mesh.triangle(t).alive)
        .filter(|&t| {
            let cg = mesh.triangle_center_of_gravity(t);
            let p = camera.project(&cg);
            let pix = Point2::new(p.x.floor(), p.y.floor());
            // One native pixel of border on every side
            if !(pix.x >= 1.0 && pix.x < ow - 1.0 && pix.y >= 1.0 && pix.y < oh - 1.0) {
                return false;
            }
            let cell = raster.to_raster(camera, &pix);
            let Some(&d) = depth.get(cell.x as usize, cell.y as usize) else {
                return false;
            };
            let tolerance = camera.pixel_footprint(&cg) * settings.centroid_tolerance_factor;
            (f64::from(d) - (center - cg).norm()).abs() < tolerance
        })
        .collect();
    debug!(visible = ids.len(), triangles = mesh.triangle_count(), "visible triangles by centroid");
    Ok(ids)
}
