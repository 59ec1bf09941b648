//! Visibility over many cameras.
//!
//! Each camera only reads the mesh, so cameras are processed in parallel.

use std::sync::atomic::{AtomicUsize, Ordering};

use densemesh_camera::{CameraModel, DepthMap};
use densemesh_mesh::{invert_object_camera_lists, Mesh, ProgressSink};
use rayon::prelude::*;
use tracing::info;

use crate::coverage::{rasterize_coverage, TriangleCoverage};
use crate::depth::depth_map_from_coverage;
use crate::error::VisibilityResult;
use crate::projection::RasterSettings;
use crate::visible::{visible_triangle_ids, VisibilitySettings};

/// Everything computed for one camera.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraView {
    /// Triangles overlapping each pixel.
    pub coverage: TriangleCoverage,
    /// Nearest surface depth per pixel.
    pub depth: DepthMap,
    /// Visible triangle ids, ascending.
    pub visible: Vec<usize>,
}

/// Rasterize, build the depth map and extract the visible set for one camera.
pub fn camera_view<C: CameraModel + Sync + ?Sized>(
    mesh: &Mesh,
    camera: &C,
    raster: &RasterSettings,
    settings: &VisibilitySettings,
) -> VisibilityResult<CameraView> {
    let coverage = rasterize_coverage(mesh, camera, raster)?;
    let depth = depth_map_from_coverage(mesh, &coverage, camera)?;
    let visible = visible_triangle_ids(mesh, &coverage, &depth, camera, settings)?;
    Ok(CameraView {
        coverage,
        depth,
        visible,
    })
}

/// Visible triangle ids for every camera, each camera rasterized at its
/// native size divided by `scale`.
pub fn visible_triangles_per_camera<C: CameraModel + Sync>(
    mesh: &Mesh,
    cameras: &[C],
    scale: u32,
    settings: &VisibilitySettings,
    progress: &dyn ProgressSink,
) -> VisibilityResult<Vec<Vec<usize>>> {
    settings.validate()?;
    let done = AtomicUsize::new(0);
    let total = cameras.len();
    let per_camera = cameras
        .par_iter()
        .map(|camera| {
            let raster = RasterSettings::downscaled(camera, scale);
            let view = camera_view(mesh, camera, &raster, settings)?;
            progress.report("visibility", done.fetch_add(1, Ordering::Relaxed) + 1, total);
            Ok(view.visible)
        })
        .collect::<VisibilityResult<Vec<_>>>()?;
    info!(
        cameras = total,
        triangles = mesh.triangle_count(),
        entries = per_camera.iter().map(Vec::len).sum::<usize>(),
        "visibility per camera"
    );
    Ok(per_camera)
}

/// For every triangle, the ids (ascending) of the cameras that see it.
pub fn triangle_cameras<C: CameraModel + Sync>(
    mesh: &Mesh,
    cameras: &[C],
    scale: u32,
    settings: &VisibilitySettings,
    progress: &dyn ProgressSink,
) -> VisibilityResult<Vec<Vec<usize>>> {
    let per_camera = visible_triangles_per_camera(mesh, cameras, scale, settings, progress)?;
    Ok(invert_object_camera_lists(&per_camera, mesh.triangle_count()))
}
