//! Depth map from triangle coverage.

use densemesh_camera::{CameraModel, DepthMap, PixelGrid};
use densemesh_geom::Plane;
use densemesh_mesh::Mesh;
use rayon::prelude::*;
use tracing::debug;

use crate::coverage::TriangleCoverage;
use crate::error::VisibilityResult;
use crate::projection::{PixelSquare, RasterSettings, TriangleProjection};

/// Depth stored for pixels no triangle covers.
pub const NO_DEPTH: f32 = -1.0;

/// Distance from the camera to the farthest point where the clip polygon of
/// triangle `t` and `square` lies on the triangle's plane.
///
/// A degenerate triangle counts at its second vertex. `None` when no clip
/// point yields a plane hit.
pub(crate) fn farthest_clip_depth<C: CameraModel + ?Sized>(
    mesh: &Mesh,
    t: usize,
    projection: &TriangleProjection,
    square: &PixelSquare,
    camera: &C,
    raster: &RasterSettings,
) -> Option<f64> {
    let center = camera.center();
    let corners = mesh.triangle_points(t);
    let plane = Plane::from_triangle(&corners[0], &corners[1], &corners[2]);
    projection
        .clip_points(square)
        .iter()
        .filter_map(|p| match &plane {
            Some(plane) => {
                let dir = camera.unproject(&raster.to_native(camera, p));
                plane.intersect_line(&center, &dir).map(|hit| (center - hit).norm())
            }
            None => Some((center - corners[1]).norm()),
        })
        .reduce(f64::max)
}

/// Depth of the nearest covering surface at every pixel.
///
/// Each covering triangle contributes its farthest clipped depth over the
/// pixel; the pixel keeps the minimum of those. Pixels without a usable
/// candidate hold [`NO_DEPTH`].
pub fn depth_map_from_coverage<C: CameraModel + Sync + ?Sized>(
    mesh: &Mesh,
    coverage: &TriangleCoverage,
    camera: &C,
) -> VisibilityResult<DepthMap> {
    let (w, h) = (coverage.width(), coverage.height());
    let raster = RasterSettings {
        width: w,
        height: h,
        margin: 0,
    };
    raster.validate()?;

    let mut depth = PixelGrid::filled(w, h, NO_DEPTH);
    depth
        .as_mut_slice()
        .par_chunks_mut(h)
        .enumerate()
        .for_each(|(x, column)| {
            for (y, cell) in column.iter_mut().enumerate() {
                let tris = coverage.triangles_at(x, y);
                if tris.is_empty() {
                    continue;
                }
                let square = PixelSquare::new(x, y);
                let nearest = tris
                    .iter()
                    .filter_map(|&t| {
                        let projection = TriangleProjection::of(mesh, t, camera, &raster)?;
                        farthest_clip_depth(mesh, t, &projection, &square, camera, &raster)
                    })
                    .reduce(f64::min);
                if let Some(d) = nearest {
                    *cell = d as f32;
                }
            }
        });

    debug!(
        width = w,
        height = h,
        filled = depth.as_slice().iter().filter(|&&d| d != NO_DEPTH).count(),
        "depth map from coverage"
    );
    Ok(depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::coverage::rasterize_coverage;
    use crate::coverage::tests::quad;
    use crate::projection::tests::camera;
    use densemesh_math::Point3;

    #[test]
    fn test_flat_quad_depth() {
        let cam = camera();
        let raster = RasterSettings::native(&cam);
        let mesh = quad(-1.0, 1.0, -1.0, 1.0, 5.0);
        let coverage = rasterize_coverage(&mesh, &cam, &raster).unwrap();
        let depth = depth_map_from_coverage(&mesh, &coverage, &cam).unwrap();

        // Pixel (50, 50) spans rays up to 1/100 off axis
        let d = f64::from(*depth.get(50, 50).unwrap());
        assert!(d >= 5.0 && d < 5.01, "depth {d}");
        // Off axis the ray is longer
        let d = f64::from(*depth.get(35, 50).unwrap());
        assert_relative_eq!(d, (5.0f64.powi(2) + 0.75f64.powi(2)).sqrt(), epsilon = 0.02);
        assert_eq!(*depth.get(10, 10).unwrap(), NO_DEPTH);
        assert_eq!(*depth.get(50, 80).unwrap(), NO_DEPTH);
    }

    #[test]
    fn test_nearest_surface_wins() {
        let cam = camera();
        let raster = RasterSettings::native(&cam);
        let mut mesh = quad(-1.0, 1.0, -1.0, 1.0, 5.0);
        let back = quad(-2.0, 2.0, -2.0, 2.0, 10.0);
        mesh.merge(&back);
        let coverage = rasterize_coverage(&mesh, &cam, &raster).unwrap();
        assert_eq!(coverage.triangles_at(45, 48).len(), 2);
        let depth = depth_map_from_coverage(&mesh, &coverage, &cam).unwrap();
        assert_relative_eq!(f64::from(*depth.get(45, 48).unwrap()), 5.0, epsilon = 0.05);
    }

    #[test]
    fn test_nothing_in_view_leaves_sentinel() {
        let cam = camera();
        let raster = RasterSettings::native(&cam);
        let mesh = quad(100.0, 101.0, 0.0, 1.0, 5.0);
        let coverage = rasterize_coverage(&mesh, &cam, &raster).unwrap();
        let depth = depth_map_from_coverage(&mesh, &coverage, &cam).unwrap();
        assert!(depth.as_slice().iter().all(|&d| d == NO_DEPTH));
    }

    #[test]
    fn test_degenerate_triangle_uses_second_vertex() {
        let cam = camera();
        let raster = RasterSettings::native(&cam);
        // Collinear along the optical axis, all projecting to (50, 50)
        let mesh = Mesh::from_indexed(
            vec![
                Point3::new(0.0, 0.0, 5.0),
                Point3::new(0.0, 0.0, 8.0),
                Point3::new(0.0, 0.0, 6.0),
            ],
            &[[0, 1, 2]],
        )
        .unwrap();
        let projection = TriangleProjection::of(&mesh, 0, &cam, &raster).unwrap();
        let d = farthest_clip_depth(&mesh, 0, &projection, &PixelSquare::new(50, 50), &cam, &raster).unwrap();
        assert_relative_eq!(d, 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rays_inside_the_plane_are_skipped() {
        let cam = camera();
        let raster = RasterSettings::native(&cam);
        // Plane y = 0 contains every ray through image row 50
        let mesh = Mesh::from_indexed(
            vec![
                Point3::new(0.0, 0.0, 5.0),
                Point3::new(0.0, 0.0, 8.0),
                Point3::new(0.1, 0.0, 5.0),
            ],
            &[[0, 1, 2]],
        )
        .unwrap();
        let projection = TriangleProjection::of(&mesh, 0, &cam, &raster).unwrap();
        let d = farthest_clip_depth(&mesh, 0, &projection, &PixelSquare::new(50, 50), &cam, &raster);
        assert_eq!(d, None);
    }
}
