//! Triangle projection into a (possibly downscaled) camera raster.
//!
//! Points are projected at the camera's native resolution and then scaled
//! to the raster, so `x_raster = x_native / native_width * width`. Pixel
//! `(x, y)` is the cell `[x, x + 1] x [y, y + 1]` of raster coordinates.

use densemesh_camera::CameraModel;
use densemesh_geom::{point_in_triangle_2d, segments_intersect_2d, triangles_overlap_2d};
use densemesh_math::{Point2, Point3};
use densemesh_mesh::Mesh;
use serde::{Deserialize, Serialize};

use crate::error::{VisibilityError, VisibilityResult};

/// Raster a camera view is projected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterSettings {
    /// Raster width in pixels.
    pub width: usize,
    /// Raster height in pixels.
    pub height: usize,
    /// Extra pixels around the raster a projected vertex may fall into.
    pub margin: usize,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            margin: 0,
        }
    }
}

impl RasterSettings {
    /// Raster at the camera's native resolution.
    pub fn native<C: CameraModel + ?Sized>(camera: &C) -> Self {
        Self::downscaled(camera, 1)
    }

    /// Raster of the camera image divided by `scale` (0 counts as 1).
    pub fn downscaled<C: CameraModel + ?Sized>(camera: &C, scale: u32) -> Self {
        let scale = scale.max(1);
        Self {
            width: (camera.width() / scale) as usize,
            height: (camera.height() / scale) as usize,
            margin: 0,
        }
    }

    /// Check the settings are usable.
    pub fn validate(&self) -> VisibilityResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(VisibilityError::InvalidSettings(format!(
                "raster must not be empty, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Native camera coordinates to raster coordinates.
    pub fn to_raster<C: CameraModel + ?Sized>(&self, camera: &C, p: &Point2) -> Point2 {
        Point2::new(
            p.x / f64::from(camera.width()) * self.width as f64,
            p.y / f64::from(camera.height()) * self.height as f64,
        )
    }

    /// Raster coordinates back to native camera coordinates.
    pub fn to_native<C: CameraModel + ?Sized>(&self, camera: &C, p: &Point2) -> Point2 {
        Point2::new(
            p.x / self.width as f64 * f64::from(camera.width()),
            p.y / self.height as f64 * f64::from(camera.height()),
        )
    }

    /// Strict in-image rule widened by `margin`.
    fn accepts(&self, pixel: [i64; 2]) -> bool {
        let m = self.margin as i64;
        pixel[0] > -m && pixel[0] < self.width as i64 + m && pixel[1] > -m && pixel[1] < self.height as i64 + m
    }
}

/// The unit cell of raster pixel `(x, y)`, split into two triangles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSquare {
    /// Corners in order `(x, y)`, `(x+1, y)`, `(x+1, y+1)`, `(x, y+1)`.
    pub corners: [Point2; 4],
}

impl PixelSquare {
    /// Cell of pixel `(x, y)`.
    pub fn new(x: usize, y: usize) -> Self {
        let (x, y) = (x as f64, y as f64);
        Self {
            corners: [
                Point2::new(x, y),
                Point2::new(x + 1.0, y),
                Point2::new(x + 1.0, y + 1.0),
                Point2::new(x, y + 1.0),
            ],
        }
    }

    /// The two triangles `(P0, P1, P2)` and `(P2, P3, P0)`.
    pub fn halves(&self) -> [[Point2; 3]; 2] {
        let [p0, p1, p2, p3] = self.corners;
        [[p0, p1, p2], [p2, p3, p0]]
    }

    /// Whether `p` lies inside or on the cell.
    pub fn contains(&self, p: &Point2) -> bool {
        self.halves()
            .iter()
            .any(|[a, b, c]| point_in_triangle_2d(p, a, b, c))
    }

    fn edges(&self) -> [(Point2, Point2); 4] {
        let c = self.corners;
        [(c[0], c[1]), (c[1], c[2]), (c[2], c[3]), (c[3], c[0])]
    }
}

/// Inclusive pixel rectangle, already clamped to the raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    /// Top-left pixel.
    pub min: [usize; 2],
    /// Bottom-right pixel, inclusive.
    pub max: [usize; 2],
}

impl PixelBounds {
    /// Every pixel in the rectangle, column by column.
    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.min[0]..=self.max[0]).flat_map(move |x| (self.min[1]..=self.max[1]).map(move |y| (x, y)))
    }
}

/// A triangle projected into a raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleProjection {
    /// Vertex positions in raster coordinates.
    pub points: [Point2; 3],
    /// Pixels holding each vertex (floor of `points`).
    pub pixels: [[i64; 2]; 3],
}

impl TriangleProjection {
    /// Project three world points. `None` if any lands at a non-finite pixel.
    pub fn new<C: CameraModel + ?Sized>(camera: &C, raster: &RasterSettings, corners: &[Point3; 3]) -> Option<Self> {
        let mut points = [Point2::origin(); 3];
        let mut pixels = [[0i64; 2]; 3];
        for ((pt, pix), c) in points.iter_mut().zip(pixels.iter_mut()).zip(corners) {
            let p = raster.to_raster(camera, &camera.project(c));
            if !(p.x.is_finite() && p.y.is_finite()) {
                return None;
            }
            *pt = p;
            *pix = [p.x.floor() as i64, p.y.floor() as i64];
        }
        Some(Self { points, pixels })
    }

    /// Project triangle `t` of `mesh`.
    pub fn of<C: CameraModel + ?Sized>(mesh: &Mesh, t: usize, camera: &C, raster: &RasterSettings) -> Option<Self> {
        Self::new(camera, raster, &mesh.triangle_points(t))
    }

    /// Whether every vertex pixel passes the raster's in-image rule.
    pub fn is_in_image(&self, raster: &RasterSettings) -> bool {
        self.pixels.iter().all(|&p| raster.accepts(p))
    }

    /// Bounding rectangle of the vertex pixels, clamped to the raster.
    pub fn pixel_bounds(&self, raster: &RasterSettings) -> Option<PixelBounds> {
        if raster.width == 0 || raster.height == 0 {
            return None;
        }
        let lo = |axis: usize| self.pixels.iter().map(|p| p[axis]).min().unwrap_or(0);
        let hi = |axis: usize| self.pixels.iter().map(|p| p[axis]).max().unwrap_or(0);
        let limit = [raster.width as i64 - 1, raster.height as i64 - 1];
        let mut min = [0usize; 2];
        let mut max = [0usize; 2];
        for axis in 0..2 {
            let (a, b) = (lo(axis).max(0), hi(axis).min(limit[axis]));
            if a > b {
                return None;
            }
            min[axis] = a as usize;
            max[axis] = b as usize;
        }
        Some(PixelBounds { min, max })
    }

    /// 2D overlap between the projected triangle and a pixel cell.
    pub fn overlaps(&self, square: &PixelSquare) -> bool {
        square.halves().iter().any(|half| triangles_overlap_2d(&self.points, half))
            || self.points.iter().any(|p| square.contains(p))
    }

    fn contains(&self, p: &Point2) -> bool {
        let [a, b, c] = &self.points;
        point_in_triangle_2d(p, a, b, c)
    }

    fn edges(&self) -> [(Point2, Point2); 3] {
        let p = self.points;
        [(p[0], p[1]), (p[1], p[2]), (p[2], p[0])]
    }

    /// Corners of the clip polygon between the triangle and a pixel cell:
    /// cell corners inside the triangle, triangle vertices inside the cell
    /// and every edge crossing. Duplicates are kept.
    pub fn clip_points(&self, square: &PixelSquare) -> Vec<Point2> {
        let mut out: Vec<Point2> = square.corners.iter().filter(|c| self.contains(c)).copied().collect();
        out.extend(self.points.iter().filter(|p| square.contains(p)));
        for (a1, a2) in self.edges() {
            for (b1, b2) in square.edges() {
                if let Some(p) = segments_intersect_2d(&a1, &a2, &b1, &b2) {
                    out.push(p);
                }
            }
        }
        out
    }

    /// A point shared by the triangle and the cell: the first vertex inside
    /// the cell, else the first cell corner inside the triangle.
    pub fn interior_point(&self, square: &PixelSquare) -> Option<Point2> {
        self.points
            .iter()
            .find(|p| square.contains(p))
            .or_else(|| square.corners.iter().find(|c| self.contains(c)))
            .copied()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use densemesh_camera::PinholeCamera;
    use densemesh_math::Vec3;

    /// 100x100 camera at the origin looking down +z, focal 100.
    pub(crate) fn camera() -> PinholeCamera {
        PinholeCamera::look_at(
            Point3::origin(),
            &Point3::new(0.0, 0.0, 1.0),
            &Vec3::new(0.0, -1.0, 0.0),
            100,
            100,
            100.0,
        )
        .unwrap()
    }

    fn flat(points: [(f64, f64); 3]) -> TriangleProjection {
        let pts = points.map(|(x, y)| Point2::new(x, y));
        TriangleProjection {
            points: pts,
            pixels: pts.map(|p| [p.x.floor() as i64, p.y.floor() as i64]),
        }
    }

    #[test]
    fn test_projection_scales_to_raster() {
        let cam = camera();
        let raster = RasterSettings::downscaled(&cam, 2);
        assert_eq!((raster.width, raster.height), (50, 50));
        let proj = TriangleProjection::new(
            &cam,
            &raster,
            &[
                Point3::new(0.0, 0.0, 5.0),
                Point3::new(1.0, 0.0, 5.0),
                Point3::new(0.0, 1.0, 5.0),
            ],
        )
        .unwrap();
        // Native (50, 50), (70, 50), (50, 70)
        assert!((proj.points[0] - Point2::new(25.0, 25.0)).norm() < 1e-9);
        assert!((proj.points[1] - Point2::new(35.0, 25.0)).norm() < 1e-9);
        assert_eq!(proj.pixels[0], [25, 25]);
        let native = raster.to_native(&cam, &proj.points[1]);
        assert!((native - Point2::new(70.0, 50.0)).norm() < 1e-9);
    }

    #[test]
    fn test_camera_plane_vertex_is_rejected() {
        let cam = camera();
        let raster = RasterSettings::native(&cam);
        let corners = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 5.0),
            Point3::new(0.0, 1.0, 5.0),
        ];
        assert!(TriangleProjection::new(&cam, &raster, &corners).is_none());
    }

    #[test]
    fn test_in_image_rule_is_strict() {
        let raster = RasterSettings {
            width: 10,
            height: 10,
            margin: 0,
        };
        assert!(flat([(1.0, 1.0), (5.0, 1.0), (1.0, 5.0)]).is_in_image(&raster));
        assert!(!flat([(0.5, 1.0), (5.0, 1.0), (1.0, 5.0)]).is_in_image(&raster));
        assert!(!flat([(1.0, 1.0), (10.0, 1.0), (1.0, 5.0)]).is_in_image(&raster));

        let wide = RasterSettings { margin: 2, ..raster };
        assert!(flat([(-0.5, 1.0), (11.0, 1.0), (1.0, 5.0)]).is_in_image(&wide));
        assert!(!flat([(-1.5, 1.0), (5.0, 1.0), (1.0, 5.0)]).is_in_image(&wide));
    }

    #[test]
    fn test_bounds_are_clamped() {
        let raster = RasterSettings {
            width: 10,
            height: 8,
            margin: 3,
        };
        let b = flat([(-2.0, 1.5), (11.5, 2.0), (3.0, 9.5)]).pixel_bounds(&raster).unwrap();
        assert_eq!(b.min, [0, 1]);
        assert_eq!(b.max, [9, 7]);
        assert_eq!(b.pixels().count(), 10 * 7);
        assert!(flat([(-3.0, -2.5), (-2.0, -2.0), (-2.5, -1.5)]).pixel_bounds(&raster).is_none());
    }

    #[test]
    fn test_overlap() {
        let tri = flat([(2.2, 2.2), (8.0, 2.2), (2.2, 8.0)]);
        assert!(tri.overlaps(&PixelSquare::new(3, 3)));
        // Vertex strictly inside the cell
        assert!(tri.overlaps(&PixelSquare::new(2, 2)));
        // Below the hypotenuse x + y = 10.2
        assert!(tri.overlaps(&PixelSquare::new(4, 5)));
        assert!(!tri.overlaps(&PixelSquare::new(6, 6)));
        assert!(!tri.overlaps(&PixelSquare::new(0, 0)));
    }

    #[test]
    fn test_clip_points_of_enclosed_cell() {
        let tri = flat([(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]);
        let pts = tri.clip_points(&PixelSquare::new(2, 2));
        assert_eq!(pts.len(), 4);
        assert_eq!(tri.interior_point(&PixelSquare::new(2, 2)), Some(Point2::new(2.0, 2.0)));
    }

    #[test]
    fn test_clip_points_of_enclosed_triangle() {
        let tri = flat([(3.2, 3.2), (3.8, 3.2), (3.2, 3.8)]);
        let cell = PixelSquare::new(3, 3);
        assert_eq!(tri.clip_points(&cell), tri.points.to_vec());
        assert_eq!(tri.interior_point(&cell), Some(tri.points[0]));
        assert_eq!(tri.interior_point(&PixelSquare::new(5, 5)), None);
    }

    #[test]
    fn test_clip_points_of_crossing_edge() {
        // Hypotenuse x + y = 7 cuts cell (3, 3) corner-to-corner
        let tri = flat([(0.0, 0.0), (7.0, 0.0), (0.0, 7.0)]);
        let pts = tri.clip_points(&PixelSquare::new(3, 3));
        assert!(pts.iter().all(|p| p.x + p.y <= 7.0 + 1e-9));
        assert!(pts.contains(&Point2::new(3.0, 3.0)));
        assert!(pts.iter().any(|p| (p - Point2::new(4.0, 3.0)).norm() < 1e-9));
    }
}
