//! Per-pixel triangle coverage.
//!
//! Rasterization runs in two passes over the same overlap test: the first
//! counts the triangles of every pixel, the second fills lists allocated to
//! exactly that size.

use densemesh_camera::{CameraModel, PixelGrid};
use densemesh_mesh::Mesh;
use tracing::debug;

use crate::error::{VisibilityError, VisibilityResult};
use crate::projection::{PixelBounds, PixelSquare, RasterSettings, TriangleProjection};

/// Triangle ids overlapping each pixel of a raster, in ascending id order.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleCoverage {
    grid: PixelGrid<Vec<usize>>,
}

impl TriangleCoverage {
    /// Wrap per-pixel lists.
    pub fn from_grid(grid: PixelGrid<Vec<usize>>) -> Self {
        Self { grid }
    }

    /// Raster width.
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    /// Raster height.
    pub fn height(&self) -> usize {
        self.grid.height()
    }

    /// Triangles overlapping pixel `(x, y)`; empty outside the raster.
    pub fn triangles_at(&self, x: usize, y: usize) -> &[usize] {
        self.grid.get(x, y).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Underlying raster.
    pub fn grid(&self) -> &PixelGrid<Vec<usize>> {
        &self.grid
    }

    /// Give back the raster.
    pub fn into_grid(self) -> PixelGrid<Vec<usize>> {
        self.grid
    }

    /// Length of every pixel's list.
    pub fn counts(&self) -> PixelGrid<usize> {
        let w = self.width();
        let h = self.height();
        PixelGrid::from_vec(w, h, self.grid.as_slice().iter().map(Vec::len).collect())
            .unwrap_or_else(|_| PixelGrid::filled(w, h, 0))
    }

    /// Total number of (pixel, triangle) entries.
    pub fn entry_count(&self) -> usize {
        self.grid.as_slice().iter().map(Vec::len).sum()
    }
}

/// A triangle that passed the in-image rule, ready to rasterize.
struct Candidate {
    id: usize,
    projection: TriangleProjection,
    bounds: PixelBounds,
}

impl Candidate {
    fn covered_pixels(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.bounds
            .pixels()
            .filter(|&(x, y)| self.projection.overlaps(&PixelSquare::new(x, y)))
    }
}

fn candidates<C, I>(mesh: &Mesh, ids: I, camera: &C, raster: &RasterSettings) -> Vec<Candidate>
where
    C: CameraModel + ?Sized,
    I: IntoIterator<Item = usize>,
{
    ids.into_iter()
        .filter(|&t| mesh.triangle(t).alive)
        .filter_map(|t| {
            let projection = TriangleProjection::of(mesh, t, camera, raster)?;
            if !projection.is_in_image(raster) {
                return None;
            }
            let bounds = projection.pixel_bounds(raster)?;
            Some(Candidate {
                id: t,
                projection,
                bounds,
            })
        })
        .collect()
}

fn check_ids(mesh: &Mesh, ids: &[usize]) -> VisibilityResult<()> {
    let n = mesh.triangle_count();
    match ids.iter().find(|&&t| t >= n) {
        Some(&t) => Err(VisibilityError::TriangleOutOfRange {
            triangle: t,
            triangle_count: n,
        }),
        None => Ok(()),
    }
}

fn count_pass(candidates: &[Candidate], raster: &RasterSettings) -> PixelGrid<usize> {
    let mut counts = PixelGrid::filled(raster.width, raster.height, 0usize);
    for c in candidates {
        for (x, y) in c.covered_pixels() {
            if let Some(n) = counts.get_mut(x, y) {
                *n += 1;
            }
        }
    }
    counts
}

fn rasterize(candidates: &[Candidate], raster: &RasterSettings) -> VisibilityResult<TriangleCoverage> {
    let counts = count_pass(candidates, raster);
    let lists = counts.as_slice().iter().map(|&n| Vec::with_capacity(n)).collect();
    let mut grid = PixelGrid::from_vec(raster.width, raster.height, lists)?;
    for c in candidates {
        for (x, y) in c.covered_pixels() {
            if let Some(list) = grid.get_mut(x, y) {
                list.push(c.id);
            }
        }
    }
    let coverage = TriangleCoverage::from_grid(grid);
    debug!(
        width = raster.width,
        height = raster.height,
        triangles = candidates.len(),
        entries = coverage.entry_count(),
        "rasterized coverage"
    );
    Ok(coverage)
}

/// Per-pixel counts of the triangles `rasterize_coverage` would list.
pub fn coverage_counts<C: CameraModel + ?Sized>(
    mesh: &Mesh,
    camera: &C,
    raster: &RasterSettings,
) -> VisibilityResult<PixelGrid<usize>> {
    raster.validate()?;
    let cands = candidates(mesh, 0..mesh.triangle_count(), camera, raster);
    Ok(count_pass(&cands, raster))
}

/// Rasterize every live triangle of `mesh` seen by `camera`.
///
/// Triangles with a vertex outside the raster (widened by `margin`) or at a
/// non-finite projection are skipped whole.
pub fn rasterize_coverage<C: CameraModel + ?Sized>(
    mesh: &Mesh,
    camera: &C,
    raster: &RasterSettings,
) -> VisibilityResult<TriangleCoverage> {
    raster.validate()?;
    let cands = candidates(mesh, 0..mesh.triangle_count(), camera, raster);
    rasterize(&cands, raster)
}

/// Like [`rasterize_coverage`], restricted to the triangles in `ids`.
pub fn rasterize_coverage_subset<C: CameraModel + ?Sized>(
    mesh: &Mesh,
    ids: &[usize],
    camera: &C,
    raster: &RasterSettings,
) -> VisibilityResult<TriangleCoverage> {
    raster.validate()?;
    check_ids(mesh, ids)?;
    let cands = candidates(mesh, ids.iter().copied(), camera, raster);
    rasterize(&cands, raster)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::projection::tests::camera;
    use densemesh_math::Point3;

    /// Quad `[x0, x1] x [y0, y1]` at depth `z`, two triangles.
    pub(crate) fn quad(x0: f64, x1: f64, y0: f64, y1: f64, z: f64) -> Mesh {
        Mesh::from_indexed(
            vec![
                Point3::new(x0, y0, z),
                Point3::new(x1, y0, z),
                Point3::new(x1, y1, z),
                Point3::new(x0, y1, z),
            ],
            &[[0, 1, 2], [0, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn test_counts_match_list_lengths() {
        let cam = camera();
        let raster = RasterSettings::native(&cam);
        // Projects to pixels [40, 50] x [40, 50]
        let mesh = quad(-0.5, 0.0, -0.5, 0.0, 5.0);
        let counts = coverage_counts(&mesh, &cam, &raster).unwrap();
        let coverage = rasterize_coverage(&mesh, &cam, &raster).unwrap();
        assert_eq!(counts, coverage.counts());
        for (x, y, list) in coverage.grid().iter_cells() {
            assert_eq!(*counts.get(x, y).unwrap(), list.len());
        }
        assert!(coverage.entry_count() > 0);
    }

    #[test]
    fn test_covered_region() {
        let cam = camera();
        let raster = RasterSettings::native(&cam);
        let mesh = quad(-0.5, 0.0, -0.5, 0.0, 5.0);
        let coverage = rasterize_coverage(&mesh, &cam, &raster).unwrap();
        for x in 41..49 {
            for y in 41..49 {
                assert!(!coverage.triangles_at(x, y).is_empty(), "pixel ({x}, {y})");
            }
        }
        // Both halves meet on the diagonal
        assert_eq!(coverage.triangles_at(45, 45), &[0, 1]);
        assert_eq!(coverage.triangles_at(48, 42), &[0]);
        assert_eq!(coverage.triangles_at(42, 48), &[1]);
        assert!(coverage.triangles_at(30, 30).is_empty());
        assert!(coverage.triangles_at(55, 45).is_empty());
    }

    #[test]
    fn test_out_of_image_triangles_are_skipped() {
        let cam = camera();
        let raster = RasterSettings::native(&cam);
        // x from 30 to 150 in pixels
        let mesh = quad(-1.0, 5.0, -0.5, 0.0, 5.0);
        let coverage = rasterize_coverage(&mesh, &cam, &raster).unwrap();
        assert_eq!(coverage.entry_count(), 0);

        let wide = RasterSettings { margin: 60, ..raster };
        let coverage = rasterize_coverage(&mesh, &cam, &wide).unwrap();
        assert!(!coverage.triangles_at(99, 45).is_empty());
    }

    #[test]
    fn test_dead_triangles_are_skipped() {
        let cam = camera();
        let mut mesh = quad(-0.5, 0.0, -0.5, 0.0, 5.0);
        mesh.set_alive(1, false).unwrap();
        let coverage = rasterize_coverage(&mesh, &cam, &RasterSettings::native(&cam)).unwrap();
        assert_eq!(coverage.triangles_at(45, 45), &[0]);
        assert!(coverage.triangles_at(42, 48).is_empty());
    }

    #[test]
    fn test_subset() {
        let cam = camera();
        let raster = RasterSettings::native(&cam);
        let mesh = quad(-0.5, 0.0, -0.5, 0.0, 5.0);
        let coverage = rasterize_coverage_subset(&mesh, &[1], &cam, &raster).unwrap();
        assert_eq!(coverage.triangles_at(45, 45), &[1]);
        assert!(coverage.triangles_at(48, 42).is_empty());
        assert!(matches!(
            rasterize_coverage_subset(&mesh, &[2], &cam, &raster),
            Err(VisibilityError::TriangleOutOfRange { triangle: 2, .. })
        ));
    }

    #[test]
    fn test_downscaled_raster() {
        let cam = camera();
        let raster = RasterSettings::downscaled(&cam, 2);
        let mesh = quad(-0.5, 0.0, -0.5, 0.0, 5.0);
        let coverage = rasterize_coverage(&mesh, &cam, &raster).unwrap();
        assert_eq!((coverage.width(), coverage.height()), (50, 50));
        assert!(!coverage.triangles_at(22, 22).is_empty());
        assert!(coverage.triangles_at(10, 10).is_empty());
    }

    #[test]
    fn test_empty_raster_is_rejected() {
        let cam = camera();
        let raster = RasterSettings {
            width: 0,
            height: 10,
            margin: 0,
        };
        assert!(rasterize_coverage(&quad(0.0, 1.0, 0.0, 1.0, 5.0), &cam, &raster).is_err());
    }
}
