//! Per-camera side files.
//!
//! All values are little-endian. Rasters are stored column-major, pixel
//! `(x, y)` at position `x * height + y`.
//!
//! - depth map: `i32 width`, `i32 height`, `width * height` `f32` values
//! - coverage: `i32 width`, `i32 height`, then per pixel `i32 len` and
//!   `len` `i32` triangle ids
//! - visible ids: `i32 n`, then `n` `i32` triangle ids

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use densemesh_camera::{DepthMap, PixelGrid};
use densemesh_mesh::io::{read_count, read_f32, write_count};
use tracing::debug;

use crate::coverage::TriangleCoverage;
use crate::error::VisibilityResult;
use crate::views::CameraView;

fn write_ids<W: Write>(writer: &mut W, ids: &[usize]) -> VisibilityResult<()> {
    write_count(writer, ids.len(), "list length")?;
    for &id in ids {
        write_count(writer, id, "triangle id")?;
    }
    Ok(())
}

fn read_ids<R: Read>(reader: &mut R) -> VisibilityResult<Vec<usize>> {
    let n = read_count(reader, "list length")?;
    let mut ids = Vec::with_capacity(n.min(1 << 20));
    for _ in 0..n {
        ids.push(read_count(reader, "triangle id")?);
    }
    Ok(ids)
}

fn write_size<W: Write>(writer: &mut W, width: usize, height: usize) -> VisibilityResult<()> {
    write_count(writer, width, "raster width")?;
    write_count(writer, height, "raster height")?;
    Ok(())
}

fn read_size<R: Read>(reader: &mut R) -> VisibilityResult<(usize, usize)> {
    let w = read_count(reader, "raster width")?;
    let h = read_count(reader, "raster height")?;
    Ok((w, h))
}

/// Write a depth map.
pub fn write_depth_map<W: Write>(writer: &mut W, depth: &DepthMap) -> VisibilityResult<()> {
    write_size(writer, depth.width(), depth.height())?;
    for d in depth.as_slice() {
        writer.write_all(&d.to_le_bytes())?;
    }
    Ok(())
}

/// Read a depth map.
pub fn read_depth_map<R: Read>(reader: &mut R) -> VisibilityResult<DepthMap> {
    let (w, h) = read_size(reader)?;
    let mut data = Vec::with_capacity((w * h).min(1 << 24));
    for _ in 0..w * h {
        data.push(read_f32(reader)?);
    }
    Ok(PixelGrid::from_vec(w, h, data)?)
}

/// Write per-pixel triangle lists.
pub fn write_coverage<W: Write>(writer: &mut W, coverage: &TriangleCoverage) -> VisibilityResult<()> {
    write_size(writer, coverage.width(), coverage.height())?;
    for ids in coverage.grid().as_slice() {
        write_ids(writer, ids)?;
    }
    Ok(())
}

/// Read per-pixel triangle lists.
pub fn read_coverage<R: Read>(reader: &mut R) -> VisibilityResult<TriangleCoverage> {
    let (w, h) = read_size(reader)?;
    let mut lists = Vec::with_capacity((w * h).min(1 << 24));
    for _ in 0..w * h {
        lists.push(read_ids(reader)?);
    }
    Ok(TriangleCoverage::from_grid(PixelGrid::from_vec(w, h, lists)?))
}

/// Write a visible-triangle list.
pub fn write_visible_ids<W: Write>(writer: &mut W, ids: &[usize]) -> VisibilityResult<()> {
    write_ids(writer, ids)
}

/// Read a visible-triangle list.
pub fn read_visible_ids<R: Read>(reader: &mut R) -> VisibilityResult<Vec<usize>> {
    read_ids(reader)
}

/// A working directory holding side files named after camera ids.
#[derive(Debug, Clone)]
pub struct SideFiles {
    dir: PathBuf,
}

impl SideFiles {
    /// Side files under `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Working directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `depthMap_<camera>.bin`
    pub fn depth_map_path(&self, camera: usize) -> PathBuf {
        self.dir.join(format!("depthMap_{camera}.bin"))
    }

    /// `trisMap_<camera>.bin`
    pub fn coverage_path(&self, camera: usize) -> PathBuf {
        self.dir.join(format!("trisMap_{camera}.bin"))
    }

    /// `visTris_<camera>.bin`
    pub fn visible_ids_path(&self, camera: usize) -> PathBuf {
        self.dir.join(format!("visTris_{camera}.bin"))
    }

    /// Write the three side files of `camera`.
    pub fn save_view(&self, camera: usize, view: &CameraView) -> VisibilityResult<()> {
        save_with(&self.depth_map_path(camera), |w| write_depth_map(w, &view.depth))?;
        save_with(&self.coverage_path(camera), |w| write_coverage(w, &view.coverage))?;
        save_with(&self.visible_ids_path(camera), |w| write_visible_ids(w, &view.visible))?;
        debug!(camera, dir = %self.dir.display(), "saved side files");
        Ok(())
    }

    /// Read the three side files of `camera`.
    pub fn load_view(&self, camera: usize) -> VisibilityResult<CameraView> {
        Ok(CameraView {
            coverage: self.load_coverage(camera)?,
            depth: self.load_depth_map(camera)?,
            visible: self.load_visible_ids(camera)?,
        })
    }

    /// Read the depth map of `camera`.
    pub fn load_depth_map(&self, camera: usize) -> VisibilityResult<DepthMap> {
        read_depth_map(&mut BufReader::new(File::open(self.depth_map_path(camera))?))
    }

    /// Read the coverage of `camera`.
    pub fn load_coverage(&self, camera: usize) -> VisibilityResult<TriangleCoverage> {
        read_coverage(&mut BufReader::new(File::open(self.coverage_path(camera))?))
    }

    /// Read the visible ids of `camera`.
    pub fn load_visible_ids(&self, camera: usize) -> VisibilityResult<Vec<usize>> {
        read_visible_ids(&mut BufReader::new(File::open(self.visible_ids_path(camera))?))
    }
}

fn save_with<F>(path: &Path, write: F) -> VisibilityResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> VisibilityResult<()>,
{
    let mut w = BufWriter::new(File::create(path)?);
    write(&mut w)?;
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VisibilityError;
    use densemesh_mesh::MeshError;
    use std::io::Cursor;

    #[test]
    fn test_depth_map_layout() {
        let mut depth = DepthMap::filled(2, 3, -1.0);
        *depth.get_mut(1, 0).unwrap() = 4.5;
        let mut buf = Vec::new();
        write_depth_map(&mut buf, &depth).unwrap();
        assert_eq!(buf.len(), 8 + 6 * 4);
        assert_eq!(&buf[0..4], &2i32.to_le_bytes());
        assert_eq!(&buf[4..8], &3i32.to_le_bytes());
        // Pixel (1, 0) is value 3
        assert_eq!(&buf[20..24], &4.5f32.to_le_bytes());
        assert_eq!(read_depth_map(&mut Cursor::new(buf)).unwrap(), depth);
    }

    #[test]
    fn test_coverage_layout() {
        let mut grid = PixelGrid::filled(2, 1, Vec::new());
        *grid.get_mut(1, 0).unwrap() = vec![3, 7];
        let coverage = TriangleCoverage::from_grid(grid);
        let mut buf = Vec::new();
        write_coverage(&mut buf, &coverage).unwrap();
        let words: Vec<i32> = buf
            .chunks(4)
            .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(words, vec![2, 1, 0, 2, 3, 7]);
        assert_eq!(read_coverage(&mut Cursor::new(buf)).unwrap(), coverage);
    }

    #[test]
    fn test_visible_ids() {
        let mut buf = Vec::new();
        write_visible_ids(&mut buf, &[0, 4, 9]).unwrap();
        assert_eq!(buf.len(), 16);
        assert_eq!(read_visible_ids(&mut Cursor::new(buf)).unwrap(), vec![0, 4, 9]);
    }

    #[test]
    fn test_bad_records() {
        let buf = (-2i32).to_le_bytes().to_vec();
        assert!(matches!(
            read_visible_ids(&mut Cursor::new(buf)),
            Err(VisibilityError::Mesh(MeshError::InvalidRecord(_)))
        ));
        let mut buf = Vec::new();
        write_depth_map(&mut buf, &DepthMap::filled(2, 2, 1.0)).unwrap();
        buf.truncate(buf.len() - 1);
        assert!(read_depth_map(&mut Cursor::new(buf)).is_err());
    }

    #[test]
    fn test_side_file_directory() {
        let dir = std::env::temp_dir().join(format!("densemesh_side_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let files = SideFiles::new(&dir);
        assert!(files.depth_map_path(3).ends_with("depthMap_3.bin"));
        assert!(files.coverage_path(3).ends_with("trisMap_3.bin"));
        assert!(files.visible_ids_path(3).ends_with("visTris_3.bin"));

        let mut grid = PixelGrid::filled(2, 2, Vec::new());
        *grid.get_mut(0, 1).unwrap() = vec![1];
        let view = CameraView {
            coverage: TriangleCoverage::from_grid(grid),
            depth: DepthMap::filled(2, 2, 2.5),
            visible: vec![1],
        };
        files.save_view(3, &view).unwrap();
        let back = files.load_view(3).unwrap();
        std::fs::remove_dir_all(&dir).ok();
        assert_eq!(back, view);
        assert!(files.load_depth_map(4).is_err());
    }
}
