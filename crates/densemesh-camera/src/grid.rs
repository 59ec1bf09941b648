//! Column-major image rasters.
//!
//! Cell `(x, y)` lives at index `x * height + y`, the layout shared by depth
//! maps, coverage lists and their side files.

use crate::error::{CameraError, CameraResult};

/// A `width x height` raster of `T`, addressed column-major.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

/// Per-pixel depth along the viewing ray; `-1` marks empty pixels.
pub type DepthMap = PixelGrid<f32>;

impl<T: Clone> PixelGrid<T> {
    /// Raster with every cell set to `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }
}

impl<T> PixelGrid<T> {
    /// Wrap existing column-major data.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> CameraResult<Self> {
        if data.len() != width * height {
            return Err(CameraError::GridSizeMismatch {
                expected: width * height,
                found: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Flat index of `(x, y)`.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        x * self.height + y
    }

    /// Cell at `(x, y)`, `None` outside the raster.
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x < self.width && y < self.height {
            self.data.get(self.index(x, y))
        } else {
            None
        }
    }

    /// Mutable cell at `(x, y)`, `None` outside the raster.
    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        if x < self.width && y < self.height {
            let i = self.index(x, y);
            self.data.get_mut(i)
        } else {
            None
        }
    }

    /// Column-major cell data.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable column-major cell data.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Take the cell data.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Iterate `(x, y, cell)` in storage order.
    pub fn iter_cells(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let h = self.height.max(1);
        self.data
            .iter()
            .enumerate()
            .map(move |(i, v)| (i / h, i % h, v))
    }
}
