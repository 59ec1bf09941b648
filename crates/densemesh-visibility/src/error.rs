//! Error types for visibility computation and its side files.

use densemesh_camera::CameraError;
use densemesh_mesh::MeshError;
use thiserror::Error;

/// Errors raised while rasterizing, testing visibility or reading side files.
#[derive(Error, Debug)]
pub enum VisibilityError {
    /// A triangle id does not exist in the mesh.
    #[error("triangle {triangle} out of range ({triangle_count} triangles)")]
    TriangleOutOfRange {
        /// Offending id.
        triangle: usize,
        /// Number of triangles in the mesh.
        triangle_count: usize,
    },

    /// Two rasters that must line up have different sizes.
    #[error("{what}: expected {expected_width}x{expected_height}, found {found_width}x{found_height}")]
    RasterMismatch {
        /// Which raster was checked.
        what: &'static str,
        /// Expected width.
        expected_width: usize,
        /// Expected height.
        expected_height: usize,
        /// Actual width.
        found_width: usize,
        /// Actual height.
        found_height: usize,
    },

    /// Settings failed validation.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// A side file holds a negative size or an id that does not fit.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Mesh-level failure.
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// Raster construction failure.
    #[error(transparent)]
    Camera(#[from] CameraError),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for visibility operations.
pub type VisibilityResult<T> = std::result::Result<T, VisibilityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<VisibilityError>();
    }

    #[test]
    fn test_display() {
        let err = VisibilityError::TriangleOutOfRange {
            triangle: 7,
            triangle_count: 3,
        };
        assert_eq!(err.to_string(), "triangle 7 out of range (3 triangles)");
    }
}
