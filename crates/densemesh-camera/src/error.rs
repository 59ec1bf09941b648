//! Error types for camera construction and rasters.

use thiserror::Error;

/// Errors raised while building cameras or image rasters.
#[derive(Error, Debug)]
pub enum CameraError {
    /// Image size or focal length is not positive.
    #[error("invalid intrinsics: {0}")]
    InvalidIntrinsics(String),

    /// The pose cannot be turned into a rotation.
    #[error("invalid pose: {0}")]
    InvalidPose(String),

    /// Raster data does not match its declared size.
    #[error("raster holds {found} values, expected {expected}")]
    GridSizeMismatch {
        /// `width * height`.
        expected: usize,
        /// Length of the supplied data.
        found: usize,
    },
}

/// Result type for camera operations.
pub type CameraResult<T> = std::result::Result<T, CameraError>;
