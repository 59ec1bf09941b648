//! Error types for mesh operations.

use thiserror::Error;

/// Errors that can occur while building, editing or loading a mesh.
#[derive(Error, Debug)]
pub enum MeshError {
    /// A triangle references a point that does not exist.
    #[error("triangle {triangle} references point {index}, mesh has {point_count} points")]
    PointIndexOutOfRange {
        /// Offending triangle.
        triangle: usize,
        /// Offending point index.
        index: usize,
        /// Number of points in the mesh.
        point_count: usize,
    },

    /// A triangle uses the same point twice.
    #[error("triangle {triangle} repeats a point index")]
    RepeatedPointIndex {
        /// Offending triangle.
        triangle: usize,
    },

    /// A triangle id does not exist.
    #[error("triangle id {triangle} out of range, mesh has {triangle_count} triangles")]
    TriangleIndexOutOfRange {
        /// Offending triangle id.
        triangle: usize,
        /// Number of triangles in the mesh.
        triangle_count: usize,
    },

    /// A triangle did not resolve to three distinct edges.
    #[error("triangle {triangle} resolved to {resolved} distinct edges instead of 3")]
    MalformedEdges {
        /// Offending triangle.
        triangle: usize,
        /// Number of distinct edges found.
        resolved: usize,
    },

    /// The point is not a vertex of the triangle.
    #[error("point {point} is not a vertex of triangle {triangle}")]
    PointNotInTriangle {
        /// Queried triangle.
        triangle: usize,
        /// Queried point.
        point: usize,
    },

    /// Mesh has no points or no triangles.
    #[error("mesh is empty")]
    EmptyMesh,

    /// Malformed text input.
    #[error("parse error on line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// Malformed binary record.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// A parallel per-point or per-triangle array has the wrong length.
    #[error("{what} has {found} entries, expected {expected}")]
    SizeMismatch {
        /// Name of the array.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        found: usize,
    },

    /// A camera id does not exist.
    #[error("camera {camera} out of range, {camera_count} cameras available")]
    CameraOutOfRange {
        /// Offending camera id.
        camera: usize,
        /// Number of cameras.
        camera_count: usize,
    },

    /// Invalid operation settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Underlying I/O failure, including truncated files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for mesh operations.
pub type MeshResult<T> = std::result::Result<T, MeshError>;
