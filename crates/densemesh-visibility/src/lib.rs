#![warn(missing_docs)]

//! Per-camera visibility for densemesh meshes.
//!
//! For one camera the pipeline is: project every triangle into a raster
//! ([`TriangleProjection`]), collect the triangles overlapping each pixel
//! ([`rasterize_coverage`]), keep the nearest surface depth per pixel
//! ([`depth_map_from_coverage`]) and finally list the triangles that agree
//! with that depth somewhere ([`visible_triangle_ids`]). Many cameras are
//! processed in parallel by [`visible_triangles_per_camera`].
//!
//! # Example
//!
//! ```ignore
//! use densemesh_mesh::NoProgress;
//! use densemesh_visibility::{triangle_cameras, VisibilitySettings};
//!
//! let mesh = densemesh_mesh::io::load_bin("mesh.bin")?;
//! let cams = triangle_cameras(&mesh, &cameras, 2, &VisibilitySettings::default(), &NoProgress)?;
//! println!("triangle 0 seen by {:?}", cams[0]);
//! ```

pub mod coverage;
pub mod depth;
pub mod error;
pub mod projection;
pub mod side_files;
pub mod views;
pub mod visible;

pub use coverage::{coverage_counts, rasterize_coverage, rasterize_coverage_subset, TriangleCoverage};
pub use depth::{depth_map_from_coverage, NO_DEPTH};
pub use error::{VisibilityError, VisibilityResult};
pub use projection::{PixelBounds, PixelSquare, RasterSettings, TriangleProjection};
pub use side_files::{
    read_coverage, read_depth_map, read_visible_ids, write_coverage, write_depth_map, write_visible_ids, SideFiles,
};
pub use views::{camera_view, triangle_cameras, visible_triangles_per_camera, CameraView};
pub use visible::{visible_triangle_ids, visible_triangles_by_centroid, VisibilitySettings};
