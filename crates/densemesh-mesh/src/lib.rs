#![warn(missing_docs)]

//! Triangle mesh entity for dense multi-view reconstruction.
//!
//! A [`Mesh`] owns a point sequence and a triangle sequence. Adjacency
//! (point fans, ordered rings, undirected edges) is derived on demand and
//! never cached, so every mutation leaves the mesh consistent on its own.
//!
//! On top of the entity this crate provides smoothing, connected
//! components, triangle filters, adaptive subdivision, depth-map
//! triangulation, camera-set bookkeeping and binary/OBJ persistence.
//!
//! # Example
//!
//! ```ignore
//! use densemesh_mesh::{Mesh, NoProgress, SubdivisionSettings};
//!
//! let mut mesh = densemesh_mesh::io::load_obj("scan.obj")?.mesh;
//! mesh.filter_triangles_with_excessive_edge_length(3.0);
//! mesh.remove_free_points();
//! let settings = SubdivisionSettings::max_edge_length(0.01, 2_000_000);
//! let outcome = mesh.subdivide(&settings, &NoProgress)?;
//! println!("{} passes", outcome.passes);
//! ```

pub mod adjacency;
pub mod cameras;
pub mod components;
pub mod depth;
pub mod error;
pub mod filter;
pub mod io;
pub mod mesh;
pub mod progress;
pub mod smoothing;
pub mod subdivide;

pub use adjacency::EdgeAdjacency;
pub use cameras::invert_object_camera_lists;
pub use depth::DepthMeshSettings;
pub use error::{MeshError, MeshResult};
pub use mesh::{apply_point_remap, Mesh, Triangle};
pub use progress::{NoProgress, ProgressSink};
pub use subdivide::{SubdivisionCriterion, SubdivisionOutcome, SubdivisionSettings};
