#![warn(missing_docs)]

//! Geometric primitives for the densemesh reconstruction core.
//!
//! Pure, allocation-light predicates over points, lines, planes, triangles
//! and hexahedra. Nothing here panics on degenerate input: parallel lines,
//! zero-length directions and coincident planes all come back as `None` or
//! `false` instead of NaN.

pub mod bbox;
pub mod hexahedron;
pub mod line;
pub mod planar;
pub mod plane;
pub mod ray;
pub mod tri_tri;

pub use bbox::Aabb3;
pub use hexahedron::Hexahedron;
pub use line::{line_line_intersect, line_plane_intersect, triangulate_rays, LineLineIntersection};
pub use planar::{
    clip_line_to_image, point_in_triangle_2d, segments_intersect_2d, triangle_area_2d,
    triangles_overlap_2d,
};
pub use plane::{oriented_point_plane_distance, point_plane_distance, Plane};
pub use ray::Ray;
pub use tri_tri::{triangle_triangle_intersection, triangles_intersect, TriTriIntersection};
