#![warn(missing_docs)]

//! Camera model capability for the densemesh reconstruction core.
//!
//! The mesh and visibility code only ever talk to cameras through the
//! [`CameraModel`] trait: project a point, unproject a pixel, the camera
//! center, the image size and the pixel footprint at a 3D point. A plain
//! [`PinholeCamera`] implementation is provided for tools and tests.
//!
//! # Example
//!
//! ```ignore
//! use densemesh_camera::{CameraModel, PinholeCamera};
//! use densemesh_math::{Point3, Vec3};
//!
//! let cam = PinholeCamera::look_at(
//!     Point3::origin(),
//!     &Point3::new(0.0, 0.0, 1.0),
//!     &Vec3::new(0.0, -1.0, 0.0),
//!     640,
//!     480,
//!     500.0,
//! )?;
//! let pix = cam.project(&Point3::new(0.0, 0.0, 5.0));
//! assert_eq!(pix.x, 320.0);
//! ```

pub mod error;
pub mod frustum;
pub mod grid;
pub mod pinhole;

pub use error::{CameraError, CameraResult};
pub use frustum::camera_hexahedron;
pub use grid::{DepthMap, PixelGrid};
pub use pinhole::PinholeCamera;

use densemesh_geom::Ray;
use densemesh_math::{Point2, Point3, Vec3};

/// The capability a calibrated camera exposes to the reconstruction core.
pub trait CameraModel {
    /// Native image width in pixels.
    fn width(&self) -> u32;

    /// Native image height in pixels.
    fn height(&self) -> u32;

    /// Optical center in world coordinates.
    fn center(&self) -> Point3;

    /// Project a world point to pixel coordinates.
    ///
    /// Points on the camera plane produce non-finite coordinates; callers
    /// reject those.
    fn project(&self, p: &Point3) -> Point2;

    /// Unit direction of the viewing ray through `pixel`, in world coordinates.
    fn unproject(&self, pixel: &Point2) -> Vec3;

    /// World-space size a single pixel covers at `p`.
    fn pixel_footprint(&self, p: &Point3) -> f64;

    /// Viewing ray through `pixel`, `None` if the direction is degenerate.
    fn pixel_ray(&self, pixel: &Point2) -> Option<Ray> {
        Ray::new(self.center(), self.unproject(pixel))
    }
}

impl<C: CameraModel + ?Sized> CameraModel for &C {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn center(&self) -> Point3 {
        (**self).center()
    }

    fn project(&self, p: &Point3) -> Point2 {
        (**self).project(p)
    }

    fn unproject(&self, pixel: &Point2) -> Vec3 {
        (**self).unproject(pixel)
    }

    fn pixel_footprint(&self, p: &Point3) -> f64 {
        (**self).pixel_footprint(p)
    }
}
