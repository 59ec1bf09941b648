//! Camera frustum as a hexahedron.

use densemesh_geom::Hexahedron;
use densemesh_math::{is_finite, Point2};

use crate::CameraModel;

/// The part of the viewing frustum between distances `near` and `far`
/// from the camera center.
///
/// Corners run `(0, 0)`, `(w, 0)`, `(w, h)`, `(0, h)` in image space, near
/// face first. `None` if `near >= far` or a corner ray is degenerate.
pub fn camera_hexahedron<C: CameraModel + ?Sized>(camera: &C, near: f64, far: f64) -> Option<Hexahedron> {
    if !(near < far) {
        return None;
    }
    let (w, h) = (camera.width() as f64, camera.height() as f64);
    let image_corners = [
        Point2::new(0.0, 0.0),
        Point2::new(w, 0.0),
        Point2::new(w, h),
        Point2::new(0.0, h),
    ];
    let c = camera.center();
    let mut dirs = [nalgebra::Vector3::zeros(); 4];
    for (dir, pix) in dirs.iter_mut().zip(image_corners.iter()) {
        *dir = camera.unproject(pix);
        if !is_finite(dir) || dir.norm() < 1e-12 {
            return None;
        }
    }
    let corner = |i: usize| {
        let d = if i < 4 { near } else { far };
        c + dirs[i % 4] * d
    };
    Some(Hexahedron::new(std::array::from_fn(corner)))
}
