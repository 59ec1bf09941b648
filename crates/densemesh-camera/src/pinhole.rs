//! Ideal pinhole camera.

use densemesh_math::{try_normalize, Point2, Point3, Vec3};
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use crate::error::{CameraError, CameraResult};
use crate::CameraModel;

/// Distortion-free pinhole camera with `x` right, `y` down and `z` forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinholeCamera {
    width: u32,
    height: u32,
    fx: f64,
    fy: f64,
    cx: f64,
    cy: f64,
    /// World-to-camera rotation.
    rotation: Matrix3<f64>,
    center: Point3,
}

impl PinholeCamera {
    /// Camera from intrinsics and a world-to-camera rotation about `center`.
    pub fn new(
        width: u32,
        height: u32,
        focal: (f64, f64),
        principal: (f64, f64),
        rotation: Matrix3<f64>,
        center: Point3,
    ) -> CameraResult<Self> {
        if width == 0 || height == 0 {
            return Err(CameraError::InvalidIntrinsics(format!(
                "image size {width}x{height}"
            )));
        }
        let (fx, fy) = focal;
        if !(fx > 0.0 && fy > 0.0) {
            return Err(CameraError::InvalidIntrinsics(format!(
                "focal length ({fx}, {fy})"
            )));
        }
        let det = rotation.determinant();
        if (det - 1.0).abs() > 1e-6 {
            return Err(CameraError::InvalidPose(format!(
                "rotation determinant {det}"
            )));
        }
        Ok(Self {
            width,
            height,
            fx,
            fy,
            cx: principal.0,
            cy: principal.1,
            rotation,
            center,
        })
    }

    /// Camera at `eye` looking at `target`, principal point at the image center.
    ///
    /// `up` is the world direction that should appear at the top of the image.
    pub fn look_at(
        eye: Point3,
        target: &Point3,
        up: &Vec3,
        width: u32,
        height: u32,
        focal: f64,
    ) -> CameraResult<Self> {
        let forward = try_normalize(&(target - eye))
            .ok_or_else(|| CameraError::InvalidPose("eye and target coincide".into()))?;
        let right = try_normalize(&forward.cross(up))
            .ok_or_else(|| CameraError::InvalidPose("up is parallel to the view direction".into()))?;
        let down = forward.cross(&right);
        let rotation = Matrix3::from_rows(&[
            right.transpose(),
            down.transpose(),
            forward.transpose(),
        ]);
        Self::new(
            width,
            height,
            (focal, focal),
            (width as f64 / 2.0, height as f64 / 2.0),
            rotation,
            eye,
        )
    }

    /// Point expressed in the camera frame.
    pub fn to_camera_frame(&self, p: &Point3) -> Vec3 {
        self.rotation * (p - self.center)
    }

    /// Depth of `p` along the optical axis.
    pub fn depth(&self, p: &Point3) -> f64 {
        self.to_camera_frame(p).z
    }
}

impl CameraModel for PinholeCamera {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn center(&self) -> Point3 {
        self.center
    }

    fn project(&self, p: &Point3) -> Point2 {
        let pc = self.to_camera_frame(p);
        Point2::new(
            self.fx * pc.x / pc.z + self.cx,
            self.fy * pc.y / pc.z + self.cy,
        )
    }

    fn unproject(&self, pixel: &Point2) -> Vec3 {
        let d = Vec3::new(
            (pixel.x - self.cx) / self.fx,
            (pixel.y - self.cy) / self.fy,
            1.0,
        );
        (self.rotation.transpose() * d).normalize()
    }

    fn pixel_footprint(&self, p: &Point3) -> f64 {
        self.depth(p).abs() * 2.0 / (self.fx + self.fy)
    }
}
