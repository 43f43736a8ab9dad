use glam::{Mat4, Vec3};

use crate::raycast::Ray;
use crate::render::CameraParams;
use crate::scene::CameraSpec;

/// Walking camera driven by yaw and pitch.
///
/// Yaw zero looks down negative Z. Positive pitch looks up.
#[derive(Debug, Clone, PartialEq)]
pub struct FirstPersonCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for FirstPersonCamera {
    fn default() -> Self {
        Self::from_spec(&CameraSpec::default())
    }
}

impl FirstPersonCamera {
    pub fn from_spec(spec: &CameraSpec) -> Self {
        Self {
            position: spec.position,
            yaw: 0.0,
            pitch: 0.0,
            fov: spec.fov.to_radians(),
            aspect: 16.0 / 9.0,
            near: spec.near,
            far: spec.far,
        }
    }

    pub fn forward(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vec3::new(-sin_yaw * cos_pitch, sin_pitch, -cos_yaw * cos_pitch)
    }

    /// Forward direction projected onto the floor.
    pub fn flat_forward(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        Vec3::new(-sin_yaw, 0.0, -cos_yaw)
    }

    pub fn flat_right(&self) -> Vec3 {
        let forward = self.flat_forward();
        Vec3::new(-forward.z, 0.0, forward.x)
    }

    pub fn set_orientation(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch;
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = if height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        };
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect.max(0.01), self.near, self.far)
    }

    pub fn params(&self) -> CameraParams {
        CameraParams {
            view_proj: self.projection_matrix() * self.view_matrix(),
            position: self.position,
        }
    }

    /// Sight line through the centre of the screen.
    pub fn ray(&self) -> Ray {
        Ray::new(self.position, self.forward())
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    #[test]
    fn starts_at_the_room_entrance_looking_forward() {
        let camera = FirstPersonCamera::default();
        assert_eq!(camera.position, Vec3::new(0.0, 1.6, 3.0));
        assert!((camera.forward() - Vec3::NEG_Z).length() < 1e-6);
        assert!((camera.fov - 75f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn turning_left_looks_down_negative_x() {
        let mut camera = FirstPersonCamera::default();
        camera.set_orientation(FRAC_PI_2, 0.0);
        assert!((camera.forward() - Vec3::NEG_X).length() < 1e-6);
        assert!((camera.flat_right() - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn flat_axes_ignore_pitch() {
        let mut camera = FirstPersonCamera::default();
        camera.set_orientation(0.3, -1.2);
        assert_eq!(camera.flat_forward().y, 0.0);
        assert!((camera.flat_forward().length() - 1.0).abs() < 1e-6);
        assert!(camera.flat_forward().dot(camera.flat_right()).abs() < 1e-6);
        assert!(camera.forward().y < 0.0);
    }

    #[test]
    fn aspect_survives_a_zero_height() {
        let mut camera = FirstPersonCamera::default();
        camera.set_aspect(1280, 0);
        assert_eq!(camera.aspect, 1.0);
        camera.set_aspect(1920, 1080);
        assert!((camera.aspect - 16.0 / 9.0).abs() < 1e-6);
        assert!(!camera.params().view_proj.col(0).x.is_nan());
    }
}
