//! Camera capability
//!
//! Orbit controls live outside the core; the frame loop only needs the
//! world-space view direction when a click is consumed.

use glam::Vec3;

use crate::consts::{CAMERA_FOV_DEG, CAMERA_POSITION};

pub trait ViewCamera {
    /// World-space unit view direction
    fn view_direction(&self) -> Vec3;
}

/// Camera looking from `position` toward `target`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAtCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_deg: f32,
}

impl Default for LookAtCamera {
    fn default() -> Self {
        Self {
            position: CAMERA_POSITION,
            target: Vec3::ZERO,
            fov_deg: CAMERA_FOV_DEG,
        }
    }
}

impl LookAtCamera {
    /// Orbit around the target by yaw/pitch (radians), keeping distance
    pub fn orbit(&mut self, yaw: f32, pitch: f32) {
        let offset = self.position - self.target;
        let distance = offset.length();
        if distance <= f32::EPSILON {
            return;
        }
        let current_pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();
        let current_yaw = offset.x.atan2(offset.z);
        let limit = std::f32::consts::FRAC_PI_2 - 0.01;
        let pitch = (current_pitch + pitch).clamp(-limit, limit);
        let yaw = current_yaw + yaw;
        self.position = self.target
            + Vec3::new(
                distance * pitch.cos() * yaw.sin(),
                distance * pitch.sin(),
                distance * pitch.cos() * yaw.cos(),
            );
    }
}

impl ViewCamera for LookAtCamera {
    fn view_direction(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }
}
