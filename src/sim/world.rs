//! Physics world capability
//!
//! The integration algorithm lives behind this trait; the frame loop only
//! steps it, reads transforms/velocities back, and writes velocities and
//! kinematic transforms.

use glam::Vec3;

use super::body::{BodyDesc, BodyHandle, Transform};

pub trait PhysicsWorld {
    /// Advance the simulation by `dt` seconds
    fn step(&mut self, dt: f32);

    /// Create a body; handles stay valid for the world's lifetime
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle;

    /// Current transform, `None` for an unknown handle
    fn transform(&self, handle: BodyHandle) -> Option<Transform>;

    /// Current linear velocity, `None` for an unknown handle
    fn velocity(&self, handle: BodyHandle) -> Option<Vec3>;

    /// Overwrite linear velocity (wakes a sleeping body)
    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec3);

    /// Author a kinematic body's transform for the next step
    fn set_kinematic_transform(&mut self, handle: BodyHandle, transform: Transform);
}
