//! Body descriptions and transforms
//!
//! Bodies are created once when the scene is materialized into a physics
//! world and never destroyed; the population is fixed for the session.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Handle issued by a physics world for a created body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// Collision shape class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Sphere { radius: f32 },
    /// Infinite plane through the body origin, normal along local +Y
    Plane,
    Box { half_extents: Vec3 },
}

/// How a body moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    /// Force-integrated (mass > 0)
    Dynamic,
    /// Never moves
    Static,
    /// Zero mass, transform authored each tick, still collides
    Kinematic,
}

/// Sleep thresholds: a dynamic body slower than `speed_limit` for
/// `time_limit` seconds is excluded from integration until woken.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SleepConfig {
    pub speed_limit: f32,
    pub time_limit: f32,
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            speed_limit: 0.1,
            time_limit: 1.0,
        }
    }
}

/// Position + rotation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Everything a physics world needs to create a body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyDesc {
    pub shape: Shape,
    /// 0 = static or kinematic
    pub mass: f32,
    pub kinematic: bool,
    pub transform: Transform,
    pub restitution: f32,
    pub sleep: Option<SleepConfig>,
}

impl BodyDesc {
    /// Dynamic sphere
    pub fn sphere(radius: f32, mass: f32, position: Vec3) -> Self {
        Self {
            shape: Shape::Sphere { radius },
            mass,
            kinematic: false,
            transform: Transform::from_position(position),
            restitution: 0.0,
            sleep: None,
        }
    }

    /// Static ground plane
    pub fn plane(position: Vec3, rotation: Quat) -> Self {
        Self {
            shape: Shape::Plane,
            mass: 0.0,
            kinematic: false,
            transform: Transform::new(position, rotation),
            restitution: 0.0,
            sleep: None,
        }
    }

    /// Zero-mass box whose transform is authored every tick
    pub fn kinematic_box(half_extents: Vec3, transform: Transform) -> Self {
        Self {
            shape: Shape::Box { half_extents },
            mass: 0.0,
            kinematic: true,
            transform,
            restitution: 0.0,
            sleep: None,
        }
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn with_sleep(mut self, sleep: SleepConfig) -> Self {
        self.sleep = Some(sleep);
        self
    }

    pub fn kind(&self) -> BodyKind {
        if self.kinematic {
            BodyKind::Kinematic
        } else if self.mass > 0.0 {
            BodyKind::Dynamic
        } else {
            BodyKind::Static
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_mass() {
        assert_eq!(BodyDesc::sphere(0.5, 1.0, Vec3::ZERO).kind(), BodyKind::Dynamic);
        assert_eq!(BodyDesc::sphere(0.5, 0.0, Vec3::ZERO).kind(), BodyKind::Static);
        assert_eq!(
            BodyDesc::plane(Vec3::ZERO, Quat::IDENTITY).kind(),
            BodyKind::Static
        );
        assert_eq!(
            BodyDesc::kinematic_box(Vec3::ONE, Transform::IDENTITY).kind(),
            BodyKind::Kinematic
        );
    }
}
