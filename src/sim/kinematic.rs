//! Authored motion for the rotating platform
//!
//! The platform is never force-integrated: its orientation advances by a
//! fixed per-axis increment every tick and the result is pushed to the
//! physics world so contacts against it use the current pose.

use glam::{EulerRot, Quat, Vec3};

use super::body::Transform;
use super::registry::{BodyRegistry, EntityId};
use super::renderable::Renderable;
use super::world::PhysicsWorld;
use crate::wrap_euler;

#[derive(Debug, Clone, PartialEq)]
pub struct KinematicDriver {
    entity: EntityId,
    position: Vec3,
    /// Current orientation, each axis wrapped to [-π, π)
    euler: Vec3,
    /// Increment per tick
    delta: Vec3,
    ticks: u64,
}

impl KinematicDriver {
    pub fn new(entity: EntityId, position: Vec3, delta: Vec3) -> Self {
        Self {
            entity,
            position,
            euler: Vec3::ZERO,
            delta,
            ticks: 0,
        }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn euler(&self) -> Vec3 {
        self.euler
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn transform(&self) -> Transform {
        Transform::new(
            self.position,
            Quat::from_euler(EulerRot::XYZ, self.euler.x, self.euler.y, self.euler.z),
        )
    }

    /// Advance one tick and publish the pose to the world and the renderable
    pub fn advance<W: PhysicsWorld + ?Sized>(
        &mut self,
        registry: &BodyRegistry,
        world: &mut W,
        renderables: &mut [Renderable],
    ) {
        self.euler = wrap_euler(self.euler + self.delta);
        self.ticks += 1;

        let transform = self.transform();
        if let Some(handle) = registry.handle(self.entity) {
            world.set_kinematic_transform(handle, transform);
        }
        if let Some(renderable) = renderables.get_mut(self.entity.0) {
            renderable.transform = transform;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::PLATFORM_SPIN;
    use crate::sim::body::BodyDesc;
    use crate::sim::renderable::{Material, MeshKind};
    use crate::sim::testing::ScriptedWorld;
    use crate::wrap_angle;
    use proptest::prelude::*;

    fn platform() -> (BodyRegistry, ScriptedWorld, Vec<Renderable>, KinematicDriver) {
        let mut registry = BodyRegistry::new();
        let id = registry.add(BodyDesc::kinematic_box(Vec3::ONE, Transform::IDENTITY));
        let mut world = ScriptedWorld::default();
        registry.materialize(&mut world);
        let visuals = vec![Renderable::new(
            Transform::IDENTITY,
            MeshKind::Torus {
                radius: 3.0,
                tube: 0.4,
            },
            Material::solid([1.0; 4]),
        )];
        let driver = KinematicDriver::new(id, Vec3::new(0.0, -5.0, 0.0), PLATFORM_SPIN);
        (registry, world, visuals, driver)
    }

    #[test]
    fn test_thousand_ticks_accumulate() {
        let (registry, mut world, mut visuals, mut driver) = platform();
        for _ in 0..1000 {
            driver.advance(&registry, &mut world, &mut visuals);
        }
        let expected = Vec3::new(
            wrap_angle(1000.0 * 0.01),
            wrap_angle(1000.0 * 0.02),
            wrap_angle(1000.0 * 0.03),
        );
        assert!((driver.euler() - expected).abs().max_element() < 1e-3);
        assert_eq!(driver.ticks(), 1000);
    }

    #[test]
    fn test_pose_published_to_world_and_visual() {
        let (registry, mut world, mut visuals, mut driver) = platform();
        driver.advance(&registry, &mut world, &mut visuals);
        let handle = registry.handle(driver.entity()).unwrap();
        assert_eq!(world.transform(handle), Some(driver.transform()));
        assert_eq!(visuals[0].transform, driver.transform());
        assert_eq!(world.kinematic_writes(), 1);
    }

    #[test]
    fn test_advances_without_materialized_world() {
        let registry = BodyRegistry::new();
        let mut world = ScriptedWorld::default();
        let mut driver = KinematicDriver::new(EntityId(0), Vec3::ZERO, PLATFORM_SPIN);
        driver.advance(&registry, &mut world, &mut []);
        assert!((driver.euler() - PLATFORM_SPIN).length() < 1e-6);
        assert_eq!(world.kinematic_writes(), 0);
    }

    proptest! {
        #[test]
        fn euler_stays_wrapped(ticks in 0usize..3000) {
            let (registry, mut world, mut visuals, mut driver) = platform();
            for _ in 0..ticks {
                driver.advance(&registry, &mut world, &mut visuals);
            }
            let limit = std::f32::consts::PI + 1e-4;
            prop_assert!(driver.euler().abs().max_element() <= limit);
        }
    }
}
