//! Scene construction
//!
//! Builds the fixed population once: N dynamic balls in the spawn column,
//! the static ground plane and (optionally) the kinematic platform. Spawn
//! positions and colors come from a seeded PCG stream, so a seed always
//! reproduces the same scene.

use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::{BodyDesc, SleepConfig, Transform};
use super::interaction::InteractionController;
use super::kinematic::KinematicDriver;
use super::registry::{BodyRegistry, EntityId};
use super::renderable::{Material, MeshKind, Renderable};
use crate::assets::Resource;
use crate::consts::*;
use crate::governor::PerformanceGovernor;
use crate::hsl_to_rgb;
use crate::renderer::vertex::colors;
use crate::settings::Settings;

/// Immutable scene parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    pub population: usize,
    pub spawn_min: Vec3,
    pub spawn_max: Vec3,
    /// Ball colors: uniform random hue at fixed saturation/lightness
    pub saturation: f32,
    pub lightness: f32,
    pub ball_radius: f32,
    pub ball_visual_radius: f32,
    pub ball_mass: f32,
    pub restitution: f32,
    pub sleep: SleepConfig,
    pub platform: bool,
    pub impulse_speed: f32,
    pub seed: u64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::new(&PerformanceGovernor::for_preset(Default::default()), &Settings::default())
    }
}

impl SceneConfig {
    pub fn new(governor: &PerformanceGovernor, settings: &Settings) -> Self {
        Self {
            population: governor.population,
            spawn_min: SPAWN_MIN,
            spawn_max: SPAWN_MAX,
            saturation: 1.0,
            lightness: 0.5,
            ball_radius: BALL_RADIUS,
            ball_visual_radius: BALL_VISUAL_RADIUS,
            ball_mass: BALL_MASS,
            restitution: BALL_RESTITUTION,
            sleep: governor.sleep,
            platform: settings.platform,
            impulse_speed: settings.impulse_speed,
            seed: settings.seed,
        }
    }
}

/// Everything the frame loop mutates, minus the physics world
#[derive(Debug, Clone)]
pub struct Scene {
    pub registry: BodyRegistry,
    /// Indexed by entity id
    pub renderables: Vec<Renderable>,
    pub interaction: InteractionController,
    pub platform: Option<KinematicDriver>,
    balls: usize,
    plane: EntityId,
}

impl Scene {
    /// Build the scene. `texture` is the ground surface; the plane renders
    /// with its base color until it is ready.
    pub fn build(config: &SceneConfig, texture: Option<Resource>) -> Self {
        let mut rng = Pcg32::seed_from_u64(config.seed);
        let mut registry = BodyRegistry::new();
        let mut renderables = Vec::with_capacity(config.population + 2);

        for _ in 0..config.population {
            let position = spawn_point(&mut rng, config.spawn_min, config.spawn_max);
            registry.add(
                BodyDesc::sphere(config.ball_radius, config.ball_mass, position)
                    .with_restitution(config.restitution)
                    .with_sleep(config.sleep),
            );
            renderables.push(Renderable::new(
                Transform::from_position(position),
                MeshKind::Sphere {
                    radius: config.ball_visual_radius,
                },
                ball_material(&mut rng, config.saturation, config.lightness),
            ));
        }

        let plane_position = Vec3::new(0.0, PLANE_HEIGHT, 0.0);
        let plane = registry.add(BodyDesc::plane(plane_position, Quat::IDENTITY));
        renderables.push(Renderable::new(
            Transform::from_position(plane_position),
            MeshKind::Plane { size: PLANE_SIZE },
            Material {
                texture,
                ..Material::solid(colors::GROUND)
            },
        ));

        let platform = config.platform.then(|| {
            let transform = Transform::from_position(PLATFORM_POSITION);
            let id = registry.add(BodyDesc::kinematic_box(PLATFORM_HALF_EXTENTS, transform));
            renderables.push(Renderable::new(
                transform,
                MeshKind::Torus {
                    radius: PLATFORM_RADIUS,
                    tube: PLATFORM_TUBE,
                },
                Material {
                    metalness: 0.6,
                    roughness: 0.3,
                    ..Material::solid(colors::PLATFORM)
                },
            ));
            KinematicDriver::new(id, PLATFORM_POSITION, PLATFORM_SPIN)
        });

        let interaction = InteractionController::new(registry.len(), config.impulse_speed);
        log::info!(
            "Scene built: {} balls, platform {}",
            config.population,
            platform.is_some()
        );

        Self {
            registry,
            renderables,
            interaction,
            platform,
            balls: config.population,
            plane,
        }
    }

    pub fn ball_count(&self) -> usize {
        self.balls
    }

    /// Ball entity ids (balls are registered first)
    pub fn balls(&self) -> impl Iterator<Item = EntityId> + use<> {
        (0..self.balls).map(EntityId)
    }

    pub fn plane(&self) -> EntityId {
        self.plane
    }

    pub fn platform(&self) -> Option<EntityId> {
        self.platform.as_ref().map(KinematicDriver::entity)
    }
}

fn spawn_point(rng: &mut Pcg32, min: Vec3, max: Vec3) -> Vec3 {
    let t = Vec3::new(rng.random::<f32>(), rng.random::<f32>(), rng.random::<f32>());
    min + (max - min) * t
}

fn ball_material(rng: &mut Pcg32, saturation: f32, lightness: f32) -> Material {
    let [r, g, b] = hsl_to_rgb(rng.random::<f32>() * 360.0, saturation, lightness);
    Material {
        base_color: [r, g, b, 1.0],
        hover_color: Some(HOVER_COLOR),
        metalness: BALL_METALNESS,
        roughness: BALL_ROUGHNESS,
        texture: None,
    }
}
