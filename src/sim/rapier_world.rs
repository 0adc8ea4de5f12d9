//! Rapier-backed physics world
//!
//! Wraps a `rapier3d` pipeline behind [`PhysicsWorld`]. Spheres, boxes and
//! the ground halfspace map onto rapier colliders; restitution combines with
//! `Max` so a bouncy ball stays bouncy on a dead floor. Sleep thresholds come
//! from the body description, and bodies without one never sleep.

use glam::{Quat, Vec3};
use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::prelude::*;

use super::body::{BodyDesc, BodyHandle, BodyKind, Shape, Transform};
use super::world::PhysicsWorld;
use crate::consts::GRAVITY;

/// Fraction of linear velocity lost per second on dynamic bodies
const LINEAR_DAMPING: f32 = 0.2;
/// Rolling balls have no rolling resistance on a halfspace without this
const ANGULAR_DAMPING: f32 = 0.6;

/// [`PhysicsWorld`] over a rapier pipeline
pub struct RapierWorld {
    gravity: Vector<Real>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    /// Indexed by `BodyHandle`
    handles: Vec<RigidBodyHandle>,
    steps: u64,
}

impl Default for RapierWorld {
    fn default() -> Self {
        Self::new(GRAVITY)
    }
}

impl std::fmt::Debug for RapierWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RapierWorld")
            .field("bodies", &self.handles.len())
            .field("steps", &self.steps)
            .finish()
    }
}

impl RapierWorld {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity: to_vector(gravity),
            params: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            handles: Vec::new(),
            steps: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Number of completed steps
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn is_sleeping(&self, handle: BodyHandle) -> bool {
        self.body(handle).is_some_and(RigidBody::is_sleeping)
    }

    /// Dynamic bodies currently integrated
    pub fn awake_count(&self) -> usize {
        self.bodies
            .iter()
            .filter(|(_, rb)| rb.is_dynamic() && !rb.is_sleeping())
            .count()
    }

    fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        let rb_handle = self.handles.get(handle.0 as usize)?;
        self.bodies.get(*rb_handle)
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        let rb_handle = self.handles.get(handle.0 as usize)?;
        self.bodies.get_mut(*rb_handle)
    }
}

impl PhysicsWorld for RapierWorld {
    fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.params.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            None,
            &(),
            &(),
        );
        self.steps += 1;
    }

    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let position = to_isometry(&desc.transform);
        let kind = desc.kind();
        let mut body = match kind {
            BodyKind::Dynamic => RigidBodyBuilder::dynamic()
                .linear_damping(LINEAR_DAMPING)
                .angular_damping(ANGULAR_DAMPING)
                .ccd_enabled(true)
                .can_sleep(desc.sleep.is_some()),
            BodyKind::Static => RigidBodyBuilder::fixed(),
            BodyKind::Kinematic => RigidBodyBuilder::kinematic_position_based(),
        }
        .position(position)
        .build();
        if let Some(sleep) = desc.sleep {
            let activation = body.activation_mut();
            activation.normalized_linear_threshold = sleep.speed_limit;
            activation.time_until_sleep = sleep.time_limit;
        }

        let collider = match desc.shape {
            Shape::Sphere { radius } => ColliderBuilder::ball(radius),
            Shape::Plane => ColliderBuilder::halfspace(Vector::y_axis()),
            Shape::Box { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
        }
        .restitution(desc.restitution)
        .restitution_combine_rule(CoefficientCombineRule::Max);
        let collider = if kind == BodyKind::Dynamic {
            collider.mass(desc.mass)
        } else {
            collider
        };

        let rb_handle = self.bodies.insert(body);
        self.colliders
            .insert_with_parent(collider, rb_handle, &mut self.bodies);

        let handle = BodyHandle(self.handles.len() as u32);
        self.handles.push(rb_handle);
        handle
    }

    fn transform(&self, handle: BodyHandle) -> Option<Transform> {
        self.body(handle).map(|rb| from_isometry(rb.position()))
    }

    fn velocity(&self, handle: BodyHandle) -> Option<Vec3> {
        self.body(handle).map(|rb| {
            if rb.is_sleeping() {
                Vec3::ZERO
            } else {
                from_vector(rb.linvel())
            }
        })
    }

    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec3) {
        if let Some(rb) = self.body_mut(handle) {
            if rb.is_dynamic() {
                rb.set_linvel(to_vector(velocity), true);
            }
        }
    }

    fn set_kinematic_transform(&mut self, handle: BodyHandle, transform: Transform) {
        if let Some(rb) = self.body_mut(handle) {
            if rb.is_kinematic() {
                rb.set_next_kinematic_position(to_isometry(&transform));
            }
        }
    }
}

fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn to_isometry(t: &Transform) -> Isometry<Real> {
    let q = t.rotation;
    Isometry::from_parts(
        Translation::from(to_vector(t.position)),
        UnitQuaternion::new_normalize(Quaternion::new(q.w, q.x, q.y, q.z)),
    )
}

fn from_isometry(iso: &Isometry<Real>) -> Transform {
    let q = iso.rotation;
    Transform::new(
        from_vector(&iso.translation.vector),
        Quat::from_xyzw(q.i, q.j, q.k, q.w),
    )
}
