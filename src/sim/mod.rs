//! Simulation module
//!
//! Everything the per-frame loop touches that is independent of the GPU
//! and the host platform:
//! - Body descriptions, the registry and the physics capability
//! - Renderables and the scene builder
//! - Pointer interaction and the kinematic platform
//! - The frame orchestrator
//!
//! Iteration is always in entity-id order.

pub mod body;
pub mod interaction;
pub mod kinematic;
pub mod rapier_world;
pub mod registry;
pub mod renderable;
pub mod scene;
pub mod tick;
pub mod world;

#[cfg(test)]
pub(crate) mod testing;

pub use body::{BodyDesc, BodyHandle, BodyKind, Shape, SleepConfig, Transform};
pub use interaction::{InteractionController, InteractionState, PointerEvent, impulse_velocity};
pub use kinematic::KinematicDriver;
pub use rapier_world::RapierWorld;
pub use registry::{BodyRegistry, EntityId};
pub use renderable::{Material, MeshKind, Renderable, Surface};
pub use scene::{Scene, SceneConfig};
pub use tick::{FrameClock, FrameOrchestrator, FrameReport, StepPlan};
pub use world::PhysicsWorld;
