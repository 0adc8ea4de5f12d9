//! Body registry
//!
//! Owns the body descriptions of the scene and, once a world is attached,
//! the handles it issued. Entity ids index both the registry and the
//! renderable list, so every body has exactly one renderable.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::body::{BodyDesc, BodyHandle, BodyKind};
use super::renderable::Renderable;
use super::world::PhysicsWorld;

/// Stable index of a scene entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub usize);

#[derive(Debug, Clone)]
struct BodySlot {
    desc: BodyDesc,
    handle: Option<BodyHandle>,
}

#[derive(Debug, Clone, Default)]
pub struct BodyRegistry {
    slots: Vec<BodySlot>,
    materialized: bool,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a body description; ids are assigned in insertion order
    pub fn add(&mut self, desc: BodyDesc) -> EntityId {
        let id = EntityId(self.slots.len());
        self.slots.push(BodySlot { desc, handle: None });
        id
    }

    /// Create every registered body in `world`. Idempotent; returns the
    /// number of bodies created by this call.
    pub fn materialize<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) -> usize {
        if self.materialized {
            return 0;
        }
        for slot in &mut self.slots {
            slot.handle = Some(world.create_body(&slot.desc));
        }
        self.materialized = true;
        log::info!("Created {} bodies", self.slots.len());
        self.slots.len()
    }

    pub fn is_materialized(&self) -> bool {
        self.materialized
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn desc(&self, id: EntityId) -> Option<&BodyDesc> {
        self.slots.get(id.0).map(|s| &s.desc)
    }

    pub fn kind(&self, id: EntityId) -> Option<BodyKind> {
        self.slots.get(id.0).map(|s| s.desc.kind())
    }

    pub fn handle(&self, id: EntityId) -> Option<BodyHandle> {
        self.slots.get(id.0).and_then(|s| s.handle)
    }

    /// Handle of a dynamic body; `None` for static/kinematic or unknown ids
    pub fn dynamic_handle(&self, id: EntityId) -> Option<BodyHandle> {
        let slot = self.slots.get(id.0)?;
        if slot.desc.kind() == BodyKind::Dynamic {
            slot.handle
        } else {
            None
        }
    }

    pub fn dynamic_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.desc.kind() == BodyKind::Dynamic)
            .count()
    }

    /// Materialized dynamic bodies in id order
    pub fn dynamic_bodies(&self) -> impl Iterator<Item = (EntityId, BodyHandle)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            (s.desc.kind() == BodyKind::Dynamic)
                .then_some(s.handle)
                .flatten()
                .map(|h| (EntityId(i), h))
        })
    }

    /// Current velocity of an entity's body
    pub fn velocity<W: PhysicsWorld + ?Sized>(&self, world: &W, id: EntityId) -> Option<Vec3> {
        world.velocity(self.handle(id)?)
    }

    /// Copy every body's transform into its renderable. Returns the number
    /// of renderables written.
    pub fn sync_transforms<W: PhysicsWorld + ?Sized>(
        &self,
        world: &W,
        renderables: &mut [Renderable],
    ) -> usize {
        let mut synced = 0;
        for (slot, renderable) in self.slots.iter().zip(renderables.iter_mut()) {
            let Some(handle) = slot.handle else { continue };
            if let Some(transform) = world.transform(handle) {
                renderable.transform = transform;
                synced += 1;
            }
        }
        synced
    }
}
