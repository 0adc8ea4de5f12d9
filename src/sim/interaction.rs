//! Pointer interaction
//!
//! Hover is visual only. A click arms a one-shot impulse request that the
//! next tick consumes: the clicked ball's velocity is *set* (not added) to
//! the view direction scaled by the impulse speed, then the request is
//! cleared whether or not the impulse could be computed. Repeated clicks
//! before a tick collapse into one request (last click wins).

use glam::Vec3;

use super::registry::{BodyRegistry, EntityId};
use super::world::PhysicsWorld;
use crate::camera::ViewCamera;
use crate::error::{PlaygroundError, Result};

/// Pointer events delivered by the renderer's picking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Enter(EntityId),
    Leave(EntityId),
    Click(EntityId),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionState {
    pub hovered: bool,
    pub impulse_requested: bool,
}

/// Velocity for an impulse along `direction`
pub fn impulse_velocity(direction: Vec3, speed: f32) -> Result<Vec3> {
    if !direction.is_finite() || direction.length_squared() < 1e-12 {
        return Err(PlaygroundError::DegenerateDirection(direction));
    }
    Ok(direction * speed)
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    states: Vec<InteractionState>,
    impulse_speed: f32,
}

impl InteractionController {
    pub fn new(entities: usize, impulse_speed: f32) -> Self {
        Self {
            states: vec![InteractionState::default(); entities],
            impulse_speed,
        }
    }

    pub fn state(&self, id: EntityId) -> Option<&InteractionState> {
        self.states.get(id.0)
    }

    pub fn is_hovered(&self, id: EntityId) -> bool {
        self.states.get(id.0).is_some_and(|s| s.hovered)
    }

    pub fn has_pending_impulse(&self) -> bool {
        self.states.iter().any(|s| s.impulse_requested)
    }

    pub fn handle(&mut self, event: PointerEvent) -> Result<()> {
        let (PointerEvent::Enter(id) | PointerEvent::Leave(id) | PointerEvent::Click(id)) = event;
        let state = self
            .states
            .get_mut(id.0)
            .ok_or(PlaygroundError::UnknownEntity(id))?;
        match event {
            PointerEvent::Enter(_) => state.hovered = true,
            PointerEvent::Leave(_) => state.hovered = false,
            PointerEvent::Click(_) => state.impulse_requested = true,
        }
        Ok(())
    }

    /// Consume pending requests. Returns the number of velocities written.
    pub fn consume<W: PhysicsWorld + ?Sized, C: ViewCamera + ?Sized>(
        &mut self,
        registry: &BodyRegistry,
        world: &mut W,
        camera: &C,
    ) -> u32 {
        let mut applied = 0;
        let mut direction = None;
        for (index, state) in self.states.iter_mut().enumerate() {
            if !std::mem::take(&mut state.impulse_requested) {
                continue;
            }
            let Some(handle) = registry.dynamic_handle(EntityId(index)) else {
                log::debug!("Click on non-dynamic entity {index} ignored");
                continue;
            };
            let dir = *direction.get_or_insert_with(|| camera.view_direction());
            match impulse_velocity(dir, self.impulse_speed) {
                Ok(velocity) => {
                    world.set_velocity(handle, velocity);
                    applied += 1;
                    log::trace!("Impulse on entity {index}: {velocity}");
                }
                Err(e) => log::debug!("Impulse skipped for entity {index}: {e}"),
            }
        }
        applied
    }
}
