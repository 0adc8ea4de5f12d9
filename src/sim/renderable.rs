//! Visual counterparts of bodies

use super::body::Transform;
use crate::assets::{Resource, SharedBytes};

/// Geometry class; tessellation comes from the performance governor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeshKind {
    Sphere { radius: f32 },
    Plane { size: f32 },
    Torus { radius: f32, tube: f32 },
}

/// Resolved surface for this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Surface<'a> {
    Textured(&'a SharedBytes),
    Solid([f32; 4]),
}

#[derive(Debug, Clone)]
pub struct Material {
    pub base_color: [f32; 4],
    /// Replaces `base_color` while hovered
    pub hover_color: Option<[f32; 4]>,
    pub metalness: f32,
    pub roughness: f32,
    /// Surface texture; the base color stands in until it is ready
    pub texture: Option<Resource>,
}

impl Material {
    pub fn solid(base_color: [f32; 4]) -> Self {
        Self {
            base_color,
            hover_color: None,
            metalness: 0.0,
            roughness: 1.0,
            texture: None,
        }
    }

    pub fn color(&self, hovered: bool) -> [f32; 4] {
        match self.hover_color {
            Some(hover) if hovered => hover,
            _ => self.base_color,
        }
    }

    pub fn surface(&self, hovered: bool) -> Surface<'_> {
        match self.texture.as_ref().and_then(Resource::ready) {
            Some(bytes) => Surface::Textured(bytes),
            None => Surface::Solid(self.color(hovered)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Renderable {
    pub transform: Transform,
    pub mesh: MeshKind,
    pub material: Material,
}

impl Renderable {
    pub fn new(transform: Transform, mesh: MeshKind, material: Material) -> Self {
        Self {
            transform,
            mesh,
            material,
        }
    }
}
