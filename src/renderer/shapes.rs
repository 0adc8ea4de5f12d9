//! Mesh generation for the scene primitives

use std::f32::consts::{PI, TAU};

use glam::Vec3;

use super::vertex::MeshVertex;
use crate::governor::Tessellation;
use crate::sim::MeshKind;

/// Indexed triangle list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Two triangles for every cell of a `(columns + 1) x (rows + 1)` grid
    fn push_grid(&mut self, columns: u32, rows: u32) {
        let stride = columns + 1;
        for row in 0..rows {
            for col in 0..columns {
                let a = row * stride + col;
                let b = a + stride;
                self.indices.extend_from_slice(&[a, b, a + 1, b, b + 1, a + 1]);
            }
        }
    }
}

/// UV sphere with `segments` slices and stacks
pub fn sphere(radius: f32, segments: u32) -> Mesh {
    let segments = segments.max(3);
    let mut mesh = Mesh {
        vertices: Vec::with_capacity(((segments + 1) * (segments + 1)) as usize),
        indices: Vec::with_capacity((segments * segments * 6) as usize),
    };

    for stack in 0..=segments {
        let phi = stack as f32 / segments as f32 * PI;
        for slice in 0..=segments {
            let theta = slice as f32 / segments as f32 * TAU;
            let normal = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
            mesh.vertices
                .push(MeshVertex::new((normal * radius).to_array(), normal.to_array()));
        }
    }
    mesh.push_grid(segments, segments);
    mesh
}

/// Torus around the local Y axis
pub fn torus(radius: f32, tube: f32, radial: u32, tubular: u32) -> Mesh {
    let radial = radial.max(3);
    let tubular = tubular.max(3);
    let mut mesh = Mesh {
        vertices: Vec::with_capacity(((radial + 1) * (tubular + 1)) as usize),
        indices: Vec::with_capacity((radial * tubular * 6) as usize),
    };

    for r in 0..=radial {
        let v = r as f32 / radial as f32 * TAU;
        for t in 0..=tubular {
            let u = t as f32 / tubular as f32 * TAU;
            let ring = Vec3::new(u.cos(), 0.0, u.sin());
            let normal = ring * v.cos() + Vec3::Y * v.sin();
            let position = ring * radius + normal * tube;
            mesh.vertices
                .push(MeshVertex::new(position.to_array(), normal.to_array()));
        }
    }
    mesh.push_grid(tubular, radial);
    mesh
}

/// Square in the local XZ plane facing +Y
pub fn plane(size: f32) -> Mesh {
    let h = size * 0.5;
    let up = [0.0, 1.0, 0.0];
    Mesh {
        vertices: vec![
            MeshVertex::new([-h, 0.0, -h], up),
            MeshVertex::new([h, 0.0, -h], up),
            MeshVertex::new([-h, 0.0, h], up),
            MeshVertex::new([h, 0.0, h], up),
        ],
        indices: vec![0, 2, 1, 2, 3, 1],
    }
}

/// Mesh for a renderable at the governor's tessellation
pub fn mesh_for(kind: MeshKind, tessellation: &Tessellation) -> Mesh {
    match kind {
        MeshKind::Sphere { radius } => sphere(radius, tessellation.sphere_segments),
        MeshKind::Plane { size } => plane(size),
        MeshKind::Torus { radius, tube } => torus(
            radius,
            tube,
            tessellation.torus_radial,
            tessellation.torus_tubular,
        ),
    }
}
