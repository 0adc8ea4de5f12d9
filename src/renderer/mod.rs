//! Rendering data
//!
//! The frame loop only mutates renderables. This module turns them into
//! GPU-ready records (instance buffers, meshes) and maps the governor's
//! render quality onto wgpu configuration. Device and surface setup stay
//! with the host application.

pub mod shapes;
pub mod vertex;

pub use shapes::{Mesh, mesh_for};
pub use vertex::{InstanceRaw, MeshVertex};

use glam::Mat4;

use crate::governor::{PerformanceGovernor, RenderQuality};
use crate::settings::PowerPreference;
use crate::sim::{EntityId, InteractionController, Renderable, Surface};

pub fn power_preference(quality: &RenderQuality) -> wgpu::PowerPreference {
    match quality.power_preference {
        PowerPreference::Default => wgpu::PowerPreference::None,
        PowerPreference::LowPower => wgpu::PowerPreference::LowPower,
        PowerPreference::HighPerformance => wgpu::PowerPreference::HighPerformance,
    }
}

pub fn multisample_state(governor: &PerformanceGovernor) -> wgpu::MultisampleState {
    wgpu::MultisampleState {
        count: governor.sample_count(),
        mask: !0,
        alpha_to_coverage_enabled: false,
    }
}

/// Build one instance record per renderable. `out` is cleared and reused
/// so the per-frame path does not allocate once it has grown.
pub fn write_instances(
    renderables: &[Renderable],
    interaction: &InteractionController,
    out: &mut Vec<InstanceRaw>,
) {
    out.clear();
    out.extend(renderables.iter().enumerate().map(|(i, renderable)| {
        let hovered = interaction.is_hovered(EntityId(i));
        let material = &renderable.material;
        let (color, textured) = match material.surface(hovered) {
            // Texture modulated by white
            Surface::Textured(_) => ([1.0; 4], 1.0),
            Surface::Solid(color) => (color, 0.0),
        };
        let transform = renderable.transform;
        InstanceRaw {
            model: Mat4::from_rotation_translation(transform.rotation, transform.position)
                .to_cols_array_2d(),
            color,
            material: [material.metalness, material.roughness, textured, 0.0],
        }
    }));
}

pub fn instance_bytes(instances: &[InstanceRaw]) -> &[u8] {
    bytemuck::cast_slice(instances)
}
