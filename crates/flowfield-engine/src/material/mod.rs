//! Materials: the shader program plus uniform/texture state a mesh draws with.
//!
//! Bind group convention shared by every material shader:
//! - group 0: per-object uniform ([`ObjectUniform`]), owned by the renderer,
//!   bound with a dynamic offset before the mesh draws
//! - group 1: material parameters and textures

mod particle;
mod pipeline;
mod vector_field;

use bytemuck::{Pod, Zeroable};

use crate::mesh::{DrawError, Mesh};
use crate::scene::CameraMatrices;

pub use particle::{ParticleMaterial, ParticleParams};
pub use pipeline::PipelineKey;
pub use vector_field::{FieldParams, VectorFieldMaterial};

/// What a material needs from the frame to bind itself.
pub struct MaterialCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
    /// Layout of group 0; part of every material pipeline layout.
    pub object_layout: &'a wgpu::BindGroupLayout,
    pub camera: &'a CameraMatrices,
}

/// Binds a program and its parameters for one mesh draw.
pub trait Material {
    fn name(&self) -> &str;

    /// Sets the pipeline and group-1 bindings on `pass` for `mesh`.
    fn apply(
        &self,
        mesh: &Mesh,
        ctx: &MaterialCtx<'_>,
        pass: &mut wgpu::RenderPass<'_>,
    ) -> Result<(), DrawError>;
}

/// Group-0 block written by the renderer for every draw item.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct ObjectUniform {
    pub mvp: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
}

impl ObjectUniform {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    pub fn new(camera: &CameraMatrices, model: glam::Mat4) -> Self {
        Self {
            mvp: (camera.view_projection() * model).to_cols_array_2d(),
            model: model.to_cols_array_2d(),
        }
    }
}
