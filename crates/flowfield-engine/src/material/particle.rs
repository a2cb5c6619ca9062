use std::cell::{Cell, RefCell};

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::pipeline::{
    PipelineCache, PipelineSpec, additive_blend, build_pipeline, program_pipeline,
};
use super::{Material, MaterialCtx, PipelineKey};
use crate::mesh::{DrawError, Mesh};
use crate::shader::SharedProgram;

/// Group-1 block of the particle shader (32 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable, PartialEq)]
pub struct ParticleParams {
    pub tint: [f32; 4],
    /// Lifetime the age is normalized against for fading.
    pub max_life: f32,
    pub _pad: [f32; 3],
}

impl Default for ParticleParams {
    fn default() -> Self {
        Self {
            tint: [0.35, 0.6, 1.0, 0.6],
            max_life: 100.0,
            _pad: [0.0; 3],
        }
    }
}

struct Bindings {
    layout: wgpu::BindGroupLayout,
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Additively blended point sprites coloured by velocity and age.
pub struct ParticleMaterial {
    program: SharedProgram,
    params: Cell<ParticleParams>,
    bindings: RefCell<Option<Bindings>>,
    pipelines: PipelineCache,
}

impl ParticleMaterial {
    pub fn new(program: SharedProgram) -> Self {
        Self {
            program,
            params: Cell::new(ParticleParams::default()),
            bindings: RefCell::new(None),
            pipelines: PipelineCache::default(),
        }
    }

    pub fn program(&self) -> &SharedProgram {
        &self.program
    }

    pub fn params(&self) -> ParticleParams {
        self.params.get()
    }

    pub fn set_params(&self, params: ParticleParams) {
        self.params.set(params);
    }

    fn ensure_bindings(&self, ctx: &MaterialCtx<'_>) {
        if self.bindings.borrow().is_some() {
            return;
        }

        let layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("flowfield particle bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<ParticleParams>() as u64,
                        ),
                    },
                    count: None,
                }],
            });

        let uniform = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("flowfield particle params"),
                contents: bytemuck::bytes_of(&self.params.get()),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("flowfield particle bind group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            }],
        });

        *self.bindings.borrow_mut() = Some(Bindings {
            layout,
            uniform,
            bind_group,
        });
    }
}

impl Material for ParticleMaterial {
    fn name(&self) -> &str {
        "particle"
    }

    fn apply(
        &self,
        mesh: &Mesh,
        ctx: &MaterialCtx<'_>,
        pass: &mut wgpu::RenderPass<'_>,
    ) -> Result<(), DrawError> {
        {
            let program = self.program.borrow();
            if !program.is_ready() {
                return Err(DrawError::ProgramNotReady(program.label().to_owned()));
            }
        }
        let layout = mesh
            .layout()
            .ok_or_else(|| DrawError::NotInitialized(mesh.label().to_owned()))?;

        self.ensure_bindings(ctx);
        let bindings = self.bindings.borrow();
        let Some(bindings) = bindings.as_ref() else {
            return Err(DrawError::NotInitialized(self.name().to_owned()));
        };

        let key = |generation: u64| PipelineKey {
            generation,
            layout: layout.clone(),
            topology: mesh.mode().topology(),
            format: ctx.surface_format,
        };
        let pipeline = program_pipeline(&self.program, &self.pipelines, key, |program| {
            build_pipeline(
                ctx,
                program,
                &PipelineSpec {
                    label: "flowfield particle pipeline",
                    material_layout: &bindings.layout,
                    vertex_layout: layout,
                    topology: mesh.mode().topology(),
                    blend: additive_blend(),
                },
            )
        })?;

        ctx.queue
            .write_buffer(&bindings.uniform, 0, bytemuck::bytes_of(&self.params.get()));

        pass.set_pipeline(&pipeline);
        pass.set_bind_group(1, &bindings.bind_group, &[]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_block_matches_wgsl_size() {
        assert_eq!(std::mem::size_of::<ParticleParams>(), 32);
    }
}
