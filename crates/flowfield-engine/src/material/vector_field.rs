use std::cell::{Cell, RefCell};
use std::rc::Rc;

use bytemuck::{Pod, Zeroable};

use super::pipeline::{PipelineCache, PipelineSpec, build_pipeline, program_pipeline};
use super::{Material, MaterialCtx, PipelineKey};
use crate::gpu::GraphicsTexture;
use crate::interop::Owner;
use crate::mesh::{DrawError, Mesh};
use crate::shader::SharedProgram;

/// Group-1 uniform of the vector-field shader.
///
/// `samples.xyz` is the glyph grid; the vertex shader derives each glyph's grid
/// cell from `instance_index`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable, PartialEq, Eq)]
pub struct FieldParams {
    pub samples: [u32; 4],
}

struct Bindings {
    layout: wgpu::BindGroupLayout,
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Draws the field as a grid of line glyphs sampled from the volume texture.
pub struct VectorFieldMaterial {
    program: SharedProgram,
    field: Rc<GraphicsTexture>,
    samples: Cell<[u32; 3]>,
    bindings: RefCell<Option<Bindings>>,
    pipelines: PipelineCache,
}

impl VectorFieldMaterial {
    pub fn new(program: SharedProgram, field: Rc<GraphicsTexture>, samples: [u32; 3]) -> Self {
        Self {
            program,
            field,
            samples: Cell::new(samples.map(|s| s.max(1))),
            bindings: RefCell::new(None),
            pipelines: PipelineCache::default(),
        }
    }

    pub fn program(&self) -> &SharedProgram {
        &self.program
    }

    pub fn samples(&self) -> [u32; 3] {
        self.samples.get()
    }

    /// Glyph grid resolution. Returns the glyph (instance) count.
    pub fn set_samples(&self, samples: [u32; 3]) -> u32 {
        let samples = samples.map(|s| s.max(1));
        self.samples.set(samples);
        samples.iter().product()
    }

    pub fn set_sample_axis(&self, axis: usize, value: u32) -> u32 {
        let mut samples = self.samples.get();
        if let Some(s) = samples.get_mut(axis) {
            *s = value;
        }
        self.set_samples(samples)
    }

    pub fn glyph_count(&self) -> u32 {
        self.samples.get().iter().product()
    }

    fn uniform(&self) -> FieldParams {
        let [x, y, z] = self.samples.get();
        FieldParams {
            samples: [x, y, z, 0],
        }
    }

    fn ensure_bindings(&self, ctx: &MaterialCtx<'_>) {
        if self.bindings.borrow().is_some() {
            return;
        }

        let layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("flowfield vector field bgl"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(
                                std::mem::size_of::<FieldParams>() as u64,
                            ),
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: false },
                            view_dimension: wgpu::TextureViewDimension::D3,
                            multisampled: false,
                        },
                        count: None,
                    },
                ],
            });

        let uniform = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("flowfield vector field params"),
            size: std::mem::size_of::<FieldParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("flowfield vector field bind group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(self.field.view()),
                },
            ],
        });

        *self.bindings.borrow_mut() = Some(Bindings {
            layout,
            uniform,
            bind_group,
        });
    }
}

impl Material for VectorFieldMaterial {
    fn name(&self) -> &str {
        "vector field"
    }

    fn apply(
        &self,
        mesh: &Mesh,
        ctx: &MaterialCtx<'_>,
        pass: &mut wgpu::RenderPass<'_>,
    ) -> Result<(), DrawError> {
        if self.field.owner() == Owner::Compute {
            return Err(DrawError::ComputeOwned(self.field.label().to_owned()));
        }

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
                    label: "flowfield vector field pipeline",
                    material_layout: &bindings.layout,
                    vertex_layout: layout,
                    topology: mesh.mode().topology(),
                    blend: wgpu::BlendState::ALPHA_BLENDING,
                },
            )
        })?;

        ctx.queue
            .write_buffer(&bindings.uniform, 0, bytemuck::bytes_of(&self.uniform()));

        pass.set_pipeline(&pipeline);
        pass.set_bind_group(1, &bindings.bind_group, &[]);
        Ok(())
    }
}
