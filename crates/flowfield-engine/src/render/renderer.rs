use crate::material::{MaterialCtx, ObjectUniform};
use crate::mesh::{DrawError, MeshStore};
use crate::scene::DrawList;
use crate::shader::FrameTaskQueue;

use super::{RenderCtx, RenderTarget};

/// Per-frame counters.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct FrameStats {
    pub tasks_run: usize,
    pub draws: usize,
}

/// Draws a [`DrawList`] and runs deferred tasks at the frame boundary.
pub struct Renderer {
    clear: wgpu::Color,
    tasks: FrameTaskQueue,

    object_layout: Option<wgpu::BindGroupLayout>,
    object_ubo: Option<wgpu::Buffer>,
    object_bind_group: Option<wgpu::BindGroup>,
    object_capacity: usize,
    object_stride: u64,
    staging: Vec<u8>,
}

impl Renderer {
    pub fn new(clear: wgpu::Color) -> Self {
        Self {
            clear,
            tasks: FrameTaskQueue::new(),
            object_layout: None,
            object_ubo: None,
            object_bind_group: None,
            object_capacity: 0,
            object_stride: 0,
            staging: Vec::new(),
        }
    }

    /// Queues `task` to run right before the next render pass.
    pub fn queue_before_render(&mut self, task: impl FnOnce() + 'static) {
        self.tasks.queue_before_render(task);
    }

    pub fn tasks_mut(&mut self) -> &mut FrameTaskQueue {
        &mut self.tasks
    }

    /// Runs pending tasks, then draws every item of `list` in order.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        list: &DrawList,
        meshes: &MeshStore,
    ) -> Result<FrameStats, DrawError> {
        let mut stats = FrameStats {
            tasks_run: self.tasks.drain(),
            draws: 0,
        };

        self.ensure_object_layout(ctx);
        self.ensure_object_capacity(ctx, list.len());
        self.write_object_uniforms(ctx, list);

        let Some(object_layout) = self.object_layout.as_ref() else {
            return Ok(stats);
        };
        let Some(object_bind_group) = self.object_bind_group.as_ref() else {
            return Ok(stats);
        };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("flowfield scene pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let mctx = MaterialCtx {
            device: ctx.device,
            queue: ctx.queue,
            surface_format: ctx.surface_format,
            object_layout,
            camera: list.camera(),
        };

        for (i, item) in list.items().iter().enumerate() {
            let Some(mesh) = meshes.get(item.mesh) else {
                log::warn!("draw item references missing mesh {:?}", item.mesh);
                continue;
            };
            let offset = (i as u64 * self.object_stride) as u32;
            rpass.set_bind_group(0, object_bind_group, &[offset]);
            mesh.draw(&mctx, &mut rpass)?;
            stats.draws += 1;
        }

        Ok(stats)
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn ensure_object_layout(&mut self, ctx: &RenderCtx<'_>) {
        if self.object_layout.is_some() {
            return;
        }

        let align = ctx.device.limits().min_uniform_buffer_offset_alignment as u64;
        self.object_stride = ObjectUniform::SIZE.next_multiple_of(align.max(1));

        self.object_layout = Some(ctx.device.create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                label: Some("flowfield object bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(ObjectUniform::SIZE),
                    },
                    count: None,
                }],
            },
        ));
    }

    fn ensure_object_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.object_capacity && self.object_ubo.is_some() {
            return;
        }
        let Some(layout) = self.object_layout.as_ref() else { return };

        let new_cap = required.next_power_of_two().max(8);
        let ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("flowfield object ubo"),
            size: new_cap as u64 * self.object_stride,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("flowfield object bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &ubo,
                    offset: 0,
                    size: wgpu::BufferSize::new(ObjectUniform::SIZE),
                }),
            }],
        });

        self.object_ubo = Some(ubo);
        self.object_bind_group = Some(bind_group);
        self.object_capacity = new_cap;
    }

    fn write_object_uniforms(&mut self, ctx: &RenderCtx<'_>, list: &DrawList) {
        let Some(ubo) = self.object_ubo.as_ref() else { return };
        if list.is_empty() {
            return;
        }

        let stride = self.object_stride as usize;
        self.staging.clear();
        self.staging.resize(list.len() * stride, 0);
        for (i, item) in list.items().iter().enumerate() {
            let uniform = ObjectUniform::new(list.camera(), item.world);
            let start = i * stride;
            self.staging[start..start + ObjectUniform::SIZE as usize]
                .copy_from_slice(bytemuck::bytes_of(&uniform));
        }
        ctx.queue.write_buffer(ubo, 0, &self.staging);
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(wgpu::Color::BLACK)
    }
}
