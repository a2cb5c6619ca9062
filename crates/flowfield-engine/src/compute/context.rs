use wgpu::util::DeviceExt;

use super::args::check_signature;
use super::kernel::Kernel;
use super::{
    ComputeBuffer, ComputeError, ComputeImage, KernelArg, KernelArgs, KernelBuffer,
    KernelBufferKind, KernelBuildOptions, KernelSource, WorkSize,
};
use crate::device::GpuContext;
use crate::gpu::{GraphicsBuffer, GraphicsTexture};
use crate::interop::{InteropLedger, ResourceId};

/// What one dispatch touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub acquired: Vec<ResourceId>,
    pub released: Vec<ResourceId>,
    pub work: WorkSize,
}

/// Compute pipeline bound to the render device.
///
/// Owns the kernel, the interop ledger and the scalar uniform block. All
/// submissions go through the shared queue; [`dispatch`](Self::dispatch) waits
/// for its own submission before returning.
#[derive(Debug)]
pub struct ComputeContext {
    gpu: GpuContext,
    kernel: Kernel,
    ledger: InteropLedger,
    scalars: Option<wgpu::Buffer>,
}

impl ComputeContext {
    /// Builds the kernel on the device the renderer uses.
    pub fn initialize(
        gpu: &GpuContext,
        source: &KernelSource,
        options: &KernelBuildOptions,
    ) -> Result<Self, ComputeError> {
        if !gpu.supports_compute_interop() {
            let adapter = gpu.adapter_info().name;
            log::error!("compute interop unavailable on `{adapter}`");
            return Err(ComputeError::SharingUnsupported { adapter });
        }

        let kernel = Kernel::build(gpu.device(), source, options).inspect_err(|e| {
            log::error!("kernel build failed: {e}");
        })?;

        log::info!(
            "kernel `{}` ready ({} bindings, workgroup {:?})",
            kernel.entry_point,
            kernel.bindings.len(),
            kernel.workgroup_size
        );

        Ok(Self {
            gpu: gpu.clone(),
            kernel,
            ledger: InteropLedger::new(),
            scalars: None,
        })
    }

    pub fn workgroup_size(&self) -> [u32; 3] {
        self.kernel.workgroup_size
    }

    pub fn ledger(&self) -> &InteropLedger {
        &self.ledger
    }

    /// Aliases a render-owned buffer for kernel access. Re-import after the
    /// buffer is recreated.
    pub fn import_buffer(&self, buffer: &GraphicsBuffer) -> Result<ComputeBuffer, ComputeError> {
        if !buffer.raw().usage().contains(wgpu::BufferUsages::STORAGE) {
            return Err(ComputeError::NotShareable {
                label: buffer.label().to_owned(),
            });
        }
        log::debug!("imported buffer `{}` ({})", buffer.label(), buffer.id());
        Ok(ComputeBuffer::alias(buffer))
    }

    pub fn import_texture(&self, texture: &GraphicsTexture) -> ComputeImage {
        log::debug!("imported texture `{}` ({})", texture.label(), texture.id());
        ComputeImage::alias(texture)
    }

    /// Allocates a compute-private buffer initialized with `contents`.
    pub fn create_buffer(&self, label: &str, contents: &[u8], kind: KernelBufferKind) -> KernelBuffer {
        let usage = match kind {
            KernelBufferKind::Storage => {
                wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC
            }
            KernelBufferKind::Uniform => wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        };
        let buffer = self
            .gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            });
        KernelBuffer::new(buffer, label, kind)
    }

    /// Queues a write ordered before the next submission.
    pub fn write_buffer(&self, buffer: &KernelBuffer, bytes: &[u8]) -> Result<(), ComputeError> {
        let len = bytes.len() as u64;
        if len > buffer.size() {
            return Err(ComputeError::WriteOutOfBounds {
                label: buffer.label().to_owned(),
                len,
                size: buffer.size(),
            });
        }
        self.gpu.queue().write_buffer(buffer.raw(), 0, bytes);
        Ok(())
    }

    /// Runs the kernel over `items` invocations.
    ///
    /// Order: scalar upload, batch acquire of every shared argument, bind,
    /// submit, wait, release. On any failure after the acquire the batch is
    /// still released before the error is returned.
    pub fn dispatch(
        &mut self,
        args: &KernelArgs<'_>,
        items: u32,
    ) -> Result<DispatchReport, ComputeError> {
        self.ledger.begin_dispatch();
        check_signature(&self.kernel.bindings, &args.signature())?;

        let work = WorkSize::for_items(
            items,
            self.kernel.workgroup_size,
            self.gpu.device().limits().max_compute_workgroups_per_dimension,
        );

        let scalar_bytes = args.scalar_bytes();
        if !scalar_bytes.is_empty() {
            self.upload_scalars(&scalar_bytes);
        }

        let batch = self.ledger.acquire(&args.shared_aliases()).inspect_err(|e| {
            log::error!("dispatch rejected: {e}");
        })?;
        let acquired = batch.ids();

        let waited = self.submit(args, work);
        let released = self.ledger.release(batch);

        waited.inspect_err(|e| log::error!("dispatch failed: {e}"))?;

        Ok(DispatchReport {
            acquired,
            released,
            work,
        })
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn upload_scalars(&mut self, bytes: &[u8]) {
        let len = bytes.len() as u64;
        let fits = self.scalars.as_ref().is_some_and(|b| b.size() >= len);
        if !fits {
            self.scalars = Some(self.gpu.device().create_buffer(&wgpu::BufferDescriptor {
                label: Some("flowfield kernel scalars"),
                size: len,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
        }
        if let Some(buf) = self.scalars.as_ref() {
            self.gpu.queue().write_buffer(buf, 0, bytes);
        }
    }

    fn submit(&self, args: &KernelArgs<'_>, work: WorkSize) -> Result<(), ComputeError> {
        if work.is_empty() {
            return Ok(());
        }

        let mut entries: Vec<wgpu::BindGroupEntry> = args
            .resources()
            .iter()
            .zip(&self.kernel.bindings)
            .map(|(arg, b)| wgpu::BindGroupEntry {
                binding: b.binding,
                resource: match *arg {
                    KernelArg::Shared(buf) => buf.raw().as_entire_binding(),
                    KernelArg::Private(buf) => buf.raw().as_entire_binding(),
                    KernelArg::Image(img) => wgpu::BindingResource::TextureView(img.view()),
                },
            })
            .collect();

        if let (Some(scalars), Some(b)) = (
            self.scalars.as_ref(),
            self.kernel.bindings.get(args.resources().len()),
        ) {
            entries.push(wgpu::BindGroupEntry {
                binding: b.binding,
                resource: scalars.as_entire_binding(),
            });
        }

        let device = self.gpu.device();
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("flowfield kernel bind group"),
            layout: &self.kernel.bind_group_layout,
            entries: &entries,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("flowfield compute encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("flowfield compute pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.kernel.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(work.groups[0], work.groups[1], work.groups[2]);
        }

        let index = self.gpu.queue().submit(Some(encoder.finish()));
        device
            .poll(wgpu::PollType::Wait {
                submission_index: Some(index),
                timeout: None,
            })
            .map_err(|e| ComputeError::Device(e.to_string()))?;
        Ok(())
    }
}
