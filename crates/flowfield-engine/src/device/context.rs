use anyhow::{Context, Result};

use super::GpuInit;

/// Adapter + device + queue shared by the render and compute pipelines.
///
/// wgpu handles are reference counted, so cloning a `GpuContext` hands out
/// another view of the *same* device. This is the "combined context": buffers
/// created through one clone are directly usable by every other clone without
/// copies, which is what the interop layer builds on.
#[derive(Clone, Debug)]
pub struct GpuContext {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl GpuContext {
    /// Requests an adapter (optionally compatible with `surface`) and opens a device on it.
    pub async fn new(
        instance: &wgpu::Instance,
        surface: Option<&wgpu::Surface<'_>>,
        init: &GpuInit,
    ) -> Result<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: surface,
                force_fallback_adapter: init.force_fallback_adapter,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::info!(
            "selected adapter: {} ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("flowfield device"),
                required_features: init.required_features,
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        Ok(Self {
            adapter,
            device,
            queue,
        })
    }

    /// Opens a device without any surface. Blocks on adapter/device acquisition.
    ///
    /// Used by tools and tests that only need compute + offscreen work.
    pub fn headless(init: &GpuInit) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        pollster::block_on(Self::new(&instance, None, init))
    }

    /// Returns the selected adapter.
    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Returns adapter name/backend information for diagnostics.
    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Whether this device can run compute kernels over buffers the render side also binds.
    ///
    /// Downlevel backends (e.g. WebGL2) lack compute shaders; the interop layer
    /// refuses to start on those.
    pub fn supports_compute_interop(&self) -> bool {
        let caps = self.adapter.get_downlevel_capabilities();
        let limits = self.device.limits();
        caps.flags.contains(wgpu::DownlevelFlags::COMPUTE_SHADERS)
            && limits.max_storage_buffers_per_shader_stage >= 2
            && limits.max_compute_workgroups_per_dimension > 0
    }
}
