use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::interop::{Owner, ResourceId, SharedToken, TokenRef};

/// A buffer owned by the render pipeline.
///
/// Holds the strong end of its [`SharedToken`]: compute aliases imported from this
/// buffer stay valid exactly as long as this value exists.
#[derive(Debug)]
pub struct GraphicsBuffer {
    buffer: wgpu::Buffer,
    size: u64,
    element_stride: u64,
    token: Arc<SharedToken>,
}

impl GraphicsBuffer {
    /// Allocates a buffer initialized with `contents`.
    ///
    /// `element_stride` is the byte size of one logical element (a vertex, an index);
    /// it only feeds [`element_count`](Self::element_count).
    pub fn from_data(
        device: &wgpu::Device,
        label: &str,
        contents: &[u8],
        element_stride: u64,
        usage: wgpu::BufferUsages,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage,
        });

        Self {
            buffer,
            size: contents.len() as u64,
            element_stride: element_stride.max(1),
            token: SharedToken::new(label),
        }
    }

    pub fn raw(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn element_stride(&self) -> u64 {
        self.element_stride
    }

    pub fn element_count(&self) -> u64 {
        self.size / self.element_stride
    }

    pub fn id(&self) -> ResourceId {
        self.token.id()
    }

    pub fn label(&self) -> &str {
        self.token.label()
    }

    /// Pipeline currently allowed to touch this memory.
    pub fn owner(&self) -> Owner {
        self.token.owner()
    }

    pub(crate) fn share(&self) -> TokenRef {
        SharedToken::downgrade(&self.token)
    }

    /// Copies the buffer into a staging buffer and blocks until it can be read.
    ///
    /// Requires `COPY_SRC` usage. Diagnostics and tests only.
    pub fn read_back(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> anyhow::Result<Vec<u8>> {
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("flowfield readback"),
            size: self.size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("flowfield readback encoder"),
        });
        encoder.copy_buffer_to_buffer(&self.buffer, 0, &staging, 0, self.size);
        let index = queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            if tx.send(result).is_err() {
                log::trace!("readback abandoned before mapping finished");
            }
        });
        device
            .poll(wgpu::PollType::Wait {
                submission_index: Some(index),
                timeout: None,
            })
            .map_err(|e| anyhow::anyhow!("device wait failed: {e}"))?;
        rx.recv()??;

        let bytes = slice.get_mapped_range().to_vec();
        staging.unmap();
        Ok(bytes)
    }

    /// Frees the GPU memory now. Compute aliases become stale immediately.
    pub fn destroy(self) {
        log::debug!("destroying buffer `{}` ({})", self.label(), self.id());
        self.buffer.destroy();
    }
}
