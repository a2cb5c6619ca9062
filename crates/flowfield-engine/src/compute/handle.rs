use crate::gpu::{GraphicsBuffer, GraphicsTexture};
use crate::interop::{ResourceId, SharedAlias, TokenRef};

/// Compute-side alias of a [`GraphicsBuffer`]. Same memory, no copy.
///
/// Goes stale as soon as the graphics buffer is destroyed or dropped; a stale
/// alias fails at acquire time and must be re-imported.
#[derive(Debug, Clone)]
pub struct ComputeBuffer {
    buffer: wgpu::Buffer,
    size: u64,
    token: TokenRef,
}

impl ComputeBuffer {
    pub(super) fn alias(src: &GraphicsBuffer) -> Self {
        Self {
            buffer: src.raw().clone(),
            size: src.size(),
            token: src.share(),
        }
    }

    pub(super) fn raw(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn id(&self) -> ResourceId {
        self.token.id()
    }

    pub fn is_stale(&self) -> bool {
        self.token.is_stale()
    }
}

impl SharedAlias for ComputeBuffer {
    fn token_ref(&self) -> &TokenRef {
        &self.token
    }
}

/// Compute-side alias of a [`GraphicsTexture`], bound as a sampled (read-only) image.
#[derive(Debug, Clone)]
pub struct ComputeImage {
    view: wgpu::TextureView,
    dims: [u32; 3],
    token: TokenRef,
}

impl ComputeImage {
    pub(super) fn alias(src: &GraphicsTexture) -> Self {
        Self {
            view: src.view().clone(),
            dims: src.dims(),
            token: src.share(),
        }
    }

    pub(super) fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn dims(&self) -> [u32; 3] {
        self.dims
    }

    pub fn id(&self) -> ResourceId {
        self.token.id()
    }

    pub fn is_stale(&self) -> bool {
        self.token.is_stale()
    }
}

impl SharedAlias for ComputeImage {
    fn token_ref(&self) -> &TokenRef {
        &self.token
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KernelBufferKind {
    /// Read-write storage, e.g. per-particle RNG state.
    Storage,
    /// Small constant block, e.g. the field bounding box.
    Uniform,
}

/// Buffer private to the compute pipeline. Never shared, never acquired.
#[derive(Debug)]
pub struct KernelBuffer {
    buffer: wgpu::Buffer,
    label: String,
    size: u64,
    kind: KernelBufferKind,
}

impl KernelBuffer {
    pub(super) fn new(buffer: wgpu::Buffer, label: &str, kind: KernelBufferKind) -> Self {
        Self {
            size: buffer.size(),
            buffer,
            label: label.to_owned(),
            kind,
        }
    }

    pub(super) fn raw(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn kind(&self) -> KernelBufferKind {
        self.kind
    }

    pub fn destroy(self) {
        self.buffer.destroy();
    }
}
