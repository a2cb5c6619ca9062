use std::rc::Rc;

use super::{AttributeLayout, DrawError, MeshError};
use crate::gpu::GraphicsBuffer;
use crate::interop::Owner;
use crate::material::{Material, MaterialCtx};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveMode {
    #[default]
    Points,
    Lines,
    Triangles,
}

impl PrimitiveMode {
    pub fn topology(self) -> wgpu::PrimitiveTopology {
        match self {
            Self::Points => wgpu::PrimitiveTopology::PointList,
            Self::Lines => wgpu::PrimitiveTopology::LineList,
            Self::Triangles => wgpu::PrimitiveTopology::TriangleList,
        }
    }
}

/// The single draw call a mesh issues.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DrawCall {
    Arrays { vertices: u32, instances: u32 },
    Indexed { indices: u32, instances: u32 },
}

impl DrawCall {
    /// Point meshes and meshes without indices draw arrays; everything else is indexed.
    pub fn plan(mode: PrimitiveMode, indexed: bool, count: u32, instances: u32) -> Self {
        if mode == PrimitiveMode::Points || !indexed {
            Self::Arrays {
                vertices: count,
                instances,
            }
        } else {
            Self::Indexed {
                indices: count,
                instances,
            }
        }
    }
}

/// Vertex buffer, optional index buffer and the material that draws them.
///
/// A *shareable* mesh allocates its vertex buffer with `STORAGE` usage so a
/// compute kernel can import it. Every (re)initialization replaces the buffers,
/// which invalidates any compute alias of the previous ones.
pub struct Mesh {
    label: String,
    mode: PrimitiveMode,
    shareable: bool,
    layout: Option<AttributeLayout>,
    vertices: Option<GraphicsBuffer>,
    indices: Option<GraphicsBuffer>,
    count: u32,
    instances: u32,
    material: Option<Rc<dyn Material>>,
}

impl Mesh {
    pub fn new(label: impl Into<String>, mode: PrimitiveMode) -> Self {
        Self {
            label: label.into(),
            mode,
            shareable: false,
            layout: None,
            vertices: None,
            indices: None,
            count: 0,
            instances: 1,
            material: None,
        }
    }

    pub fn shareable(mut self, shareable: bool) -> Self {
        self.shareable = shareable;
        self
    }

    /// (Re)creates the vertex buffer from interleaved `vertex_data`.
    pub fn initialize(
        &mut self,
        device: &wgpu::Device,
        vertex_data: &[f32],
        layout: AttributeLayout,
    ) -> Result<(), MeshError> {
        let count = self.replace_vertices(device, vertex_data, &layout)?;
        self.replace_indices(None);
        self.count = count;
        self.layout = Some(layout);
        Ok(())
    }

    /// As [`initialize`](Self::initialize), plus an index buffer. The draw count
    /// becomes the index count.
    pub fn initialize_indexed(
        &mut self,
        device: &wgpu::Device,
        vertex_data: &[f32],
        layout: AttributeLayout,
        index_data: &[u32],
    ) -> Result<(), MeshError> {
        let vertices = layout.vertex_count(vertex_data.len())?;
        if let Some(&index) = index_data.iter().find(|&&i| i >= vertices) {
            return Err(MeshError::IndexOutOfRange { index, vertices });
        }

        self.replace_vertices(device, vertex_data, &layout)?;
        let indices = GraphicsBuffer::from_data(
            device,
            &format!("{} indices", self.label),
            bytemuck::cast_slice(index_data),
            std::mem::size_of::<u32>() as u64,
            wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        );
        self.replace_indices(Some(indices));
        self.count = index_data.len() as u32;
        self.layout = Some(layout);
        Ok(())
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn mode(&self) -> PrimitiveMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: PrimitiveMode) {
        self.mode = mode;
    }

    pub fn layout(&self) -> Option<&AttributeLayout> {
        self.layout.as_ref()
    }

    pub fn vertex_buffer(&self) -> Option<&GraphicsBuffer> {
        self.vertices.as_ref()
    }

    /// Vertices drawn, or indices when the mesh is indexed.
    pub fn vertex_count(&self) -> u32 {
        self.count
    }

    pub fn instances(&self) -> u32 {
        self.instances
    }

    pub fn set_instances(&mut self, instances: u32) {
        self.instances = instances;
    }

    pub fn material(&self) -> Option<&Rc<dyn Material>> {
        self.material.as_ref()
    }

    pub fn set_material(&mut self, material: Rc<dyn Material>) {
        self.material = Some(material);
    }

    pub fn draw_call(&self) -> DrawCall {
        DrawCall::plan(self.mode, self.indices.is_some(), self.count, self.instances)
    }

    /// Applies the material and records the draw into `pass`.
    pub fn draw(
        &self,
        ctx: &MaterialCtx<'_>,
        pass: &mut wgpu::RenderPass<'_>,
    ) -> Result<DrawCall, DrawError> {
        let vertices = self
            .vertices
            .as_ref()
            .ok_or_else(|| DrawError::NotInitialized(self.label.clone()))?;
        if vertices.owner() == Owner::Compute {
            return Err(DrawError::ComputeOwned(vertices.label().to_owned()));
        }
        let material = self
            .material
            .as_ref()
            .ok_or_else(|| DrawError::NoMaterial(self.label.clone()))?;

        material.apply(self, ctx, pass)?;
        pass.set_vertex_buffer(0, vertices.raw().slice(..));

        let call = self.draw_call();
        match call {
            DrawCall::Arrays {
                vertices,
                instances,
            } => pass.draw(0..vertices, 0..instances),
            DrawCall::Indexed { indices, instances } => {
                if let Some(ib) = self.indices.as_ref() {
                    pass.set_index_buffer(ib.raw().slice(..), wgpu::IndexFormat::Uint32);
                }
                pass.draw_indexed(0..indices, 0, 0..instances);
            }
        }
        Ok(call)
    }

    /// Frees the GPU buffers. The mesh can be initialized again afterwards.
    pub fn destroy(&mut self) {
        if let Some(v) = self.vertices.take() {
            v.destroy();
        }
        self.replace_indices(None);
        self.count = 0;
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn replace_vertices(
        &mut self,
        device: &wgpu::Device,
        data: &[f32],
        layout: &AttributeLayout,
    ) -> Result<u32, MeshError> {
        if data.is_empty() {
            return Err(MeshError::Empty(self.label.clone()));
        }
        let count = layout.vertex_count(data.len())?;

        let mut usage = wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST;
        if self.shareable {
            usage |= wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC;
        }

        let buffer = GraphicsBuffer::from_data(
            device,
            &format!("{} vertices", self.label),
            bytemuck::cast_slice(data),
            layout.stride_bytes(),
            usage,
        );

        if let Some(old) = self.vertices.replace(buffer) {
            log::debug!("mesh `{}` re-initialized; {} is gone", self.label, old.id());
            old.destroy();
        }
        Ok(count)
    }

    fn replace_indices(&mut self, indices: Option<GraphicsBuffer>) {
        if let Some(old) = std::mem::replace(&mut self.indices, indices) {
            old.destroy();
        }
    }
}

impl std::fmt::Debug for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("label", &self.label)
            .field("mode", &self.mode)
            .field("count", &self.count)
            .field("instances", &self.instances)
            .field("indexed", &self.indices.is_some())
            .field("material", &self.material.as_ref().map(|m| m.name().to_owned()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_ignore_indices() {
        assert_eq!(
            DrawCall::plan(PrimitiveMode::Points, true, 12, 1),
            DrawCall::Arrays {
                vertices: 12,
                instances: 1
            }
        );
    }

    #[test]
    fn unindexed_lines_draw_arrays() {
        assert_eq!(
            DrawCall::plan(PrimitiveMode::Lines, false, 2, 1000),
            DrawCall::Arrays {
                vertices: 2,
                instances: 1000
            }
        );
    }

    #[test]
    fn indexed_triangles_draw_elements() {
        assert_eq!(
            DrawCall::plan(PrimitiveMode::Triangles, true, 36, 1),
            DrawCall::Indexed {
                indices: 36,
                instances: 1
            }
        );
    }

    #[test]
    fn new_mesh_is_uninitialized() {
        let mesh = Mesh::new("particles", PrimitiveMode::Points);
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.instances(), 1);
        assert!(mesh.vertex_buffer().is_none());
    }
}
