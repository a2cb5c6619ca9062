use glam::Mat4;

use super::{CameraMatrices, NodeId};
use crate::mesh::MeshId;

/// A single draw item: the node that produced it, its mesh and world matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub node: NodeId,
    pub mesh: MeshId,
    pub world: Mat4,
}

/// Recorded draw stream for a frame.
///
/// Filled by [`SceneGraph::draw`](super::SceneGraph::draw) in traversal order and
/// consumed by the renderer in the same order.
///
/// - `push()` is O(1)
/// - `begin()` keeps allocated capacity, so a warmed list does not allocate
#[derive(Debug, Default)]
pub struct DrawList {
    items: Vec<DrawItem>,
    camera: CameraMatrices,
}

impl DrawList {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears recorded items and sets the camera for the new frame.
    #[inline]
    pub fn begin(&mut self, camera: CameraMatrices) {
        self.items.clear();
        self.camera = camera;
    }

    #[inline]
    pub fn push(&mut self, node: NodeId, mesh: MeshId, world: Mat4) {
        self.items.push(DrawItem { node, mesh, world });
    }

    /// Returns items in traversal order.
    #[inline]
    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }

    #[inline]
    pub fn camera(&self) -> &CameraMatrices {
        &self.camera
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
