use super::Mesh;

/// Index of a mesh in a [`MeshStore`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct MeshId(u32);

/// Owns every mesh of a scene; graph nodes refer to meshes by id.
#[derive(Debug, Default)]
pub struct MeshStore {
    meshes: Vec<Mesh>,
}

impl MeshStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() as u32 - 1)
    }

    pub fn get(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.get_mut(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Frees the GPU buffers of every mesh.
    pub fn destroy_all(&mut self) {
        for mesh in &mut self.meshes {
            mesh.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::PrimitiveMode;

    #[test]
    fn ids_follow_insertion() {
        let mut store = MeshStore::new();
        let a = store.insert(Mesh::new("a", PrimitiveMode::Points));
        let b = store.insert(Mesh::new("b", PrimitiveMode::Lines));
        assert_ne!(a, b);
        assert_eq!(store.get(b).map(|m| m.label()), Some("b"));
        assert_eq!(store.len(), 2);
    }
}
