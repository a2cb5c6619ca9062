use glam::{Mat4, Quat, Vec3};
use thiserror::Error;

use super::{CameraMatrices, DrawList};
use crate::mesh::MeshId;

/// Local transform of a node: scale, then rotate, then translate.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub orientation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.orientation, self.position)
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation.normalize();
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    /// Post-multiplies the orientation by a rotation of `angle` radians about `axis`.
    pub fn rotate(&mut self, axis: Vec3, angle: f32) {
        self.set_orientation(self.orientation * Quat::from_axis_angle(axis.normalize(), angle));
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("node {0:?} already has a parent")]
    AlreadyParented(NodeId),

    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
}

#[derive(Debug)]
struct Node {
    label: String,
    transform: Transform,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    mesh: Option<MeshId>,
}

/// Arena-backed scene tree.
///
/// Nodes are created detached and attached with [`SceneGraph::add_child`]; only
/// nodes reachable from the root are drawn. World transforms compose top-down:
/// `world(child) = world(parent) * local(child)`.
#[derive(Debug)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        graph.root = graph.add_node("root");
        graph
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Creates a detached node.
    pub fn add_node(&mut self, label: impl Into<String>) -> NodeId {
        self.nodes.push(Node {
            label: label.into(),
            transform: Transform::default(),
            parent: None,
            children: Vec::new(),
            mesh: None,
        });
        NodeId(self.nodes.len() as u32 - 1)
    }

    pub fn add_mesh_node(&mut self, label: impl Into<String>, mesh: MeshId) -> NodeId {
        let id = self.add_node(label);
        self.nodes[id.0 as usize].mesh = Some(mesh);
        id
    }

    /// Appends `child` to `parent`'s ordered child list.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), GraphError> {
        self.node(parent)?;
        if self.node(child)?.parent.is_some() {
            return Err(GraphError::AlreadyParented(child));
        }

        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(GraphError::Cycle { parent, child });
            }
            cursor = self.nodes[id.0 as usize].parent;
        }

        self.nodes[child.0 as usize].parent = Some(parent);
        self.nodes[parent.0 as usize].children.push(child);
        Ok(())
    }

    pub fn label(&self, id: NodeId) -> Result<&str, GraphError> {
        Ok(&self.node(id)?.label)
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, GraphError> {
        Ok(self.node(id)?.parent)
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId], GraphError> {
        Ok(&self.node(id)?.children)
    }

    pub fn mesh(&self, id: NodeId) -> Result<Option<MeshId>, GraphError> {
        Ok(self.node(id)?.mesh)
    }

    pub fn set_mesh(&mut self, id: NodeId, mesh: Option<MeshId>) -> Result<(), GraphError> {
        self.node_mut(id)?.mesh = mesh;
        Ok(())
    }

    pub fn transform(&self, id: NodeId) -> Result<&Transform, GraphError> {
        Ok(&self.node(id)?.transform)
    }

    pub fn transform_mut(&mut self, id: NodeId) -> Result<&mut Transform, GraphError> {
        Ok(&mut self.node_mut(id)?.transform)
    }

    /// World matrix of `id`, composed from the root down.
    pub fn world_transform(&self, id: NodeId) -> Result<Mat4, GraphError> {
        let node = self.node(id)?;
        let parent_world = match node.parent {
            Some(p) => self.world_transform(p)?,
            None => Mat4::IDENTITY,
        };
        Ok(parent_world * node.transform.matrix())
    }

    /// Records every mesh reachable from the root into `list`, pre-order, children
    /// in insertion order.
    pub fn draw(&self, camera: CameraMatrices, list: &mut DrawList) {
        list.begin(camera);
        self.visit(self.root, Mat4::IDENTITY, list);
    }

    fn visit(&self, id: NodeId, parent_world: Mat4, list: &mut DrawList) {
        let node = &self.nodes[id.0 as usize];
        let world = parent_world * node.transform.matrix();

        if let Some(mesh) = node.mesh {
            list.push(id, mesh, world);
        }
        for &child in &node.children {
            self.visit(child, world, list);
        }
    }

    fn node(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.nodes
            .get(id.0 as usize)
            .ok_or(GraphError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, GraphError> {
        self.nodes
            .get_mut(id.0 as usize)
            .ok_or(GraphError::UnknownNode(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Mesh, MeshStore, PrimitiveMode};

    fn meshes(n: usize) -> Vec<MeshId> {
        let mut store = MeshStore::new();
        (0..n)
            .map(|i| store.insert(Mesh::new(format!("m{i}"), PrimitiveMode::Points)))
            .collect()
    }

    #[test]
    fn traversal_is_preorder_in_insertion_order() {
        let m = meshes(5);
        let mut g = SceneGraph::new();
        let a = g.add_mesh_node("a", m[0]);
        let b = g.add_mesh_node("b", m[1]);
        let a1 = g.add_mesh_node("a1", m[2]);
        let a2 = g.add_mesh_node("a2", m[3]);
        let b1 = g.add_mesh_node("b1", m[4]);
        let group = g.add_node("group");

        g.add_child(g.root(), a).unwrap();
        g.add_child(g.root(), b).unwrap();
        g.add_child(a, a1).unwrap();
        g.add_child(a, group).unwrap();
        g.add_child(group, a2).unwrap();
        g.add_child(b, b1).unwrap();

        let mut list = DrawList::new();
        g.draw(CameraMatrices::default(), &mut list);
        let order: Vec<_> = list.items().iter().map(|i| i.node).collect();
        assert_eq!(order, vec![a, a1, a2, b, b1]);
    }

    #[test]
    fn moving_a_parent_moves_descendants_by_the_same_delta() {
        let m = meshes(2);
        let mut g = SceneGraph::new();
        let parent = g.add_node("parent");
        let child = g.add_mesh_node("child", m[0]);
        let grandchild = g.add_mesh_node("grandchild", m[1]);
        g.add_child(g.root(), parent).unwrap();
        g.add_child(parent, child).unwrap();
        g.add_child(child, grandchild).unwrap();
        g.transform_mut(child).unwrap().set_position(Vec3::new(1.0, 0.0, 0.0));
        g.transform_mut(grandchild).unwrap().set_position(Vec3::new(0.0, 2.0, 0.0));

        let before = |g: &SceneGraph, id| g.world_transform(id).unwrap().w_axis.truncate();
        let child_before = before(&g, child);
        let grand_before = before(&g, grandchild);
        let local_before = *g.transform(child).unwrap();

        let delta = Vec3::new(-3.0, 0.5, 4.0);
        g.transform_mut(parent).unwrap().set_position(delta);

        assert!((before(&g, child) - (child_before + delta)).length() < 1e-5);
        assert!((before(&g, grandchild) - (grand_before + delta)).length() < 1e-5);
        assert_eq!(*g.transform(child).unwrap(), local_before);
    }

    #[test]
    fn world_composes_scale_and_rotation() {
        let mut g = SceneGraph::new();
        let parent = g.add_node("parent");
        let child = g.add_node("child");
        g.add_child(g.root(), parent).unwrap();
        g.add_child(parent, child).unwrap();
        g.transform_mut(parent).unwrap().set_scale(Vec3::splat(2.0));
        g.transform_mut(child).unwrap().set_position(Vec3::new(1.0, 0.0, 0.0));

        let p = g.world_transform(child).unwrap().transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn reparenting_is_rejected() {
        let mut g = SceneGraph::new();
        let a = g.add_node("a");
        let b = g.add_node("b");
        g.add_child(g.root(), a).unwrap();
        assert_eq!(g.add_child(b, a), Err(GraphError::AlreadyParented(a)));
    }

    #[test]
    fn cycles_are_rejected() {
        let mut g = SceneGraph::new();
        let a = g.add_node("a");
        let b = g.add_node("b");
        g.add_child(a, b).unwrap();
        assert_eq!(
            g.add_child(b, a),
            Err(GraphError::Cycle {
                parent: b,
                child: a
            })
        );

        let root = g.root();
        g.add_child(root, a).unwrap();
        assert_eq!(
            g.add_child(b, root),
            Err(GraphError::Cycle {
                parent: b,
                child: root
            })
        );
    }

    #[test]
    fn detached_nodes_are_not_drawn() {
        let m = meshes(1);
        let mut g = SceneGraph::new();
        g.add_mesh_node("floating", m[0]);
        let mut list = DrawList::new();
        g.draw(CameraMatrices::default(), &mut list);
        assert!(list.is_empty());
    }
}
