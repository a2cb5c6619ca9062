//! Scene graph, camera and the particle scene built on them.
//!
//! Responsibilities:
//! - own the node tree and compose world transforms top-down
//! - record a frame's draws into a [`DrawList`] in traversal order
//! - host [`ParticleScene`], which ties compute, meshes, materials and reload together

mod camera;
mod config;
mod controls;
mod graph;
mod list;
mod particles;
mod seed;

pub use camera::{Camera, CameraMatrices};
pub use config::{CameraConfig, ParticleSceneConfig, ShaderPaths};
pub use controls::{ControlState, SliderRange};
pub use graph::{GraphError, NodeId, SceneGraph, Transform};
pub use list::{DrawItem, DrawList};
pub use particles::{FieldAxis, ParticleScene};
pub use seed::{MAX_LIFETIME, PARTICLE_ATTRIBUTES, PARTICLE_STRIDE, seed_particles, seed_rng_state};
