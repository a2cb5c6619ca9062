//! Flowfield engine crate.
//!
//! A wgpu particle simulation in which a compute kernel updates particle state
//! in place inside the vertex buffer the render pass draws from. The render and
//! compute pipelines share one device; ownership of shared buffers moves
//! between them through an explicit acquire/release ledger.
//!
//! Layering, leaves first: `gpu` handles, `mesh`, `material`, `scene`
//! graph/camera, `shader` programs and reload, `compute` + `interop`, and the
//! `scene::ParticleScene` composition root. `device`, `window`, `core`,
//! `input`, `time` and `logging` are the runtime around it.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod gpu;
pub mod interop;
pub mod compute;
pub mod field;
pub mod mesh;
pub mod material;
pub mod render;
pub mod scene;
pub mod shader;
