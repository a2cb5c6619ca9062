//! Frame rendering: walks a recorded draw list and lets each mesh draw itself.
//!
//! Conventions:
//! - one render pass per frame, cleared to the renderer's clear color
//! - no depth buffer; draw order is traversal order
//! - per-object matrices live in one uniform buffer indexed by dynamic offset

mod ctx;
mod renderer;

pub use ctx::{RenderCtx, RenderTarget};
pub use renderer::{FrameStats, Renderer};
