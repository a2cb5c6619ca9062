//! Render-side GPU resources.
//!
//! Every resource here is owned by the rasterization pipeline. Resources that the
//! compute side may alias carry a [`SharedToken`](crate::interop::SharedToken);
//! the compute views live in [`crate::compute`] and can only be obtained through
//! `ComputeContext::import_*`.

mod buffer;
mod texture;

pub use buffer::GraphicsBuffer;
pub use texture::GraphicsTexture;
