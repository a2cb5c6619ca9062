//! Vertex/index buffers plus the draw call that covers them.

mod error;
mod layout;
mod geometry;
mod store;

pub use error::{DrawError, MeshError};
pub use layout::AttributeLayout;
pub use geometry::{DrawCall, Mesh, PrimitiveMode};
pub use store::{MeshId, MeshStore};
