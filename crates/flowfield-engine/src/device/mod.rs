//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue shared by compute and render work
//! - creating & configuring the Surface (swapchain) when a window exists
//! - acquiring frames and providing encoders/views for rendering
//! - capturing validation errors of fallible object creation (shader reloads)

mod context;
mod gpu;
mod init;
mod surface;
mod validation;

pub use context::GpuContext;
pub use gpu::{Gpu, GpuFrame};
pub use init::GpuInit;
pub use surface::SurfaceErrorAction;
pub use validation::with_validation;
