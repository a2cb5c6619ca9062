//! Shader programs and live reload.
//!
//! - [`ShaderProgram`]: per-stage WGSL sources loaded by path, validated and turned
//!   into device modules; rebuildable in place.
//! - [`ShaderReloader`]: maps watched file sets to rebuild closures.
//! - [`FrameTaskQueue`]: closures deferred to the next frame boundary.
//!
//! Reload flow: file watcher thread -> changed path over a channel ->
//! `ShaderReloader::poll` (render thread) -> rebuild queued -> drained right before
//! the next render pass.

mod error;
mod program;
mod reload;
mod stage;
mod tasks;
mod validate;

pub use error::ShaderError;
pub use program::{ShaderProgram, SharedProgram};
pub use reload::ShaderReloader;
pub use stage::ShaderStage;
pub use tasks::FrameTaskQueue;
pub use validate::{find_entry_point, validate_wgsl};
