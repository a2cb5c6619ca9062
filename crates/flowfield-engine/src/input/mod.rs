//! Keyboard input.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! The runtime translates platform events through `platform.rs`.

mod types;
pub(crate) mod platform;

pub use types::{Key, KeyEvent, KeyState};
