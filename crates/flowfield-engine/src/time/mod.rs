//! Frame timing.
//!
//! One `FrameClock` per render loop; `tick()` once per presented frame. The
//! scene scales the resulting delta by its configured time scale before the
//! kernel sees it.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
