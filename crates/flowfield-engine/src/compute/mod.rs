//! Compute side of the interop: kernel build, resource import, dispatch.
//!
//! The compute pipeline runs on the same device as the renderer. Render-owned
//! resources are *imported* as aliases ([`ComputeBuffer`], [`ComputeImage`]) and
//! handed over for the duration of one dispatch through the [`InteropLedger`].
//!
//! [`InteropLedger`]: crate::interop::InteropLedger

mod args;
mod context;
mod error;
mod handle;
mod kernel;
mod work;

pub use args::{ArgKind, KernelArg, KernelArgs};
pub use context::{ComputeContext, DispatchReport};
pub use error::ComputeError;
pub use handle::{ComputeBuffer, ComputeImage, KernelBuffer, KernelBufferKind};
pub use kernel::{BindingKind, KernelBinding, KernelBuildOptions, KernelSource};
pub use work::WorkSize;
