//! Ownership transfer between the render and compute pipelines.
//!
//! A graphics resource that the compute side also touches carries a [`SharedToken`].
//! The render side holds the token strongly (it owns the memory); compute aliases
//! hold a [`TokenRef`], a weak reference that goes stale as soon as the graphics
//! resource is recreated or destroyed.
//!
//! Access rights move only through [`InteropLedger::acquire`] and
//! [`InteropLedger::release`], one batch per dispatch:
//!
//! ```text
//! acquire(batch) -> dispatch -> release(batch) -> draw
//! ```

mod error;
mod ledger;
mod token;

pub use error::InteropError;
pub use ledger::{AcquiredBatch, InteropEvent, InteropLedger};
pub use token::{Owner, ResourceId, SharedAlias, SharedToken, TokenRef};
