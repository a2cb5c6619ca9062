use thiserror::Error;

use super::ResourceId;

/// Violations of the acquire/release protocol.
///
/// These are programmer errors: the owning scene is expected to re-import aliases
/// synchronously after every re-initialization, so none of them should surface at runtime.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InteropError {
    #[error("stale compute alias for `{label}` ({id}): the graphics resource was recreated or destroyed")]
    StaleHandle { id: ResourceId, label: String },

    #[error("`{label}` ({id}) is already acquired by the compute pipeline")]
    AlreadyAcquired { id: ResourceId, label: String },

    #[error("`{label}` ({id}) appears more than once in a single acquire batch")]
    DuplicateInBatch { id: ResourceId, label: String },
}
