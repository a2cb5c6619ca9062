use std::path::PathBuf;

use thiserror::Error;

use crate::interop::InteropError;
use crate::shader::ShaderError;

/// Compute pipeline failures. All of them are fatal for the simulation.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("adapter `{adapter}` cannot share buffers between compute and render pipelines")]
    SharingUnsupported { adapter: String },

    #[error("failed to read kernel source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("kernel `{label}` failed to build:\n{log}")]
    Compile { label: String, log: String },

    #[error("kernel `{label}` has no compute entry point `{entry}`")]
    MissingKernel { label: String, entry: String },

    #[error("kernel binding {binding} is not supported: {reason}")]
    UnsupportedBinding { binding: u32, reason: &'static str },

    #[error("kernel expects {expected} argument(s), {given} bound")]
    ArgumentCount { expected: usize, given: usize },

    #[error("argument {index} is a {given:?}, kernel binding {binding} wants {expected:?}")]
    ArgumentMismatch {
        index: usize,
        binding: u32,
        expected: super::BindingKind,
        given: super::ArgKind,
    },

    #[error("`{label}` cannot be imported: created without STORAGE usage")]
    NotShareable { label: String },

    #[error("write of {len} bytes does not fit `{label}` ({size} bytes)")]
    WriteOutOfBounds { label: String, len: u64, size: u64 },

    #[error(transparent)]
    Interop(#[from] InteropError),

    #[error("device wait failed: {0}")]
    Device(String),
}

impl From<ShaderError> for ComputeError {
    fn from(e: ShaderError) -> Self {
        match e {
            ShaderError::Io { path, source } => Self::Io { path, source },
            ShaderError::Parse { label, log }
            | ShaderError::Validation { label, log }
            | ShaderError::Device { label, log } => {
                Self::Compile { label, log }
            }
            ShaderError::MissingEntryPoint { label, entry, .. } => {
                Self::MissingKernel { label, entry }
            }
            other => Self::Compile {
                label: "kernel".to_owned(),
                log: other.to_string(),
            },
        }
    }
}
