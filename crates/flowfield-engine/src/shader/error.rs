use std::path::PathBuf;

use thiserror::Error;

use super::ShaderStage;

/// Shader build failures. `log` fields carry the compiler diagnostic text.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to read shader source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{label}` failed to compile:\n{log}")]
    Parse { label: String, log: String },

    #[error("`{label}` failed validation:\n{log}")]
    Validation { label: String, log: String },

    #[error("`{label}` has no {stage:?} entry point named `{entry}`")]
    MissingEntryPoint {
        label: String,
        stage: ShaderStage,
        entry: String,
    },

    #[error("`{label}` was rejected by the device:\n{log}")]
    Device { label: String, log: String },

    #[error("{0:?} shaders are not supported by the wgpu back-end")]
    UnsupportedStage(ShaderStage),

    #[error("shader program `{0}` has no stages")]
    NoStages(String),
}

impl ShaderError {
    /// Compiler log for diagnostics, when the failure came from the compiler.
    pub fn log(&self) -> Option<&str> {
        match self {
            Self::Parse { log, .. } | Self::Validation { log, .. } | Self::Device { log, .. } => {
                Some(log)
            }
            _ => None,
        }
    }
}
