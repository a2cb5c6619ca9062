use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshError {
    #[error("attribute layout is empty")]
    EmptyLayout,

    #[error("attribute {index} has {components} components (expected 1..=4)")]
    BadComponents { index: usize, components: u32 },

    #[error("{len} floats do not divide into vertices of {stride} floats")]
    Misaligned { len: usize, stride: u32 },

    #[error("mesh `{0}` has no vertex data")]
    Empty(String),

    #[error("index {index} is out of range for {vertices} vertices")]
    IndexOutOfRange { index: u32, vertices: u32 },
}

/// Reasons a mesh (or its material) refuses to draw this frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DrawError {
    #[error("`{0}` is held by the compute pipeline")]
    ComputeOwned(String),

    #[error("mesh `{0}` was never initialized")]
    NotInitialized(String),

    #[error("mesh `{0}` has no material")]
    NoMaterial(String),

    #[error("shader program `{0}` has not been built")]
    ProgramNotReady(String),

    #[error("pipeline `{label}` was rejected by the device:\n{log}")]
    PipelineRejected { label: String, log: String },
}
