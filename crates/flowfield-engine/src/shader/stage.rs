/// Pipeline stage a source file is compiled for.
///
/// The geometry and tessellation stages exist so that programs declared for a
/// classic rasterizer fail loudly instead of silently dropping a stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
    Geometry,
    TessControl,
    TessEvaluation,
}

impl ShaderStage {
    /// Entry point name each stage file must export.
    pub fn default_entry_point(self) -> &'static str {
        match self {
            Self::Vertex => "vs_main",
            Self::Fragment => "fs_main",
            Self::Compute => "cs_main",
            Self::Geometry => "gs_main",
            Self::TessControl => "tcs_main",
            Self::TessEvaluation => "tes_main",
        }
    }

    pub fn is_supported(self) -> bool {
        matches!(self, Self::Vertex | Self::Fragment | Self::Compute)
    }

    pub(crate) fn to_naga(self) -> Option<naga::ShaderStage> {
        match self {
            Self::Vertex => Some(naga::ShaderStage::Vertex),
            Self::Fragment => Some(naga::ShaderStage::Fragment),
            Self::Compute => Some(naga::ShaderStage::Compute),
            _ => None,
        }
    }
}
