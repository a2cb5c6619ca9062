//! Vector field volumes: FGA loading and a procedural fallback.

mod fga;
mod procedural;

use std::path::PathBuf;

use glam::Vec3;
use thiserror::Error;

pub use fga::{load_fga, parse_fga};
pub use procedural::vortex;

#[derive(Debug, Error)]
pub enum FieldError {
    #[error("failed to read field {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("token {index} (`{token}`) is not a number")]
    BadNumber { index: usize, token: String },

    #[error("field header is truncated ({0} values, need 9)")]
    TruncatedHeader(usize),

    #[error("field dimensions must be positive, got {0:?}")]
    BadDimensions([i64; 3]),

    #[error("expected {expected} vectors, found {found} values")]
    VectorCount { expected: usize, found: usize },
}

/// A dense 3-D vector grid; x varies fastest, then y, then z.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorField {
    pub dims: [u32; 3],
    /// World-space bounds recorded in the file.
    pub min: Vec3,
    pub max: Vec3,
    /// `xyz` = direction, `w` = 1.
    pub texels: Vec<[f32; 4]>,
}

impl VectorField {
    pub fn len(&self) -> usize {
        self.texels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texels.is_empty()
    }

    pub fn at(&self, x: u32, y: u32, z: u32) -> Option<[f32; 4]> {
        let [nx, ny, nz] = self.dims;
        if x >= nx || y >= ny || z >= nz {
            return None;
        }
        let i = (z as usize * ny as usize + y as usize) * nx as usize + x as usize;
        self.texels.get(i).copied()
    }
}
