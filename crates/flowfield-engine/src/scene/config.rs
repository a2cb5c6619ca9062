use std::path::{Path, PathBuf};

use super::SliderRange;

/// Per-stage WGSL files of one rendering program.
#[derive(Debug, Clone)]
pub struct ShaderPaths {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

#[derive(Debug, Clone)]
pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub distance: f32,
    /// Radians the rig turns about -Y per frame while auto-rotation is on.
    pub rotation_step: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 100.0,
            distance: 5.0,
            rotation_step: 0.005,
        }
    }
}

/// Everything [`ParticleScene`](super::ParticleScene) needs at startup.
#[derive(Debug, Clone)]
pub struct ParticleSceneConfig {
    pub particle_range: SliderRange,
    pub initial_particles: u32,

    pub kernel: PathBuf,
    pub particle_shaders: ShaderPaths,
    pub field_shaders: ShaderPaths,
    /// FGA volume; a procedural vortex is generated when `None`.
    pub field: Option<PathBuf>,

    /// Multiplies the frame delta before it reaches the kernel.
    pub time_scale: f32,
    pub tightness: f32,
    pub field_samples: [u32; 3],
    pub sample_range: SliderRange,
    pub field_scale: f32,

    pub camera: CameraConfig,
    /// Fixed RNG seed; entropy is used when `None`.
    pub seed: Option<u64>,
    /// Start the file watcher for shader hot reload.
    pub watch_shaders: bool,
}

impl Default for ParticleSceneConfig {
    fn default() -> Self {
        Self::with_asset_dir("assets")
    }
}

impl ParticleSceneConfig {
    /// Standard layout under `dir`: `shaders/*.wgsl` and an optional `fields/default.fga`.
    pub fn with_asset_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let shader = |name: &str| dir.join("shaders").join(name);
        let field = dir.join("fields").join("default.fga");

        Self {
            particle_range: SliderRange::new(1.0, 1_000_000.0),
            initial_particles: 2,
            kernel: shader("particle_simulation.wgsl"),
            particle_shaders: ShaderPaths {
                vertex: shader("particle.vert.wgsl"),
                fragment: shader("particle.frag.wgsl"),
            },
            field_shaders: ShaderPaths {
                vertex: shader("vector_field.vert.wgsl"),
                fragment: shader("vector_field.frag.wgsl"),
            },
            field: field.is_file().then_some(field),
            time_scale: 1.0 / 3.0,
            tightness: 0.25,
            field_samples: [10, 10, 10],
            sample_range: SliderRange::new(1.0, 20.0),
            field_scale: 2.0,
            camera: CameraConfig::default(),
            seed: None,
            watch_shaders: true,
        }
    }
}
