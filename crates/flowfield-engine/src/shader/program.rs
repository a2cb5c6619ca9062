use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::{ShaderError, ShaderStage, find_entry_point, validate_wgsl};
use crate::device::with_validation;

/// A program shared between the materials that draw with it and its reload task.
pub type SharedProgram = Rc<RefCell<ShaderProgram>>;

/// A set of per-stage WGSL files compiled into device modules.
///
/// Rebuilds are all-or-nothing: every stage is re-read and validated first, and
/// the live modules are replaced only when all of them compile. A failed rebuild
/// leaves the previous modules (and generation) in place. A build that the
/// device accepts but a material's pipeline rejects is undone with
/// [`rollback`](ShaderProgram::rollback).
#[derive(Debug)]
pub struct ShaderProgram {
    label: String,
    stages: BTreeMap<ShaderStage, PathBuf>,
    modules: BTreeMap<ShaderStage, wgpu::ShaderModule>,
    generation: u64,
    /// Highest generation ever issued.
    latest: u64,
    /// Modules and generation replaced by the last build.
    previous: Option<(BTreeMap<ShaderStage, wgpu::ShaderModule>, u64)>,
}

impl ShaderProgram {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            stages: BTreeMap::new(),
            modules: BTreeMap::new(),
            generation: 0,
            latest: 0,
            previous: None,
        }
    }

    /// Assigns the source file for `stage`, replacing any previous path.
    pub fn set_shader(
        &mut self,
        path: impl Into<PathBuf>,
        stage: ShaderStage,
    ) -> Result<(), ShaderError> {
        if !stage.is_supported() {
            return Err(ShaderError::UnsupportedStage(stage));
        }
        self.stages.insert(stage, path.into());
        Ok(())
    }

    pub fn with_stage(
        mut self,
        stage: ShaderStage,
        path: impl Into<PathBuf>,
    ) -> Result<Self, ShaderError> {
        self.set_shader(path, stage)?;
        Ok(self)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Source paths, in stage order. These are the files the reloader watches.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.stages.values().cloned().collect()
    }

    /// Fresh on every successful build; zero until the first one.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_ready(&self) -> bool {
        self.generation > 0
    }

    pub fn module(&self, stage: ShaderStage) -> Option<&wgpu::ShaderModule> {
        self.modules.get(&stage)
    }

    /// Reads and validates every stage without touching the device.
    pub fn compile_sources(&self) -> Result<Vec<(ShaderStage, String)>, ShaderError> {
        if self.stages.is_empty() {
            return Err(ShaderError::NoStages(self.label.clone()));
        }

        self.stages
            .iter()
            .map(|(&stage, path)| {
                let source = read_source(path)?;
                let label = format!("{} ({})", self.label, path.display());
                let module = validate_wgsl(&label, &source)?;
                find_entry_point(&label, &module, stage, stage.default_entry_point())?;
                Ok((stage, source))
            })
            .collect()
    }

    /// Builds (or rebuilds) the device modules from the stage files.
    ///
    /// Module creation runs inside a validation scope; a module the device
    /// rejects fails the build with the previous modules still live.
    pub fn initialize(&mut self, device: &wgpu::Device) -> Result<(), ShaderError> {
        let sources = self.compile_sources()?;

        let modules = with_validation(device, || {
            sources
                .into_iter()
                .map(|(stage, source)| {
                    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                        label: Some(&format!("{} {stage:?}", self.label)),
                        source: wgpu::ShaderSource::Wgsl(source.into()),
                    });
                    (stage, module)
                })
                .collect::<BTreeMap<_, _>>()
        })
        .map_err(|e| ShaderError::Device {
            label: self.label.clone(),
            log: e.to_string(),
        })?;

        let previous = std::mem::replace(&mut self.modules, modules);
        if self.generation > 0 {
            self.previous = Some((previous, self.generation));
        }
        self.latest += 1;
        self.generation = self.latest;
        log::info!(
            "shader program `{}` built (generation {})",
            self.label,
            self.generation
        );
        Ok(())
    }

    /// Restores the modules and generation that were live before the last
    /// build. Used when the device rejects a pipeline made from the new build.
    ///
    /// Generations are never reused; the next successful build gets a fresh one.
    pub fn rollback(&mut self) -> bool {
        let Some((modules, generation)) = self.previous.take() else {
            return false;
        };
        log::warn!(
            "shader program `{}` rolled back from generation {} to {generation}",
            self.label,
            self.generation
        );
        self.modules = modules;
        self.generation = generation;
        true
    }

    /// Hot-reload entry point: rebuilds and logs the outcome.
    ///
    /// Returns `false` when the rebuild failed and the previous program stayed live.
    pub fn reload(&mut self, device: &wgpu::Device) -> bool {
        match self.initialize(device) {
            Ok(()) => true,
            Err(e) => {
                log::error!(
                    "reload of `{}` failed; keeping generation {}: {e}",
                    self.label,
                    self.generation
                );
                false
            }
        }
    }

    pub fn into_shared(self) -> SharedProgram {
        Rc::new(RefCell::new(self))
    }

    /// Closure that rebuilds `program` on `device`; meant for the frame task queue.
    ///
    /// Captures only the program handle and a device handle.
    pub fn rebuild_task(program: &SharedProgram, device: &wgpu::Device) -> impl Fn() + 'static {
        let program = Rc::clone(program);
        let device = device.clone();
        move || {
            program.borrow_mut().reload(&device);
        }
    }
}

fn read_source(path: &Path) -> Result<String, ShaderError> {
    std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const VERT: &str = r#"
@vertex
fn vs_main(@location(0) pos: vec4<f32>) -> @builtin(position) vec4<f32> {
    return pos;
}
"#;

    const FRAG: &str = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 1.0, 1.0, 1.0);
}
"#;

    fn program_in(dir: &Path) -> ShaderProgram {
        fs::write(dir.join("p.vert.wgsl"), VERT).unwrap();
        fs::write(dir.join("p.frag.wgsl"), FRAG).unwrap();
        ShaderProgram::new("p")
            .with_stage(ShaderStage::Vertex, dir.join("p.vert.wgsl"))
            .unwrap()
            .with_stage(ShaderStage::Fragment, dir.join("p.frag.wgsl"))
            .unwrap()
    }

    #[test]
    fn compiles_every_stage_independently() {
        let dir = tempfile::tempdir().unwrap();
        let program = program_in(dir.path());

        let sources = program.compile_sources().unwrap();
        let stages: Vec<_> = sources.iter().map(|(s, _)| *s).collect();
        assert_eq!(stages, vec![ShaderStage::Vertex, ShaderStage::Fragment]);
    }

    #[test]
    fn broken_stage_fails_the_whole_program() {
        let dir = tempfile::tempdir().unwrap();
        let program = program_in(dir.path());
        fs::write(dir.path().join("p.frag.wgsl"), "@fragment fn fs_main( {").unwrap();

        let err = program.compile_sources().unwrap_err();
        assert!(err.log().is_some());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let program = ShaderProgram::new("ghost")
            .with_stage(ShaderStage::Vertex, "/definitely/not/here.wgsl")
            .unwrap();
        assert!(matches!(
            program.compile_sources(),
            Err(ShaderError::Io { .. })
        ));
    }

    #[test]
    fn stage_without_expected_entry_point_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("v.wgsl"), FRAG).unwrap();
        let program = ShaderProgram::new("v")
            .with_stage(ShaderStage::Vertex, dir.path().join("v.wgsl"))
            .unwrap();
        assert!(matches!(
            program.compile_sources(),
            Err(ShaderError::MissingEntryPoint { .. })
        ));
    }

    #[test]
    fn tessellation_stages_cannot_be_declared() {
        let mut program = ShaderProgram::new("field");
        let err = program
            .set_shader("field.tesc", ShaderStage::TessControl)
            .unwrap_err();
        assert!(matches!(err, ShaderError::UnsupportedStage(_)));
        assert!(program.paths().is_empty());
    }

    #[test]
    fn rollback_needs_an_earlier_build() {
        let mut program = ShaderProgram::new("fresh");
        assert!(!program.rollback());
        assert_eq!(program.generation(), 0);
        assert!(!program.is_ready());
    }

    #[test]
    fn empty_program_has_nothing_to_compile() {
        assert!(matches!(
            ShaderProgram::new("empty").compile_sources(),
            Err(ShaderError::NoStages(_))
        ));
    }
}
