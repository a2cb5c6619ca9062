use std::cell::RefCell;
use std::collections::HashMap;

use super::MaterialCtx;
use crate::device::with_validation;
use crate::mesh::{AttributeLayout, DrawError};
use crate::shader::{ShaderProgram, ShaderStage, SharedProgram};

/// Everything a cached render pipeline depends on.
///
/// `generation` ties the pipeline to one build of its shader program; a reload
/// bumps the generation and the stale pipelines are evicted once a pipeline for
/// the new generation has built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub generation: u64,
    pub layout: AttributeLayout,
    pub topology: wgpu::PrimitiveTopology,
    pub format: wgpu::TextureFormat,
}

/// Per-material pipeline cache.
#[derive(Debug, Default)]
pub(crate) struct PipelineCache {
    pipelines: RefCell<HashMap<PipelineKey, wgpu::RenderPipeline>>,
}

impl PipelineCache {
    pub(crate) fn get_or_build(
        &self,
        key: PipelineKey,
        build: impl FnOnce() -> Result<wgpu::RenderPipeline, DrawError>,
    ) -> Result<wgpu::RenderPipeline, DrawError> {
        let mut pipelines = self.pipelines.borrow_mut();
        if let Some(p) = pipelines.get(&key) {
            return Ok(p.clone());
        }

        let pipeline = build()?;
        pipelines.retain(|k, _| k.generation == key.generation);
        pipelines.insert(key, pipeline.clone());
        Ok(pipeline)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.pipelines.borrow().len()
    }
}

/// Fetches the pipeline for the program's current generation.
///
/// When the device rejects a pipeline built from a freshly reloaded program,
/// the program is rolled back and the pipeline for the restored generation is
/// used instead (usually still cached). A rejection with nothing to roll back
/// to is returned.
pub(crate) fn program_pipeline(
    program: &SharedProgram,
    cache: &PipelineCache,
    key: impl Fn(u64) -> PipelineKey,
    build: impl Fn(&ShaderProgram) -> Result<wgpu::RenderPipeline, DrawError>,
) -> Result<wgpu::RenderPipeline, DrawError> {
    let first = {
        let current = program.borrow();
        cache.get_or_build(key(current.generation()), || build(&current))
    };

    match first {
        Err(err @ DrawError::PipelineRejected { .. }) => {
            if !program.borrow_mut().rollback() {
                return Err(err);
            }
            log::error!("{err}");
            let restored = program.borrow();
            cache.get_or_build(key(restored.generation()), || build(&restored))
        }
        other => other,
    }
}

/// Fixed-function choices that differ between materials.
pub(crate) struct PipelineSpec<'a> {
    pub label: &'a str,
    pub material_layout: &'a wgpu::BindGroupLayout,
    pub vertex_layout: &'a AttributeLayout,
    pub topology: wgpu::PrimitiveTopology,
    pub blend: wgpu::BlendState,
}

pub(crate) fn build_pipeline(
    ctx: &MaterialCtx<'_>,
    program: &ShaderProgram,
    spec: &PipelineSpec<'_>,
) -> Result<wgpu::RenderPipeline, DrawError> {
    let not_ready = || DrawError::ProgramNotReady(program.label().to_owned());
    let vs = program.module(ShaderStage::Vertex).ok_or_else(not_ready)?;
    let fs = program.module(ShaderStage::Fragment).ok_or_else(not_ready)?;

    let attributes = spec.vertex_layout.attributes();

    let pipeline = with_validation(ctx.device, || {
        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(spec.label),
                bind_group_layouts: &[ctx.object_layout, spec.material_layout],
                immediate_size: 0,
            });

        ctx.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(spec.label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: vs,
                    entry_point: Some(ShaderStage::Vertex.default_entry_point()),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: spec.vertex_layout.stride_bytes(),
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &attributes,
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module: fs,
                    entry_point: Some(ShaderStage::Fragment.default_entry_point()),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.surface_format,
                        blend: Some(spec.blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: spec.topology,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
    })
    .map_err(|e| DrawError::PipelineRejected {
        label: spec.label.to_owned(),
        log: e.to_string(),
    })?;

    log::debug!(
        "built pipeline `{}` for generation {}",
        spec.label,
        program.generation()
    );
    Ok(pipeline)
}

pub(crate) fn additive_blend() -> wgpu::BlendState {
    let add = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: add,
        alpha: add,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(generation: u64) -> PipelineKey {
        PipelineKey {
            generation,
            layout: AttributeLayout::new(&[4, 4, 2]).unwrap(),
            topology: wgpu::PrimitiveTopology::PointList,
            format: wgpu::TextureFormat::Bgra8UnormSrgb,
        }
    }

    #[test]
    fn failed_build_leaves_cache_untouched() {
        let cache = PipelineCache::default();
        let err = cache
            .get_or_build(key(1), || Err(DrawError::ProgramNotReady("p".into())))
            .unwrap_err();
        assert_eq!(err, DrawError::ProgramNotReady("p".into()));
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn rejection_without_an_earlier_build_is_returned() {
        let program = ShaderProgram::new("p").into_shared();
        let cache = PipelineCache::default();
        let attempts = std::cell::Cell::new(0);

        let err = program_pipeline(&program, &cache, key, |_| {
            attempts.set(attempts.get() + 1);
            Err(DrawError::PipelineRejected {
                label: "p".into(),
                log: "binding mismatch".into(),
            })
        })
        .unwrap_err();

        assert!(matches!(err, DrawError::PipelineRejected { .. }));
        assert_eq!(attempts.get(), 1);
        assert_eq!(program.borrow().generation(), 0);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn other_build_errors_skip_rollback() {
        let program = ShaderProgram::new("p").into_shared();
        let cache = PipelineCache::default();

        let err = program_pipeline(&program, &cache, key, |p| {
            Err(DrawError::ProgramNotReady(p.label().to_owned()))
        })
        .unwrap_err();
        assert_eq!(err, DrawError::ProgramNotReady("p".into()));
    }

    #[test]
    fn keys_differ_by_generation() {
        assert_ne!(key(1), key(2));
        assert_eq!(key(3), key(3));
    }
}
