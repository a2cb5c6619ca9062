use std::path::Path;

use super::ComputeError;
use crate::shader::{ShaderStage, find_entry_point, validate_wgsl};

/// WGSL source of a compute kernel.
#[derive(Debug, Clone)]
pub struct KernelSource {
    pub label: String,
    pub wgsl: String,
}

impl KernelSource {
    pub fn from_wgsl(label: impl Into<String>, wgsl: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            wgsl: wgsl.into(),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ComputeError> {
        let path = path.as_ref();
        let wgsl = std::fs::read_to_string(path).map_err(|source| ComputeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            label: path.display().to_string(),
            wgsl,
        })
    }
}

#[derive(Debug, Clone)]
pub struct KernelBuildOptions {
    /// Kernel function looked up after the build.
    pub entry_point: String,
    /// Skips zero-initialization of workgroup memory.
    pub relaxed_math: bool,
}

impl Default for KernelBuildOptions {
    fn default() -> Self {
        Self {
            entry_point: "particle_simulation".to_owned(),
            relaxed_math: true,
        }
    }
}

/// What a kernel binding expects, reflected from the WGSL module.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BindingKind {
    StorageBuffer { read_only: bool },
    UniformBuffer,
    SampledTexture {
        dimension: wgpu::TextureViewDimension,
        sample_type: wgpu::TextureSampleType,
    },
}

impl BindingKind {
    fn layout_type(self) -> wgpu::BindingType {
        match self {
            Self::StorageBuffer { read_only } => wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            Self::UniformBuffer => wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            Self::SampledTexture {
                dimension,
                sample_type,
            } => wgpu::BindingType::Texture {
                sample_type,
                view_dimension: dimension,
                multisampled: false,
            },
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct KernelBinding {
    pub binding: u32,
    pub kind: BindingKind,
}

/// Group-0 bindings declared by `module`, ordered by binding index.
pub(crate) fn reflect_bindings(module: &naga::Module) -> Result<Vec<KernelBinding>, ComputeError> {
    let mut out = Vec::new();

    for (_, var) in module.global_variables.iter() {
        let Some(rb) = var.binding.as_ref() else { continue };
        if rb.group != 0 {
            return Err(ComputeError::UnsupportedBinding {
                binding: rb.binding,
                reason: "kernels bind everything in group 0",
            });
        }

        let kind = match var.space {
            naga::AddressSpace::Storage { access } => BindingKind::StorageBuffer {
                read_only: !access.contains(naga::StorageAccess::STORE),
            },
            naga::AddressSpace::Uniform => BindingKind::UniformBuffer,
            naga::AddressSpace::Handle => match module.types[var.ty].inner {
                naga::TypeInner::Image {
                    dim,
                    arrayed: false,
                    class: naga::ImageClass::Sampled { kind, multi: false },
                } => BindingKind::SampledTexture {
                    dimension: view_dimension(dim),
                    sample_type: sample_type(kind).ok_or(ComputeError::UnsupportedBinding {
                        binding: rb.binding,
                        reason: "unsupported texel scalar kind",
                    })?,
                },
                _ => {
                    return Err(ComputeError::UnsupportedBinding {
                        binding: rb.binding,
                        reason: "only sampled, non-arrayed textures can be bound",
                    });
                }
            },
            _ => continue,
        };

        out.push(KernelBinding {
            binding: rb.binding,
            kind,
        });
    }

    out.sort_by_key(|b| b.binding);
    Ok(out)
}

fn view_dimension(dim: naga::ImageDimension) -> wgpu::TextureViewDimension {
    match dim {
        naga::ImageDimension::D1 => wgpu::TextureViewDimension::D1,
        naga::ImageDimension::D2 => wgpu::TextureViewDimension::D2,
        naga::ImageDimension::D3 => wgpu::TextureViewDimension::D3,
        naga::ImageDimension::Cube => wgpu::TextureViewDimension::Cube,
    }
}

// Float volumes are read with `textureLoad`, so they never need to be filterable.
fn sample_type(kind: naga::ScalarKind) -> Option<wgpu::TextureSampleType> {
    match kind {
        naga::ScalarKind::Float => Some(wgpu::TextureSampleType::Float { filterable: false }),
        naga::ScalarKind::Sint => Some(wgpu::TextureSampleType::Sint),
        naga::ScalarKind::Uint => Some(wgpu::TextureSampleType::Uint),
        _ => None,
    }
}

/// A built kernel: pipeline plus the reflected binding table it was built against.
#[derive(Debug)]
pub(crate) struct Kernel {
    pub(crate) pipeline: wgpu::ComputePipeline,
    pub(crate) bind_group_layout: wgpu::BindGroupLayout,
    pub(crate) bindings: Vec<KernelBinding>,
    pub(crate) workgroup_size: [u32; 3],
    pub(crate) entry_point: String,
}

impl Kernel {
    /// Validates `source`, reflects its bindings and builds the pipeline.
    pub(crate) fn build(
        device: &wgpu::Device,
        source: &KernelSource,
        options: &KernelBuildOptions,
    ) -> Result<Self, ComputeError> {
        let (bindings, workgroup_size) = Self::inspect(source, options)?;

        let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = bindings
            .iter()
            .map(|b| wgpu::BindGroupLayoutEntry {
                binding: b.binding,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: b.kind.layout_type(),
                count: None,
            })
            .collect();

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("flowfield kernel bgl"),
            entries: &layout_entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("flowfield kernel pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&source.label),
            source: wgpu::ShaderSource::Wgsl(source.wgsl.as_str().into()),
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(&options.entry_point),
            layout: Some(&pipeline_layout),
            module: &module,
            entry_point: Some(&options.entry_point),
            compilation_options: wgpu::PipelineCompilationOptions {
                zero_initialize_workgroup_memory: !options.relaxed_math,
                ..Default::default()
            },
            cache: None,
        });

        Ok(Self {
            pipeline,
            bind_group_layout,
            bindings,
            workgroup_size,
            entry_point: options.entry_point.clone(),
        })
    }

    /// Device-free part of the build: validation, entry lookup, reflection.
    pub(crate) fn inspect(
        source: &KernelSource,
        options: &KernelBuildOptions,
    ) -> Result<(Vec<KernelBinding>, [u32; 3]), ComputeError> {
        let module = validate_wgsl(&source.label, &source.wgsl)?;
        let entry = find_entry_point(
            &source.label,
            &module,
            ShaderStage::Compute,
            &options.entry_point,
        )?;
        let workgroup_size = entry.workgroup_size;
        let bindings = reflect_bindings(&module)?;
        Ok((bindings, workgroup_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KERNEL: &str = r#"
struct Params { tightness: f32, delta_time: f32 }

@group(0) @binding(0) var<storage, read_write> particles: array<f32>;
@group(0) @binding(1) var<storage, read_write> seeds: array<u32>;
@group(0) @binding(2) var field: texture_3d<f32>;
@group(0) @binding(3) var<uniform> bbox: array<vec4<f32>, 2>;
@group(0) @binding(4) var<uniform> params: Params;

@compute @workgroup_size(64)
fn particle_simulation(@builtin(global_invocation_id) gid: vec3<u32>) {
    let i = gid.x;
    if (i >= arrayLength(&seeds)) { return; }
    let v = textureLoad(field, vec3<i32>(0, 0, 0), 0);
    particles[i] = v.x * params.tightness + bbox[0].x + params.delta_time;
    seeds[i] = seeds[i] + 1u;
}
"#;

    #[test]
    fn reflects_the_particle_kernel_layout() {
        let source = KernelSource::from_wgsl("kernel", KERNEL);
        let (bindings, wg) = Kernel::inspect(&source, &KernelBuildOptions::default()).unwrap();

        assert_eq!(wg, [64, 1, 1]);
        let kinds: Vec<_> = bindings.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BindingKind::StorageBuffer { read_only: false },
                BindingKind::StorageBuffer { read_only: false },
                BindingKind::SampledTexture {
                    dimension: wgpu::TextureViewDimension::D3,
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                },
                BindingKind::UniformBuffer,
                BindingKind::UniformBuffer,
            ]
        );
    }

    #[test]
    fn wrong_entry_name_is_missing_kernel() {
        let source = KernelSource::from_wgsl("kernel", KERNEL);
        let options = KernelBuildOptions {
            entry_point: "simulate".to_owned(),
            ..Default::default()
        };
        assert!(matches!(
            Kernel::inspect(&source, &options),
            Err(ComputeError::MissingKernel { .. })
        ));
    }

    #[test]
    fn build_failure_carries_the_compiler_log() {
        let source = KernelSource::from_wgsl("broken", "@compute @workgroup_size(64) fn particle_simulation( {");
        match Kernel::inspect(&source, &KernelBuildOptions::default()) {
            Err(ComputeError::Compile { label, log }) => {
                assert_eq!(label, "broken");
                assert!(!log.is_empty());
            }
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn bindings_outside_group_zero_are_rejected() {
        let source = KernelSource::from_wgsl(
            "grouped",
            r#"
@group(1) @binding(0) var<storage, read_write> data: array<f32>;
@compute @workgroup_size(1)
fn particle_simulation() { data[0] = 1.0; }
"#,
        );
        assert!(matches!(
            Kernel::inspect(&source, &KernelBuildOptions::default()),
            Err(ComputeError::UnsupportedBinding { binding: 0, .. })
        ));
    }
}
