#![allow(dead_code)]

use std::path::PathBuf;

use flowfield_engine::device::{GpuContext, GpuInit};
use flowfield_engine::render::{FrameStats, RenderCtx, RenderTarget};
use flowfield_engine::scene::{ParticleScene, ParticleSceneConfig};

pub const OFFSCREEN: (u32, u32) = (64, 64);

/// A headless device, or `None` (with a note on stderr) when the machine has no adapter.
pub fn gpu() -> Option<GpuContext> {
    let init = GpuInit {
        power_preference: wgpu::PowerPreference::LowPower,
        ..GpuInit::default()
    };
    match GpuContext::headless(&init) {
        Ok(gpu) if gpu.supports_compute_interop() => Some(gpu),
        Ok(gpu) => {
            eprintln!("skipping: {} cannot run compute interop", gpu.adapter_info().name);
            None
        }
        Err(err) => {
            eprintln!("skipping: no GPU adapter ({err:#})");
            None
        }
    }
}

pub fn asset_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../flowfield-viewer/assets")
}

/// Viewer assets, no file watcher, procedural field, fixed seed.
pub fn scene_config() -> ParticleSceneConfig {
    ParticleSceneConfig {
        field: None,
        seed: Some(0x5EED),
        watch_shaders: false,
        ..ParticleSceneConfig::with_asset_dir(asset_dir())
    }
}

pub fn floats(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Runs one full frame of `scene` into a throwaway offscreen target.
pub fn render_offscreen(
    gpu: &GpuContext,
    scene: &mut ParticleScene,
    dt: f32,
) -> anyhow::Result<FrameStats> {
    let (width, height) = OFFSCREEN;
    let format = wgpu::TextureFormat::Rgba8UnormSrgb;
    let texture = gpu.device().create_texture(&wgpu::TextureDescriptor {
        label: Some("offscreen target"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let mut encoder = gpu
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });

    let ctx = RenderCtx::new(gpu.device(), gpu.queue(), format, OFFSCREEN);
    let stats = {
        let mut target = RenderTarget::new(&mut encoder, &view);
        scene.frame(dt, &ctx, &mut target)?
    };
    gpu.queue().submit(Some(encoder.finish()));
    Ok(stats)
}
