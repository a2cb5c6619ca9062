mod common;

use flowfield_engine::compute::{
    ComputeContext, ComputeError, KernelArgs, KernelBufferKind, KernelBuildOptions, KernelSource,
};
use flowfield_engine::field;
use flowfield_engine::gpu::GraphicsTexture;
use flowfield_engine::interop::{InteropError, Owner};
use flowfield_engine::mesh::{AttributeLayout, Mesh, PrimitiveMode};
use flowfield_engine::scene::{PARTICLE_ATTRIBUTES, seed_particles, seed_rng_state};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn kernel(gpu: &flowfield_engine::device::GpuContext) -> ComputeContext {
    let path = common::asset_dir().join("shaders/particle_simulation.wgsl");
    let source = KernelSource::from_path(path).unwrap();
    ComputeContext::initialize(gpu, &source, &KernelBuildOptions::default()).unwrap()
}

#[test]
fn stale_alias_fails_the_dispatch() {
    let Some(gpu) = common::gpu() else { return };
    let mut compute = kernel(&gpu);
    let mut rng = StdRng::seed_from_u64(3);

    let layout = || AttributeLayout::new(&PARTICLE_ATTRIBUTES).unwrap();
    let mut mesh = Mesh::new("particles", PrimitiveMode::Points).shareable(true);
    mesh.initialize(gpu.device(), &seed_particles(&mut rng, 16), layout())
        .unwrap();
    let stale = compute.import_buffer(mesh.vertex_buffer().unwrap()).unwrap();

    mesh.initialize(gpu.device(), &seed_particles(&mut rng, 32), layout())
        .unwrap();
    assert!(stale.is_stale());

    let volume = field::vortex([4, 4, 4]);
    let texture =
        GraphicsTexture::volume(gpu.device(), gpu.queue(), "field", volume.dims, &volume.texels);
    let image = compute.import_texture(&texture);
    let seeds = compute.create_buffer(
        "seeds",
        bytemuck::cast_slice(&seed_rng_state(&mut rng, 32)),
        KernelBufferKind::Storage,
    );
    let bbox = compute.create_buffer("bbox", &[0u8; 32], KernelBufferKind::Uniform);

    let args = KernelArgs::new()
        .buffer(&stale)
        .private(&seeds)
        .image(&image)
        .private(&bbox)
        .f32(0.25)
        .f32(0.016);
    match compute.dispatch(&args, 32) {
        Err(ComputeError::Interop(InteropError::StaleHandle { .. })) => {}
        other => panic!("expected a stale handle error, got {other:?}"),
    }

    // Nothing flipped; the texture is still render-owned.
    assert_eq!(texture.owner(), Owner::Graphics);

    let fresh = compute.import_buffer(mesh.vertex_buffer().unwrap()).unwrap();
    let args = KernelArgs::new()
        .buffer(&fresh)
        .private(&seeds)
        .image(&image)
        .private(&bbox)
        .f32(0.25)
        .f32(0.016);
    let report = compute.dispatch(&args, 32).unwrap();
    assert_eq!(report.acquired, report.released);
    assert_eq!(mesh.vertex_buffer().unwrap().owner(), Owner::Graphics);
}

#[test]
fn arguments_are_checked_against_the_kernel() {
    let Some(gpu) = common::gpu() else { return };
    let mut compute = kernel(&gpu);

    let seeds = compute.create_buffer("seeds", &[1u8; 64], KernelBufferKind::Storage);
    let args = KernelArgs::new().private(&seeds).f32(1.0);
    assert!(matches!(
        compute.dispatch(&args, 4),
        Err(ComputeError::ArgumentCount { expected: 5, given: 2 })
    ));
}

#[test]
fn non_shareable_buffers_cannot_be_imported() {
    let Some(gpu) = common::gpu() else { return };
    let compute = kernel(&gpu);

    let mut mesh = Mesh::new("glyph", PrimitiveMode::Lines);
    mesh.initialize(
        gpu.device(),
        &[0.0; 14],
        AttributeLayout::new(&[4, 3]).unwrap(),
    )
    .unwrap();
    assert!(matches!(
        compute.import_buffer(mesh.vertex_buffer().unwrap()),
        Err(ComputeError::NotShareable { .. })
    ));
}
