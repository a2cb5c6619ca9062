mod common;

use flowfield_engine::input::{Key, KeyState};
use flowfield_engine::scene::{FieldAxis, MAX_LIFETIME, PARTICLE_STRIDE, ParticleScene};

#[test]
fn committing_a_count_rebuilds_the_shared_buffer() {
    let Some(gpu) = common::gpu() else { return };
    let mut scene = ParticleScene::initialize(&gpu, (320, 240), common::scene_config()).unwrap();
    assert_eq!(scene.particle_count(), 2);

    let range = scene.config().particle_range;
    assert_eq!(scene.commit_particle_count(range.normalize(1000.0)).unwrap(), 1000);

    let bytes = scene
        .particle_buffer()
        .unwrap()
        .read_back(gpu.device(), gpu.queue())
        .unwrap();
    let data = common::floats(&bytes);
    assert_eq!(data.len(), 1000 * PARTICLE_STRIDE);

    for p in data.chunks_exact(PARTICLE_STRIDE) {
        assert!(p[..3].iter().all(|c| (-1.0..=1.0).contains(c)));
        assert_eq!(p[3], 1.0);
        assert_eq!(&p[4..8], &[0.0, 0.0, 0.0, 1.0]);
        assert_eq!(p[8], 0.0);
        assert!((0.0..=MAX_LIFETIME).contains(&p[9]));
    }
}

#[test]
fn dispatch_acquires_and_releases_the_same_batch() {
    let Some(gpu) = common::gpu() else { return };
    let mut scene = ParticleScene::initialize(&gpu, (320, 240), common::scene_config()).unwrap();
    scene.set_particle_count(5000).unwrap();

    let report = scene.simulate(1.0 / 60.0).unwrap();
    assert_eq!(report.acquired.len(), 2, "particle buffer and field texture");
    assert_eq!(report.acquired, report.released);
    assert!(scene.ledger().is_balanced());
    assert!(report.work.invocations([64, 1, 1]) >= 5000);

    let bytes = scene
        .particle_buffer()
        .unwrap()
        .read_back(gpu.device(), gpu.queue())
        .unwrap();
    let data = common::floats(&bytes);
    assert_eq!(data.len(), 5000 * PARTICLE_STRIDE);
    assert!(data.iter().all(|v| v.is_finite()));
}

#[test]
fn reseeding_replaces_the_alias() {
    let Some(gpu) = common::gpu() else { return };
    let mut scene = ParticleScene::initialize(&gpu, (320, 240), common::scene_config()).unwrap();

    let before = scene.particle_alias().clone();
    assert!(!before.is_stale());

    scene.on_key(Key::E, KeyState::Pressed).unwrap();
    assert!(before.is_stale());
    assert!(!scene.particle_alias().is_stale());
    assert_eq!(scene.particle_count(), 2);

    scene.simulate(0.01).unwrap();
}

#[test]
fn keys_toggle_pause_and_rotation() {
    let Some(gpu) = common::gpu() else { return };
    let mut scene = ParticleScene::initialize(&gpu, (320, 240), common::scene_config()).unwrap();

    scene.on_key(Key::P, KeyState::Pressed).unwrap();
    assert!(scene.controls().paused);
    scene.on_key(Key::P, KeyState::Released).unwrap();
    assert!(scene.controls().paused);

    scene.on_key(Key::O, KeyState::Pressed).unwrap();
    assert!(scene.controls().rotating);

    // Paused: update must not touch the shared buffer.
    scene.update(0.1).unwrap();
    assert!(scene.ledger().journal().is_empty());
}

#[test]
fn field_sample_preview_resizes_the_glyph_grid() {
    let Some(gpu) = common::gpu() else { return };
    let mut scene = ParticleScene::initialize(&gpu, (320, 240), common::scene_config()).unwrap();

    let range = scene.config().sample_range;
    assert_eq!(scene.preview_field_samples(FieldAxis::Y, range.normalize(4.0)), 4);
    assert_eq!(scene.controls().field_samples, [10, 4, 10]);

    scene.commit_field_samples(FieldAxis::Y, 1.0);
    assert_eq!(scene.controls().field_samples, [10, 4, 10]);
}

#[test]
fn a_frame_draws_field_then_particles() {
    let Some(gpu) = common::gpu() else { return };
    let mut scene =
        ParticleScene::initialize(&gpu, common::OFFSCREEN, common::scene_config()).unwrap();

    let stats = common::render_offscreen(&gpu, &mut scene, 1.0 / 60.0).unwrap();

    assert_eq!(stats.draws, 2);
    let children = scene.graph().children(scene.graph().root()).unwrap();
    assert_eq!(children.last(), Some(&scene.particle_node()));
}
