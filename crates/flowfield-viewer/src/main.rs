use std::path::PathBuf;

use anyhow::Result;
use winit::dpi::LogicalSize;

use flowfield_engine::core::{App, AppControl, FrameCtx};
use flowfield_engine::device::{Gpu, GpuInit};
use flowfield_engine::input::{Key, KeyEvent, KeyState};
use flowfield_engine::logging::{LoggingConfig, init_logging};
use flowfield_engine::scene::{ParticleScene, ParticleSceneConfig};
use flowfield_engine::window::{Runtime, RuntimeConfig};

/// Step applied to the tightness control per arrow-key press.
const TIGHTNESS_STEP: f32 = 0.05;

struct Viewer {
    config: ParticleSceneConfig,
    scene: Option<ParticleScene>,
}

impl Viewer {
    fn new(config: ParticleSceneConfig) -> Self {
        Self {
            config,
            scene: None,
        }
    }

    fn handle_key(scene: &mut ParticleScene, event: KeyEvent) -> Result<()> {
        let range = scene.config().particle_range;
        match event.key {
            Key::ArrowUp if event.is_press() => {
                let target = scene.particle_count().saturating_mul(10) as f32;
                scene.commit_particle_count(range.normalize(target))?;
            }
            Key::ArrowDown if event.is_press() => {
                let target = (scene.particle_count() / 10) as f32;
                scene.commit_particle_count(range.normalize(target))?;
            }
            Key::ArrowRight if event.state == KeyState::Pressed => {
                scene.preview_tightness(scene.controls().tightness + TIGHTNESS_STEP);
            }
            Key::ArrowLeft if event.state == KeyState::Pressed => {
                scene.preview_tightness(scene.controls().tightness - TIGHTNESS_STEP);
            }
            _ if !event.repeat => scene.on_key(event.key, event.state)?,
            _ => {}
        }
        Ok(())
    }
}

impl App for Viewer {
    fn on_gpu_ready(&mut self, gpu: &Gpu<'_>) -> Result<()> {
        let size = gpu.size();
        let scene = ParticleScene::initialize(
            gpu.context(),
            (size.width, size.height),
            self.config.clone(),
        )?;
        self.scene = Some(scene);
        log::info!("keys: E re-seed, P pause, O rotate, Up/Down particle count, Left/Right tightness");
        Ok(())
    }

    fn on_key(&mut self, event: KeyEvent) -> AppControl {
        if event.key == Key::Escape {
            return AppControl::Exit;
        }
        let Some(scene) = self.scene.as_mut() else {
            return AppControl::Continue;
        };
        match Self::handle_key(scene, event) {
            Ok(()) => AppControl::Continue,
            Err(err) => {
                log::error!("{err:#}");
                AppControl::Exit
            }
        }
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        if let Some(scene) = self.scene.as_mut() {
            scene.resize(width, height);
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(scene) = self.scene.as_mut() else {
            return AppControl::Continue;
        };

        if let Err(err) = scene.update(ctx.time.dt) {
            log::error!("{err:#}");
            return AppControl::Exit;
        }

        if ctx.time.frame_index % 60 == 0 {
            let c = scene.controls();
            ctx.runtime.set_title(format!(
                "flowfield | {} particles | tightness {:.2}{}",
                c.particle_count,
                c.tightness,
                if c.paused { " | paused" } else { "" },
            ));
        }

        ctx.render(|rctx, target| scene.render(rctx, target).map(|_| ()))
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let assets = std::env::var_os("FLOWFIELD_ASSETS")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets"));
    log::info!("assets: {}", assets.display());

    let config = RuntimeConfig {
        title: "flowfield".to_owned(),
        initial_size: LogicalSize::new(1280.0, 720.0),
    };

    Runtime::run(config, GpuInit::default(), Viewer::new(ParticleSceneConfig::with_asset_dir(assets)))
}
