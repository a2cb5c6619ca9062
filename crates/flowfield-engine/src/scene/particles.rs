use std::rc::Rc;

use anyhow::{Context, Result};
use glam::{Mat4, Vec3, Vec4};
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::seed::{PARTICLE_ATTRIBUTES, seed_particles, seed_rng_state};
use super::{Camera, ControlState, DrawList, NodeId, ParticleSceneConfig, SceneGraph, ShaderPaths, SliderRange};
use crate::compute::{
    ComputeBuffer, ComputeContext, ComputeImage, DispatchReport, KernelArgs, KernelBuffer,
    KernelBufferKind, KernelBuildOptions, KernelSource,
};
use crate::device::GpuContext;
use crate::field::{self, VectorField};
use crate::gpu::{GraphicsBuffer, GraphicsTexture};
use crate::input::{Key, KeyState};
use crate::interop::InteropLedger;
use crate::material::{ParticleMaterial, VectorFieldMaterial};
use crate::mesh::{AttributeLayout, Mesh, MeshId, MeshStore, PrimitiveMode};
use crate::render::{FrameStats, RenderCtx, RenderTarget, Renderer};
use crate::shader::{ShaderProgram, ShaderReloader, ShaderStage, SharedProgram};

/// Axis of the vector-field glyph grid.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FieldAxis {
    X,
    Y,
    Z,
}

impl FieldAxis {
    fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

const TIGHTNESS_RANGE: SliderRange = SliderRange::new(0.0, 1.0);

// One line glyph: base and tip, each `{position w/ tip factor in x, colour}`.
const GLYPH_VERTICES: [f32; 14] = [
    0.0, 0.0, 0.0, 1.0, 0.15, 0.35, 0.9, //
    1.0, 0.0, 0.0, 1.0, 0.85, 0.95, 1.0,
];
const GLYPH_ATTRIBUTES: [u32; 2] = [4, 3];

struct Particles {
    node: NodeId,
    mesh: MeshId,
    program: SharedProgram,
    alias: ComputeBuffer,
    seeds: KernelBuffer,
}

struct Field {
    node: NodeId,
    mesh: MeshId,
    program: SharedProgram,
    texture: Rc<GraphicsTexture>,
    image: ComputeImage,
    material: Rc<VectorFieldMaterial>,
    bbox: KernelBuffer,
}

/// The particle simulation scene.
///
/// Per frame: pending shader changes are turned into rebuild tasks, the kernel
/// advances the particles (unless paused), the camera rig turns (if enabled),
/// then the graph is traversed and drawn. Rebuild tasks run right before the
/// render pass.
pub struct ParticleScene {
    config: ParticleSceneConfig,
    gpu: GpuContext,

    graph: SceneGraph,
    meshes: MeshStore,
    camera: Camera,
    camera_rig: NodeId,
    draw_list: DrawList,

    renderer: Renderer,
    reloader: ShaderReloader,
    compute: ComputeContext,

    controls: ControlState,
    rng: StdRng,

    particles: Particles,
    field: Field,
}

impl ParticleScene {
    /// Builds compute, the vector field and the particle system.
    ///
    /// `viewport` is the drawable size used for the camera aspect.
    pub fn initialize(
        gpu: &GpuContext,
        viewport: (u32, u32),
        config: ParticleSceneConfig,
    ) -> Result<Self> {
        let source = KernelSource::from_path(&config.kernel)
            .with_context(|| format!("loading kernel {}", config.kernel.display()))?;
        let compute = ComputeContext::initialize(gpu, &source, &KernelBuildOptions::default())
            .context("compute initialization failed")?;

        let mut reloader = if config.watch_shaders {
            ShaderReloader::new()
        } else {
            ShaderReloader::manual()
        };
        let mut graph = SceneGraph::new();
        let mut meshes = MeshStore::new();
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let cam = &config.camera;
        let mut camera = Camera::new(
            cam.fov_y_degrees.to_radians(),
            viewport.0 as f32,
            viewport.1 as f32,
            cam.near,
            cam.far,
        );
        camera.set_position(Vec3::new(0.0, 0.0, cam.distance));
        let camera_rig = graph.add_node("camera rig");
        graph.add_child(graph.root(), camera_rig)?;

        let field = Self::init_field(gpu, &compute, &mut graph, &mut meshes, &mut reloader, &config)?;

        let particle_program = load_program(gpu, "particles", &config.particle_shaders)?;
        let particle_material = Rc::new(ParticleMaterial::new(Rc::clone(&particle_program)));
        let mut particle_mesh = Mesh::new("particles", PrimitiveMode::Points).shareable(true);
        particle_mesh.set_material(particle_material);

        let count = clamp_count(&config.particle_range, config.initial_particles);
        let (alias, seeds) = upload_particles(gpu, &compute, &mut particle_mesh, &mut rng, count)?;
        let particle_mesh = meshes.insert(particle_mesh);
        let particle_node = graph.add_mesh_node("particles", particle_mesh);
        graph.add_child(graph.root(), particle_node)?;

        reloader.add_files_to_watch(
            particle_program.borrow().paths(),
            ShaderProgram::rebuild_task(&particle_program, gpu.device()),
        );

        let controls = ControlState {
            particle_count: count,
            field_samples: field.material.samples(),
            tightness: config.tightness,
            paused: false,
            rotating: false,
        };

        log::info!("particle scene ready with {count} particle(s)");

        Ok(Self {
            gpu: gpu.clone(),
            graph,
            meshes,
            camera,
            camera_rig,
            draw_list: DrawList::new(),
            renderer: Renderer::default(),
            reloader,
            compute,
            controls,
            rng,
            particles: Particles {
                node: particle_node,
                mesh: particle_mesh,
                program: particle_program,
                alias,
                seeds,
            },
            field,
            config,
        })
    }

    fn init_field(
        gpu: &GpuContext,
        compute: &ComputeContext,
        graph: &mut SceneGraph,
        meshes: &mut MeshStore,
        reloader: &mut ShaderReloader,
        config: &ParticleSceneConfig,
    ) -> Result<Field> {
        let program = load_program(gpu, "vector field", &config.field_shaders)?;

        let volume: VectorField = match &config.field {
            Some(path) => field::load_fga(path)
                .with_context(|| format!("loading vector field {}", path.display()))?,
            None => {
                log::info!("no field file configured; using a procedural vortex");
                field::vortex([16, 16, 16])
            }
        };
        let texture = Rc::new(GraphicsTexture::volume(
            gpu.device(),
            gpu.queue(),
            "vector field",
            volume.dims,
            &volume.texels,
        ));
        let image = compute.import_texture(&texture);

        let material = Rc::new(VectorFieldMaterial::new(
            Rc::clone(&program),
            Rc::clone(&texture),
            config.field_samples,
        ));

        let mut mesh = Mesh::new("vector field", PrimitiveMode::Lines);
        mesh.initialize(
            gpu.device(),
            &GLYPH_VERTICES,
            AttributeLayout::new(&GLYPH_ATTRIBUTES)?,
        )?;
        mesh.set_instances(material.glyph_count());
        mesh.set_material(material.clone());
        let mesh = meshes.insert(mesh);

        let node = graph.add_mesh_node("vector field", mesh);
        graph
            .transform_mut(node)?
            .set_scale(Vec3::splat(config.field_scale));
        graph.add_child(graph.root(), node)?;

        let bbox = compute.create_buffer(
            "field bounding box",
            bytemuck::cast_slice(&[0f32; 8]),
            KernelBufferKind::Uniform,
        );

        reloader.add_files_to_watch(
            program.borrow().paths(),
            ShaderProgram::rebuild_task(&program, gpu.device()),
        );

        Ok(Field {
            node,
            mesh,
            program,
            texture,
            image,
            material,
            bbox,
        })
    }

    // ── frame ──────────────────────────────────────────────────────────────

    /// Reload polling, simulation and camera motion for one frame.
    pub fn update(&mut self, dt: f32) -> Result<()> {
        let queued = self.reloader.poll(self.renderer.tasks_mut());
        if queued > 0 {
            log::debug!("{queued} shader rebuild(s) queued");
        }

        if !self.controls.paused {
            self.simulate(dt * self.config.time_scale)?;
        }

        if self.controls.rotating {
            let step = self.config.camera.rotation_step;
            self.graph
                .transform_mut(self.camera_rig)?
                .rotate(Vec3::NEG_Y, step);
        }
        Ok(())
    }

    /// Runs one kernel dispatch over every particle.
    pub fn simulate(&mut self, delta_time: f32) -> Result<DispatchReport> {
        let world = self.graph.world_transform(self.field.node)?;
        let bbox = bounding_box(world);
        self.compute
            .write_buffer(&self.field.bbox, bytemuck::cast_slice(&bbox))?;

        let args = KernelArgs::new()
            .buffer(&self.particles.alias)
            .private(&self.particles.seeds)
            .image(&self.field.image)
            .private(&self.field.bbox)
            .f32(self.controls.tightness)
            .f32(delta_time);

        let report = self
            .compute
            .dispatch(&args, self.controls.particle_count)
            .context("particle simulation dispatch failed")?;
        Ok(report)
    }

    /// Traverses the graph and draws it into `target`.
    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) -> Result<FrameStats> {
        let rig = self.graph.world_transform(self.camera_rig)?;
        self.graph.draw(self.camera.matrices(rig), &mut self.draw_list);
        let stats = self
            .renderer
            .render(ctx, target, &self.draw_list, &self.meshes)?;
        Ok(stats)
    }

    pub fn frame(
        &mut self,
        dt: f32,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
    ) -> Result<FrameStats> {
        self.update(dt)?;
        self.render(ctx, target)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_aspect(width as f32, height as f32);
    }

    // ── controls ───────────────────────────────────────────────────────────

    /// Recreates the particle buffer with `count` fresh particles and re-imports it.
    pub fn set_particle_count(&mut self, count: u32) -> Result<()> {
        let count = clamp_count(&self.config.particle_range, count);
        let mesh = self
            .meshes
            .get_mut(self.particles.mesh)
            .context("particle mesh missing")?;

        let (alias, seeds) = upload_particles(&self.gpu, &self.compute, mesh, &mut self.rng, count)?;
        self.particles.alias = alias;
        std::mem::replace(&mut self.particles.seeds, seeds).destroy();
        self.controls.particle_count = count;

        log::info!("particle count set to {count}");
        Ok(())
    }

    /// Continuous drag of the particle-count control. Only the commit applies.
    pub fn preview_particle_count(&mut self, value: f32) {
        log::trace!(
            "particle count preview {}",
            self.config.particle_range.map_u32(value)
        );
    }

    /// Maps a normalized control value onto the count range and applies it.
    pub fn commit_particle_count(&mut self, value: f32) -> Result<u32> {
        let count = self.config.particle_range.map_u32(value);
        self.set_particle_count(count)?;
        Ok(self.controls.particle_count)
    }

    pub fn preview_field_samples(&mut self, axis: FieldAxis, value: f32) -> u32 {
        let samples = self.config.sample_range.map_u32(value);
        let glyphs = self.field.material.set_sample_axis(axis.index(), samples);
        if let Some(mesh) = self.meshes.get_mut(self.field.mesh) {
            mesh.set_instances(glyphs);
        }
        self.controls.field_samples = self.field.material.samples();
        samples
    }

    pub fn commit_field_samples(&mut self, _axis: FieldAxis, _value: f32) {}

    pub fn preview_tightness(&mut self, value: f32) -> f32 {
        self.controls.tightness = TIGHTNESS_RANGE.map(value);
        self.controls.tightness
    }

    pub fn commit_tightness(&mut self, _value: f32) {}

    /// `E` re-seeds, `P` pauses, `O` toggles camera rotation. Presses only.
    pub fn on_key(&mut self, key: Key, state: KeyState) -> Result<()> {
        if state != KeyState::Pressed {
            return Ok(());
        }
        match key {
            Key::E => self.set_particle_count(self.controls.particle_count)?,
            Key::P => {
                self.controls.paused = !self.controls.paused;
                log::info!("simulation {}", if self.controls.paused { "paused" } else { "resumed" });
            }
            Key::O => self.controls.rotating = !self.controls.rotating,
            _ => {}
        }
        Ok(())
    }

    // ── queries ────────────────────────────────────────────────────────────

    pub fn controls(&self) -> &ControlState {
        &self.controls
    }

    pub fn config(&self) -> &ParticleSceneConfig {
        &self.config
    }

    pub fn particle_count(&self) -> u32 {
        self.controls.particle_count
    }

    pub fn particle_buffer(&self) -> Option<&GraphicsBuffer> {
        self.meshes.get(self.particles.mesh)?.vertex_buffer()
    }

    pub fn particle_alias(&self) -> &ComputeBuffer {
        &self.particles.alias
    }

    pub fn field_texture(&self) -> &GraphicsTexture {
        &self.field.texture
    }

    pub fn ledger(&self) -> &InteropLedger {
        self.compute.ledger()
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn particle_node(&self) -> NodeId {
        self.particles.node
    }

    pub fn particle_program(&self) -> &SharedProgram {
        &self.particles.program
    }

    pub fn field_program(&self) -> &SharedProgram {
        &self.field.program
    }

    pub fn reloader(&self) -> &ShaderReloader {
        &self.reloader
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }
}

impl Drop for ParticleScene {
    fn drop(&mut self) {
        self.meshes.destroy_all();
    }
}

fn load_program(gpu: &GpuContext, label: &str, paths: &ShaderPaths) -> Result<SharedProgram> {
    let mut program = ShaderProgram::new(label)
        .with_stage(ShaderStage::Vertex, &paths.vertex)?
        .with_stage(ShaderStage::Fragment, &paths.fragment)?;
    program
        .initialize(gpu.device())
        .with_context(|| format!("building shader program `{label}`"))?;
    Ok(program.into_shared())
}

fn clamp_count(range: &SliderRange, count: u32) -> u32 {
    (count as f32).clamp(range.min, range.max).round() as u32
}

/// Writes fresh particles into `mesh`, then imports the new buffer and creates
/// matching RNG state for the kernel.
fn upload_particles(
    gpu: &GpuContext,
    compute: &ComputeContext,
    mesh: &mut Mesh,
    rng: &mut StdRng,
    count: u32,
) -> Result<(ComputeBuffer, KernelBuffer)> {
    let data = seed_particles(rng, count);
    mesh.initialize(gpu.device(), &data, AttributeLayout::new(&PARTICLE_ATTRIBUTES)?)?;

    let buffer = mesh
        .vertex_buffer()
        .context("particle mesh has no vertex buffer after initialization")?;
    let alias = compute.import_buffer(buffer)?;

    let seeds = seed_rng_state(rng, count);
    let seeds = compute.create_buffer(
        "particle rng state",
        bytemuck::cast_slice(&seeds),
        KernelBufferKind::Storage,
    );
    Ok((alias, seeds))
}

/// Opposite corners of the unit cube mapped through the field's world matrix.
fn bounding_box(world: Mat4) -> [f32; 8] {
    let a = world * Vec4::new(-1.0, -1.0, 1.0, 1.0);
    let b = world * Vec4::new(1.0, 1.0, -1.0, 1.0);
    [a.x, a.y, a.z, a.w, b.x, b.y, b.z, b.w]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_follows_field_scale() {
        let bbox = bounding_box(Mat4::from_scale(Vec3::splat(2.0)));
        assert_eq!(bbox, [-2.0, -2.0, 2.0, 1.0, 2.0, 2.0, -2.0, 1.0]);
    }

    #[test]
    fn counts_clamp_into_range() {
        let range = SliderRange::new(1.0, 1_000_000.0);
        assert_eq!(clamp_count(&range, 0), 1);
        assert_eq!(clamp_count(&range, 2), 2);
        assert_eq!(clamp_count(&range, 5_000_000), 1_000_000);
    }

    #[test]
    fn glyph_matches_its_layout() {
        let layout = AttributeLayout::new(&GLYPH_ATTRIBUTES).unwrap();
        assert_eq!(layout.vertex_count(GLYPH_VERTICES.len()).unwrap(), 2);
    }
}
