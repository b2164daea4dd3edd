//! Simulation Loop
//!
//! Owns the physics world, the scene, the actor and the renderer, and runs
//! one fixed-order tick per frame:
//!
//! 1. physics step, then contact hooks, then post-step hooks
//! 2. controller advance
//! 3. camera update
//! 4. render
//! 5. schedule the next tick
//!
//! Only one tick is ever in flight: `tick` takes `&mut self` and the next
//! one is requested from the [`FrameScheduler`] only after the current one
//! has finished. Stopping cancels the pending request.

use std::sync::Arc;

use glam::Mat4;

use crate::camera::CameraPose;
use crate::config::{Archetype, ConfigError, LevelConfig, ResolvedArchetype};
use crate::input::ControlState;
use crate::physics::{BodyDesc, BodyHandle, BoxWorld, PhysicsWorld, RapierWorld};
use crate::player::{AdvanceOutcome, LocomotionController};
use crate::render::{SceneRenderer, Scene, box_mesh, grid_mesh, rgb_hex};

/// Source of "run the next tick" requests, typically the display refresh.
pub trait FrameScheduler {
    /// Request one more tick.
    fn schedule_next(&mut self);

    /// Drop any pending request.
    fn cancel(&mut self);
}

/// Scheduler driven by hand: a pending flag the caller polls.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    pending: bool,
    requests: usize,
    cancellations: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Consume the pending request, if there is one.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    /// Total `schedule_next` calls.
    pub fn requests(&self) -> usize {
        self.requests
    }

    /// Total `cancel` calls.
    pub fn cancellations(&self) -> usize {
        self.cancellations
    }
}

impl FrameScheduler for ManualScheduler {
    fn schedule_next(&mut self) {
        self.pending = true;
        self.requests += 1;
    }

    fn cancel(&mut self) {
        self.pending = false;
        self.cancellations += 1;
    }
}

/// Errors from starting or restarting the loop.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("failed to build the level or actor: {0}")]
    Config(#[from] ConfigError),
}

/// Whether ticks are being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
}

/// What one call to [`SimulationLoop::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// The loop is not running; nothing happened
    Idle,
    /// A full tick ran and a frame was rendered
    Advanced { camera: CameraPose },
    /// The actor died; level and actor were rebuilt from defaults
    Respawned,
}

/// Spawns the actor from a resolved archetype.
#[derive(Debug, Clone)]
pub struct ActorFactory {
    resolved: ResolvedArchetype,
}

impl ActorFactory {
    pub fn new(archetype: &Archetype) -> Result<Self, ConfigError> {
        Ok(Self {
            resolved: archetype.resolve()?,
        })
    }

    pub fn archetype(&self) -> &Archetype {
        &self.resolved.archetype
    }

    /// Spawn the actor into `world` and attach its mesh to `scene`.
    pub fn spawn<W: PhysicsWorld + ?Sized>(
        &self,
        world: &mut W,
        scene: &mut Scene,
    ) -> Result<LocomotionController, ConfigError> {
        let actor = LocomotionController::spawn(world, &self.resolved)?;
        scene.attach(actor.body(), Arc::clone(&self.resolved.mesh));
        Ok(actor)
    }
}

/// Create the level's static bodies and their meshes.
pub fn build_level<W: PhysicsWorld + ?Sized>(world: &mut W, level: &LevelConfig, scene: &mut Scene) -> Vec<BodyHandle> {
    let handles: Vec<BodyHandle> = level
        .blocks
        .iter()
        .map(|block| {
            let handle = world.create_body(BodyDesc::static_box(block.center, block.half_extents, level.material));
            let [r, g, b] = block.color;
            scene.attach(handle, Arc::new(box_mesh(block.half_extents, [r, g, b, 1.0])));
            handle
        })
        .collect();

    if let Some(grid) = &level.grid {
        let mesh = grid_mesh(grid.size, grid.spacing, 1.0, rgb_hex(0x888888));
        scene.add_static(Arc::new(mesh), Mat4::from_translation(glam::Vec3::new(0.0, 0.0, grid.z)));
    }

    log::info!("level built with {} blocks", handles.len());
    handles
}

type WorldFactory<W> = Box<dyn FnMut(&LevelConfig) -> W>;

/// Fixed-step driver for one actor in one level.
pub struct SimulationLoop<W: PhysicsWorld, R: SceneRenderer, S: FrameScheduler> {
    world_factory: WorldFactory<W>,
    world: W,
    renderer: R,
    scheduler: S,
    level: LevelConfig,
    actors: ActorFactory,
    actor: Option<LocomotionController>,
    scene: Scene,
    state: LoopState,
    ticks: u64,
}

impl<R: SceneRenderer, S: FrameScheduler> SimulationLoop<BoxWorld, R, S> {
    /// Loop over the [`BoxWorld`] test double with the level's gravity.
    pub fn with_box_world(
        renderer: R,
        scheduler: S,
        level: LevelConfig,
        archetype: &Archetype,
    ) -> Result<Self, SimulationError> {
        Self::new(
            Box::new(|level: &LevelConfig| BoxWorld::new(level.gravity)),
            renderer,
            scheduler,
            level,
            archetype,
        )
    }
}

impl<R: SceneRenderer, S: FrameScheduler> SimulationLoop<RapierWorld, R, S> {
    /// Loop over a rapier3d world with the level's gravity.
    pub fn with_rapier_world(
        renderer: R,
        scheduler: S,
        level: LevelConfig,
        archetype: &Archetype,
    ) -> Result<Self, SimulationError> {
        Self::new(
            Box::new(|level: &LevelConfig| RapierWorld::new(level.gravity)),
            renderer,
            scheduler,
            level,
            archetype,
        )
    }
}

impl<W: PhysicsWorld, R: SceneRenderer, S: FrameScheduler> SimulationLoop<W, R, S> {
    /// Validate the defaults and create an empty world. The loop starts stopped.
    pub fn new(
        mut world_factory: WorldFactory<W>,
        renderer: R,
        scheduler: S,
        level: LevelConfig,
        archetype: &Archetype,
    ) -> Result<Self, SimulationError> {
        level.validate()?;
        let actors = ActorFactory::new(archetype)?;
        let world = world_factory(&level);

        Ok(Self {
            world_factory,
            world,
            renderer,
            scheduler,
            level,
            actors,
            actor: None,
            scene: Scene::new(),
            state: LoopState::Stopped,
            ticks: 0,
        })
    }

    /// Build level and actor and start ticking.
    pub fn init(&mut self) -> Result<(), SimulationError> {
        self.populate()?;
        self.state = LoopState::Running;
        self.scheduler.schedule_next();
        Ok(())
    }

    /// Cancel the pending tick and tear everything down to an empty world.
    pub fn stop(&mut self) {
        self.scheduler.cancel();
        self.world = (self.world_factory)(&self.level);
        self.renderer.reset();
        self.scene.clear();
        self.actor = None;
        self.state = LoopState::Stopped;
        log::info!("simulation stopped after {} ticks", self.ticks);
    }

    /// Stop, rebuild level and actor from the defaults, and resume.
    pub fn reset(&mut self) -> Result<(), SimulationError> {
        self.stop();
        if let Err(e) = self.populate() {
            log::error!("respawn failed: {e}");
            return Err(e.into());
        }
        self.state = LoopState::Running;
        self.scheduler.schedule_next();
        log::info!("simulation reset");
        Ok(())
    }

    fn populate(&mut self) -> Result<(), ConfigError> {
        build_level(&mut self.world, &self.level, &mut self.scene);
        let actor = self.actors.spawn(&mut self.world, &mut self.scene)?;
        self.actor = Some(actor);
        Ok(())
    }

    /// Run one tick with the controls as they are now.
    pub fn tick(&mut self, input: &ControlState) -> Result<TickOutcome, SimulationError> {
        if self.state != LoopState::Running {
            return Ok(TickOutcome::Idle);
        }
        let Some(actor) = self.actor.as_mut() else {
            return Ok(TickOutcome::Idle);
        };

        let dt = self.level.timestep;
        let events = self.world.step(dt);

        let body = actor.body();
        for contact in events.contacts.iter().filter(|c| c.body == body) {
            actor.on_contact(&self.world, contact);
        }
        if events.post_step.contains(&body) {
            actor.post_step(&mut self.world);
        }

        if actor.advance(input, &mut self.world, dt) == AdvanceOutcome::Destroyed {
            self.reset()?;
            return Ok(TickOutcome::Respawned);
        }

        let Some(camera) = actor.camera_pose(&self.world) else {
            log::warn!("{} missing from the world, no camera this tick", actor.body());
            self.scheduler.schedule_next();
            return Ok(TickOutcome::Idle);
        };

        let instances = self.scene.instances(&self.world);
        self.renderer.render(&camera, &instances);

        self.ticks += 1;
        self.scheduler.schedule_next();
        Ok(TickOutcome::Advanced { camera })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn actor(&self) -> Option<&LocomotionController> {
        self.actor.as_ref()
    }

    pub fn actor_mut(&mut self) -> Option<&mut LocomotionController> {
        self.actor.as_mut()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn level(&self) -> &LevelConfig {
        &self.level
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Completed ticks since creation.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
