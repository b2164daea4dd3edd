//! Stride Demo - Locomotion Rig Viewer
//!
//! Drives the glider (or a custom archetype) around the stepped level with a
//! chase camera.
//!
//! Run with: `cargo run --bin stride_demo -- [--archetype FILE] [--level FILE]`
//!
//! Controls:
//! - W/S: Accelerate forward/backward
//! - A/D: Turn left/right
//! - Space: Jump (only while grounded)
//! - R: Reset the level and actor
//! - ESC: Exit
//!
//! Logs at info by default; set `RUST_LOG=debug` for jump and contact logs.

use std::path::PathBuf;
use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode as WinitKey, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

use stride_engine::config::{Archetype, ConfigError, LevelConfig};
use stride_engine::input::{ControlSet, ControlState, KeyCode};
use stride_engine::physics::RapierWorld;
use stride_engine::render::{GpuRenderer, RenderError};
use stride_engine::simulation::{FrameScheduler, SimulationError, SimulationLoop, TickOutcome};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("usage: stride_demo [--archetype FILE] [--level FILE] ({0})")]
    Usage(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

// ============================================================================
// ARGUMENTS
// ============================================================================

#[derive(Debug, Default)]
struct DemoArgs {
    archetype: Option<PathBuf>,
    level: Option<PathBuf>,
}

impl DemoArgs {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, DemoError> {
        let mut parsed = Self::default();
        while let Some(flag) = args.next() {
            let slot = match flag.as_str() {
                "--archetype" => &mut parsed.archetype,
                "--level" => &mut parsed.level,
                other => return Err(DemoError::Usage(format!("unknown argument `{other}`"))),
            };
            let value = args
                .next()
                .ok_or_else(|| DemoError::Usage(format!("`{flag}` needs a file")))?;
            *slot = Some(PathBuf::from(value));
        }
        Ok(parsed)
    }

    fn load(&self) -> Result<(Archetype, LevelConfig), DemoError> {
        let archetype = match &self.archetype {
            Some(path) => Archetype::from_path(path)?,
            None => Archetype::glider(),
        };
        let level = match &self.level {
            Some(path) => LevelConfig::from_path(path)?,
            None => LevelConfig::default(),
        };
        Ok((archetype, level))
    }
}

// ============================================================================
// FRAME SCHEDULING
// ============================================================================

/// Ticks on window redraws; one request in flight at a time.
struct RedrawScheduler {
    window: Arc<Window>,
    pending: bool,
}

impl RedrawScheduler {
    fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }
}

impl FrameScheduler for RedrawScheduler {
    fn schedule_next(&mut self) {
        self.pending = true;
        self.window.request_redraw();
    }

    fn cancel(&mut self) {
        self.pending = false;
    }
}

fn convert_key(key: WinitKey) -> KeyCode {
    match key {
        WinitKey::KeyW => KeyCode::W,
        WinitKey::KeyA => KeyCode::A,
        WinitKey::KeyS => KeyCode::S,
        WinitKey::KeyD => KeyCode::D,
        WinitKey::KeyQ => KeyCode::Q,
        WinitKey::KeyE => KeyCode::E,
        WinitKey::KeyR => KeyCode::R,
        WinitKey::KeyF => KeyCode::F,
        WinitKey::KeyJ => KeyCode::J,
        WinitKey::KeyK => KeyCode::K,
        WinitKey::KeyL => KeyCode::L,
        WinitKey::KeyI => KeyCode::I,
        WinitKey::Space => KeyCode::Space,
        WinitKey::ShiftLeft => KeyCode::ShiftLeft,
        WinitKey::ShiftRight => KeyCode::ShiftRight,
        WinitKey::ControlLeft => KeyCode::ControlLeft,
        WinitKey::ControlRight => KeyCode::ControlRight,
        WinitKey::ArrowUp => KeyCode::ArrowUp,
        WinitKey::ArrowDown => KeyCode::ArrowDown,
        WinitKey::ArrowLeft => KeyCode::ArrowLeft,
        WinitKey::ArrowRight => KeyCode::ArrowRight,
        WinitKey::Escape => KeyCode::Escape,
        WinitKey::Enter => KeyCode::Enter,
        WinitKey::Tab => KeyCode::Tab,
        _ => KeyCode::Unknown,
    }
}

// ============================================================================
// APPLICATION
// ============================================================================

type DemoLoop = SimulationLoop<RapierWorld, GpuRenderer, RedrawScheduler>;

struct StrideDemoApp {
    archetype: Archetype,
    level: LevelConfig,
    bindings: ControlSet,
    controls: ControlState,
    sim: Option<DemoLoop>,
    /// Hidden once any control is pressed
    intro_shown: bool,
    failure: Option<DemoError>,
}

impl StrideDemoApp {
    fn new(archetype: Archetype, level: LevelConfig) -> Self {
        Self {
            archetype,
            level,
            bindings: ControlSet::default(),
            controls: ControlState::new(),
            sim: None,
            intro_shown: true,
            failure: None,
        }
    }

    fn initialize(&mut self, event_loop: &ActiveEventLoop) -> Result<(), DemoError> {
        let attrs = WindowAttributes::default()
            .with_title(format!("Stride \u{00b7} {}", self.archetype.name))
            .with_inner_size(PhysicalSize::new(1280, 800));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let renderer = GpuRenderer::new(Arc::clone(&window))?;
        let scheduler = RedrawScheduler {
            window,
            pending: false,
        };
        let mut sim = SimulationLoop::with_rapier_world(renderer, scheduler, self.level.clone(), &self.archetype)?;
        sim.init()?;

        log::info!("press W/S/A/D to move, Space to jump");
        self.sim = Some(sim);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: DemoError) {
        log::error!("{error}");
        self.failure = Some(error);
        event_loop.exit();
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: WinitKey, pressed: bool) {
        if pressed && key == WinitKey::Escape {
            event_loop.exit();
            return;
        }
        if pressed && key == WinitKey::KeyR {
            if let Some(sim) = self.sim.as_mut() {
                if let Err(e) = sim.reset() {
                    self.fail(event_loop, e.into());
                }
            }
            return;
        }

        self.controls.handle_key(&self.bindings, convert_key(key), pressed);
        if self.intro_shown && self.controls.any_pressed() {
            self.intro_shown = false;
            log::debug!("first control pressed, hiding intro");
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(sim) = self.sim.as_mut() else {
            return;
        };
        if !sim.scheduler_mut().take() {
            return;
        }
        match sim.tick(&self.controls) {
            Ok(TickOutcome::Respawned) => log::info!("actor fell below the level, respawned"),
            Ok(_) => {}
            Err(e) => self.fail(event_loop, e.into()),
        }
    }
}

impl ApplicationHandler for StrideDemoApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.sim.is_none() {
            if let Err(e) = self.initialize(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.handle_key(event_loop, key, event.state == ElementState::Pressed);
                }
            }

            // Keys released while unfocused never arrive
            WindowEvent::Focused(false) => self.controls.release_all(),

            WindowEvent::Resized(size) => {
                if let Some(sim) = self.sim.as_mut() {
                    sim.renderer_mut().resize(size.width, size.height);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }
}

fn run() -> Result<(), DemoError> {
    let args = DemoArgs::parse(std::env::args().skip(1))?;
    let (archetype, level) = args.load()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = StrideDemoApp::new(archetype, level);
    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

fn main() {
    // Info by default, GPU backends quiet unless RUST_LOG says otherwise
    let default = "info,wgpu_hal=off,wgpu_core=off,wgpu=off,naga=off";
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp_secs()
        .try_init();

    println!("===========================================");
    println!("   Stride \u{00b7} Locomotion Rig");
    println!("===========================================");
    println!();
    println!("Controls:");
    println!("  W/S: Forward / backward");
    println!("  A/D: Turn left / right");
    println!("  Space: Jump");
    println!("  R: Reset");
    println!("  ESC: Exit");
    println!();

    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
