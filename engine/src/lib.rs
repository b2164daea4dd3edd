//! Stride Engine Library
//!
//! A third-person locomotion rig: a keyboard-driven rigid body with eased
//! acceleration, ground-gated jumping, upright correction and a chase
//! camera, running on a fixed-step physics loop.
//!
//! # Modules
//!
//! - [`input`] - Control bindings and held-control state
//! - [`physics`] - The physics world contract, the rapier3d [`RapierWorld`] and the [`BoxWorld`] test double
//! - [`player`] - Locomotion state and the per-tick controller
//! - [`camera`] - Chase camera pose and projection
//! - [`config`] - Actor archetypes and level layout, loadable from JSON
//! - [`model`] - Triangle/quad model parser for actor meshes
//! - [`render`] - Scene meshes, GPU and headless renderers
//! - [`simulation`] - The fixed-order tick loop tying it all together
//!
//! # Example
//!
//! ```ignore
//! use stride_engine::config::{Archetype, LevelConfig};
//! use stride_engine::input::ControlState;
//! use stride_engine::render::HeadlessRenderer;
//! use stride_engine::simulation::{ManualScheduler, SimulationLoop};
//!
//! let mut sim = SimulationLoop::with_box_world(
//!     HeadlessRenderer::new(),
//!     ManualScheduler::new(),
//!     LevelConfig::default(),
//!     &Archetype::glider(),
//! )?;
//! sim.init()?;
//!
//! let controls = ControlState::new();
//! while sim.scheduler_mut().take() {
//!     sim.tick(&controls)?;
//! }
//! ```

pub mod camera;
pub mod config;
pub mod input;
pub mod math;
pub mod model;
pub mod physics;
pub mod player;
pub mod render;
pub mod simulation;

// Re-export the types most callers touch
pub use config::{Archetype, ConfigError, LevelConfig};
pub use input::{Control, ControlSet, ControlState, KeyCode};
pub use physics::{BoxWorld, PhysicsWorld, RapierWorld};
pub use player::LocomotionController;
pub use simulation::{FrameScheduler, SimulationError, SimulationLoop, TickOutcome};
