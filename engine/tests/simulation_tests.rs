//! Simulation Tests - Tick Order, Respawn and Lifecycle
//!
//! Runs the full loop headless over the built-in box world.

use glam::Vec3;

use stride_engine::config::{Archetype, LevelConfig, ShapeSource};
use stride_engine::input::{Control, ControlState};
use stride_engine::physics::PhysicsWorld;
use stride_engine::render::HeadlessRenderer;
use stride_engine::simulation::{LoopState, ManualScheduler, SimulationLoop, TickOutcome};
use stride_engine::BoxWorld;

const CRATE_ARCHETYPE: &str = include_str!("../../assets/archetypes/crate.json");
const FLAT_LEVEL: &str = include_str!("../../assets/levels/flat.json");

type HeadlessLoop = SimulationLoop<BoxWorld, HeadlessRenderer, ManualScheduler>;

fn glider_loop() -> HeadlessLoop {
    let mut sim = SimulationLoop::with_box_world(
        HeadlessRenderer::with_history(4),
        ManualScheduler::new(),
        LevelConfig::default(),
        &Archetype::glider(),
    )
    .expect("defaults are valid");
    sim.init().expect("init");
    sim
}

fn crate_loop() -> HeadlessLoop {
    let archetype = Archetype::from_json_str(CRATE_ARCHETYPE).expect("crate archetype parses");
    let level = LevelConfig::from_json_str(FLAT_LEVEL).expect("flat level parses");
    let mut sim =
        SimulationLoop::with_box_world(HeadlessRenderer::new(), ManualScheduler::new(), level, &archetype)
            .expect("crate loop builds");
    sim.init().expect("init");
    sim
}

/// Run scheduled ticks until none is pending or `limit` is reached.
fn run(sim: &mut HeadlessLoop, input: &ControlState, limit: usize) -> Vec<TickOutcome> {
    let mut outcomes = Vec::new();
    while outcomes.len() < limit && sim.scheduler_mut().take() {
        outcomes.push(sim.tick(input).expect("tick"));
    }
    outcomes
}

fn held(controls: &[Control]) -> ControlState {
    let mut state = ControlState::new();
    for control in controls {
        state.set(*control, true);
    }
    state
}

// ============================================================================
// Ticking
// ============================================================================

#[test]
fn test_each_tick_schedules_exactly_one_more() {
    let mut sim = glider_loop();
    assert_eq!(sim.scheduler().requests(), 1);

    let outcomes = run(&mut sim, &ControlState::new(), 10);
    assert_eq!(outcomes.len(), 10);
    assert_eq!(sim.scheduler().requests(), 11);
    assert!(sim.scheduler().is_pending());
    assert_eq!(sim.ticks(), 10);
}

#[test]
fn test_camera_tracks_actor_every_tick() {
    let mut sim = glider_loop();
    for outcome in run(&mut sim, &ControlState::new(), 20) {
        let TickOutcome::Advanced { camera } = outcome else {
            panic!("unexpected outcome {outcome:?}");
        };
        let actor = sim.actor().expect("actor");
        let body = sim.world().body(actor.body()).expect("body");
        // Glider camera: straight above, 400 up
        assert_eq!(camera.target, body.position);
        assert_eq!(camera.position, body.position + Vec3::new(0.0, 0.0, 400.0));
    }
    let frame = sim.renderer().last_frame().expect("frame rendered");
    assert_eq!(frame.transforms.len(), sim.scene().len());
}

#[test]
fn test_actor_lands_and_becomes_grounded() {
    let mut sim = crate_loop();
    run(&mut sim, &ControlState::new(), 80);

    let actor = sim.actor().expect("actor");
    assert!(actor.is_grounded());
    let body = sim.world().body(actor.body()).expect("body");
    // Resting on the flat floor (top at z = 0) with half height 6
    assert!((body.position.z - 6.0).abs() < 1.0, "resting height {}", body.position.z);
}

#[test]
fn test_driving_forward_moves_along_heading() {
    let mut sim = crate_loop();
    run(&mut sim, &ControlState::new(), 80);
    let start = {
        let actor = sim.actor().expect("actor");
        sim.world().body(actor.body()).expect("body").position
    };

    run(&mut sim, &held(&[Control::Forward]), 16);

    let actor = sim.actor().expect("actor");
    let end = sim.world().body(actor.body()).expect("body").position;
    // Heading zero: forward is -X
    assert!(end.x < start.x - 10.0, "moved from {start:?} to {end:?}");
    assert!((end.y - start.y).abs() < 1.0);
}

// ============================================================================
// Respawn and lifecycle
// ============================================================================

#[test]
fn test_falling_below_death_plane_respawns() {
    let mut sim = crate_loop();
    run(&mut sim, &ControlState::new(), 3);

    let handle = sim.actor().expect("actor").body();
    sim.world_mut().body_mut(handle).expect("body").position = Vec3::new(0.0, 0.0, -600.0);

    assert!(sim.scheduler_mut().take());
    let outcome = sim.tick(&ControlState::new()).expect("tick");
    assert_eq!(outcome, TickOutcome::Respawned);

    // Fresh level and actor, ticking resumes
    assert!(sim.is_running());
    assert!(sim.scheduler().is_pending());
    assert_eq!(sim.renderer().resets(), 1);
    assert_eq!(sim.world().bodies().len(), 2);

    let actor = sim.actor().expect("respawned actor");
    assert!(!actor.is_grounded());
    assert_eq!(actor.state().time_alive, 0.0);
    assert_eq!(sim.world().body(actor.body()).expect("body").position, Vec3::new(0.0, 0.0, 40.0));
}

#[test]
fn test_stop_then_tick_is_idle() {
    let mut sim = glider_loop();
    run(&mut sim, &ControlState::new(), 5);
    sim.stop();

    assert_eq!(sim.state(), LoopState::Stopped);
    assert!(!sim.scheduler().is_pending());
    assert_eq!(sim.scheduler().cancellations(), 1);
    assert_eq!(sim.tick(&held(&[Control::Forward])).expect("tick"), TickOutcome::Idle);
    assert!(sim.renderer().frames().is_empty());
}

#[test]
fn test_reset_rebuilds_from_defaults() {
    let mut sim = glider_loop();
    run(&mut sim, &held(&[Control::Forward, Control::Left]), 12);
    sim.reset().expect("reset");

    let actor = sim.actor().expect("actor");
    assert_eq!(actor.state().linear.acceleration, 0.0);
    assert_eq!(actor.state().angular.acceleration, 0.0);
    assert_eq!(actor.heading(), Vec3::ZERO);
    assert_eq!(sim.world().bodies().len(), 7);
    assert!(sim.is_running());
}

#[test]
fn test_box_archetype_from_json() {
    let archetype = Archetype::from_json_str(CRATE_ARCHETYPE).expect("parses");
    assert_eq!(archetype.name, "crate");
    assert!(matches!(archetype.shape, ShapeSource::Box { .. }));

    let resolved = archetype.resolve().expect("resolves");
    assert_eq!(resolved.half_extents, Vec3::new(12.0, 8.0, 6.0));
    assert_eq!(resolved.mesh.triangle_count(), 12);
}
