//! Locomotion Tests - Easing, Jumping, Righting and the Death Plane
//!
//! Drives a box-shaped actor through the public controller API on the
//! built-in box world.

use glam::{EulerRot, Quat, Vec3};

use stride_engine::config::level::{LEVEL_GRAVITY, LEVEL_TIMESTEP};
use stride_engine::config::{Archetype, ResolvedArchetype, ShapeSource};
use stride_engine::config::AxisTuning;
use stride_engine::input::{Control, ControlState};
use stride_engine::physics::{BodyDesc, BoxWorld, Material, PhysicsWorld};
use stride_engine::player::{AdvanceOutcome, AxisState, LocomotionController};

const DT: f32 = LEVEL_TIMESTEP;

// ============================================================================
// Helpers
// ============================================================================

fn box_actor() -> ResolvedArchetype {
    let mut archetype = Archetype::glider();
    archetype.shape = ShapeSource::Box {
        half_extents: Vec3::new(10.0, 6.0, 4.0),
        color: [0.2, 0.9, 0.8],
    };
    archetype.resolve().expect("box archetype resolves")
}

fn level_world() -> BoxWorld {
    let mut world = BoxWorld::new(LEVEL_GRAVITY);
    world.create_body(BodyDesc::static_box(
        Vec3::new(0.0, 0.0, -20.0),
        Vec3::new(800.0, 800.0, 20.0),
        Material::default(),
    ));
    world
}

fn controls(held: &[Control]) -> ControlState {
    let mut state = ControlState::new();
    for control in held {
        state.set(*control, true);
    }
    state
}

/// One full tick in loop order: step, contacts, post-step, advance.
fn tick(world: &mut BoxWorld, actor: &mut LocomotionController, input: &ControlState) -> AdvanceOutcome {
    let events = world.step(DT);
    for contact in &events.contacts {
        actor.on_contact(world, contact);
    }
    if events.post_step.contains(&actor.body()) {
        actor.post_step(world);
    }
    actor.advance(input, world, DT)
}

/// Spawn on the floor and tick until the actor reports ground.
fn landed() -> (BoxWorld, LocomotionController) {
    let mut world = level_world();
    let mut actor = LocomotionController::spawn(&mut world, &box_actor()).expect("spawns");
    let idle = ControlState::new();

    for _ in 0..200 {
        tick(&mut world, &mut actor, &idle);
        if actor.is_grounded() {
            break;
        }
    }
    assert!(actor.is_grounded(), "actor never landed");

    // Let the landing bounce die out so the floor contact is current
    for _ in 0..200 {
        tick(&mut world, &mut actor, &idle);
        let body = world.body(actor.body()).expect("body");
        if world.has_collisions(actor.body()) && body.linear_velocity.z.abs() < 0.5 {
            break;
        }
    }
    assert!(world.has_collisions(actor.body()), "actor never settled");
    (world, actor)
}

fn linear_axis() -> AxisState {
    AxisState::new(AxisTuning {
        step: 1.5,
        max: 45.0,
        damping: 0.9,
    })
}

// ============================================================================
// Easing
// ============================================================================

#[test]
fn test_held_forward_ramps_then_snaps() {
    let mut axis = linear_axis();
    let mut previous = axis.acceleration;

    // Walks down one step at a time until it reaches half of max
    loop {
        axis.ease_negative();
        if axis.acceleration > previous {
            break;
        }
        assert!((previous - axis.acceleration - 1.5).abs() < 1e-5);
        previous = axis.acceleration;
    }

    assert!(previous <= -22.5);
    assert_eq!(axis.acceleration, -11.25);
}

#[test]
fn test_held_input_never_exceeds_max() {
    let mut axis = linear_axis();
    for _ in 0..500 {
        axis.ease_positive();
        assert!(axis.acceleration.abs() <= axis.max);
    }
    for _ in 0..500 {
        axis.ease_negative();
        assert!(axis.acceleration.abs() <= axis.max);
    }
}

#[test]
fn test_airborne_forward_speed_grows_until_snap() {
    // Nothing to collide with
    let mut world = BoxWorld::new(LEVEL_GRAVITY);
    let mut actor = LocomotionController::spawn(&mut world, &box_actor()).expect("spawns");
    let forward = controls(&[Control::Forward]);

    let mut previous = 0.0_f32;
    let mut snapped = false;
    for _ in 0..40 {
        tick(&mut world, &mut actor, &forward);
        let velocity = world.body(actor.body()).expect("body").linear_velocity;
        let planar = velocity.truncate().length();

        assert!(planar <= actor.state().linear.max + 1e-4);
        if planar < previous {
            snapped = true;
            break;
        }
        previous = planar;
    }

    assert!(snapped, "ramp never reached the snap threshold");
    assert!(previous >= 22.5 - 1e-4);
}

#[test]
fn test_clamp_holds_for_arbitrary_input() {
    let (mut world, mut actor) = landed();

    // Deterministic pseudo-random key mashing
    let mut seed: u32 = 0x2545_f491;
    for _ in 0..400 {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        let held: Vec<Control> = Control::ALL
            .iter()
            .enumerate()
            .filter(|(i, _)| seed & (1 << i) != 0)
            .map(|(_, c)| *c)
            .collect();

        tick(&mut world, &mut actor, &controls(&held));

        let state = actor.state();
        assert!(state.linear.acceleration.abs() <= state.linear.max);
        assert!(state.angular.acceleration.abs() <= state.angular.max);
    }
}

#[test]
fn test_released_axis_decays_monotonically() {
    let (mut world, mut actor) = landed();
    let forward = controls(&[Control::Forward, Control::Right]);
    for _ in 0..5 {
        tick(&mut world, &mut actor, &forward);
    }

    let idle = ControlState::new();
    let mut linear = actor.state().linear.acceleration.abs();
    let mut angular = actor.state().angular.acceleration.abs();
    assert!(linear > 0.0 && angular > 0.0);

    for _ in 0..30 {
        tick(&mut world, &mut actor, &idle);
        let state = actor.state();
        assert!(state.linear.acceleration.abs() <= linear);
        assert!(state.angular.acceleration.abs() <= angular);
        linear = state.linear.acceleration.abs();
        angular = state.angular.acceleration.abs();
    }
    assert!(linear < 1.0);
}

#[test]
fn test_forward_sets_planar_velocity_along_heading() {
    let (mut world, mut actor) = landed();
    tick(&mut world, &mut actor, &controls(&[Control::Forward]));

    let acceleration = actor.state().linear.acceleration;
    assert!(acceleration < 0.0);

    let body = world.body(actor.body()).expect("body");
    let yaw = actor.heading().z;
    assert!((body.linear_velocity.x - acceleration * yaw.cos()).abs() < 1e-4);
    assert!((body.linear_velocity.y - acceleration * yaw.sin()).abs() < 1e-4);
}

#[test]
fn test_turning_rotates_about_z() {
    let (mut world, mut actor) = landed();
    let (_, _, before) = world.body(actor.body()).expect("body").orientation.to_euler(EulerRot::XYZ);

    tick(&mut world, &mut actor, &controls(&[Control::Left]));

    let (roll, pitch, after) = world.body(actor.body()).expect("body").orientation.to_euler(EulerRot::XYZ);
    assert!((after - before - actor.state().angular.acceleration).abs() < 1e-4);
    assert!(actor.state().angular.acceleration > 0.0);
    assert!(roll.abs() < 1e-4 && pitch.abs() < 1e-4);
}

// ============================================================================
// Jumping
// ============================================================================

#[test]
fn test_jump_requires_ground() {
    let mut world = level_world();
    let mut actor = LocomotionController::spawn(&mut world, &box_actor()).expect("spawns");

    // Airborne at spawn: jump does nothing
    tick(&mut world, &mut actor, &controls(&[Control::Jump]));
    let velocity = world.body(actor.body()).expect("body").linear_velocity;
    assert!(velocity.z < 0.0);
    assert!(!actor.is_grounded());
}

#[test]
fn test_jump_from_ground_clears_grounded() {
    let (mut world, mut actor) = landed();

    let outcome = actor.advance(&controls(&[Control::Jump]), &mut world, DT);
    assert_eq!(outcome, AdvanceOutcome::Alive);
    assert!(!actor.is_grounded());
    assert_eq!(world.body(actor.body()).expect("body").linear_velocity.z, 38.0);

    // Holding jump in the air does not fire again
    world.step(DT);
    actor.advance(&controls(&[Control::Jump]), &mut world, DT);
    assert!(world.body(actor.body()).expect("body").linear_velocity.z < 38.0);
}

#[test]
fn test_grounded_without_contact_does_not_jump() {
    let (mut world, mut actor) = landed();

    // Lift clear of the floor; grounded is only cleared by jumping
    let body = world.body_mut(actor.body()).expect("body");
    body.position.z += 100.0;
    body.linear_velocity = Vec3::ZERO;
    world.step(DT);
    assert!(!world.has_collisions(actor.body()));
    assert!(actor.is_grounded());

    actor.advance(&controls(&[Control::Jump]), &mut world, DT);

    assert!(actor.is_grounded());
    let velocity = world.body(actor.body()).expect("body").linear_velocity;
    assert!(velocity.z <= 0.0, "jumped without contact: vz {}", velocity.z);
}

#[test]
fn test_jump_clears_a_step() {
    let (mut world, mut actor) = landed();
    let start = world.body(actor.body()).expect("body").position.z;

    let mut peak = start;
    tick(&mut world, &mut actor, &controls(&[Control::Jump]));
    for _ in 0..40 {
        tick(&mut world, &mut actor, &ControlState::new());
        peak = peak.max(world.body(actor.body()).expect("body").position.z);
    }
    assert!(peak - start > 60.0, "peak rise {}", peak - start);
}

// ============================================================================
// Orientation
// ============================================================================

#[test]
fn test_tipped_actor_is_righted_on_contact() {
    let (mut world, mut actor) = landed();
    let yaw = 0.6;
    world.body_mut(actor.body()).expect("body").orientation =
        Quat::from_euler(EulerRot::XYZ, std::f32::consts::FRAC_PI_2 + 0.2, 0.0, yaw);

    tick(&mut world, &mut actor, &ControlState::new());

    let orientation = world.body(actor.body()).expect("body").orientation;
    let (x, y, z) = orientation.to_euler(EulerRot::XYZ);
    assert!(x.abs() < 1e-4 && y.abs() < 1e-4, "roll {x} pitch {y}");
    assert!(z.abs() > 0.0);
    assert_eq!(actor.heading().x, 0.0);
    assert_eq!(actor.heading().y, 0.0);
}

#[test]
fn test_tipped_actor_in_air_is_not_righted() {
    let mut world = level_world();
    let mut actor = LocomotionController::spawn(&mut world, &box_actor()).expect("spawns");
    let roll = std::f32::consts::FRAC_PI_2 + 0.2;
    world.body_mut(actor.body()).expect("body").orientation = Quat::from_euler(EulerRot::XYZ, roll, 0.0, 0.6);

    tick(&mut world, &mut actor, &ControlState::new());

    assert!(!world.has_collisions(actor.body()));
    assert!(actor.state().is_tipped_over());
    let (x, _, z) = world.body(actor.body()).expect("body").orientation.to_euler(EulerRot::XYZ);
    assert!((x - roll).abs() < 1e-4, "roll {x}");
    assert!((z - 0.6).abs() < 1e-4, "yaw {z}");
}

#[test]
fn test_post_step_cancels_yaw_spin() {
    let (mut world, mut actor) = landed();
    world.body_mut(actor.body()).expect("body").angular_velocity = Vec3::new(0.1, 0.2, 3.0);

    actor.post_step(&mut world);

    let spin = world.body(actor.body()).expect("body").angular_velocity;
    assert_eq!(spin.z, 0.0);
    assert_eq!(spin.x, 0.1);
}

#[test]
fn test_forward_in_air_relevels() {
    let mut world = level_world();
    let mut actor = LocomotionController::spawn(&mut world, &box_actor()).expect("spawns");
    world.body_mut(actor.body()).expect("body").orientation = Quat::from_rotation_x(0.4);

    actor.advance(&controls(&[Control::Forward]), &mut world, DT);

    let orientation = world.body(actor.body()).expect("body").orientation;
    let (x, y, _) = orientation.to_euler(EulerRot::XYZ);
    assert!(x.abs() < 1e-5 && y.abs() < 1e-5);
}

// ============================================================================
// Death plane
// ============================================================================

#[test]
fn test_terminal_reported_once_per_crossing() {
    let mut world = level_world();
    let mut actor = LocomotionController::spawn(&mut world, &box_actor()).expect("spawns");
    let idle = ControlState::new();

    world.body_mut(actor.body()).expect("body").position.z = -900.0;
    assert_eq!(actor.advance(&idle, &mut world, DT), AdvanceOutcome::Destroyed);
    assert_eq!(actor.advance(&idle, &mut world, DT), AdvanceOutcome::Alive);

    // Back above and down again counts as a new crossing
    world.body_mut(actor.body()).expect("body").position.z = 100.0;
    assert_eq!(actor.advance(&idle, &mut world, DT), AdvanceOutcome::Alive);
    world.body_mut(actor.body()).expect("body").position.z = -800.0;
    assert_eq!(actor.advance(&idle, &mut world, DT), AdvanceOutcome::Destroyed);
}

#[test]
fn test_time_alive_accumulates() {
    let (mut world, mut actor) = landed();
    let before = actor.state().time_alive;
    for _ in 0..8 {
        tick(&mut world, &mut actor, &ControlState::new());
    }
    assert!((actor.state().time_alive - before - 1.0).abs() < 1e-4);
}
