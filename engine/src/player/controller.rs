//! Locomotion Controller
//!
//! Drives one rigid body in a [`PhysicsWorld`] from the held controls.
//! The controller never integrates anything itself: it sets the body's
//! planar velocity, turns it about +Z and fires jumps, then lets the world
//! step.
//!
//! # Tick order
//!
//! 1. Jump, only when grounded and touching something
//! 2. Linear easing (forward / backward), re-levelling in the air on forward
//! 3. Angular easing (right / left)
//! 4. Damping of axes without input
//! 5. Planar velocity from the heading, yaw rotation from the turn rate
//! 6. Death-plane check
//!
//! Orientation bookkeeping ([`post_step`](LocomotionController::post_step))
//! and ground detection ([`on_contact`](LocomotionController::on_contact))
//! run from the world's hooks, dispatched by the simulation loop.
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut actor = LocomotionController::spawn(&mut world, &resolved)?;
//!
//! // Each tick:
//! let events = world.step(dt);
//! for contact in &events.contacts { actor.on_contact(&world, contact); }
//! actor.post_step(&mut world);
//! if actor.advance(&controls, &mut world, dt) == AdvanceOutcome::Destroyed {
//!     // respawn
//! }
//! ```

use glam::{Quat, Vec3};

use super::locomotion::LocomotionState;
use crate::camera::{CameraFollow, CameraPose};
use crate::config::{ConfigError, ResolvedArchetype};
use crate::input::{Control, ControlState};
use crate::math::{euler_from_quat, polar_to_cartesian, rad_to_deg, yaw_rotation};
use crate::physics::{BodyDesc, BodyHandle, BodyHooks, ContactEvent, PhysicsWorld, Shape};

/// Result of one [`LocomotionController::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Alive,
    /// The body fell through the death plane this tick
    Destroyed,
}

/// Player locomotion for one body.
#[derive(Debug, Clone)]
pub struct LocomotionController {
    body: BodyHandle,
    state: LocomotionState,
    camera: CameraFollow,
    death_z: f32,
    /// Set while the body is at or below the death plane
    below_death_plane: bool,
}

impl LocomotionController {
    /// Create the actor's body in `world` and register its hooks.
    ///
    /// Fails if the world lacks a capability the controller relies on.
    pub fn spawn<W: PhysicsWorld + ?Sized>(world: &mut W, resolved: &ResolvedArchetype) -> Result<Self, ConfigError> {
        if let Some(missing) = world.capabilities().first_missing() {
            return Err(ConfigError::MissingCapability(missing));
        }

        let archetype = &resolved.archetype;
        archetype.validate()?;

        let body = world.create_body(BodyDesc {
            shape: Shape::Cuboid {
                half_extents: resolved.half_extents,
            },
            mass: archetype.mass,
            position: archetype.spawn_position,
            orientation: Quat::IDENTITY,
            material: archetype.material,
        });
        world.watch(body, BodyHooks::ALL);

        log::info!(
            "spawned {} as {} at {:?} (half extents {:?})",
            archetype.name,
            body,
            archetype.spawn_position,
            resolved.half_extents
        );

        Ok(Self {
            body,
            state: LocomotionState::new(archetype),
            camera: CameraFollow::new(archetype.camera.horizontal, archetype.camera.vertical),
            death_z: archetype.death_z,
            below_death_plane: false,
        })
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn state(&self) -> &LocomotionState {
        &self.state
    }

    pub fn heading(&self) -> Vec3 {
        self.state.heading
    }

    pub fn is_grounded(&self) -> bool {
        self.state.is_grounded
    }

    pub fn camera(&self) -> &CameraFollow {
        &self.camera
    }

    /// Camera pose framing the body, or `None` if the body is gone.
    pub fn camera_pose<W: PhysicsWorld + ?Sized>(&self, world: &W) -> Option<CameraPose> {
        world.body(self.body).map(|body| self.camera.update(body, self.state.heading))
    }

    /// Apply one tick of input to the body.
    pub fn advance<W: PhysicsWorld + ?Sized>(&mut self, input: &ControlState, world: &mut W, dt: f32) -> AdvanceOutcome {
        self.state.time_alive += dt;

        let colliding = world.has_collisions(self.body);
        let heading = self.state.heading;
        let jump_impulse = self.state.jump_impulse;

        let Some(body) = world.body_mut(self.body) else {
            log::warn!("{} missing from the world, skipping tick", self.body);
            return AdvanceOutcome::Alive;
        };

        if input.is_pressed(Control::Jump) && self.state.is_grounded && colliding {
            self.state.is_grounded = false;
            body.linear_velocity.z = jump_impulse;
            log::debug!("{} jumped with impulse {}", self.body, jump_impulse);
        }

        let forward = input.is_pressed(Control::Forward);
        let backward = input.is_pressed(Control::Backward);
        let left = input.is_pressed(Control::Left);
        let right = input.is_pressed(Control::Right);

        if forward {
            self.state.linear.ease_negative();
            // Level out while airborne
            if !colliding {
                body.orientation = yaw_rotation(heading.z);
            }
        }
        if backward {
            self.state.linear.ease_positive();
        }
        if right {
            self.state.angular.ease_negative();
        }
        if left {
            self.state.angular.ease_positive();
        }

        if !forward && !backward {
            self.state.linear.damp();
        }
        if !left && !right {
            self.state.angular.damp();
        }

        let planar = polar_to_cartesian(self.state.linear.acceleration, heading.z);
        body.linear_velocity.x = planar.x;
        body.linear_velocity.y = planar.y;

        world.rotate_on_axis(self.body, Vec3::Z, self.state.angular.acceleration);

        self.check_death_plane(world)
    }

    fn check_death_plane<W: PhysicsWorld + ?Sized>(&mut self, world: &W) -> AdvanceOutcome {
        let Some(body) = world.body(self.body) else {
            return AdvanceOutcome::Alive;
        };

        if body.position.z > self.death_z {
            self.below_death_plane = false;
            return AdvanceOutcome::Alive;
        }
        if self.below_death_plane {
            return AdvanceOutcome::Alive;
        }

        self.below_death_plane = true;
        log::info!(
            "{} fell below z = {} after {:.1}s",
            self.body,
            self.death_z,
            self.state.time_alive
        );
        AdvanceOutcome::Destroyed
    }

    /// Orientation bookkeeping after a physics step.
    ///
    /// Cancels yaw spin from contacts, refreshes the heading and puts the
    /// body back upright (keeping its yaw) if it has tipped past 90 degrees
    /// while touching something.
    pub fn post_step<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) {
        let colliding = world.has_collisions(self.body);
        let Some(body) = world.body_mut(self.body) else {
            log::warn!("{} missing from the world during post-step", self.body);
            return;
        };

        body.angular_velocity.z = 0.0;

        let heading = euler_from_quat(body.orientation);
        self.state.heading = heading;
        self.state.roll_degrees = rad_to_deg(heading.x).round() as i32;
        self.state.pitch_degrees = rad_to_deg(heading.y).round() as i32;

        if colliding && self.state.is_tipped_over() {
            body.orientation = yaw_rotation(heading.z);
            self.state.heading = Vec3::new(0.0, 0.0, heading.z);
            log::debug!(
                "{} righted from roll {} pitch {}",
                self.body,
                self.state.roll_degrees,
                self.state.pitch_degrees
            );
        }
    }

    /// Ground detection on contact: a downward ray from the body hitting
    /// the touched body marks the actor grounded.
    ///
    /// Grounded is only cleared by jumping.
    pub fn on_contact<W: PhysicsWorld + ?Sized>(&mut self, world: &W, contact: &ContactEvent) {
        if contact.body != self.body || self.state.is_grounded {
            return;
        }
        let Some(body) = world.body(self.body) else {
            log::warn!("{} missing from the world during contact", self.body);
            return;
        };

        if world.ray_intersect(body.position, Vec3::NEG_Z, contact.other).is_some() {
            self.state.is_grounded = true;
            log::debug!("{} grounded on {}", self.body, contact.other);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Archetype, ShapeSource};
    use crate::input::ControlSet;
    use crate::input::KeyCode;
    use crate::physics::{BoxWorld, Capabilities, Capability, Material};

    fn box_archetype() -> ResolvedArchetype {
        let mut archetype = Archetype::glider();
        archetype.shape = ShapeSource::Box {
            half_extents: Vec3::new(10.0, 6.0, 4.0),
            color: [1.0, 1.0, 1.0],
        };
        archetype.resolve().expect("box archetype")
    }

    fn held(keys: &[KeyCode]) -> ControlState {
        let bindings = ControlSet::default();
        let mut controls = ControlState::new();
        for key in keys {
            controls.handle_key(&bindings, *key, true);
        }
        controls
    }

    #[test]
    fn test_spawn_registers_body_and_hooks() {
        let mut world = BoxWorld::default();
        let actor = LocomotionController::spawn(&mut world, &box_archetype()).expect("spawns");

        let body = world.body(actor.body()).expect("body exists");
        assert_eq!(body.position, Vec3::new(0.0, 0.0, 50.0));
        assert!(!actor.is_grounded());

        let events = world.step(1.0 / 60.0);
        assert_eq!(events.post_step, vec![actor.body()]);
    }

    struct NoRays(BoxWorld);

    impl PhysicsWorld for NoRays {
        fn capabilities(&self) -> Capabilities {
            Capabilities {
                ray_casts: false,
                ..Capabilities::ALL
            }
        }
        fn create_body(&mut self, desc: BodyDesc) -> BodyHandle {
            self.0.create_body(desc)
        }
        fn step(&mut self, dt: f32) -> crate::physics::StepEvents {
            self.0.step(dt)
        }
        fn body(&self, handle: BodyHandle) -> Option<&crate::physics::ActorBody> {
            self.0.body(handle)
        }
        fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut crate::physics::ActorBody> {
            self.0.body_mut(handle)
        }
        fn bodies(&self) -> Vec<BodyHandle> {
            self.0.bodies()
        }
        fn collisions(&self, handle: BodyHandle) -> Vec<BodyHandle> {
            self.0.collisions(handle)
        }
        fn ray_intersect(&self, _: Vec3, _: Vec3, _: BodyHandle) -> Option<crate::physics::RayHit> {
            None
        }
        fn rotate_on_axis(&mut self, handle: BodyHandle, axis: Vec3, angle: f32) {
            self.0.rotate_on_axis(handle, axis, angle)
        }
        fn watch(&mut self, handle: BodyHandle, hooks: BodyHooks) {
            self.0.watch(handle, hooks)
        }
    }

    #[test]
    fn test_spawn_fails_without_capability() {
        let mut world = NoRays(BoxWorld::default());
        let err = LocomotionController::spawn(&mut world, &box_archetype()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCapability(Capability::RayCasts)));
        assert!(world.bodies().is_empty());
    }

    #[test]
    fn test_forward_sets_planar_velocity_along_heading() {
        let mut world = BoxWorld::default();
        let mut actor = LocomotionController::spawn(&mut world, &box_archetype()).expect("spawns");

        actor.advance(&held(&[KeyCode::W]), &mut world, 1.0 / 60.0);

        let body = world.body(actor.body()).expect("body");
        // Heading yaw is 0, so forward (negative acceleration) moves along -X
        assert!((body.linear_velocity.x + 1.5).abs() < 1e-6);
        assert!(body.linear_velocity.y.abs() < 1e-6);
        assert_eq!(body.linear_velocity.z, 0.0);
    }

    #[test]
    fn test_turn_rotates_about_z() {
        let mut world = BoxWorld::default();
        let mut actor = LocomotionController::spawn(&mut world, &box_archetype()).expect("spawns");

        actor.advance(&held(&[KeyCode::A]), &mut world, 1.0 / 60.0);
        actor.post_step(&mut world);

        assert!((actor.heading().z - 0.007).abs() < 1e-5);
    }

    #[test]
    fn test_contact_from_above_grounds_actor() {
        let mut world = BoxWorld::default();
        let floor = world.create_body(BodyDesc::static_box(
            Vec3::new(0.0, 0.0, -20.0),
            Vec3::new(800.0, 800.0, 20.0),
            Material::default(),
        ));
        let mut actor = LocomotionController::spawn(&mut world, &box_archetype()).expect("spawns");

        let contact = ContactEvent {
            body: actor.body(),
            other: floor,
            normal: Vec3::Z,
        };
        actor.on_contact(&world, &contact);
        assert!(actor.is_grounded());
    }

    #[test]
    fn test_side_contact_does_not_ground() {
        let mut world = BoxWorld::default();
        let wall = world.create_body(BodyDesc::static_box(
            Vec3::new(40.0, 0.0, 50.0),
            Vec3::new(5.0, 50.0, 50.0),
            Material::default(),
        ));
        let mut actor = LocomotionController::spawn(&mut world, &box_archetype()).expect("spawns");

        let contact = ContactEvent {
            body: actor.body(),
            other: wall,
            normal: Vec3::NEG_X,
        };
        actor.on_contact(&world, &contact);
        assert!(!actor.is_grounded());
    }
}
