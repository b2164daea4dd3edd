//! Physics world adapter
//!
//! The locomotion rig never integrates or resolves collisions itself; it
//! consumes a physics engine through the [`PhysicsWorld`] trait. Engine
//! callbacks are modelled as hook registrations ([`PhysicsWorld::watch`])
//! whose notifications are returned from [`PhysicsWorld::step`] and
//! dispatched by the simulation loop in a fixed order: contact events first,
//! then post-step notifications.

use std::fmt;

use glam::{Quat, Vec3};

use super::collision::RayHit;

/// Stable identifier of a body inside one world instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u32);

impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

/// Kinematic state of a rigid body as seen by gameplay code.
///
/// Owned by the world; the controller only ever borrows it through a handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorBody {
    pub handle: BodyHandle,
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
}

impl ActorBody {
    pub fn at_rest(handle: BodyHandle, position: Vec3, orientation: Quat) -> Self {
        Self {
            handle,
            position,
            orientation,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
        }
    }
}

/// Collision shape of a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Cuboid { half_extents: Vec3 },
}

/// Contact material. Combined per pair by taking the larger value.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Material {
    pub friction: f32,
    pub restitution: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            friction: 0.0,
            restitution: 0.1,
        }
    }
}

/// Everything needed to create a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub shape: Shape,
    /// Zero mass makes the body static.
    pub mass: f32,
    pub position: Vec3,
    pub orientation: Quat,
    pub material: Material,
}

impl BodyDesc {
    /// Static box centered at `position`.
    pub fn static_box(position: Vec3, half_extents: Vec3, material: Material) -> Self {
        Self {
            shape: Shape::Cuboid { half_extents },
            mass: 0.0,
            position,
            orientation: Quat::IDENTITY,
            material,
        }
    }
}

/// Which hooks a watched body wants notifications for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BodyHooks {
    pub post_step: bool,
    pub contacts: bool,
}

impl BodyHooks {
    pub const ALL: BodyHooks = BodyHooks {
        post_step: true,
        contacts: true,
    };
}

/// A contact reported for a watched body during a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    /// The watched body
    pub body: BodyHandle,
    /// The body it touched
    pub other: BodyHandle,
    /// Contact normal pointing from `other` towards `body`
    pub normal: Vec3,
}

/// Notifications produced by one [`PhysicsWorld::step`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepEvents {
    /// Contact events for bodies watched with `contacts`
    pub contacts: Vec<ContactEvent>,
    /// Bodies watched with `post_step`, in registration order
    pub post_step: Vec<BodyHandle>,
}

/// Optional adapter capabilities the locomotion controller depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    CollisionQueries,
    RayCasts,
    AxisRotation,
    PostStepHooks,
    ContactEvents,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::CollisionQueries => "collision queries",
            Capability::RayCasts => "ray casts",
            Capability::AxisRotation => "rotate-on-axis",
            Capability::PostStepHooks => "post-step hooks",
            Capability::ContactEvents => "contact events",
        };
        f.write_str(name)
    }
}

/// Capabilities an adapter actually provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub collision_queries: bool,
    pub ray_casts: bool,
    pub axis_rotation: bool,
    pub post_step_hooks: bool,
    pub contact_events: bool,
}

impl Capabilities {
    pub const ALL: Capabilities = Capabilities {
        collision_queries: true,
        ray_casts: true,
        axis_rotation: true,
        post_step_hooks: true,
        contact_events: true,
    };

    /// First capability from `Capability` order that is missing, if any.
    pub fn first_missing(&self) -> Option<Capability> {
        let table = [
            (self.collision_queries, Capability::CollisionQueries),
            (self.ray_casts, Capability::RayCasts),
            (self.axis_rotation, Capability::AxisRotation),
            (self.post_step_hooks, Capability::PostStepHooks),
            (self.contact_events, Capability::ContactEvents),
        ];
        table
            .into_iter()
            .find(|(present, _)| !present)
            .map(|(_, capability)| capability)
    }
}

/// Capability set of a rigid-body physics engine.
///
/// Queries about unknown handles are answered with the "nothing there"
/// value (`None`, empty list, no hit) rather than an error.
pub trait PhysicsWorld {
    /// What this adapter supports. Checked once when an actor spawns.
    fn capabilities(&self) -> Capabilities;

    /// Create a rigid body and return its handle.
    fn create_body(&mut self, desc: BodyDesc) -> BodyHandle;

    /// Advance the world by `dt` seconds.
    fn step(&mut self, dt: f32) -> StepEvents;

    fn body(&self, handle: BodyHandle) -> Option<&ActorBody>;

    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut ActorBody>;

    /// Every body handle, in creation order.
    fn bodies(&self) -> Vec<BodyHandle>;

    /// Bodies in active contact with `handle` after the last step.
    fn collisions(&self, handle: BodyHandle) -> Vec<BodyHandle>;

    /// Whether `handle` has at least one active contact.
    fn has_collisions(&self, handle: BodyHandle) -> bool {
        !self.collisions(handle).is_empty()
    }

    /// Ray test against a single body. `direction` must be normalized.
    fn ray_intersect(&self, origin: Vec3, direction: Vec3, target: BodyHandle) -> Option<RayHit>;

    /// Rotate a body by `angle` radians about the world-space `axis`.
    fn rotate_on_axis(&mut self, handle: BodyHandle, axis: Vec3, angle: f32);

    /// Register post-step and/or contact notifications for a body.
    fn watch(&mut self, handle: BodyHandle, hooks: BodyHooks);
}
