//! Physics module for the Stride engine
//!
//! Gameplay code talks to rigid-body physics only through the
//! [`PhysicsWorld`] trait. [`RapierWorld`] runs a full rapier3d pipeline
//! with contact torque; [`BoxWorld`] is a small deterministic cuboid world
//! used as a test double where exact AABB behaviour is wanted.
//!
//! # Unit System
//!
//! World units are whatever the level is authored in (the default level is
//! roughly centimetre scale). +Z is up.
//!
//! # Submodules
//!
//! - [`world`] - The adapter trait, body handles, hooks and capabilities
//! - [`rapier_world`] - rapier3d adapter
//! - [`box_world`] - Cuboid test double
//! - [`collision`] - Ray-AABB intersection and AABB overlap

pub mod box_world;
pub mod collision;
pub mod rapier_world;
pub mod world;

// Re-export commonly used types at the physics module level
pub use box_world::{BoxWorld, DEFAULT_GRAVITY};
pub use collision::{Aabb, Penetration, RayHit, aabb_surface_normal, ray_aabb_intersect};
pub use glam::{Quat, Vec3};
pub use rapier_world::RapierWorld;
pub use world::{
    ActorBody, BodyDesc, BodyHandle, BodyHooks, Capabilities, Capability, ContactEvent, Material,
    PhysicsWorld, Shape, StepEvents,
};
