//! Built-in box physics world
//!
//! A small rigid-body world of cuboids implementing [`PhysicsWorld`]. Enough
//! for a single actor walking over static blocks:
//!
//! - semi-implicit Euler integration with constant gravity
//! - orientation integrated from angular velocity
//! - dynamic-vs-any collision on world AABBs, resolved along the axis of
//!   least penetration
//!
//! Rotated boxes collide as their enclosing AABB and contacts never produce
//! torque. Swap in a full engine behind [`PhysicsWorld`] when that matters.

use std::collections::{BTreeSet, HashMap};

use glam::{Quat, Vec3};

use super::collision::{Aabb, RayHit};
use super::world::{
    ActorBody, BodyDesc, BodyHandle, BodyHooks, Capabilities, ContactEvent, Material,
    PhysicsWorld, Shape, StepEvents,
};

/// Standard gravity along -Z in world units per second squared.
pub const DEFAULT_GRAVITY: Vec3 = Vec3::new(0.0, 0.0, -9.81);

#[derive(Debug, Clone)]
struct RigidBody {
    state: ActorBody,
    half_extents: Vec3,
    inverse_mass: f32,
    material: Material,
}

impl RigidBody {
    fn is_dynamic(&self) -> bool {
        self.inverse_mass > 0.0
    }

    fn aabb(&self) -> Aabb {
        Aabb::from_oriented(self.state.position, self.half_extents, self.state.orientation)
    }
}

/// Reference [`PhysicsWorld`] made of boxes.
#[derive(Debug, Clone)]
pub struct BoxWorld {
    gravity: Vec3,
    bodies: Vec<RigidBody>,
    /// Unordered contact pairs from the last step, stored as (low, high)
    contacts: BTreeSet<(BodyHandle, BodyHandle)>,
    watched: Vec<(BodyHandle, BodyHooks)>,
    index: HashMap<BodyHandle, usize>,
}

impl Default for BoxWorld {
    fn default() -> Self {
        Self::new(DEFAULT_GRAVITY)
    }
}

impl BoxWorld {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity,
            bodies: Vec::new(),
            contacts: BTreeSet::new(),
            watched: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// World AABB of a body, if it exists.
    pub fn aabb(&self, handle: BodyHandle) -> Option<Aabb> {
        self.get(handle).map(RigidBody::aabb)
    }

    /// Number of bodies.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    fn get(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.index.get(&handle).map(|&i| &self.bodies[i])
    }

    fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        let i = *self.index.get(&handle)?;
        self.bodies.get_mut(i)
    }

    fn integrate(&mut self, dt: f32) {
        let gravity = self.gravity;
        for body in self.bodies.iter_mut().filter(|b| b.is_dynamic()) {
            let state = &mut body.state;
            state.linear_velocity += gravity * dt;
            state.position += state.linear_velocity * dt;

            let spin = state.angular_velocity * dt;
            if spin.length_squared() > 0.0 {
                state.orientation = (Quat::from_scaled_axis(spin) * state.orientation).normalize();
            }
        }
    }

    /// Detects overlaps involving at least one dynamic body and pushes the
    /// bodies apart. Returns the contact pairs with the normal pointing from
    /// the second body to the first.
    fn resolve_contacts(&mut self) -> Vec<(usize, usize, Vec3)> {
        let mut found = Vec::new();

        for i in 0..self.bodies.len() {
            if !self.bodies[i].is_dynamic() {
                continue;
            }
            for j in 0..self.bodies.len() {
                if i == j || (self.bodies[j].is_dynamic() && j < i) {
                    continue;
                }

                let Some(push) = self.bodies[i].aabb().penetration(&self.bodies[j].aabb()) else {
                    continue;
                };

                let inv_i = self.bodies[i].inverse_mass;
                let inv_j = self.bodies[j].inverse_mass;
                let total = inv_i + inv_j;
                let friction = self.bodies[i].material.friction.max(self.bodies[j].material.friction);
                let restitution = self.bodies[i]
                    .material
                    .restitution
                    .max(self.bodies[j].material.restitution);

                let relative = self.bodies[i].state.linear_velocity - self.bodies[j].state.linear_velocity;
                let approach = relative.dot(push.normal);

                for (index, inverse_mass, sign) in [(i, inv_i, 1.0), (j, inv_j, -1.0)] {
                    if inverse_mass <= 0.0 {
                        continue;
                    }
                    let share = inverse_mass / total;
                    let state = &mut self.bodies[index].state;
                    state.position += push.normal * (push.depth * share * sign);

                    if approach < 0.0 {
                        let impulse = -(1.0 + restitution) * approach * share;
                        state.linear_velocity += push.normal * (impulse * sign);
                    }

                    let normal_part = push.normal * state.linear_velocity.dot(push.normal);
                    let tangent = state.linear_velocity - normal_part;
                    state.linear_velocity = normal_part + tangent * (1.0 - friction).clamp(0.0, 1.0);
                }

                found.push((i, j, push.normal));
            }
        }

        found
    }

    fn hooks_for(&self, handle: BodyHandle) -> Option<BodyHooks> {
        self.watched
            .iter()
            .find(|(watched, _)| *watched == handle)
            .map(|(_, hooks)| *hooks)
    }
}

impl PhysicsWorld for BoxWorld {
    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    fn create_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.bodies.len() as u32);
        let Shape::Cuboid { half_extents } = desc.shape;
        let inverse_mass = if desc.mass > 0.0 { 1.0 / desc.mass } else { 0.0 };

        self.index.insert(handle, self.bodies.len());
        self.bodies.push(RigidBody {
            state: ActorBody::at_rest(handle, desc.position, desc.orientation),
            half_extents,
            inverse_mass,
            material: desc.material,
        });
        handle
    }

    fn step(&mut self, dt: f32) -> StepEvents {
        self.integrate(dt);
        let pairs = self.resolve_contacts();

        self.contacts.clear();
        let mut events = StepEvents::default();

        for (i, j, normal) in pairs {
            let a = self.bodies[i].state.handle;
            let b = self.bodies[j].state.handle;
            self.contacts.insert((a.min(b), a.max(b)));

            if self.hooks_for(a).is_some_and(|h| h.contacts) {
                events.contacts.push(ContactEvent { body: a, other: b, normal });
            }
            if self.hooks_for(b).is_some_and(|h| h.contacts) {
                events.contacts.push(ContactEvent { body: b, other: a, normal: -normal });
            }
        }

        events.post_step = self
            .watched
            .iter()
            .filter(|(_, hooks)| hooks.post_step)
            .map(|(handle, _)| *handle)
            .collect();

        events
    }

    fn body(&self, handle: BodyHandle) -> Option<&ActorBody> {
        self.get(handle).map(|b| &b.state)
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut ActorBody> {
        self.get_mut(handle).map(|b| &mut b.state)
    }

    fn bodies(&self) -> Vec<BodyHandle> {
        self.bodies.iter().map(|b| b.state.handle).collect()
    }

    fn collisions(&self, handle: BodyHandle) -> Vec<BodyHandle> {
        self.contacts
            .iter()
            .filter_map(|&(a, b)| {
                if a == handle {
                    Some(b)
                } else if b == handle {
                    Some(a)
                } else {
                    None
                }
            })
            .collect()
    }

    fn ray_intersect(&self, origin: Vec3, direction: Vec3, target: BodyHandle) -> Option<RayHit> {
        self.get(target)?.aabb().ray_hit(origin, direction)
    }

    fn rotate_on_axis(&mut self, handle: BodyHandle, axis: Vec3, angle: f32) {
        let Some(body) = self.get_mut(handle) else {
            return;
        };
        let Some(axis) = axis.try_normalize() else {
            return;
        };
        let state = &mut body.state;
        state.orientation = (Quat::from_axis_angle(axis, angle) * state.orientation).normalize();
    }

    fn watch(&mut self, handle: BodyHandle, hooks: BodyHooks) {
        if let Some(entry) = self.watched.iter_mut().find(|(watched, _)| *watched == handle) {
            entry.1 = hooks;
        } else {
            self.watched.push((handle, hooks));
        }
    }
}
