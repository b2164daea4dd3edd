//! Rapier-backed physics world
//!
//! Wraps a rapier3d pipeline behind [`PhysicsWorld`]. Contacts produce
//! torque here, so an actor can actually be tipped over by the level.
//!
//! Gameplay code reads and writes bodies through an [`ActorBody`] mirror.
//! Mirrors edited since the last step are pushed into rapier before the
//! next step and every mirror is refreshed from rapier after it. Ray tests
//! run against the mirrored pose, so a body moved by hand is hit where it
//! now is rather than where rapier last left it.

use std::collections::HashMap;

use glam::{Quat, Vec3};
use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::parry::query::{Ray, RayCast};
use rapier3d::prelude::{
    CCDSolver, CoefficientCombineRule, ColliderBuilder, ColliderHandle, ColliderSet, DefaultBroadPhase,
    ImpulseJointSet, IntegrationParameters, IslandManager, Isometry, MultibodyJointSet, NarrowPhase,
    PhysicsPipeline, Point, Real, RigidBodyBuilder, RigidBodyHandle, RigidBodySet, Translation, Vector,
};

use super::collision::RayHit;
use super::world::{
    ActorBody, BodyDesc, BodyHandle, BodyHooks, Capabilities, ContactEvent, PhysicsWorld, Shape,
    StepEvents,
};

/// Longest ray tested by [`PhysicsWorld::ray_intersect`].
const MAX_RAY_DISTANCE: Real = 1.0e6;

fn to_vector(v: Vec3) -> Vector<Real> {
    Vector::new(v.x, v.y, v.z)
}

fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn to_isometry(position: Vec3, orientation: Quat) -> Isometry<Real> {
    let q = orientation.normalize();
    Isometry::from_parts(
        Translation::new(position.x, position.y, position.z),
        UnitQuaternion::new_normalize(Quaternion::new(q.w, q.x, q.y, q.z)),
    )
}

fn from_rotation(rotation: &UnitQuaternion<Real>) -> Quat {
    Quat::from_xyzw(rotation.i, rotation.j, rotation.k, rotation.w)
}

#[derive(Debug, Clone)]
struct Entry {
    /// What gameplay sees and edits
    state: ActorBody,
    /// Mirror value as of the last sync with rapier
    synced: ActorBody,
    rigid_body: RigidBodyHandle,
    collider: ColliderHandle,
}

/// [`PhysicsWorld`] over a rapier3d rigid-body pipeline.
pub struct RapierWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,

    entries: Vec<Entry>,
    index: HashMap<BodyHandle, usize>,
    /// Reverse lookup for contact pairs
    by_collider: HashMap<ColliderHandle, BodyHandle>,
    watched: Vec<(BodyHandle, BodyHooks)>,
}

impl Default for RapierWorld {
    fn default() -> Self {
        Self::new(super::DEFAULT_GRAVITY)
    }
}

impl RapierWorld {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity: to_vector(gravity),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            entries: Vec::new(),
            index: HashMap::new(),
            by_collider: HashMap::new(),
            watched: Vec::new(),
        }
    }

    pub fn gravity(&self) -> Vec3 {
        from_vector(&self.gravity)
    }

    /// Number of bodies.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, handle: BodyHandle) -> Option<&Entry> {
        self.index.get(&handle).map(|&i| &self.entries[i])
    }

    fn entry_mut(&mut self, handle: BodyHandle) -> Option<&mut Entry> {
        let i = *self.index.get(&handle)?;
        self.entries.get_mut(i)
    }

    fn hooks_for(&self, handle: BodyHandle) -> Option<BodyHooks> {
        self.watched
            .iter()
            .find(|(watched, _)| *watched == handle)
            .map(|(_, hooks)| *hooks)
    }

    /// Write mirrors edited by gameplay back into rapier.
    fn push_edits(&mut self) {
        for entry in &mut self.entries {
            if entry.state == entry.synced {
                continue;
            }
            let Some(body) = self.rigid_body_set.get_mut(entry.rigid_body) else {
                continue;
            };
            let state = &entry.state;
            body.set_position(to_isometry(state.position, state.orientation), true);
            if body.is_dynamic() {
                body.set_linvel(to_vector(state.linear_velocity), true);
                body.set_angvel(to_vector(state.angular_velocity), true);
            }
        }
    }

    /// Refresh every mirror from rapier.
    fn pull_state(&mut self) {
        for entry in &mut self.entries {
            let Some(body) = self.rigid_body_set.get(entry.rigid_body) else {
                continue;
            };
            let state = &mut entry.state;
            state.position = from_vector(body.translation());
            state.orientation = from_rotation(body.rotation());
            state.linear_velocity = from_vector(body.linvel());
            state.angular_velocity = from_vector(body.angvel());
            entry.synced = *state;
        }
    }

    /// Touching pairs from the narrow phase, with the world normal pointing
    /// from the first body to the second.
    fn touching_pairs(&self) -> Vec<(BodyHandle, BodyHandle, Vec3)> {
        self.narrow_phase
            .contact_pairs()
            .filter(|pair| pair.has_any_active_contact)
            .filter_map(|pair| {
                let a = *self.by_collider.get(&pair.collider1)?;
                let b = *self.by_collider.get(&pair.collider2)?;
                let normal = pair
                    .manifolds
                    .iter()
                    .find(|m| !m.points.is_empty())
                    .map(|m| from_vector(&m.data.normal))
                    .unwrap_or(Vec3::ZERO);
                Some((a, b, normal))
            })
            .collect()
    }
}

impl PhysicsWorld for RapierWorld {
    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    fn create_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.entries.len() as u32);
        let Shape::Cuboid { half_extents } = desc.shape;

        let builder = if desc.mass > 0.0 {
            RigidBodyBuilder::dynamic().can_sleep(false)
        } else {
            RigidBodyBuilder::fixed()
        };
        let rigid_body = self
            .rigid_body_set
            .insert(builder.position(to_isometry(desc.position, desc.orientation)).build());

        let mut collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .friction(desc.material.friction)
            .restitution(desc.material.restitution)
            .friction_combine_rule(CoefficientCombineRule::Max)
            .restitution_combine_rule(CoefficientCombineRule::Max);
        if desc.mass > 0.0 {
            collider = collider.mass(desc.mass);
        }
        let collider = self
            .collider_set
            .insert_with_parent(collider.build(), rigid_body, &mut self.rigid_body_set);

        let state = ActorBody::at_rest(handle, desc.position, desc.orientation);
        self.index.insert(handle, self.entries.len());
        self.by_collider.insert(collider, handle);
        self.entries.push(Entry {
            state,
            synced: state,
            rigid_body,
            collider,
        });
        handle
    }

    fn step(&mut self, dt: f32) -> StepEvents {
        self.push_edits();

        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );

        self.pull_state();

        let mut events = StepEvents::default();
        for (a, b, normal) in self.touching_pairs() {
            // Rapier's normal points from the first collider to the second
            if self.hooks_for(a).is_some_and(|h| h.contacts) {
                events.contacts.push(ContactEvent { body: a, other: b, normal: -normal });
            }
            if self.hooks_for(b).is_some_and(|h| h.contacts) {
                events.contacts.push(ContactEvent { body: b, other: a, normal });
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
        self.entry(handle).map(|e| &e.state)
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut ActorBody> {
        self.entry_mut(handle).map(|e| &mut e.state)
    }

    fn bodies(&self) -> Vec<BodyHandle> {
        self.entries.iter().map(|e| e.state.handle).collect()
    }

    fn collisions(&self, handle: BodyHandle) -> Vec<BodyHandle> {
        let Some(entry) = self.entry(handle) else {
            return Vec::new();
        };
        let mut touching: Vec<BodyHandle> = self
            .narrow_phase
            .contact_pairs_with(entry.collider)
            .filter(|pair| pair.has_any_active_contact)
            .filter_map(|pair| {
                let other = if pair.collider1 == entry.collider {
                    pair.collider2
                } else {
                    pair.collider1
                };
                self.by_collider.get(&other).copied()
            })
            .collect();
        touching.sort();
        touching.dedup();
        touching
    }

    fn ray_intersect(&self, origin: Vec3, direction: Vec3, target: BodyHandle) -> Option<RayHit> {
        let entry = self.entry(target)?;
        let collider = self.collider_set.get(entry.collider)?;
        let pose = to_isometry(entry.state.position, entry.state.orientation);
        let ray = Ray::new(Point::new(origin.x, origin.y, origin.z), to_vector(direction));

        let hit = collider
            .shape()
            .cast_ray_and_get_normal(&pose, &ray, MAX_RAY_DISTANCE, true)?;
        let point = ray.point_at(hit.time_of_impact);
        Some(RayHit {
            point: Vec3::new(point.x, point.y, point.z),
            normal: from_vector(&hit.normal),
            distance: hit.time_of_impact,
        })
    }

    fn rotate_on_axis(&mut self, handle: BodyHandle, axis: Vec3, angle: f32) {
        let Some(entry) = self.entry_mut(handle) else {
            return;
        };
        let Some(axis) = axis.try_normalize() else {
            return;
        };
        let state = &mut entry.state;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::Material;

    const DT: f32 = 1.0 / 60.0;

    fn floor(world: &mut RapierWorld) -> BodyHandle {
        world.create_body(BodyDesc::static_box(
            Vec3::new(0.0, 0.0, -20.0),
            Vec3::new(800.0, 800.0, 20.0),
            Material::default(),
        ))
    }

    fn crate_at(world: &mut RapierWorld, position: Vec3, orientation: Quat) -> BodyHandle {
        world.create_body(BodyDesc {
            shape: Shape::Cuboid {
                half_extents: Vec3::splat(1.0),
            },
            mass: 3.0,
            position,
            orientation,
            material: Material::default(),
        })
    }

    #[test]
    fn test_dynamic_body_falls() {
        let mut world = RapierWorld::default();
        let body = crate_at(&mut world, Vec3::new(0.0, 0.0, 50.0), Quat::IDENTITY);

        world.step(DT);

        let state = world.body(body).expect("body exists");
        assert!(state.linear_velocity.z < 0.0);
        assert!(state.position.z < 50.0);
    }

    #[test]
    fn test_body_comes_to_rest_on_floor() {
        let mut world = RapierWorld::default();
        let ground = floor(&mut world);
        let body = crate_at(&mut world, Vec3::new(0.0, 0.0, 3.0), Quat::IDENTITY);

        for _ in 0..240 {
            world.step(DT);
        }

        let state = world.body(body).expect("body exists");
        assert!((state.position.z - 1.0).abs() < 0.1, "resting height {}", state.position.z);
        assert_eq!(world.collisions(body), vec![ground]);
        assert_eq!(world.collisions(ground), vec![body]);
    }

    #[test]
    fn test_edge_landing_produces_spin() {
        let mut world = RapierWorld::default();
        floor(&mut world);
        let body = crate_at(&mut world, Vec3::new(0.0, 0.0, 2.0), Quat::from_rotation_x(0.5));

        let mut max_spin = 0.0_f32;
        for _ in 0..120 {
            world.step(DT);
            max_spin = max_spin.max(world.body(body).expect("body").angular_velocity.length());
        }
        assert!(max_spin > 0.1, "contact never spun the box: {max_spin}");
    }

    #[test]
    fn test_contact_events_only_for_watched_bodies() {
        let mut world = RapierWorld::default();
        let ground = floor(&mut world);
        let body = crate_at(&mut world, Vec3::new(0.0, 0.0, 1.0), Quat::IDENTITY);

        let events = world.step(DT);
        assert!(events.contacts.is_empty());
        assert!(events.post_step.is_empty());

        world.watch(body, BodyHooks::ALL);
        let events = world.step(DT);
        assert_eq!(events.post_step, vec![body]);
        assert_eq!(events.contacts.len(), 1);
        assert_eq!(events.contacts[0].body, body);
        assert_eq!(events.contacts[0].other, ground);
        assert!(events.contacts[0].normal.z > 0.9, "normal {:?}", events.contacts[0].normal);
    }

    #[test]
    fn test_edits_reach_the_simulation() {
        let mut world = RapierWorld::new(Vec3::ZERO);
        let body = crate_at(&mut world, Vec3::ZERO, Quat::IDENTITY);

        world.body_mut(body).expect("body").linear_velocity = Vec3::new(6.0, 0.0, 0.0);
        world.step(0.5);

        let state = world.body(body).expect("body");
        assert!((state.position.x - 3.0).abs() < 1e-3, "x {}", state.position.x);
    }

    #[test]
    fn test_ray_uses_mirrored_pose() {
        let mut world = RapierWorld::default();
        let ground = floor(&mut world);

        let hit = world
            .ray_intersect(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z, ground)
            .expect("floor below");
        assert!((hit.distance - 10.0).abs() < 1e-3);
        assert!((hit.normal - Vec3::Z).length() < 1e-4);

        // Moved by hand, not stepped yet
        world.body_mut(ground).expect("floor").position.z = -30.0;
        let hit = world
            .ray_intersect(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z, ground)
            .expect("floor below");
        assert!((hit.distance - 20.0).abs() < 1e-3);

        assert!(world.ray_intersect(Vec3::new(0.0, 0.0, 10.0), Vec3::Z, ground).is_none());
        assert!(world.ray_intersect(Vec3::ZERO, Vec3::NEG_Z, BodyHandle(99)).is_none());
    }

    #[test]
    fn test_rotate_on_axis_accumulates() {
        let mut world = RapierWorld::default();
        let body = crate_at(&mut world, Vec3::ZERO, Quat::IDENTITY);

        world.rotate_on_axis(body, Vec3::Z, 0.25);
        world.rotate_on_axis(body, Vec3::Z, 0.25);

        let (axis, angle) = world.body(body).expect("body").orientation.to_axis_angle();
        assert!((angle - 0.5).abs() < 1e-5);
        assert!((axis - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_unknown_handle_queries_are_empty() {
        let world = RapierWorld::default();
        assert!(world.body(BodyHandle(3)).is_none());
        assert!(world.collisions(BodyHandle(3)).is_empty());
        assert!(!world.has_collisions(BodyHandle(3)));
    }
}
