//! Collision detection module
//!
//! Axis-aligned box primitives for the built-in physics world: ray-AABB
//! intersection (slab method), surface normals, and AABB overlap with a
//! minimum-penetration contact.
//!
//! # Example
//!
//! ```ignore
//! use stride_engine::physics::collision::{ray_aabb_intersect, Aabb};
//! use glam::Vec3;
//!
//! let floor = Aabb::from_center(Vec3::new(0.0, 0.0, -20.0), Vec3::new(800.0, 800.0, 20.0));
//! let down = Vec3::NEG_Z;
//!
//! if let Some(t) = ray_aabb_intersect(Vec3::new(0.0, 0.0, 50.0), down, floor.min, floor.max) {
//!     println!("floor is {} below", t);
//! }
//! ```

use glam::{Mat3, Quat, Vec3};

/// Result of a ray test against a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// World-space point where the ray enters the body
    pub point: Vec3,
    /// Outward surface normal at the hit point
    pub normal: Vec3,
    /// Distance from ray origin to hit point
    pub distance: f32,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

/// Overlap between two boxes, expressed as the push that separates them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Penetration {
    /// Unit axis pointing from the second box towards the first
    pub normal: Vec3,
    /// Overlap depth along `normal`
    pub depth: f32,
}

impl Aabb {
    /// Box centered on `center` with the given half extents.
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Tightest AABB around a box with half extents `half_extents` rotated by `rotation`.
    pub fn from_oriented(center: Vec3, half_extents: Vec3, rotation: Quat) -> Self {
        let basis = Mat3::from_quat(rotation);
        let world_half = Vec3::new(
            basis.row(0).abs().dot(half_extents),
            basis.row(1).abs().dot(half_extents),
            basis.row(2).abs().dot(half_extents),
        );
        Self::from_center(center, world_half)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Strict overlap test; boxes that only touch do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    /// Minimum-translation push that moves `self` out of `other`.
    ///
    /// Returns `None` when the boxes do not overlap.
    pub fn penetration(&self, other: &Aabb) -> Option<Penetration> {
        if !self.overlaps(other) {
            return None;
        }

        let overlap = self.max.min(other.max) - self.min.max(other.min);
        let delta = self.center() - other.center();

        let (axis, depth) = if overlap.x <= overlap.y && overlap.x <= overlap.z {
            (Vec3::X, overlap.x)
        } else if overlap.y <= overlap.z {
            (Vec3::Y, overlap.y)
        } else {
            (Vec3::Z, overlap.z)
        };

        let sign = if delta.dot(axis) < 0.0 { -1.0 } else { 1.0 };
        Some(Penetration {
            normal: axis * sign,
            depth,
        })
    }

    /// Ray test against this box, with the entry normal.
    pub fn ray_hit(&self, origin: Vec3, direction: Vec3) -> Option<RayHit> {
        let distance = ray_aabb_intersect(origin, direction, self.min, self.max)?;
        let point = origin + direction * distance;
        Some(RayHit {
            point,
            normal: aabb_surface_normal(point, self.min, self.max),
            distance,
        })
    }
}

/// Ray-AABB intersection using the slab method.
///
/// `ray_dir` must be normalized. Returns the distance to the nearest
/// intersection at or in front of the origin; a ray starting inside the box
/// reports its exit distance.
pub fn ray_aabb_intersect(
    ray_origin: Vec3,
    ray_dir: Vec3,
    aabb_min: Vec3,
    aabb_max: Vec3,
) -> Option<f32> {
    // Axis-parallel rays get a huge finite inverse so 0 * inv stays 0
    let inv_dir = Vec3::new(
        if ray_dir.x.abs() > 1e-10 { 1.0 / ray_dir.x } else { f32::MAX * ray_dir.x.signum() },
        if ray_dir.y.abs() > 1e-10 { 1.0 / ray_dir.y } else { f32::MAX * ray_dir.y.signum() },
        if ray_dir.z.abs() > 1e-10 { 1.0 / ray_dir.z } else { f32::MAX * ray_dir.z.signum() },
    );

    let t1 = (aabb_min - ray_origin) * inv_dir;
    let t2 = (aabb_max - ray_origin) * inv_dir;

    let t_min = t1.min(t2).max_element();
    let t_max = t1.max(t2).min_element();

    if t_max >= t_min && t_max >= 0.0 {
        if t_min >= 0.0 { Some(t_min) } else { Some(t_max) }
    } else {
        None
    }
}

/// Outward normal of the AABB face closest to `point`.
pub fn aabb_surface_normal(point: Vec3, aabb_min: Vec3, aabb_max: Vec3) -> Vec3 {
    let center = (aabb_min + aabb_max) * 0.5;
    let half_extents = (aabb_max - aabb_min) * 0.5;
    let normalized = (point - center) / half_extents;
    let abs_normalized = normalized.abs();

    if abs_normalized.x >= abs_normalized.y && abs_normalized.x >= abs_normalized.z {
        Vec3::new(normalized.x.signum(), 0.0, 0.0)
    } else if abs_normalized.y >= abs_normalized.z {
        Vec3::new(0.0, normalized.y.signum(), 0.0)
    } else {
        Vec3::new(0.0, 0.0, normalized.z.signum())
    }
}
