//! Actor archetypes
//!
//! An archetype is the bundle of tunables that defines how one actor moves
//! and feels: mass, jump, acceleration and turn easing, camera offsets, the
//! death plane, its collision shape and material, and where it spawns.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{ConfigError, read_file};
use crate::model::ModelGeometry;
use crate::physics::Material;
use crate::render::{Mesh, box_mesh, rgb_hex};

// Glider defaults

/// Body mass
pub const GLIDER_MASS: f32 = 3.0;
/// Upward velocity assigned on jump
pub const GLIDER_JUMP_IMPULSE: f32 = 38.0;
/// Linear acceleration change per tick
pub const GLIDER_LINEAR_STEP: f32 = 1.5;
/// Linear acceleration bound
pub const GLIDER_LINEAR_MAX: f32 = 45.0;
/// Linear decay factor per tick without input
pub const GLIDER_LINEAR_DAMPING: f32 = 0.9;
/// Turn rate change per tick, radians
pub const GLIDER_ANGULAR_STEP: f32 = 0.007;
/// Turn rate bound, radians per tick
pub const GLIDER_ANGULAR_MAX: f32 = 0.04;
/// Turn decay factor per tick without input
pub const GLIDER_ANGULAR_DAMPING: f32 = 0.8;
/// Camera distance behind along the heading
pub const GLIDER_CAMERA_OFFSET_H: f32 = 0.0;
/// Camera height above the body
pub const GLIDER_CAMERA_OFFSET_V: f32 = 400.0;
/// Falling to or below this height destroys the actor
pub const GLIDER_DEATH_Z: f32 = -800.0;
/// Uniform scale applied to the glider model
pub const GLIDER_MODEL_SCALE: f32 = 12.0;
/// Spawn point
pub const GLIDER_SPAWN: Vec3 = Vec3::new(0.0, 0.0, 50.0);

/// Easing tunables of one acceleration axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisTuning {
    pub step: f32,
    pub max: f32,
    pub damping: f32,
}

/// Follow-camera offsets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraOffsets {
    pub horizontal: f32,
    pub vertical: f32,
}

/// Where the actor's collision box and mesh come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeSource {
    /// Plain box
    Box { half_extents: Vec3, color: [f32; 3] },
    /// Model file; relative paths resolve against the archetype file
    Model { path: PathBuf, scale: f32 },
    /// The built-in glider model
    Glider { scale: f32 },
}

/// Named bundle of movement tunables for one actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Archetype {
    pub name: String,
    pub mass: f32,
    pub jump_impulse: f32,
    pub linear: AxisTuning,
    pub angular: AxisTuning,
    pub camera: CameraOffsets,
    pub death_z: f32,
    pub shape: ShapeSource,
    /// Per-material color overrides for model shapes
    pub palette: Vec<[f32; 3]>,
    pub material: Material,
    pub spawn_position: Vec3,
}

impl Default for Archetype {
    fn default() -> Self {
        Self::glider()
    }
}

impl Archetype {
    /// The built-in archetype.
    pub fn glider() -> Self {
        let cyan = rgb_hex(0x38fdd9);
        let green = rgb_hex(0x0fdb8c);
        Self {
            name: "glider".to_string(),
            mass: GLIDER_MASS,
            jump_impulse: GLIDER_JUMP_IMPULSE,
            linear: AxisTuning {
                step: GLIDER_LINEAR_STEP,
                max: GLIDER_LINEAR_MAX,
                damping: GLIDER_LINEAR_DAMPING,
            },
            angular: AxisTuning {
                step: GLIDER_ANGULAR_STEP,
                max: GLIDER_ANGULAR_MAX,
                damping: GLIDER_ANGULAR_DAMPING,
            },
            camera: CameraOffsets {
                horizontal: GLIDER_CAMERA_OFFSET_H,
                vertical: GLIDER_CAMERA_OFFSET_V,
            },
            death_z: GLIDER_DEATH_Z,
            shape: ShapeSource::Glider {
                scale: GLIDER_MODEL_SCALE,
            },
            palette: vec![
                [cyan[0], cyan[1], cyan[2]],
                [green[0], green[1], green[2]],
            ],
            material: Material::default(),
            spawn_position: GLIDER_SPAWN,
        }
    }

    /// Parse and validate an archetype from JSON. Every field is required.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let archetype: Archetype = serde_json::from_str(json)?;
        archetype.validate()?;
        Ok(archetype)
    }

    /// Load an archetype file. Relative model paths are made relative to it.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut archetype = Self::from_json_str(&read_file(path)?)?;

        if let ShapeSource::Model { path: model, .. } = &mut archetype.shape {
            if model.is_relative() {
                if let Some(dir) = path.parent() {
                    *model = dir.join(&*model);
                }
            }
        }
        Ok(archetype)
    }

    /// Reject tunables the controller cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("mass", self.mass)?;
        non_negative("jump_impulse", self.jump_impulse)?;

        positive("linear.step", self.linear.step)?;
        positive("linear.max", self.linear.max)?;
        unit_open("linear.damping", self.linear.damping)?;
        positive("angular.step", self.angular.step)?;
        positive("angular.max", self.angular.max)?;
        unit_open("angular.damping", self.angular.damping)?;

        finite("camera.horizontal", self.camera.horizontal)?;
        finite("camera.vertical", self.camera.vertical)?;
        finite("death_z", self.death_z)?;

        non_negative("material.friction", self.material.friction)?;
        non_negative("material.restitution", self.material.restitution)?;

        if !self.spawn_position.is_finite() {
            return Err(invalid("spawn_position", "must be finite"));
        }
        if self.spawn_position.z <= self.death_z {
            return Err(invalid(
                "spawn_position",
                format!("spawn height {} is at or below death_z {}", self.spawn_position.z, self.death_z),
            ));
        }

        match &self.shape {
            ShapeSource::Box { half_extents, .. } => {
                if !half_extents.is_finite() || half_extents.min_element() <= 0.0 {
                    return Err(invalid("shape.half_extents", "must be positive"));
                }
            }
            ShapeSource::Model { scale, .. } | ShapeSource::Glider { scale } => {
                positive("shape.scale", *scale)?;
            }
        }
        Ok(())
    }

    /// Validate and load the shape: physics half extents plus render mesh.
    pub fn resolve(&self) -> Result<ResolvedArchetype, ConfigError> {
        self.validate()?;

        let (half_extents, mesh) = match &self.shape {
            ShapeSource::Box { half_extents, color } => {
                (*half_extents, box_mesh(*half_extents, [color[0], color[1], color[2], 1.0]))
            }
            ShapeSource::Model { path, scale } => {
                let model = ModelGeometry::from_path(path)?.prepare(*scale);
                (model.half_extents(), model.to_mesh(&self.palette))
            }
            ShapeSource::Glider { scale } => {
                let model = ModelGeometry::glider()?.prepare(*scale);
                (model.half_extents(), model.to_mesh(&self.palette))
            }
        };

        if half_extents.min_element() <= 0.0 {
            return Err(invalid("shape", "model is flat along one axis"));
        }

        Ok(ResolvedArchetype {
            archetype: self.clone(),
            half_extents,
            mesh: Arc::new(mesh),
        })
    }
}

/// An archetype whose shape has been loaded.
#[derive(Debug, Clone)]
pub struct ResolvedArchetype {
    pub archetype: Archetype,
    pub half_extents: Vec3,
    pub mesh: Arc<Mesh>,
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidArchetype {
        field,
        reason: reason.into(),
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() { Ok(()) } else { Err(invalid(field, format!("{value} is not finite"))) }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 { Ok(()) } else { Err(invalid(field, format!("{value} must be greater than 0"))) }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value >= 0.0 { Ok(()) } else { Err(invalid(field, format!("{value} must not be negative"))) }
}

fn unit_open(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} must lie strictly between 0 and 1")))
    }
}
