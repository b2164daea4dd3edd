//! Level configuration
//!
//! A level is a list of static boxes plus the world settings they live in.
//! The default is a large black floor with a staircase of five cyan blocks
//! leading up from it.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{ConfigError, read_file};
use crate::physics::Material;
use crate::render::rgb_hex;

/// Half size of the floor on X and Y
pub const FLOOR_SIZE: f32 = 800.0;
/// Half thickness of the floor; its top sits at z = 0
pub const FLOOR_HEIGHT: f32 = 20.0;
/// Half size of each staircase block
pub const BLOCK_HALF: f32 = 30.0;
/// Gravity of the default level
pub const LEVEL_GRAVITY: Vec3 = Vec3::new(0.0, 0.0, -10.0);
/// Simulated seconds per tick
pub const LEVEL_TIMESTEP: f32 = 1.0 / 8.0;

/// One static box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Block {
    pub center: Vec3,
    pub half_extents: Vec3,
    pub color: [f32; 3],
}

/// Reference grid drawn on the floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridHelper {
    /// Lines span -size..size on X and Y
    pub size: f32,
    /// Distance between lines
    pub spacing: f32,
    /// Height of the grid plane
    pub z: f32,
}

/// World settings and static geometry of a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevelConfig {
    pub gravity: Vec3,
    /// Fixed simulation step in seconds
    pub timestep: f32,
    /// Material shared by every block
    pub material: Material,
    pub blocks: Vec<Block>,
    pub grid: Option<GridHelper>,
}

impl Default for LevelConfig {
    fn default() -> Self {
        let black = rgb_hex(0x000000);
        let cyan = rgb_hex(0x38fdd9);
        let black = [black[0], black[1], black[2]];
        let cyan = [cyan[0], cyan[1], cyan[2]];

        let floor = Block {
            center: Vec3::new(0.0, 0.0, -FLOOR_HEIGHT),
            half_extents: Vec3::new(FLOOR_SIZE, FLOOR_SIZE, FLOOR_HEIGHT),
            color: black,
        };

        // Each block one step higher than the last
        let steps = [
            Vec3::new(-240.0, -200.0, BLOCK_HALF - 1.0),
            Vec3::new(-300.0, -260.0, 90.0),
            Vec3::new(-180.0, -200.0, 150.0),
            Vec3::new(-120.0, -140.0, 210.0),
            Vec3::new(-60.0, -80.0, 270.0),
        ];

        let mut blocks = vec![floor];
        blocks.extend(steps.into_iter().map(|center| Block {
            center,
            half_extents: Vec3::splat(BLOCK_HALF),
            color: cyan,
        }));

        Self {
            gravity: LEVEL_GRAVITY,
            timestep: LEVEL_TIMESTEP,
            material: Material {
                friction: 0.0,
                restitution: 0.1,
            },
            blocks,
            grid: Some(GridHelper {
                size: FLOOR_SIZE,
                spacing: FLOOR_SIZE / 10.0,
                z: 0.5,
            }),
        }
    }
}

impl LevelConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let level: LevelConfig = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json_str(&read_file(path.as_ref())?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.gravity.is_finite() {
            return Err(invalid("gravity must be finite"));
        }
        if !(self.timestep.is_finite() && self.timestep > 0.0) {
            return Err(invalid(format!("timestep {} must be positive", self.timestep)));
        }
        for (i, block) in self.blocks.iter().enumerate() {
            if !block.center.is_finite() || !block.half_extents.is_finite() || block.half_extents.min_element() <= 0.0 {
                return Err(invalid(format!("block {i} needs a finite center and positive half extents")));
            }
        }
        if let Some(grid) = &self.grid {
            if !(grid.size > 0.0 && grid.spacing > 0.0 && grid.z.is_finite()) {
                return Err(invalid("grid size and spacing must be positive"));
            }
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidLevel {
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level_layout() {
        let level = LevelConfig::default();
        assert!(level.validate().is_ok());
        assert_eq!(level.blocks.len(), 6);

        // Floor top is flush with z = 0
        let floor = level.blocks[0];
        assert_eq!(floor.center.z + floor.half_extents.z, 0.0);

        // Staircase climbs 60 units per block
        let heights: Vec<f32> = level.blocks[2..].iter().map(|b| b.center.z).collect();
        assert_eq!(heights, vec![90.0, 150.0, 210.0, 270.0]);
    }

    #[test]
    fn test_rejects_bad_timestep() {
        let mut level = LevelConfig::default();
        level.timestep = 0.0;
        assert!(matches!(level.validate(), Err(ConfigError::InvalidLevel { .. })));
    }

    #[test]
    fn test_json_roundtrip() {
        let level = LevelConfig::default();
        let json = serde_json::to_string(&level).expect("serializes");
        assert_eq!(LevelConfig::from_json_str(&json).expect("parses"), level);
    }
}
