//! Configuration
//!
//! Named-constant defaults for the built-in actor and level, plus JSON
//! loading for custom ones. Everything is validated when it is loaded or
//! spawned; nothing is silently defaulted.

pub mod archetype;
pub mod level;

use std::path::Path;

use crate::model::ModelError;
use crate::physics::Capability;

pub use archetype::{Archetype, AxisTuning, CameraOffsets, ResolvedArchetype, ShapeSource};
pub use level::{Block, GridHelper, LevelConfig};

/// Errors raised while loading or applying configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid archetype field `{field}`: {reason}")]
    InvalidArchetype { field: &'static str, reason: String },

    #[error("invalid level: {reason}")]
    InvalidLevel { reason: String },

    #[error("physics world does not support {0}")]
    MissingCapability(Capability),

    #[error(transparent)]
    Model(#[from] ModelError),
}

pub(crate) fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}
