//! Camera Module
//!
//! Third-person follow camera for the controlled actor.
//! This module is window-system agnostic - it only deals with camera state and math.

pub mod follow;

pub use follow::{
    CameraFollow, CameraPose, Projection, follow_pose,
    DEFAULT_FAR, DEFAULT_FOV_DEGREES, DEFAULT_NEAR,
};
