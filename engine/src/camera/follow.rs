//! Third-person follow camera
//!
//! The camera sits at a fixed offset from the controlled body, rotated with
//! the body's heading, and always looks at the body. Nothing is smoothed:
//! the pose is recomputed from scratch every tick.

use glam::{Mat4, Vec3};

use crate::math::polar_to_cartesian;
use crate::physics::ActorBody;

/// Vertical field of view in degrees
pub const DEFAULT_FOV_DEGREES: f32 = 45.0;
/// Near clip plane in world units
pub const DEFAULT_NEAR: f32 = 1.0;
/// Far clip plane in world units
pub const DEFAULT_FAR: f32 = 15000.0;

/// Where the camera is and what it looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl CameraPose {
    /// Up vector actually used for the view basis.
    ///
    /// When the view direction is parallel to `up` (a camera straight above
    /// its target) the basis is undefined; screen-up then falls back to -X,
    /// which keeps +Y pointing right on screen for the top-down view.
    pub fn effective_up(&self) -> Vec3 {
        let forward = self.target - self.position;
        if forward.cross(self.up).length_squared() > 1e-10 * forward.length_squared().max(1.0) {
            return self.up;
        }
        if self.up.z.abs() > 0.5 { Vec3::NEG_X } else { Vec3::Z }
    }

    /// Right-handed view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.effective_up())
    }
}

/// Perspective projection settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y_degrees: DEFAULT_FOV_DEGREES,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        }
    }
}

impl Projection {
    /// Projection matrix with wgpu's 0..1 depth range.
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_degrees.to_radians(), aspect.max(1e-4), self.near, self.far)
    }

    pub fn view_projection(&self, pose: &CameraPose, aspect: f32) -> Mat4 {
        self.matrix(aspect) * pose.view_matrix()
    }
}

/// Camera pose for a body at `position` facing `heading` (Euler, yaw in z).
///
/// The horizontal offset is rotated by the yaw; the vertical offset is added
/// to z. Up is always +Z.
pub fn follow_pose(position: Vec3, heading: Vec3, offset_h: f32, offset_v: f32) -> CameraPose {
    let horizontal = polar_to_cartesian(offset_h, heading.z);
    CameraPose {
        position: Vec3::new(
            position.x + horizontal.x,
            position.y + horizontal.y,
            position.z + offset_v,
        ),
        target: position,
        up: Vec3::Z,
    }
}

/// Follow-camera offsets for one actor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFollow {
    /// Distance from the body on the ground plane, along the heading
    pub offset_h: f32,
    /// Height above the body
    pub offset_v: f32,
}

impl CameraFollow {
    pub fn new(offset_h: f32, offset_v: f32) -> Self {
        Self { offset_h, offset_v }
    }

    /// Pose that frames `body` for the given heading.
    pub fn update(&self, body: &ActorBody, heading: Vec3) -> CameraPose {
        follow_pose(body.position, heading, self.offset_h, self.offset_v)
    }
}
