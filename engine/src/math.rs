//! Math helpers shared by the controller and the camera.
//!
//! The world is Z-up: X/Y span the ground plane, Z points at the sky.

use glam::{EulerRot, Quat, Vec2, Vec3};

/// Converts a polar coordinate (radius, angle) on the ground plane to X/Y.
///
/// `x = r * cos(theta)`, `y = r * sin(theta)`. A negative radius points the
/// result away from `theta`, which the locomotion controller relies on.
pub fn polar_to_cartesian(radius: f32, theta: f32) -> Vec2 {
    Vec2::new(radius * theta.cos(), radius * theta.sin())
}

/// Degrees to radians.
pub fn deg_to_rad(degrees: f32) -> f32 {
    degrees.to_radians()
}

/// Radians to degrees.
pub fn rad_to_deg(radians: f32) -> f32 {
    radians.to_degrees()
}

/// Euler angles (x = roll, y = pitch, z = yaw) of a quaternion, intrinsic XYZ order.
pub fn euler_from_quat(rotation: Quat) -> Vec3 {
    let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
    Vec3::new(x, y, z)
}

/// Upright orientation turned `yaw` radians about +Z.
pub fn yaw_rotation(yaw: f32) -> Quat {
    Quat::from_axis_angle(Vec3::Z, yaw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_polar_to_cartesian_axes() {
        let p = polar_to_cartesian(2.0, 0.0);
        assert!((p.x - 2.0).abs() < 1e-6);
        assert!(p.y.abs() < 1e-6);

        let p = polar_to_cartesian(2.0, FRAC_PI_2);
        assert!(p.x.abs() < 1e-6);
        assert!((p.y - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_negative_radius_flips_direction() {
        let p = polar_to_cartesian(-1.0, 0.0);
        assert!((p.x + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_degree_conversion() {
        assert!((deg_to_rad(180.0) - PI).abs() < 1e-6);
        assert!((rad_to_deg(FRAC_PI_2) - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_euler_roundtrip_yaw_only() {
        let euler = euler_from_quat(yaw_rotation(0.75));
        assert!(euler.x.abs() < 1e-5);
        assert!(euler.y.abs() < 1e-5);
        assert!((euler.z - 0.75).abs() < 1e-5);
    }
}
