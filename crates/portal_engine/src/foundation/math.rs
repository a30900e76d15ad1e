//! Math utilities and types
//!
//! Provides the fundamental math types used by portal traversal.
//!
//! # Coordinate System
//! The world is Z-up. Every oriented frame (portals, walls, objects) uses
//! +X as its forward axis, +Y as its right axis and +Z as its up axis, so a
//! portal's passable rectangle lies in its local Y/Z plane.

pub use nalgebra::{Vector2, Vector3, Matrix4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Quaternion type for rotations
pub type Quat = nalgebra::UnitQuaternion<f32>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Forward axis (+X) in world space
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::x()
    }

    /// Right axis (+Y) in world space
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::y()
    }

    /// Up axis (+Z) in world space
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::z()
    }

    /// Move a world-space point into this frame, ignoring scale
    pub fn inverse_transform_position_no_scale(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse_transform_vector(&(point - self.position))
    }

    /// Move a local point into world space, ignoring scale
    pub fn transform_position_no_scale(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Quat, Vec3};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Rotation about the world up axis
    pub fn yaw_rotation(angle: f32) -> Quat {
        Quat::from_axis_angle(&Vec3::z_axis(), angle)
    }

    /// Rotation whose forward axis points along `direction` with zero roll.
    ///
    /// Mirrors how a wall hit normal becomes a portal orientation: yaw from the
    /// horizontal part, pitch from the vertical part. Zero-length input yields
    /// the identity.
    pub fn rotation_from_forward(direction: Vec3) -> Quat {
        let length = direction.norm();
        if length <= f32::EPSILON {
            return Quat::identity();
        }
        let dir = direction / length;
        let yaw = dir.y.atan2(dir.x);
        let pitch = -dir.z.clamp(-1.0, 1.0).asin();
        Quat::from_euler_angles(0.0, pitch, yaw)
    }

    /// Same rotation with the roll (rotation about forward) removed
    pub fn without_roll(rotation: &Quat) -> Quat {
        let (_roll, pitch, yaw) = rotation.euler_angles();
        Quat::from_euler_angles(0.0, pitch, yaw)
    }

    /// Roll component of a rotation, in radians
    pub fn roll_of(rotation: &Quat) -> f32 {
        rotation.euler_angles().0
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a perspective projection matrix
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        // Depth mapped to [0,1], perspective divide on view-space depth
        let tan_half_fovy = (fov_y * 0.5).tan();

        let mut result = Mat4::zeros();
        result[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        result[(1, 1)] = 1.0 / tan_half_fovy;
        result[(2, 2)] = far / (far - near);
        result[(2, 3)] = -(near * far) / (far - near);
        result[(3, 2)] = 1.0;

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::utils::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_basis_vectors_follow_rotation() {
        let transform = Transform::from_position_rotation(Vec3::zeros(), yaw_rotation(constants::HALF_PI));

        assert_relative_eq!(transform.forward(), Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(transform.right(), Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(transform.up(), Vec3::z(), epsilon = 1e-6);
    }

    #[test]
    fn test_no_scale_position_round_trip() {
        let transform = Transform::from_position_rotation(
            Vec3::new(3.0, -2.0, 7.0),
            Quat::from_euler_angles(0.2, -0.4, 1.1),
        );
        let point = Vec3::new(10.0, 4.0, -1.0);

        let local = transform.inverse_transform_position_no_scale(point);
        assert_relative_eq!(transform.transform_position_no_scale(local), point, epsilon = 1e-4);
    }

    #[test]
    fn test_rotation_from_forward_points_forward() {
        for dir in [Vec3::x(), -Vec3::x(), Vec3::y(), Vec3::new(1.0, 1.0, 0.5), Vec3::new(0.0, -1.0, -0.3)] {
            let rotation = rotation_from_forward(dir);
            assert_relative_eq!(rotation * Vec3::x(), dir.normalize(), epsilon = 1e-5);
            assert_relative_eq!(roll_of(&rotation), 0.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_rotation_from_forward_degenerate_is_identity() {
        assert_eq!(rotation_from_forward(Vec3::zeros()), Quat::identity());
    }

    #[test]
    fn test_without_roll_keeps_view_direction() {
        let rotation = Quat::from_euler_angles(0.7, -0.3, 2.0);
        let flattened = without_roll(&rotation);

        assert_relative_eq!(roll_of(&flattened), 0.0, epsilon = 1e-5);
        assert_relative_eq!(flattened * Vec3::x(), rotation * Vec3::x(), epsilon = 1e-5);
    }
}
