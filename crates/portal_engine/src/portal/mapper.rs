//! Coordinate mapping between two linked portals
//!
//! Something entering portal A must leave portal B facing away from B, so
//! every mapping goes: world -> A's local frame -> rotate 180 degrees about
//! local up -> B's world frame. The rotation negates local forward (X) and
//! right (Y) and keeps up (Z).
//!
//! Positions, directions and orientations all use the same rotation, which
//! keeps them first-order consistent: mapping `p + εv` equals mapping `p`
//! plus `ε` times the mapped `v`. That is what keeps velocity continuous
//! across a crossing.
//!
//! All mappings ignore scale.

use crate::foundation::math::{constants::PI, utils, Quat, Transform, Vec3};

/// Mapping from one portal's frame into its linked portal's frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortalMapping {
    origin: Transform,
    target: Transform,
}

impl PortalMapping {
    /// Mapping from `origin` (the portal being entered) to `target` (the exit)
    pub fn new(origin: &Transform, target: &Transform) -> Self {
        Self {
            origin: *origin,
            target: *target,
        }
    }

    /// The mapping back from the exit to the entrance
    pub fn reversed(&self) -> Self {
        Self {
            origin: self.target,
            target: self.origin,
        }
    }

    /// Entrance frame
    pub fn origin(&self) -> &Transform {
        &self.origin
    }

    /// Exit frame
    pub fn target(&self) -> &Transform {
        &self.target
    }

    /// Map a world position
    pub fn position(&self, point: Vec3) -> Vec3 {
        let local = self.origin.inverse_transform_position_no_scale(point);
        let flipped = Vec3::new(-local.x, -local.y, local.z);
        self.target.transform_position_no_scale(flipped)
    }

    /// Map a world direction (velocity, angular velocity, normals)
    ///
    /// Projects onto the entrance basis and recombines on the exit basis with
    /// forward and right negated. No translation is involved.
    pub fn direction(&self, direction: Vec3) -> Vec3 {
        let forward = direction.dot(&self.origin.forward());
        let right = direction.dot(&self.origin.right());
        let up = direction.dot(&self.origin.up());

        -self.target.forward() * forward - self.target.right() * right + self.target.up() * up
    }

    /// Map a world orientation
    pub fn orientation(&self, rotation: &Quat) -> Quat {
        let local = self.origin.rotation.inverse() * rotation;
        let flipped = utils::yaw_rotation(PI) * local;
        self.target.rotation * flipped
    }

    /// Map a full transform (scale is carried over unchanged)
    pub fn transform(&self, transform: &Transform) -> Transform {
        Transform {
            position: self.position(transform.position),
            rotation: self.orientation(&transform.rotation),
            scale: transform.scale,
        }
    }
}

/// Map a position from `origin` to `target`.
///
/// Returns the zero vector when either portal is absent. That is a no-op
/// sentinel, not an error.
pub fn map_position(point: Vec3, origin: Option<&Transform>, target: Option<&Transform>) -> Vec3 {
    match (origin, target) {
        (Some(origin), Some(target)) => PortalMapping::new(origin, target).position(point),
        _ => Vec3::zeros(),
    }
}

/// Map a direction from `origin` to `target`; zero when either portal is absent.
pub fn map_direction(direction: Vec3, origin: Option<&Transform>, target: Option<&Transform>) -> Vec3 {
    match (origin, target) {
        (Some(origin), Some(target)) => PortalMapping::new(origin, target).direction(direction),
        _ => Vec3::zeros(),
    }
}

/// Map an orientation from `origin` to `target`; identity when either portal is absent.
pub fn map_orientation(rotation: &Quat, origin: Option<&Transform>, target: Option<&Transform>) -> Quat {
    match (origin, target) {
        (Some(origin), Some(target)) => PortalMapping::new(origin, target).orientation(rotation),
        _ => Quat::identity(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants::HALF_PI;
    use approx::assert_relative_eq;

    fn frame(position: Vec3, yaw: f32) -> Transform {
        Transform::from_position_rotation(position, utils::yaw_rotation(yaw))
    }

    fn frame_pairs() -> Vec<(Transform, Transform)> {
        vec![
            (frame(Vec3::zeros(), 0.0), frame(Vec3::new(1000.0, 0.0, 0.0), PI)),
            (frame(Vec3::new(100.0, 50.0, 0.0), HALF_PI), frame(Vec3::new(-300.0, 20.0, 80.0), 0.3)),
            (
                Transform::from_position_rotation(Vec3::new(5.0, -5.0, 10.0), Quat::from_euler_angles(0.4, -0.2, 1.0)),
                Transform::from_position_rotation(Vec3::new(-50.0, 200.0, -30.0), Quat::from_euler_angles(-0.3, 0.9, -2.2)),
            ),
        ]
    }

    fn angle_between(a: &Quat, b: &Quat) -> f32 {
        a.angle_to(b)
    }

    #[test]
    fn test_point_in_front_exits_behind_facing_away() {
        // A at the origin facing +X, B at x=1000 facing -X (back toward A).
        let a = frame(Vec3::zeros(), 0.0);
        let b = frame(Vec3::new(1000.0, 0.0, 0.0), PI);
        let mapping = PortalMapping::new(&a, &b);

        // 10 units in front of A maps to 10 units behind B.
        assert_relative_eq!(mapping.position(Vec3::new(10.0, 0.0, 0.0)), Vec3::new(1010.0, 0.0, 0.0), epsilon = 1e-3);
        // Entering A (moving -X) leaves B along B's forward (-X).
        assert_relative_eq!(mapping.direction(-Vec3::x()), -Vec3::x(), epsilon = 1e-5);
        // Right offsets flip side, up offsets keep theirs.
        assert_relative_eq!(mapping.position(Vec3::new(0.0, 20.0, 30.0)), Vec3::new(1000.0, 20.0, 30.0), epsilon = 1e-3);
    }

    #[test]
    fn test_position_round_trip() {
        let points = [Vec3::zeros(), Vec3::new(10.0, -4.0, 3.0), Vec3::new(-250.0, 80.0, 1000.0)];
        for (a, b) in frame_pairs() {
            let forward = PortalMapping::new(&a, &b);
            for point in points {
                let back = forward.reversed().position(forward.position(point));
                assert_relative_eq!(back, point, epsilon = 1e-2);
            }
        }
    }

    #[test]
    fn test_orientation_round_trip() {
        let rotations = [Quat::identity(), Quat::from_euler_angles(0.1, 0.5, -2.0), Quat::from_euler_angles(0.0, -1.2, 3.0)];
        for (a, b) in frame_pairs() {
            let forward = PortalMapping::new(&a, &b);
            for rotation in rotations {
                let back = forward.reversed().orientation(&forward.orientation(&rotation));
                assert_relative_eq!(angle_between(&back, &rotation), 0.0, epsilon = 1e-3);
            }
        }
    }

    #[test]
    fn test_zero_roll_preserved_when_up_vectors_match() {
        let a = frame(Vec3::new(0.0, 0.0, 0.0), 0.7);
        let b = frame(Vec3::new(500.0, -200.0, 50.0), -2.1);
        let mapping = PortalMapping::new(&a, &b);

        for (pitch, yaw) in [(0.0, 0.0), (0.4, 1.3), (-0.9, -2.5), (1.2, 3.0)] {
            let mapped = mapping.orientation(&Quat::from_euler_angles(0.0, pitch, yaw));
            assert_relative_eq!(utils::roll_of(&mapped), 0.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_direction_matches_position_to_first_order() {
        let epsilon = 1e-2;
        let velocity = Vec3::new(30.0, -12.0, 5.0);
        let position = Vec3::new(15.0, 4.0, -2.0);

        for (a, b) in frame_pairs() {
            let mapping = PortalMapping::new(&a, &b);
            let moved = mapping.position(position + velocity * epsilon);
            let predicted = mapping.position(position) + mapping.direction(velocity) * epsilon;
            assert_relative_eq!(moved, predicted, epsilon = 1e-2);
        }
    }

    #[test]
    fn test_direction_matches_orientation_rotation() {
        for (a, b) in frame_pairs() {
            let mapping = PortalMapping::new(&a, &b);
            let rotation = Quat::from_euler_angles(0.2, 0.3, -0.4);
            let mapped = mapping.orientation(&rotation);
            assert_relative_eq!(mapped * Vec3::x(), mapping.direction(rotation * Vec3::x()), epsilon = 1e-4);
        }
    }

    #[test]
    fn test_angular_velocity_through_rotated_pair() {
        // Portals related by a rotation with pitch and roll, not just yaw.
        let a = Transform::from_position_rotation(Vec3::new(0.0, 0.0, 0.0), Quat::from_euler_angles(0.3, 0.6, 0.2));
        let b = Transform::from_position_rotation(Vec3::new(400.0, 100.0, -50.0), Quat::from_euler_angles(-0.5, 0.1, 2.4));
        let mapping = PortalMapping::new(&a, &b);

        let orientation = Quat::from_euler_angles(0.1, -0.2, 0.9);
        let angular = Vec3::new(0.4, -1.1, 2.0);
        let dt = 1e-3;

        // Integrating then mapping must equal mapping then integrating with
        // the mapped angular velocity.
        let spun_then_mapped = mapping.orientation(&(Quat::from_scaled_axis(angular * dt) * orientation));
        let mapped_then_spun = Quat::from_scaled_axis(mapping.direction(angular) * dt) * mapping.orientation(&orientation);

        assert_relative_eq!(angle_between(&spun_then_mapped, &mapped_then_spun), 0.0, epsilon = 1e-4);
        assert_relative_eq!(mapping.direction(angular).norm(), angular.norm(), epsilon = 1e-4);
    }

    #[test]
    fn test_absent_portal_returns_sentinels() {
        let a = frame(Vec3::new(1.0, 2.0, 3.0), 0.0);

        assert_eq!(map_position(Vec3::new(5.0, 5.0, 5.0), Some(&a), None), Vec3::zeros());
        assert_eq!(map_direction(Vec3::x(), None, Some(&a)), Vec3::zeros());
        assert_eq!(map_orientation(&Quat::from_euler_angles(0.0, 0.0, 1.0), None, None), Quat::identity());
    }
}
