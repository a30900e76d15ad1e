//! Bounded placement surfaces and fitting portals onto them
//!
//! A wall is a rectangle centred on its transform, lying in its local Y/Z
//! plane with the surface normal along local +X. Width runs along local Y and
//! height along local Z.

use crate::foundation::math::{Transform, Vec2, Vec3};
use super::error::PlacementError;

/// A rectangular surface portals can be fitted onto
#[derive(Debug, Clone, PartialEq)]
pub struct PortalWall {
    transform: Transform,
    width: f32,
    height: f32,
}

impl PortalWall {
    /// Create a wall centred on `transform` with the given full size
    pub fn new(transform: Transform, width: f32, height: f32) -> Self {
        Self {
            transform,
            width,
            height,
        }
    }

    /// World frame of the wall (forward is the surface normal)
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Full width along local Y
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Full height along local Z
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Whether a wall-local point lies within the rectangle (depth is ignored)
    pub fn contains_local(&self, local: Vec3) -> bool {
        local.y.abs() <= self.width * 0.5 && local.z.abs() <= self.height * 0.5
    }

    /// Fit a `width` x `height` rectangle around `impact` without leaving the wall.
    ///
    /// The centre is moved inward by exactly the overflow on each axis, never
    /// further. Distance from the surface is kept as given.
    pub fn try_place_portal(&self, impact: Vec3, width: f32, height: f32) -> Result<Vec3, PlacementError> {
        if width > self.width || height > self.height {
            return Err(PlacementError::TooLarge {
                width,
                height,
                wall_width: self.width,
                wall_height: self.height,
            });
        }

        let mut local = self.transform.inverse_transform_position_no_scale(impact);
        local.y = constrain_axis(local.y, width * 0.5, self.width * 0.5);
        local.z = constrain_axis(local.z, height * 0.5, self.height * 0.5);

        Ok(self.transform.transform_position_no_scale(local))
    }

    /// Whether a candidate portal would overlap a sibling already on this wall.
    ///
    /// Extents are half-width and half-height. Both rectangles are compared
    /// in the wall's local Y/Z plane.
    pub fn reject_if_overlapping(
        &self,
        candidate_origin: Vec3,
        candidate_extents: Vec2,
        sibling_origin: Vec3,
        sibling_extents: Vec2,
    ) -> bool {
        let candidate = self.transform.inverse_transform_position_no_scale(candidate_origin);
        let sibling = self.transform.inverse_transform_position_no_scale(sibling_origin);

        rectangles_overlap(
            Vec2::new(candidate.y, candidate.z),
            candidate_extents,
            Vec2::new(sibling.y, sibling.z),
            sibling_extents,
        )
    }
}

/// Interval overlap on both axes. Rectangles that only touch do not overlap.
pub fn rectangles_overlap(a_center: Vec2, a_extents: Vec2, b_center: Vec2, b_extents: Vec2) -> bool {
    let overlaps_on = |axis: usize| {
        a_center[axis] + a_extents[axis] > b_center[axis] - b_extents[axis]
            && a_center[axis] - a_extents[axis] < b_center[axis] + b_extents[axis]
    };
    overlaps_on(0) && overlaps_on(1)
}

fn constrain_axis(center: f32, half: f32, wall_half: f32) -> f32 {
    let overflow = center.abs() + half - wall_half;
    if overflow > 0.0 {
        center - center.signum() * overflow
    } else {
        center
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{constants::HALF_PI, utils};
    use approx::assert_relative_eq;

    fn square_wall() -> PortalWall {
        PortalWall::new(Transform::identity(), 200.0, 200.0)
    }

    #[test]
    fn test_edge_impact_is_pulled_inward_by_overflow() {
        let wall = square_wall();
        let placed = wall.try_place_portal(Vec3::new(0.0, 90.0, 0.0), 100.0, 100.0).unwrap();

        assert_relative_eq!(placed, Vec3::new(0.0, 50.0, 0.0), epsilon = 1e-4);
    }

    #[test]
    fn test_both_axes_clamped_independently() {
        let wall = square_wall();
        let placed = wall.try_place_portal(Vec3::new(1.0, -95.0, 80.0), 100.0, 50.0).unwrap();

        assert_relative_eq!(placed, Vec3::new(1.0, -50.0, 75.0), epsilon = 1e-4);
    }

    #[test]
    fn test_interior_impact_untouched() {
        let wall = square_wall();
        let placed = wall.try_place_portal(Vec3::new(0.0, 10.0, -20.0), 100.0, 50.0).unwrap();

        assert_relative_eq!(placed, Vec3::new(0.0, 10.0, -20.0), epsilon = 1e-4);
    }

    #[test]
    fn test_oversized_portal_rejected() {
        let wall = square_wall();
        let result = wall.try_place_portal(Vec3::zeros(), 250.0, 100.0);

        assert!(matches!(result, Err(PlacementError::TooLarge { width, .. }) if width == 250.0));
    }

    #[test]
    fn test_fitting_respects_wall_rotation() {
        // Wall facing +Y: local right (+Y) points along world -X.
        let wall = PortalWall::new(
            Transform::from_position_rotation(Vec3::new(0.0, 300.0, 100.0), utils::yaw_rotation(HALF_PI)),
            200.0,
            200.0,
        );
        let placed = wall.try_place_portal(Vec3::new(-90.0, 301.0, 100.0), 100.0, 50.0).unwrap();

        assert_relative_eq!(placed, Vec3::new(-50.0, 301.0, 100.0), epsilon = 1e-3);
    }

    #[test]
    fn test_sibling_overlap() {
        let wall = square_wall();
        let extents = Vec2::new(50.0, 25.0);

        assert!(wall.reject_if_overlapping(Vec3::zeros(), extents, Vec3::new(0.0, 40.0, 0.0), extents));
        assert!(!wall.reject_if_overlapping(Vec3::zeros(), extents, Vec3::new(0.0, 120.0, 0.0), extents));
        // Offset vertically past the combined half-heights.
        assert!(!wall.reject_if_overlapping(Vec3::zeros(), extents, Vec3::new(0.0, 10.0, 60.0), extents));
    }

    #[test]
    fn test_touching_rectangles_do_not_overlap() {
        let extents = Vec2::new(50.0, 25.0);

        assert!(!rectangles_overlap(Vec2::zeros(), extents, Vec2::new(100.0, 0.0), extents));
        assert!(rectangles_overlap(Vec2::zeros(), extents, Vec2::new(99.9, 0.0), extents));
    }

    #[test]
    fn test_contains_local() {
        let wall = PortalWall::new(Transform::identity(), 400.0, 300.0);

        assert!(wall.contains_local(Vec3::new(5.0, 200.0, -150.0)));
        assert!(!wall.contains_local(Vec3::new(0.0, 201.0, 0.0)));
    }
}
