//! Primitive collision shapes and intersection algorithms
//!
//! Provides the geometric primitives portal traversal relies on: rays for
//! placement traces, planes for crossing tests and oriented boxes for the
//! trigger and surface volumes around a portal.

use crate::foundation::math::{Transform, Vec3};

/// A ray for line traces
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// The direction of the ray (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance to the first hit on a sphere the ray starts outside of
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let to_center = center - self.origin;
        let radius_squared = radius * radius;
        if to_center.norm_squared() <= radius_squared {
            return None;
        }

        let along = to_center.dot(&self.direction);
        if along < 0.0 {
            return None;
        }
        let miss_squared = to_center.norm_squared() - along * along;
        if miss_squared > radius_squared {
            return None;
        }
        Some(along - (radius_squared - miss_squared).sqrt())
    }
}

/// An infinite plane through `point` with unit `normal`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// A point on the plane
    pub point: Vec3,
    /// Unit normal; the side it points to is "in front"
    pub normal: Vec3,
}

impl Plane {
    /// Creates a plane from a point and a normal
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        Self {
            point,
            normal: normal.normalize(),
        }
    }

    /// Signed distance of `point` from the plane
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        (point - self.point).dot(&self.normal)
    }

    /// True when `point` is on the plane or on the side the normal points to
    pub fn is_in_front(&self, point: Vec3) -> bool {
        self.signed_distance(point) >= 0.0
    }

    /// Intersection of the segment `start..end` with the plane.
    ///
    /// Only reports a hit when the endpoints lie on opposite sides. A point on
    /// the plane counts as in front, matching [`Plane::is_in_front`], so a
    /// segment that merely touches the plane from the front never hits.
    pub fn intersect_segment(&self, start: Vec3, end: Vec3) -> Option<Vec3> {
        let start_distance = self.signed_distance(start);
        let end_distance = self.signed_distance(end);

        if (start_distance >= 0.0) == (end_distance >= 0.0) {
            return None;
        }

        let denominator = start_distance - end_distance;
        if denominator.abs() <= f32::EPSILON {
            return None;
        }

        let t = start_distance / denominator;
        Some(start + (end - start) * t)
    }

    /// Intersection distance along a ray, if the ray hits the front face
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let facing = ray.direction.dot(&self.normal);
        if facing >= -f32::EPSILON {
            return None;
        }
        let t = (self.point - ray.origin).dot(&self.normal) / facing;
        (t >= 0.0).then_some(t)
    }
}

/// A box with half-extents along the local axes of a transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    /// Position and rotation of the box (scale is ignored)
    pub frame: Transform,
    /// Half-size along local X, Y and Z
    pub half_extents: Vec3,
}

impl OrientedBox {
    /// Creates an oriented box
    pub fn new(frame: Transform, half_extents: Vec3) -> Self {
        Self { frame, half_extents }
    }

    /// Check if the box contains a point (boundary inclusive)
    pub fn contains_point(&self, point: Vec3) -> bool {
        let local = self.frame.inverse_transform_position_no_scale(point);
        local.x.abs() <= self.half_extents.x
            && local.y.abs() <= self.half_extents.y
            && local.z.abs() <= self.half_extents.z
    }

    /// Check if a sphere touches the box
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        let local = self.frame.inverse_transform_position_no_scale(center);
        let closest = Vec3::new(
            local.x.clamp(-self.half_extents.x, self.half_extents.x),
            local.y.clamp(-self.half_extents.y, self.half_extents.y),
            local.z.clamp(-self.half_extents.z, self.half_extents.z),
        );
        (local - closest).norm_squared() <= radius * radius
    }
}
