//! Scene capabilities consumed by the portal engine
//!
//! [`ObjectWorld`] and [`SceneQuery`] are the seams to the host engine: the
//! transform-apply capability and the scene-query capability. [`SceneWorld`]
//! is a self-contained implementation of both, used by the demo and tests.

use crate::foundation::collections::{HandleMap, ObjectId, WallId};
use crate::foundation::math::{Quat, Transform, Vec3};
use crate::physics::{CollisionChannels, Plane, Ray};
use crate::portal::PortalWall;
use super::object::{Anchor, Motion, ObjectClass, ObjectKind, SceneObject};

/// Transform-apply capability over world objects
///
/// Every lookup returns `None` or `false` for objects that no longer exist;
/// callers treat that as "object gone", never as a panic.
pub trait ObjectWorld {
    /// Whether the object still exists
    fn contains(&self, id: ObjectId) -> bool;

    /// All live objects
    fn object_ids(&self) -> Vec<ObjectId>;

    /// Classification for tracking eligibility
    fn class(&self, id: ObjectId) -> Option<ObjectClass>;

    /// Root transform
    fn transform(&self, id: ObjectId) -> Option<Transform>;

    /// Camera transform for pawns, root transform otherwise
    fn view_transform(&self, id: ObjectId) -> Option<Transform>;

    /// Bounding sphere radius around the root
    fn bounding_radius(&self, id: ObjectId) -> Option<f32>;

    /// Velocity state
    fn motion(&self, id: ObjectId) -> Option<Motion>;

    /// Replace velocity state
    fn set_motion(&mut self, id: ObjectId, motion: Motion) -> bool;

    /// Look/control orientation of a pawn
    fn control_rotation(&self, id: ObjectId) -> Option<Quat>;

    /// Replace the look/control orientation of a pawn
    fn set_control_rotation(&mut self, id: ObjectId, rotation: Quat) -> bool;

    /// Move without sweeping or interpolation
    fn teleport(&mut self, id: ObjectId, position: Vec3, rotation: Quat) -> bool;

    /// Place a (non-simulated) object
    fn set_transform(&mut self, id: ObjectId, transform: Transform) -> bool;

    /// Enter the teleporting interaction state
    fn begin_teleport(&mut self, id: ObjectId);

    /// Leave the teleporting interaction state
    fn end_teleport(&mut self, id: ObjectId);

    /// Spawn a hidden cosmetic duplicate of `source`
    fn spawn_duplicate(&mut self, source: ObjectId, transform: Transform) -> Option<ObjectId>;

    /// Remove an object
    fn destroy(&mut self, id: ObjectId) -> bool;

    /// Show or hide an object in the main render pass
    fn set_hidden(&mut self, id: ObjectId, hidden: bool) -> bool;

    /// Whether an object is hidden from the main render pass
    fn is_hidden(&self, id: ObjectId) -> Option<bool>;

    /// Position of the point representing the object
    fn anchor_position(&self, id: ObjectId, anchor: Anchor) -> Option<Vec3> {
        match anchor {
            Anchor::Camera => self.view_transform(id).map(|t| t.position),
            Anchor::Root => self.transform(id).map(|t| t.position),
        }
    }
}

/// Result of a line trace
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceHit {
    /// Impact point
    pub location: Vec3,
    /// Surface normal at the impact
    pub normal: Vec3,
    /// Distance from the trace start
    pub distance: f32,
    /// Portal wall that was hit, if the surface is one
    pub wall: Option<WallId>,
    /// Object that blocked the trace, if it was not a surface
    pub object: Option<ObjectId>,
}

/// Scene-query capability
pub trait SceneQuery {
    /// First blocking surface or object on the segment `start..end` matching `channels`.
    ///
    /// Objects are tested against their effective channels, so grabbed or
    /// teleporting objects let portal-wall traces through. An object the
    /// trace starts inside never blocks it.
    fn line_trace(&self, start: Vec3, end: Vec3, channels: CollisionChannels) -> Option<TraceHit>;

    /// Look up a portal wall
    fn wall(&self, id: WallId) -> Option<&PortalWall>;
}

#[derive(Debug, Clone)]
struct Surface {
    wall: PortalWall,
    channels: CollisionChannels,
}

/// In-memory world: objects, surfaces and a simple integrator
#[derive(Debug, Default)]
pub struct SceneWorld {
    objects: HandleMap<ObjectId, SceneObject>,
    surfaces: HandleMap<WallId, Surface>,
}

impl SceneWorld {
    /// Create an empty world
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object
    pub fn spawn(&mut self, object: SceneObject) -> ObjectId {
        log::debug!("Spawning object {}", object.name);
        self.objects.insert(object)
    }

    /// Add a wall portals can be placed on
    pub fn add_portal_wall(&mut self, wall: PortalWall) -> WallId {
        self.surfaces.insert(Surface {
            wall,
            channels: CollisionChannels::WORLD_STATIC | CollisionChannels::PORTAL_WALL,
        })
    }

    /// Add a blocking surface that does not accept portals
    pub fn add_surface(&mut self, wall: PortalWall) -> WallId {
        self.surfaces.insert(Surface {
            wall,
            channels: CollisionChannels::WORLD_STATIC,
        })
    }

    /// Borrow an object
    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(id)
    }

    /// Mutably borrow an object
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(id)
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the world has no objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Start holding an object
    pub fn grab(&mut self, id: ObjectId) -> bool {
        self.objects.get_mut(id).map(|o| o.interaction.begin_grab()).is_some()
    }

    /// Stop holding an object
    pub fn release(&mut self, id: ObjectId) -> bool {
        self.objects.get_mut(id).map(|o| o.interaction.end_grab()).is_some()
    }

    /// Advance every moving object by `delta_time` seconds
    pub fn step_physics(&mut self, delta_time: f32) {
        for object in self.objects.values_mut() {
            match object.motion {
                Some(Motion::Character { velocity }) => {
                    object.transform.position += velocity * delta_time;
                }
                Some(Motion::Body { linear, angular }) => {
                    object.transform.position += linear * delta_time;
                    let spin = Quat::from_scaled_axis(angular * delta_time);
                    object.transform.rotation = spin * object.transform.rotation;
                }
                None => {}
            }
        }
    }
}

impl ObjectWorld for SceneWorld {
    fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    fn object_ids(&self) -> Vec<ObjectId> {
        self.objects.keys().collect()
    }

    fn class(&self, id: ObjectId) -> Option<ObjectClass> {
        self.objects.get(id).map(SceneObject::class)
    }

    fn transform(&self, id: ObjectId) -> Option<Transform> {
        self.objects.get(id).map(|o| o.transform)
    }

    fn view_transform(&self, id: ObjectId) -> Option<Transform> {
        self.objects.get(id).map(SceneObject::view_transform)
    }

    fn bounding_radius(&self, id: ObjectId) -> Option<f32> {
        self.objects.get(id).map(|o| o.bounding_radius)
    }

    fn motion(&self, id: ObjectId) -> Option<Motion> {
        self.objects.get(id).and_then(|o| o.motion)
    }

    fn set_motion(&mut self, id: ObjectId, motion: Motion) -> bool {
        match self.objects.get_mut(id) {
            Some(object) if object.motion.is_some() => {
                object.motion = Some(motion);
                true
            }
            _ => false,
        }
    }

    fn control_rotation(&self, id: ObjectId) -> Option<Quat> {
        match self.objects.get(id)?.kind {
            ObjectKind::Pawn { control_rotation, .. } => Some(control_rotation),
            _ => None,
        }
    }

    fn set_control_rotation(&mut self, id: ObjectId, rotation: Quat) -> bool {
        match self.objects.get_mut(id).map(|o| &mut o.kind) {
            Some(ObjectKind::Pawn { control_rotation, .. }) => {
                *control_rotation = rotation;
                true
            }
            _ => false,
        }
    }

    fn teleport(&mut self, id: ObjectId, position: Vec3, rotation: Quat) -> bool {
        match self.objects.get_mut(id) {
            Some(object) => {
                object.transform.position = position;
                object.transform.rotation = rotation;
                true
            }
            None => false,
        }
    }

    fn set_transform(&mut self, id: ObjectId, transform: Transform) -> bool {
        match self.objects.get_mut(id) {
            Some(object) => {
                object.transform = transform;
                true
            }
            None => false,
        }
    }

    fn begin_teleport(&mut self, id: ObjectId) {
        if let Some(object) = self.objects.get_mut(id) {
            object.interaction.begin_teleport();
        }
    }

    fn end_teleport(&mut self, id: ObjectId) {
        if let Some(object) = self.objects.get_mut(id) {
            object.interaction.end_teleport();
        }
    }

    fn spawn_duplicate(&mut self, source: ObjectId, transform: Transform) -> Option<ObjectId> {
        let object = self.objects.get(source)?;
        if matches!(object.kind, ObjectKind::Duplicate { .. }) {
            return None;
        }
        let duplicate = SceneObject::duplicate_of(source, object, transform);
        log::debug!("Spawning duplicate {}", duplicate.name);
        Some(self.objects.insert(duplicate))
    }

    fn destroy(&mut self, id: ObjectId) -> bool {
        self.objects.remove(id).is_some()
    }

    fn set_hidden(&mut self, id: ObjectId, hidden: bool) -> bool {
        self.objects.get_mut(id).map(|o| o.hidden = hidden).is_some()
    }

    fn is_hidden(&self, id: ObjectId) -> Option<bool> {
        self.objects.get(id).map(|o| o.hidden)
    }
}

impl SceneQuery for SceneWorld {
    fn line_trace(&self, start: Vec3, end: Vec3, channels: CollisionChannels) -> Option<TraceHit> {
        let length = (end - start).norm();
        if length <= f32::EPSILON {
            return None;
        }
        let ray = Ray::new(start, end - start);

        let surface_hits = self
            .surfaces
            .iter()
            .filter(|(_, surface)| surface.channels.overlaps(channels))
            .filter_map(|(id, surface)| {
                let frame = surface.wall.transform();
                let plane = Plane::new(frame.position, frame.forward());
                let distance = plane.intersect_ray(&ray).filter(|t| *t <= length)?;
                let location = ray.point_at(distance);
                surface.wall.contains_local(frame.inverse_transform_position_no_scale(location)).then(|| TraceHit {
                    location,
                    normal: plane.normal,
                    distance,
                    wall: surface.channels.contains(CollisionChannels::PORTAL_WALL).then_some(id),
                    object: None,
                })
            });

        let object_hits = self
            .objects
            .iter()
            .filter(|(_, object)| object.effective_channels().overlaps(channels))
            .filter_map(|(id, object)| {
                let center = object.transform.position;
                let distance = ray
                    .intersect_sphere(center, object.bounding_radius)
                    .filter(|t| *t <= length)?;
                let location = ray.point_at(distance);
                Some(TraceHit {
                    location,
                    normal: (location - center).normalize(),
                    distance,
                    wall: None,
                    object: Some(id),
                })
            });

        surface_hits
            .chain(object_hits)
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn wall(&self, id: WallId) -> Option<&PortalWall> {
        self.surfaces
            .get(id)
            .filter(|s| s.channels.contains(CollisionChannels::PORTAL_WALL))
            .map(|s| &s.wall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{constants::PI, utils};
    use approx::assert_relative_eq;

    fn wall_facing_minus_x(distance: f32) -> PortalWall {
        // Forward (surface normal) points back toward the origin.
        PortalWall::new(
            Transform::from_position_rotation(Vec3::new(distance, 0.0, 0.0), utils::yaw_rotation(PI)),
            400.0,
            300.0,
        )
    }

    #[test]
    fn test_line_trace_hits_closest_wall() {
        let mut world = SceneWorld::new();
        let near = world.add_portal_wall(wall_facing_minus_x(500.0));
        world.add_portal_wall(wall_facing_minus_x(800.0));

        let hit = world
            .line_trace(Vec3::zeros(), Vec3::new(10_000.0, 0.0, 0.0), CollisionChannels::PORTAL_WALL)
            .unwrap();

        assert_eq!(hit.wall, Some(near));
        assert_relative_eq!(hit.distance, 500.0, epsilon = 1e-3);
        assert_relative_eq!(hit.normal, -Vec3::x(), epsilon = 1e-5);
    }

    #[test]
    fn test_line_trace_respects_length_and_bounds() {
        let mut world = SceneWorld::new();
        world.add_portal_wall(wall_facing_minus_x(500.0));

        assert!(world.line_trace(Vec3::zeros(), Vec3::new(100.0, 0.0, 0.0), CollisionChannels::all()).is_none());
        assert!(world
            .line_trace(Vec3::new(0.0, 1000.0, 0.0), Vec3::new(10_000.0, 1000.0, 0.0), CollisionChannels::all())
            .is_none());
    }

    #[test]
    fn test_plain_surface_is_not_a_portal_wall() {
        let mut world = SceneWorld::new();
        let surface = world.add_surface(wall_facing_minus_x(500.0));

        let hit = world
            .line_trace(Vec3::zeros(), Vec3::new(1000.0, 0.0, 0.0), CollisionChannels::WORLD_STATIC)
            .unwrap();
        assert_eq!(hit.wall, None);
        assert!(world.wall(surface).is_none());
    }

    #[test]
    fn test_step_physics_integrates_motion() {
        let mut world = SceneWorld::new();
        let body = world.spawn(
            SceneObject::body("crate", Vec3::zeros(), 10.0).with_velocity(Vec3::new(100.0, 0.0, 0.0), Vec3::new(0.0, 0.0, PI)),
        );

        world.step_physics(0.5);

        let transform = world.transform(body).unwrap();
        assert_relative_eq!(transform.position, Vec3::new(50.0, 0.0, 0.0), epsilon = 1e-4);
        assert_relative_eq!(transform.forward(), Vec3::y(), epsilon = 1e-4);
    }

    #[test]
    fn test_duplicate_of_duplicate_is_refused() {
        let mut world = SceneWorld::new();
        let body = world.spawn(SceneObject::body("crate", Vec3::zeros(), 10.0));
        let duplicate = world.spawn_duplicate(body, Transform::identity()).unwrap();

        assert_eq!(world.is_hidden(duplicate), Some(true));
        assert!(world.spawn_duplicate(duplicate, Transform::identity()).is_none());
    }

    #[test]
    fn test_grabbed_object_stops_blocking_portal_traces() {
        let mut world = SceneWorld::new();
        let wall = world.add_portal_wall(wall_facing_minus_x(500.0));
        let body = world.spawn(SceneObject::body("crate", Vec3::new(200.0, 0.0, 0.0), 10.0));
        let end = Vec3::new(1000.0, 0.0, 0.0);

        let blocked = world.line_trace(Vec3::zeros(), end, CollisionChannels::PORTAL_WALL).unwrap();
        assert_eq!(blocked.object, Some(body));
        assert_eq!(blocked.wall, None);
        assert_relative_eq!(blocked.distance, 190.0, epsilon = 1e-3);
        assert_relative_eq!(blocked.normal, -Vec3::x(), epsilon = 1e-5);

        world.grab(body);
        let through = world.line_trace(Vec3::zeros(), end, CollisionChannels::PORTAL_WALL).unwrap();
        assert_eq!(through.wall, Some(wall));
        assert_eq!(through.object, None);

        world.release(body);
        assert_eq!(world.line_trace(Vec3::zeros(), end, CollisionChannels::PORTAL_WALL).unwrap().object, Some(body));
    }

    #[test]
    fn test_trace_ignores_object_it_starts_in_and_duplicates() {
        let mut world = SceneWorld::new();
        let wall = world.add_portal_wall(wall_facing_minus_x(500.0));
        let shooter = world.spawn(SceneObject::body("shooter", Vec3::zeros(), 40.0));
        let body = world.spawn(SceneObject::body("crate", Vec3::new(1000.0, 0.0, 0.0), 10.0));
        let duplicate = world
            .spawn_duplicate(body, Transform::from_position(Vec3::new(200.0, 0.0, 0.0)))
            .unwrap();

        let hit = world
            .line_trace(Vec3::zeros(), Vec3::new(1000.0, 0.0, 0.0), CollisionChannels::PORTAL_WALL)
            .unwrap();

        assert_eq!(hit.wall, Some(wall));
        assert_ne!(hit.object, Some(shooter));
        assert_ne!(hit.object, Some(duplicate));
    }

    #[test]
    fn test_missing_object_is_reported_not_panicked() {
        let mut world = SceneWorld::new();
        let body = world.spawn(SceneObject::body("crate", Vec3::zeros(), 10.0));
        world.destroy(body);

        assert!(!world.contains(body));
        assert!(world.transform(body).is_none());
        assert!(!world.teleport(body, Vec3::zeros(), Quat::identity()));
    }
}
