//! Tracked object registry and shadow duplicate lifecycle
//!
//! Each portal owns one registry. A record exists for every eligible object
//! inside the portal's trigger volume:
//!
//! ```text
//! Untracked --trigger enter (in front)--> Tracked --crossing--> Crossed
//!     ^                                     |                      |
//!     +---------- trigger exit -------------+     adopted by the destination
//! ```
//!
//! The registry is the sole owner of its duplicates. Two one-directional maps
//! are kept: object to record (holding the duplicate), and duplicate back to
//! the original. Removing a record always destroys its duplicate unless the
//! record is being handed to another registry.

use std::collections::HashMap;

use crate::foundation::collections::ObjectId;
use crate::foundation::math::Vec3;
use crate::scene::{Anchor, ObjectClass, ObjectWorld};
use super::mapper::PortalMapping;

/// Lifecycle state of an object relative to one portal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    /// Not near this portal
    Untracked,
    /// Inside the trigger volume
    Tracked,
    /// Crossed; in transit to the destination's registry
    Crossed,
}

/// Object kind resolved once when tracking starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedKind {
    /// Controlled pawn; tracked by its camera
    Pawn,
    /// Simulated body; tracked by its root
    Body,
}

impl TrackedKind {
    /// Kind for an object class, or `None` if the class is never tracked
    pub fn from_class(class: ObjectClass) -> Option<Self> {
        match class {
            ObjectClass::ControlledPawn => Some(Self::Pawn),
            ObjectClass::PhysicsBody => Some(Self::Body),
            ObjectClass::Other => None,
        }
    }

    /// Point representing the object in crossing tests
    pub fn anchor(self) -> Anchor {
        match self {
            Self::Pawn => Anchor::Camera,
            Self::Body => Anchor::Root,
        }
    }
}

/// Per-object tracking data
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedRecord {
    /// Anchor position sampled at the end of the previous physics step
    pub last_known_position: Vec3,
    kind: TrackedKind,
    duplicate: Option<ObjectId>,
    duplicate_visible: bool,
    state: TrackingState,
}

impl TrackedRecord {
    fn new(kind: TrackedKind, position: Vec3) -> Self {
        Self {
            last_known_position: position,
            kind,
            duplicate: None,
            duplicate_visible: false,
            state: TrackingState::Tracked,
        }
    }

    /// Resolved kind
    pub fn kind(&self) -> TrackedKind {
        self.kind
    }

    /// Anchor used for crossing tests
    pub fn anchor(&self) -> Anchor {
        self.kind.anchor()
    }

    /// Duplicate currently standing in for the object
    pub fn duplicate(&self) -> Option<ObjectId> {
        self.duplicate
    }

    /// Whether the duplicate should be rendered
    pub fn duplicate_visible(&self) -> bool {
        self.duplicate_visible
    }

    /// Lifecycle state
    pub fn state(&self) -> TrackingState {
        self.state
    }
}

/// Registry of objects near one portal
#[derive(Debug, Default)]
pub struct TrackedObjectRegistry {
    records: HashMap<ObjectId, TrackedRecord>,
    duplicates: HashMap<ObjectId, ObjectId>,
}

impl TrackedObjectRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked objects
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether an object is tracked
    pub fn contains(&self, object: ObjectId) -> bool {
        self.records.contains_key(&object)
    }

    /// State of an object relative to this portal
    pub fn state(&self, object: ObjectId) -> TrackingState {
        self.records.get(&object).map_or(TrackingState::Untracked, TrackedRecord::state)
    }

    /// Record for an object
    pub fn record(&self, object: ObjectId) -> Option<&TrackedRecord> {
        self.records.get(&object)
    }

    pub(crate) fn record_mut(&mut self, object: ObjectId) -> Option<&mut TrackedRecord> {
        self.records.get_mut(&object)
    }

    /// Tracked objects
    pub fn objects(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.records.keys().copied()
    }

    /// Duplicate of a tracked object
    pub fn duplicate_of(&self, object: ObjectId) -> Option<ObjectId> {
        self.records.get(&object).and_then(TrackedRecord::duplicate)
    }

    /// Original object a duplicate stands in for
    pub fn original_of(&self, duplicate: ObjectId) -> Option<ObjectId> {
        self.duplicates.get(&duplicate).copied()
    }

    /// Start tracking an object.
    ///
    /// A hidden duplicate is placed on the far side when `mapping` is known.
    /// Returns false if the object was already tracked.
    pub fn begin_tracking<W>(
        &mut self,
        world: &mut W,
        object: ObjectId,
        kind: TrackedKind,
        position: Vec3,
        mapping: Option<&PortalMapping>,
    ) -> bool
    where
        W: ObjectWorld + ?Sized,
    {
        if self.records.contains_key(&object) {
            return false;
        }

        log::debug!("Tracking {:?} as {:?}", object, kind);
        let mut record = TrackedRecord::new(kind, position);
        if let Some(mapping) = mapping {
            record.duplicate = self.spawn_duplicate(world, object, mapping, false);
        }
        self.records.insert(object, record);
        true
    }

    /// Stop tracking an object and destroy its duplicate
    pub fn end_tracking<W>(&mut self, world: &mut W, object: ObjectId) -> bool
    where
        W: ObjectWorld + ?Sized,
    {
        match self.records.remove(&object) {
            Some(record) => {
                log::debug!("Stopped tracking {:?}", object);
                self.destroy_duplicate(world, record.duplicate);
                true
            }
            None => false,
        }
    }

    /// Show or hide an object's duplicate
    pub fn set_duplicate_visible<W>(&mut self, world: &mut W, object: ObjectId, visible: bool) -> bool
    where
        W: ObjectWorld + ?Sized,
    {
        let Some(record) = self.records.get_mut(&object) else {
            return false;
        };
        record.duplicate_visible = visible;
        if let Some(duplicate) = record.duplicate {
            world.set_hidden(duplicate, !visible);
        }
        true
    }

    /// Per-frame duplicate maintenance.
    ///
    /// Drops records whose object is gone, creates duplicates that are
    /// missing now that a link exists, destroys them when there is no link,
    /// and moves every duplicate to the mapped transform of its object.
    /// Returns the objects that were dropped.
    pub fn refresh<W>(&mut self, world: &mut W, mapping: Option<&PortalMapping>) -> Vec<ObjectId>
    where
        W: ObjectWorld + ?Sized,
    {
        let dropped = self.prune(world);

        let Some(mapping) = mapping else {
            self.detach_duplicates(world);
            return dropped;
        };

        let objects: Vec<ObjectId> = self.records.keys().copied().collect();
        for object in objects {
            let Some(transform) = world.transform(object) else {
                continue;
            };
            let existing = self.records.get(&object).and_then(|r| r.duplicate);
            match existing {
                Some(duplicate) if world.contains(duplicate) => {
                    world.set_transform(duplicate, mapping.transform(&transform));
                }
                _ => {
                    if let Some(stale) = existing {
                        self.duplicates.remove(&stale);
                    }
                    let visible = self.records.get(&object).is_some_and(|r| r.duplicate_visible);
                    let duplicate = self.spawn_duplicate(world, object, mapping, visible);
                    if let Some(record) = self.records.get_mut(&object) {
                        record.duplicate = duplicate;
                    }
                }
            }
        }
        dropped
    }

    /// Drop records whose object no longer exists, tearing down duplicates
    pub fn prune<W>(&mut self, world: &mut W) -> Vec<ObjectId>
    where
        W: ObjectWorld + ?Sized,
    {
        let gone: Vec<ObjectId> = self.records.keys().copied().filter(|id| !world.contains(*id)).collect();
        for object in &gone {
            log::debug!("Dropping tracked object {:?}: no longer in the world", object);
            if let Some(record) = self.records.remove(object) {
                self.destroy_duplicate(world, record.duplicate);
            }
        }
        gone
    }

    /// Destroy every duplicate but keep the records
    pub fn detach_duplicates<W>(&mut self, world: &mut W)
    where
        W: ObjectWorld + ?Sized,
    {
        for record in self.records.values_mut() {
            if let Some(duplicate) = record.duplicate.take() {
                world.destroy(duplicate);
            }
        }
        self.duplicates.clear();
    }

    /// Remove a crossed object's record without destroying its duplicate
    pub fn take(&mut self, object: ObjectId) -> Option<TrackedRecord> {
        let mut record = self.records.remove(&object)?;
        if let Some(duplicate) = record.duplicate {
            self.duplicates.remove(&duplicate);
        }
        record.state = TrackingState::Crossed;
        Some(record)
    }

    /// Take over a record handed off from the source portal.
    ///
    /// The duplicate is reused (or created when missing), moved to the mapped
    /// transform, and made visible straight away. If the object is already
    /// tracked here, the incoming duplicate is destroyed and the existing one
    /// is shown instead.
    pub fn adopt<W>(
        &mut self,
        world: &mut W,
        object: ObjectId,
        mut record: TrackedRecord,
        position: Vec3,
        mapping: Option<&PortalMapping>,
    ) where
        W: ObjectWorld + ?Sized,
    {
        if self.records.contains_key(&object) {
            self.destroy_duplicate(world, record.duplicate);
            if let Some(existing) = self.records.get_mut(&object) {
                existing.last_known_position = position;
            }
            self.set_duplicate_visible(world, object, true);
            return;
        }

        record.state = TrackingState::Tracked;
        record.last_known_position = position;
        record.duplicate_visible = true;

        match (record.duplicate, mapping) {
            (Some(duplicate), Some(mapping)) if world.contains(duplicate) => {
                if let Some(transform) = world.transform(object) {
                    world.set_transform(duplicate, mapping.transform(&transform));
                }
                world.set_hidden(duplicate, false);
                self.duplicates.insert(duplicate, object);
            }
            (existing, Some(mapping)) => {
                self.destroy_duplicate(world, existing);
                record.duplicate = self.spawn_duplicate(world, object, mapping, true);
            }
            (existing, None) => {
                self.destroy_duplicate(world, existing);
                record.duplicate = None;
            }
        }

        log::debug!("Adopted {:?} with duplicate {:?}", object, record.duplicate);
        self.records.insert(object, record);
    }

    /// Stop tracking everything and destroy every duplicate
    pub fn clear<W>(&mut self, world: &mut W)
    where
        W: ObjectWorld + ?Sized,
    {
        for (_, record) in self.records.drain() {
            if let Some(duplicate) = record.duplicate {
                world.destroy(duplicate);
            }
        }
        self.duplicates.clear();
    }

    fn spawn_duplicate<W>(&mut self, world: &mut W, object: ObjectId, mapping: &PortalMapping, visible: bool) -> Option<ObjectId>
    where
        W: ObjectWorld + ?Sized,
    {
        let transform = mapping.transform(&world.transform(object)?);
        let duplicate = world.spawn_duplicate(object, transform)?;
        world.set_hidden(duplicate, !visible);
        self.duplicates.insert(duplicate, object);
        Some(duplicate)
    }

    fn destroy_duplicate<W>(&mut self, world: &mut W, duplicate: Option<ObjectId>)
    where
        W: ObjectWorld + ?Sized,
    {
        if let Some(duplicate) = duplicate {
            self.duplicates.remove(&duplicate);
            world.destroy(duplicate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{constants::PI, utils, Transform};
    use crate::scene::{SceneObject, SceneWorld};
    use approx::assert_relative_eq;

    fn mapping() -> PortalMapping {
        PortalMapping::new(
            &Transform::identity(),
            &Transform::from_position_rotation(Vec3::new(1000.0, 0.0, 0.0), utils::yaw_rotation(PI)),
        )
    }

    fn world_with_body() -> (SceneWorld, ObjectId) {
        let mut world = SceneWorld::new();
        let body = world.spawn(SceneObject::body("crate", Vec3::new(50.0, 0.0, 0.0), 10.0));
        (world, body)
    }

    #[test]
    fn test_entry_creates_hidden_duplicate_on_far_side() {
        let (mut world, body) = world_with_body();
        let mut registry = TrackedObjectRegistry::new();

        assert!(registry.begin_tracking(&mut world, body, TrackedKind::Body, Vec3::new(50.0, 0.0, 0.0), Some(&mapping())));

        let duplicate = registry.duplicate_of(body).unwrap();
        assert_eq!(registry.state(body), TrackingState::Tracked);
        assert_eq!(registry.original_of(duplicate), Some(body));
        assert_eq!(world.is_hidden(duplicate), Some(true));
        assert_relative_eq!(world.transform(duplicate).unwrap().position, Vec3::new(1050.0, 0.0, 0.0), epsilon = 1e-3);
    }

    #[test]
    fn test_entry_twice_is_ignored() {
        let (mut world, body) = world_with_body();
        let mut registry = TrackedObjectRegistry::new();

        registry.begin_tracking(&mut world, body, TrackedKind::Body, Vec3::zeros(), Some(&mapping()));
        let objects_before = world.len();

        assert!(!registry.begin_tracking(&mut world, body, TrackedKind::Body, Vec3::zeros(), Some(&mapping())));
        assert_eq!(world.len(), objects_before);
    }

    #[test]
    fn test_exit_destroys_duplicate() {
        let (mut world, body) = world_with_body();
        let mut registry = TrackedObjectRegistry::new();
        registry.begin_tracking(&mut world, body, TrackedKind::Body, Vec3::zeros(), Some(&mapping()));
        let duplicate = registry.duplicate_of(body).unwrap();

        assert!(registry.end_tracking(&mut world, body));

        assert!(!world.contains(duplicate));
        assert_eq!(registry.original_of(duplicate), None);
        assert_eq!(registry.state(body), TrackingState::Untracked);
    }

    #[test]
    fn test_visibility_toggles_duplicate() {
        let (mut world, body) = world_with_body();
        let mut registry = TrackedObjectRegistry::new();
        registry.begin_tracking(&mut world, body, TrackedKind::Body, Vec3::zeros(), Some(&mapping()));
        let duplicate = registry.duplicate_of(body).unwrap();

        registry.set_duplicate_visible(&mut world, body, true);
        assert_eq!(world.is_hidden(duplicate), Some(false));

        registry.set_duplicate_visible(&mut world, body, false);
        assert_eq!(world.is_hidden(duplicate), Some(true));
    }

    #[test]
    fn test_refresh_follows_object_and_prunes_destroyed() {
        let (mut world, body) = world_with_body();
        let other = world.spawn(SceneObject::body("ball", Vec3::new(20.0, 0.0, 0.0), 5.0));
        let mut registry = TrackedObjectRegistry::new();
        registry.begin_tracking(&mut world, body, TrackedKind::Body, Vec3::zeros(), Some(&mapping()));
        registry.begin_tracking(&mut world, other, TrackedKind::Body, Vec3::zeros(), Some(&mapping()));
        let other_duplicate = registry.duplicate_of(other).unwrap();

        world.set_transform(body, Transform::from_position(Vec3::new(30.0, 10.0, 5.0)));
        world.destroy(other);
        let dropped = registry.refresh(&mut world, Some(&mapping()));

        assert_eq!(dropped, vec![other]);
        assert!(!world.contains(other_duplicate));
        let duplicate = registry.duplicate_of(body).unwrap();
        assert_relative_eq!(world.transform(duplicate).unwrap().position, Vec3::new(1030.0, 10.0, 5.0), epsilon = 1e-3);
    }

    #[test]
    fn test_duplicates_follow_link_state() {
        let (mut world, body) = world_with_body();
        let mut registry = TrackedObjectRegistry::new();

        registry.begin_tracking(&mut world, body, TrackedKind::Body, Vec3::zeros(), None);
        assert_eq!(registry.duplicate_of(body), None);

        registry.set_duplicate_visible(&mut world, body, true);
        registry.refresh(&mut world, Some(&mapping()));
        let duplicate = registry.duplicate_of(body).unwrap();
        assert_eq!(world.is_hidden(duplicate), Some(false));

        registry.refresh(&mut world, None);
        assert!(registry.contains(body));
        assert_eq!(registry.duplicate_of(body), None);
        assert!(!world.contains(duplicate));
    }

    #[test]
    fn test_hand_off_reuses_duplicate_and_forces_visible() {
        let (mut world, body) = world_with_body();
        let mut source = TrackedObjectRegistry::new();
        let mut destination = TrackedObjectRegistry::new();
        source.begin_tracking(&mut world, body, TrackedKind::Body, Vec3::zeros(), Some(&mapping()));
        let duplicate = source.duplicate_of(body).unwrap();

        let record = source.take(body).unwrap();
        assert_eq!(record.state(), TrackingState::Crossed);
        destination.adopt(&mut world, body, record, Vec3::new(1.0, 2.0, 3.0), Some(&mapping().reversed()));

        assert!(!source.contains(body));
        assert_eq!(source.original_of(duplicate), None);
        assert_eq!(destination.duplicate_of(body), Some(duplicate));
        assert_eq!(destination.original_of(duplicate), Some(body));
        assert_eq!(world.is_hidden(duplicate), Some(false));
        let adopted = destination.record(body).unwrap();
        assert!(adopted.duplicate_visible());
        assert_eq!(adopted.state(), TrackingState::Tracked);
        assert_eq!(adopted.last_known_position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_hand_off_into_existing_record_keeps_one_duplicate() {
        let (mut world, body) = world_with_body();
        let mut source = TrackedObjectRegistry::new();
        let mut destination = TrackedObjectRegistry::new();
        source.begin_tracking(&mut world, body, TrackedKind::Body, Vec3::zeros(), Some(&mapping()));
        destination.begin_tracking(&mut world, body, TrackedKind::Body, Vec3::zeros(), Some(&mapping().reversed()));
        let incoming = source.duplicate_of(body).unwrap();
        let kept = destination.duplicate_of(body).unwrap();

        let record = source.take(body).unwrap();
        destination.adopt(&mut world, body, record, Vec3::zeros(), Some(&mapping().reversed()));

        assert!(!world.contains(incoming));
        assert_eq!(destination.duplicate_of(body), Some(kept));
        assert_eq!(world.is_hidden(kept), Some(false));
    }

    #[test]
    fn test_clear_destroys_everything() {
        let (mut world, body) = world_with_body();
        let mut registry = TrackedObjectRegistry::new();
        registry.begin_tracking(&mut world, body, TrackedKind::Body, Vec3::zeros(), Some(&mapping()));
        let duplicate = registry.duplicate_of(body).unwrap();

        registry.clear(&mut world);

        assert!(registry.is_empty());
        assert!(!world.contains(duplicate));
        assert!(world.contains(body));
    }

    #[test]
    fn test_kind_resolution() {
        assert_eq!(TrackedKind::from_class(ObjectClass::ControlledPawn), Some(TrackedKind::Pawn));
        assert_eq!(TrackedKind::from_class(ObjectClass::PhysicsBody), Some(TrackedKind::Body));
        assert_eq!(TrackedKind::from_class(ObjectClass::Other), None);
        assert_eq!(TrackedKind::Pawn.anchor(), Anchor::Camera);
        assert_eq!(TrackedKind::Body.anchor(), Anchor::Root);
    }
}
