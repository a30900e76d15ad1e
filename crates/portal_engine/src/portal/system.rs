//! # Portal System
//!
//! Owns the portal table and drives every portal through the frame:
//!
//! 1. [`PortalSystem::pre_physics`]: trigger and surface overlap changes
//!    start and stop tracking and toggle duplicate visibility.
//! 2. Physics runs (host-owned).
//! 3. [`PortalSystem::post_physics`]: duplicates follow their objects and
//!    crossings are detected and teleported.
//! 4. [`PortalSystem::render_prep`]: every portal's view is synthesized from
//!    the post-teleport world.
//!
//! Phases must run in that order; calling one out of turn is an error.
//! Links are plain handles into the table and are always updated on both
//! sides at once.

use std::collections::HashSet;

use crate::core::PortalConfig;
use crate::foundation::collections::{HandleMap, ObjectId, PortalId};
use crate::foundation::math::{utils, Transform, Vec2, Vec3};
use crate::render::{CaptureBackend, ClipPlane, RenderTarget, Viewer};
use crate::scene::{Motion, ObjectWorld};
use super::error::PortalError;
use super::mapper::PortalMapping;
use super::portal::{Portal, PortalSide};
use super::tracking::TrackedKind;

/// Ordered phases of a simulation frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    /// Overlap events, before physics integrates
    PrePhysics,
    /// Crossing detection, after physics integrated
    PostPhysics,
    /// View synthesis, after teleports resolved
    RenderPrep,
}

impl FramePhase {
    /// Phase that follows this one
    pub fn next(self) -> Self {
        match self {
            Self::PrePhysics => Self::PostPhysics,
            Self::PostPhysics => Self::RenderPrep,
            Self::RenderPrep => Self::PrePhysics,
        }
    }
}

/// Which of a portal's volumes an overlap concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapVolume {
    /// The larger volume that starts and ends tracking
    Trigger,
    /// The thin volume around the opening that drives duplicate visibility
    Surface,
}

/// Overlap change between an object and a portal volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapEvent {
    /// Object started overlapping
    Begin {
        /// Portal owning the volume
        portal: PortalId,
        /// Overlapping object
        object: ObjectId,
        /// Volume concerned
        volume: OverlapVolume,
    },
    /// Object stopped overlapping
    End {
        /// Portal owning the volume
        portal: PortalId,
        /// Object that left
        object: ObjectId,
        /// Volume concerned
        volume: OverlapVolume,
    },
}

impl OverlapEvent {
    /// Portal the event belongs to
    pub fn portal(&self) -> PortalId {
        match self {
            Self::Begin { portal, .. } | Self::End { portal, .. } => *portal,
        }
    }

    /// Object the event concerns
    pub fn object(&self) -> ObjectId {
        match self {
            Self::Begin { object, .. } | Self::End { object, .. } => *object,
        }
    }
}

/// A completed teleport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    /// Object that crossed
    pub object: ObjectId,
    /// Portal it entered
    pub from: PortalId,
    /// Portal it left through
    pub to: PortalId,
    /// Root transform after the teleport
    pub transform: Transform,
}

/// Portal table and per-frame driver
#[derive(Debug)]
pub struct PortalSystem {
    portals: HandleMap<PortalId, Portal>,
    config: PortalConfig,
    viewer: Option<Viewer>,
    next_phase: FramePhase,
}

impl PortalSystem {
    /// Create an empty portal system
    pub fn new(config: PortalConfig) -> Self {
        Self {
            portals: HandleMap::with_key(),
            config,
            viewer: None,
            next_phase: FramePhase::PrePhysics,
        }
    }

    /// Builder pattern: set the player's point of view
    pub fn with_viewer(mut self, viewer: Viewer) -> Self {
        self.viewer = Some(viewer);
        self
    }

    /// Replace the player's point of view
    pub fn set_viewer(&mut self, viewer: Option<Viewer>) {
        self.viewer = viewer;
    }

    /// Player's point of view
    pub fn viewer(&self) -> Option<&Viewer> {
        self.viewer.as_ref()
    }

    /// Mutable access to the player's point of view (resize, projection)
    pub fn viewer_mut(&mut self) -> Option<&mut Viewer> {
        self.viewer.as_mut()
    }

    /// Portal configuration
    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Phase the next call must be
    pub fn next_phase(&self) -> FramePhase {
        self.next_phase
    }

    /// Look up a portal
    pub fn portal(&self, id: PortalId) -> Option<&Portal> {
        self.portals.get(id)
    }

    pub(crate) fn portal_mut(&mut self, id: PortalId) -> Option<&mut Portal> {
        self.portals.get_mut(id)
    }

    /// All portals
    pub fn portals(&self) -> impl Iterator<Item = (PortalId, &Portal)> {
        self.portals.iter()
    }

    /// Number of portals
    pub fn len(&self) -> usize {
        self.portals.len()
    }

    /// Whether there are no portals
    pub fn is_empty(&self) -> bool {
        self.portals.is_empty()
    }

    /// Create an unlinked portal
    pub fn spawn_portal(&mut self, frame: Transform, extents: Vec2, side: PortalSide) -> PortalId {
        let size = self
            .viewer
            .as_ref()
            .map_or((1, 1), |v| RenderTarget::scaled_size(v.viewport, self.config.effective_render_scale()));
        let id = self.portals.insert(Portal::new(frame, extents, side, &self.config, size));
        log::info!("Spawned {:?} portal {:?} at {:?}", side, id, frame.position);
        id
    }

    /// Move a portal. Everything it was tracking is dropped.
    pub fn move_portal<W>(&mut self, world: &mut W, id: PortalId, frame: Transform) -> Result<(), PortalError>
    where
        W: ObjectWorld + ?Sized,
    {
        let portal = self.portals.get_mut(id).ok_or(PortalError::UnknownPortal(id))?;
        portal.set_frame(frame);
        portal.registry.clear(world);
        portal.trigger_overlaps.clear();
        portal.surface_overlaps.clear();
        portal.surface_offset_active = false;
        log::info!("Moved portal {:?} to {:?}", id, frame.position);
        Ok(())
    }

    /// Remove a portal, unlinking its partner and destroying its duplicates
    pub fn despawn_portal<W>(&mut self, world: &mut W, id: PortalId) -> Result<(), PortalError>
    where
        W: ObjectWorld + ?Sized,
    {
        if let Some(partner) = self.unlink(id)? {
            if let Some(partner) = self.portals.get_mut(partner) {
                partner.registry.detach_duplicates(world);
            }
        }
        let mut portal = self.portals.remove(id).ok_or(PortalError::UnknownPortal(id))?;
        portal.registry.clear(world);
        log::info!("Despawned portal {:?}", id);
        Ok(())
    }

    /// Link two portals to each other.
    ///
    /// Any previous partner of either portal is unlinked first.
    pub fn link(&mut self, a: PortalId, b: PortalId) -> Result<(), PortalError> {
        if a == b {
            return Err(PortalError::SelfLink);
        }
        if !self.portals.contains_key(a) {
            return Err(PortalError::UnknownPortal(a));
        }
        if !self.portals.contains_key(b) {
            return Err(PortalError::UnknownPortal(b));
        }
        if self.portals.get(a).and_then(Portal::linked) == Some(b) {
            return Ok(());
        }

        self.unlink(a)?;
        self.unlink(b)?;
        if let Some(portal) = self.portals.get_mut(a) {
            portal.linked = Some(b);
        }
        if let Some(portal) = self.portals.get_mut(b) {
            portal.linked = Some(a);
        }
        log::info!("Linked portals {:?} <-> {:?}", a, b);
        Ok(())
    }

    /// Break a portal's link on both sides. Returns the former partner.
    pub fn unlink(&mut self, id: PortalId) -> Result<Option<PortalId>, PortalError> {
        let portal = self.portals.get_mut(id).ok_or(PortalError::UnknownPortal(id))?;
        let Some(partner) = portal.linked.take() else {
            return Ok(None);
        };
        if let Some(other) = self.portals.get_mut(partner) {
            if other.linked == Some(id) {
                other.linked = None;
            }
        }
        log::info!("Unlinked portals {:?} <-> {:?}", id, partner);
        Ok(Some(partner))
    }

    /// Mapping from a portal into its partner, if it has one
    pub fn mapping(&self, id: PortalId) -> Option<PortalMapping> {
        let portal = self.portals.get(id)?;
        let linked = self.portals.get(portal.linked?)?;
        Some(PortalMapping::new(portal.frame(), linked.frame()))
    }

    /// Pre-physics phase: derive overlap events and apply them
    pub fn pre_physics<W>(&mut self, world: &mut W) -> Result<Vec<OverlapEvent>, PortalError>
    where
        W: ObjectWorld + ?Sized,
    {
        self.enter_phase(FramePhase::PrePhysics)?;

        let events = self.detect_overlaps(world);
        for event in &events {
            self.handle_overlap(world, *event)?;
        }

        self.complete_phase(FramePhase::PrePhysics);
        Ok(events)
    }

    /// Apply one overlap event.
    ///
    /// Hosts with their own overlap detection may call this directly instead
    /// of relying on [`PortalSystem::pre_physics`].
    pub fn handle_overlap<W>(&mut self, world: &mut W, event: OverlapEvent) -> Result<(), PortalError>
    where
        W: ObjectWorld + ?Sized,
    {
        let id = event.portal();
        let mapping = self.mapping(id);
        let portal = self.portals.get_mut(id).ok_or(PortalError::UnknownPortal(id))?;

        match event {
            OverlapEvent::Begin { object, volume: OverlapVolume::Trigger, .. } => {
                portal.trigger_overlaps.insert(object);
                let Some(kind) = world.class(object).and_then(TrackedKind::from_class) else {
                    return Ok(());
                };
                let Some(position) = world.anchor_position(object, kind.anchor()) else {
                    return Ok(());
                };
                if !portal.is_point_in_front(position) {
                    log::debug!("Not tracking {:?}: entered portal {:?} from behind", object, id);
                    return Ok(());
                }
                if portal.registry.begin_tracking(world, object, kind, position, mapping.as_ref())
                    && portal.surface_overlaps.contains(&object)
                {
                    portal.registry.set_duplicate_visible(world, object, true);
                }
            }
            OverlapEvent::End { object, volume: OverlapVolume::Trigger, .. } => {
                portal.trigger_overlaps.remove(&object);
                portal.registry.end_tracking(world, object);
            }
            OverlapEvent::Begin { object, volume: OverlapVolume::Surface, .. } => {
                portal.surface_overlaps.insert(object);
                portal.registry.set_duplicate_visible(world, object, true);
            }
            OverlapEvent::End { object, volume: OverlapVolume::Surface, .. } => {
                portal.surface_overlaps.remove(&object);
                portal.registry.set_duplicate_visible(world, object, false);
            }
        }
        Ok(())
    }

    /// Post-physics phase: refresh duplicates, detect crossings and teleport
    pub fn post_physics<W, C>(&mut self, world: &mut W, capture: &mut C) -> Result<Vec<Crossing>, PortalError>
    where
        W: ObjectWorld + ?Sized,
        C: CaptureBackend + ?Sized,
    {
        self.enter_phase(FramePhase::PostPhysics)?;

        let mut crossings = Vec::new();
        let ids: Vec<PortalId> = self.portals.keys().collect();
        for id in ids {
            let mapping = self.mapping(id);
            let Some(portal) = self.portals.get_mut(id) else {
                continue;
            };

            for dropped in portal.registry.refresh(world, mapping.as_ref()) {
                portal.trigger_overlaps.remove(&dropped);
                portal.surface_overlaps.remove(&dropped);
            }

            let tracked: Vec<_> = portal
                .registry
                .objects()
                .filter_map(|object| {
                    let record = portal.registry.record(object)?;
                    Some((object, record.anchor(), record.last_known_position))
                })
                .collect();

            let mut crossed = Vec::new();
            for (object, anchor, last) in tracked {
                let Some(current) = world.anchor_position(object, anchor) else {
                    continue;
                };
                if portal.is_crossing(last, current) {
                    crossed.push((object, current));
                } else if let Some(record) = portal.registry.record_mut(object) {
                    record.last_known_position = current;
                }
            }

            for (object, current) in crossed {
                match self.teleport(world, capture, id, object) {
                    Some(transform) => crossings.push(Crossing {
                        object,
                        from: id,
                        to: self.portals.get(id).and_then(Portal::linked).unwrap_or(id),
                        transform,
                    }),
                    None => {
                        if let Some(record) = self.portals.get_mut(id).and_then(|p| p.registry.record_mut(object)) {
                            record.last_known_position = current;
                        }
                    }
                }
            }
        }

        self.complete_phase(FramePhase::PostPhysics);
        Ok(crossings)
    }

    /// Render-prep phase: update every portal's surface offset and view
    pub fn render_prep<W, C>(&mut self, world: &W, capture: &mut C) -> Result<(), PortalError>
    where
        W: ObjectWorld + ?Sized,
        C: CaptureBackend + ?Sized,
    {
        self.enter_phase(FramePhase::RenderPrep)?;

        let ids: Vec<PortalId> = self.portals.keys().collect();
        for id in ids {
            self.update_surface_offset(world, id);
            self.update_view(world, capture, id);
        }

        self.complete_phase(FramePhase::RenderPrep);
        Ok(())
    }

    /// Run a whole frame with `physics` integrating between the phases
    pub fn run_frame<W, C, F>(&mut self, world: &mut W, capture: &mut C, physics: F) -> Result<Vec<Crossing>, PortalError>
    where
        W: ObjectWorld + ?Sized,
        C: CaptureBackend + ?Sized,
        F: FnOnce(&mut W),
    {
        self.pre_physics(world)?;
        physics(&mut *world);
        let crossings = self.post_physics(world, capture)?;
        self.render_prep(&*world, capture)?;
        Ok(crossings)
    }

    /// Move an object from `from` to the far side of its partner.
    ///
    /// Returns the object's new root transform, or `None` when nothing moved
    /// (no partner, or the object is gone). Callers must check before
    /// assuming the object was relocated.
    pub fn teleport<W, C>(&mut self, world: &mut W, capture: &mut C, from: PortalId, object: ObjectId) -> Option<Transform>
    where
        W: ObjectWorld + ?Sized,
        C: CaptureBackend + ?Sized,
    {
        let mapping = self.mapping(from)?;
        let to = self.portals.get(from)?.linked?;
        let transform = world.transform(object)?;

        if let Some(portal) = self.portals.get_mut(from) {
            portal.camera.camera_cut = true;
        }

        let saved = world.motion(object);

        let moved = mapping.transform(&transform);
        world.begin_teleport(object);
        world.teleport(object, moved.position, moved.rotation);
        world.end_teleport(object);

        if let Some(control) = world.control_rotation(object) {
            world.set_control_rotation(object, utils::without_roll(&mapping.orientation(&control)));
        }

        if let Some(motion) = saved {
            let mapped = match motion {
                Motion::Character { velocity } => Motion::Character {
                    velocity: mapping.direction(velocity),
                },
                Motion::Body { linear, angular } => Motion::Body {
                    linear: mapping.direction(linear),
                    angular: mapping.direction(angular),
                },
            };
            world.set_motion(object, mapped);
        }

        log::info!("Teleported {:?} from portal {:?} to {:?}", object, from, to);

        self.update_surface_offset(&*world, to);
        self.update_view(&*world, capture, to);
        self.hand_off(world, from, to, object);

        Some(moved)
    }

    /// Synthesize one portal's view.
    ///
    /// Unlinked portals are cleared to the mask colour. Linked portals place
    /// their virtual camera at the mapped player camera and capture.
    pub fn update_view<W, C>(&mut self, world: &W, capture: &mut C, id: PortalId)
    where
        W: ObjectWorld + ?Sized,
        C: CaptureBackend + ?Sized,
    {
        let linked = self
            .portals
            .get(id)
            .and_then(Portal::linked)
            .and_then(|linked| self.portals.get(linked))
            .map(|linked| *linked.frame());
        let view = self.viewer.as_ref().and_then(|v| world.view_transform(v.pawn));
        let Some(portal) = self.portals.get_mut(id) else {
            return;
        };

        let (Some(linked), Some(viewer), Some(view)) = (linked, self.viewer.as_ref(), view) else {
            log::trace!("Portal {:?} inactive, clearing view", id);
            capture.clear(id, &portal.camera.target, self.config.mask_color);
            return;
        };

        let (width, height) = RenderTarget::scaled_size(viewer.viewport, self.config.effective_render_scale());
        portal.camera.target.resize(width, height);

        portal.camera.post_process = viewer.post_process.clone();

        let normal = linked.forward();
        portal.camera.clip_plane = Some(ClipPlane {
            base: linked.position - normal * self.config.clip_plane_offset,
            normal,
        });

        portal.camera.projection = viewer.projection;

        let mapping = PortalMapping::new(portal.frame(), &linked);
        portal.camera.set_world_transform(Transform::from_position_rotation(
            mapping.position(view.position),
            mapping.orientation(&view.rotation),
        ));

        log::trace!("Capturing portal {:?} ({}x{}, cut: {})", id, width, height, portal.camera.camera_cut);
        capture.capture(id, &portal.camera);
        portal.camera.camera_cut = false;
    }

    /// Record whether the player's camera is inside a portal's surface volume
    pub fn update_surface_offset<W>(&mut self, world: &W, id: PortalId)
    where
        W: ObjectWorld + ?Sized,
    {
        let camera = self.viewer.as_ref().and_then(|v| world.view_transform(v.pawn));
        if let Some(portal) = self.portals.get_mut(id) {
            portal.surface_offset_active =
                portal.is_linked() && camera.is_some_and(|c| portal.is_point_inside(c.position));
        }
    }

    fn hand_off<W>(&mut self, world: &mut W, from: PortalId, to: PortalId, object: ObjectId)
    where
        W: ObjectWorld + ?Sized,
    {
        let Some(source) = self.portals.get_mut(from) else {
            return;
        };
        source.trigger_overlaps.remove(&object);
        source.surface_overlaps.remove(&object);
        let Some(record) = source.registry.take(object) else {
            return;
        };

        let position = world
            .anchor_position(object, record.anchor())
            .unwrap_or(record.last_known_position);
        let mapping = self.mapping(to);
        let Some(destination) = self.portals.get_mut(to) else {
            if let Some(duplicate) = record.duplicate() {
                world.destroy(duplicate);
            }
            return;
        };

        destination.registry.adopt(world, object, record, position, mapping.as_ref());
        destination.trigger_overlaps.insert(object);
        destination.surface_overlaps.insert(object);
        log::debug!("Handed {:?} from portal {:?} to {:?}", object, from, to);
    }

    fn detect_overlaps<W>(&self, world: &W) -> Vec<OverlapEvent>
    where
        W: ObjectWorld + ?Sized,
    {
        // Eligibility only gates new overlaps. An object already inside a
        // volume leaves it on geometry alone, whatever its class is now.
        let spheres: Vec<(ObjectId, Vec3, f32, bool)> = world
            .object_ids()
            .into_iter()
            .filter_map(|id| {
                let eligible = world.class(id).and_then(TrackedKind::from_class).is_some();
                Some((id, world.transform(id)?.position, world.bounding_radius(id)?, eligible))
            })
            .collect();

        let mut events = Vec::new();
        for (portal_id, portal) in &self.portals {
            let trigger = portal.trigger_volume();
            let surface = portal.surface_volume();

            let in_trigger: HashSet<ObjectId> = spheres
                .iter()
                .filter(|(id, _, _, eligible)| *eligible || portal.trigger_overlaps.contains(id))
                .filter(|(_, center, radius, _)| trigger.intersects_sphere(*center, *radius))
                .map(|(id, ..)| *id)
                .collect();
            let in_surface: HashSet<ObjectId> = spheres
                .iter()
                .filter(|(id, _, _, eligible)| *eligible || portal.surface_overlaps.contains(id))
                .filter(|(_, center, radius, _)| surface.intersects_sphere(*center, *radius))
                .map(|(id, ..)| *id)
                .collect();

            let begin = |object: &ObjectId, volume| OverlapEvent::Begin { portal: portal_id, object: *object, volume };
            let end = |object: &ObjectId, volume| OverlapEvent::End { portal: portal_id, object: *object, volume };

            events.extend(in_trigger.difference(&portal.trigger_overlaps).map(|o| begin(o, OverlapVolume::Trigger)));
            events.extend(in_surface.difference(&portal.surface_overlaps).map(|o| begin(o, OverlapVolume::Surface)));
            events.extend(portal.surface_overlaps.difference(&in_surface).map(|o| end(o, OverlapVolume::Surface)));
            events.extend(portal.trigger_overlaps.difference(&in_trigger).map(|o| end(o, OverlapVolume::Trigger)));
        }
        events
    }

    fn enter_phase(&self, phase: FramePhase) -> Result<(), PortalError> {
        if self.next_phase != phase {
            log::warn!("Frame phase {:?} called while {:?} is due", phase, self.next_phase);
            return Err(PortalError::PhaseOrder {
                expected: self.next_phase,
                found: phase,
            });
        }
        Ok(())
    }

    fn complete_phase(&mut self, phase: FramePhase) {
        self.next_phase = phase.next();
    }
}
