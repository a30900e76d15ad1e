//! A single portal endpoint
//!
//! A portal is a rectangle in its local Y/Z plane facing along local +X. It
//! owns its virtual camera and the registry of objects near its opening, and
//! holds a non-owning handle to its linked partner in the portal table.

use std::collections::HashSet;

use crate::core::PortalConfig;
use crate::foundation::collections::{ObjectId, PortalId, WallId};
use crate::foundation::math::{Transform, Vec2, Vec3};
use crate::physics::{OrientedBox, Plane};
use crate::render::VirtualCamera;
use super::tracking::TrackedObjectRegistry;

/// Which of the pair a portal is; only selects cosmetics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortalSide {
    /// First portal of the pair
    Left,
    /// Second portal of the pair
    Right,
}

impl PortalSide {
    /// The other side
    pub fn other(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// One endpoint of a linked portal pair
#[derive(Debug)]
pub struct Portal {
    frame: Transform,
    extents: Vec2,
    side: PortalSide,
    wall: Option<WallId>,
    pub(crate) linked: Option<PortalId>,
    pub(crate) camera: VirtualCamera,
    pub(crate) registry: TrackedObjectRegistry,
    pub(crate) trigger_overlaps: HashSet<ObjectId>,
    pub(crate) surface_overlaps: HashSet<ObjectId>,
    pub(crate) surface_offset_active: bool,
    trigger_depth: f32,
    trigger_margin: f32,
    surface_depth: f32,
}

impl Portal {
    /// Create an unlinked portal.
    ///
    /// `extents` are the half-width and half-height of the passable
    /// rectangle. `viewport` sizes the initial render target.
    pub fn new(frame: Transform, extents: Vec2, side: PortalSide, config: &PortalConfig, viewport: (u32, u32)) -> Self {
        Self {
            frame,
            extents,
            side,
            wall: None,
            linked: None,
            camera: VirtualCamera::new(viewport),
            registry: TrackedObjectRegistry::new(),
            trigger_overlaps: HashSet::new(),
            surface_overlaps: HashSet::new(),
            surface_offset_active: false,
            trigger_depth: config.trigger_depth,
            trigger_margin: config.trigger_margin,
            surface_depth: config.surface_depth,
        }
    }

    /// World frame; forward is the surface normal
    pub fn frame(&self) -> &Transform {
        &self.frame
    }

    pub(crate) fn set_frame(&mut self, frame: Transform) {
        self.frame = frame;
    }

    /// Half-width and half-height of the opening
    pub fn extents(&self) -> Vec2 {
        self.extents
    }

    /// Side of the pair
    pub fn side(&self) -> PortalSide {
        self.side
    }

    /// Wall the portal was placed on
    pub fn wall(&self) -> Option<WallId> {
        self.wall
    }

    pub(crate) fn set_wall(&mut self, wall: Option<WallId>) {
        self.wall = wall;
    }

    /// Linked partner
    pub fn linked(&self) -> Option<PortalId> {
        self.linked
    }

    /// Whether the portal has a partner
    pub fn is_linked(&self) -> bool {
        self.linked.is_some()
    }

    /// Virtual camera rendering the partner's side
    pub fn camera(&self) -> &VirtualCamera {
        &self.camera
    }

    /// Objects currently tracked near the opening
    pub fn registry(&self) -> &TrackedObjectRegistry {
        &self.registry
    }

    /// Whether the player's camera was inside the surface volume at the last update
    pub fn surface_offset_active(&self) -> bool {
        self.surface_offset_active
    }

    /// Plane of the opening
    pub fn plane(&self) -> Plane {
        Plane::new(self.frame.position, self.frame.forward())
    }

    /// On the plane or on the side the portal faces
    pub fn is_point_in_front(&self, point: Vec3) -> bool {
        self.plane().is_in_front(point)
    }

    /// Where the segment `last..current` passes through the opening, if it does.
    ///
    /// Requires all three: the segment crosses the plane, `last` was in
    /// front, and the crossing lies within the rectangle.
    pub fn crossing_point(&self, last: Vec3, current: Vec3) -> Option<Vec3> {
        if !self.is_point_in_front(last) {
            return None;
        }
        let intersection = self.plane().intersect_segment(last, current)?;
        let local = self.frame.inverse_transform_position_no_scale(intersection);
        (local.y.abs() <= self.extents.x && local.z.abs() <= self.extents.y).then_some(intersection)
    }

    /// Whether the segment `last..current` passes through the opening
    pub fn is_crossing(&self, last: Vec3, current: Vec3) -> bool {
        self.crossing_point(last, current).is_some()
    }

    /// Whether a point is within the thin surface volume of the opening
    pub fn is_point_inside(&self, point: Vec3) -> bool {
        self.surface_volume().contains_point(point)
    }

    /// Volume that starts and ends tracking
    pub fn trigger_volume(&self) -> OrientedBox {
        OrientedBox::new(
            self.frame,
            Vec3::new(
                self.trigger_depth,
                self.extents.x + self.trigger_margin,
                self.extents.y + self.trigger_margin,
            ),
        )
    }

    /// Volume of the surface mesh; drives duplicate visibility
    pub fn surface_volume(&self) -> OrientedBox {
        OrientedBox::new(self.frame, Vec3::new(self.surface_depth, self.extents.x, self.extents.y))
    }
}
