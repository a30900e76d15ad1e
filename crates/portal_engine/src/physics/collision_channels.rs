//! Collision channel system for filtering traces and overlaps
//!
//! Channels describe what an object is and what it answers to. Portal-related
//! channels are stripped from cosmetic duplicates and masked out while an
//! object is grabbed or mid-teleport.

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Collision channels an object participates in
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CollisionChannels: u32 {
        /// Static level geometry
        const WORLD_STATIC = 1 << 0;
        /// Moving level geometry and props
        const WORLD_DYNAMIC = 1 << 1;
        /// Player-controlled pawns
        const PAWN = 1 << 2;
        /// Simulated physics bodies
        const PHYSICS_BODY = 1 << 3;
        /// Surfaces a portal may be placed on
        const PORTAL_WALL = 1 << 4;
        /// A portal's trigger volume
        const PORTAL_TRIGGER = 1 << 5;
        /// A portal's surface volume
        const PORTAL_SURFACE = 1 << 6;

        /// Every portal-related channel
        const PORTAL = Self::PORTAL_WALL.bits()
            | Self::PORTAL_TRIGGER.bits()
            | Self::PORTAL_SURFACE.bits();
    }
}

impl CollisionChannels {
    /// Check whether two channel sets share any channel
    pub fn overlaps(self, other: Self) -> bool {
        self.intersects(other)
    }

    /// Channels a cosmetic duplicate keeps
    pub fn for_duplicate(self) -> Self {
        self.difference(Self::PORTAL)
    }
}

/// Physical-interaction record for an object
///
/// The only place grab and teleport transitions are recorded. Channel masking
/// is derived from these flags rather than mutated globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhysicalInteraction {
    /// Object is held by a grabber
    pub grabbed: bool,
    /// Object is between teleport-start and teleport-end
    pub teleporting: bool,
}

impl PhysicalInteraction {
    /// Mark the start of a grab
    pub fn begin_grab(&mut self) {
        self.grabbed = true;
    }

    /// Mark the end of a grab
    pub fn end_grab(&mut self) {
        self.grabbed = false;
    }

    /// Mark the start of a teleport
    pub fn begin_teleport(&mut self) {
        self.teleporting = true;
    }

    /// Mark the end of a teleport
    pub fn end_teleport(&mut self) {
        self.teleporting = false;
    }

    /// Whether portal walls are currently ignored
    pub fn ignores_portal_walls(&self) -> bool {
        self.grabbed || self.teleporting
    }

    /// Channels the object effectively responds to given its base channels
    pub fn effective_channels(&self, base: CollisionChannels) -> CollisionChannels {
        if self.ignores_portal_walls() {
            base.difference(CollisionChannels::PORTAL_WALL)
        } else {
            base
        }
    }
}
