//! Firing portals at walls
//!
//! Traces from the player's eye, fits the portal rectangle onto the wall
//! that was hit, checks it against the other portal, then spawns or moves
//! the portal for that side and links the pair.

use crate::core::PlacementConfig;
use crate::foundation::collections::PortalId;
use crate::foundation::math::{utils, Transform, Vec3};
use crate::scene::{ObjectWorld, SceneQuery};
use super::error::PlacementError;
use super::portal::PortalSide;
use super::system::PortalSystem;

/// Places the left and right portals of a pair
#[derive(Debug, Clone)]
pub struct PortalPlacer {
    config: PlacementConfig,
    left: Option<PortalId>,
    right: Option<PortalId>,
}

impl PortalPlacer {
    /// Create a placer with no portals yet
    pub fn new(config: PlacementConfig) -> Self {
        Self {
            config,
            left: None,
            right: None,
        }
    }

    /// Placement configuration
    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Portal placed for a side
    pub fn portal(&self, side: PortalSide) -> Option<PortalId> {
        match side {
            PortalSide::Left => self.left,
            PortalSide::Right => self.right,
        }
    }

    /// Fire the portal for `side` from `eye` along `direction`.
    ///
    /// On success the portal sits one unit off the wall facing along the
    /// impact normal, and is linked to the other side if that exists.
    pub fn place<W>(
        &mut self,
        system: &mut PortalSystem,
        world: &mut W,
        side: PortalSide,
        eye: Vec3,
        direction: Vec3,
    ) -> Result<PortalId, PlacementError>
    where
        W: ObjectWorld + SceneQuery + ?Sized,
    {
        let result = self.try_place(system, world, side, eye, direction);
        if let Err(error) = &result {
            log::warn!("Rejected {:?} portal placement: {}", side, error);
        }
        result
    }

    fn try_place<W>(
        &mut self,
        system: &mut PortalSystem,
        world: &mut W,
        side: PortalSide,
        eye: Vec3,
        direction: Vec3,
    ) -> Result<PortalId, PlacementError>
    where
        W: ObjectWorld + SceneQuery + ?Sized,
    {
        self.forget_despawned(system);

        let direction = direction.try_normalize(f32::EPSILON).ok_or(PlacementError::NoSurface)?;
        let end = eye + direction * self.config.max_distance;

        let hit = world
            .line_trace(eye, end, self.config.wall_channel)
            .ok_or(PlacementError::NoSurface)?;
        let wall_id = hit.wall.ok_or(PlacementError::NotAWall)?;
        let wall = world.wall(wall_id).ok_or(PlacementError::UnknownWall)?.clone();

        let impact = hit.location + hit.normal;
        let origin = wall.try_place_portal(impact, self.config.portal_width, self.config.portal_height)?;
        let extents = self.config.half_extents();

        let sibling = self.portal(side.other()).and_then(|id| system.portal(id));
        if let Some(sibling) = sibling.filter(|s| s.wall() == Some(wall_id)) {
            if wall.reject_if_overlapping(origin, extents, sibling.frame().position, sibling.extents()) {
                return Err(PlacementError::Overlapping);
            }
        }

        let frame = Transform::from_position_rotation(origin, utils::rotation_from_forward(hit.normal));
        let id = match self.portal(side) {
            Some(id) => {
                system.move_portal(world, id, frame)?;
                id
            }
            None => {
                let id = system.spawn_portal(frame, extents, side);
                match side {
                    PortalSide::Left => self.left = Some(id),
                    PortalSide::Right => self.right = Some(id),
                }
                id
            }
        };
        if let Some(portal) = system.portal_mut(id) {
            portal.set_wall(Some(wall_id));
        }

        if let (Some(left), Some(right)) = (self.left, self.right) {
            system.link(left, right)?;
        }
        Ok(id)
    }

    /// Drop handles to portals removed from the system behind our back
    fn forget_despawned(&mut self, system: &PortalSystem) {
        for handle in [&mut self.left, &mut self.right] {
            if let Some(id) = (*handle).filter(|id| system.portal(*id).is_none()) {
                log::debug!("Forgetting despawned portal {:?}", id);
                *handle = None;
            }
        }
    }
}
