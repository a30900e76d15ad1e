//! Portal traversal
//!
//! - [`mapper`]: frame-to-frame coordinate mapping between linked portals
//! - [`wall`]: placement surfaces and fitting portals onto them
//! - [`portal`]: a single endpoint and its crossing test
//! - [`tracking`]: objects near an opening and their shadow duplicates
//! - [`system`]: the portal table, links, frame phases and teleportation
//! - [`placement`]: firing portals at walls

pub mod error;
pub mod mapper;
pub mod wall;
#[allow(clippy::module_inception)]
pub mod portal;
pub mod tracking;
pub mod system;
pub mod placement;

#[cfg(test)]
mod tests;

pub use error::{PlacementError, PortalError};
pub use mapper::{map_direction, map_orientation, map_position, PortalMapping};
pub use wall::{rectangles_overlap, PortalWall};
pub use portal::{Portal, PortalSide};
pub use tracking::{TrackedKind, TrackedObjectRegistry, TrackedRecord, TrackingState};
pub use system::{Crossing, FramePhase, OverlapEvent, OverlapVolume, PortalSystem};
pub use placement::PortalPlacer;
