//! Portal error types

use crate::foundation::collections::PortalId;
use super::system::FramePhase;

/// Reasons a portal could not be placed on a surface
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PlacementError {
    /// The trace hit nothing within range
    #[error("No surface within range")]
    NoSurface,

    /// The trace hit geometry that does not accept portals
    #[error("Surface does not accept portals")]
    NotAWall,

    /// The trace reported a wall the scene no longer knows about
    #[error("Wall is not registered with the scene")]
    UnknownWall,

    /// The requested rectangle is larger than the wall
    #[error("Portal {width}x{height} does not fit on wall {wall_width}x{wall_height}")]
    TooLarge {
        /// Requested portal width
        width: f32,
        /// Requested portal height
        height: f32,
        /// Wall width
        wall_width: f32,
        /// Wall height
        wall_height: f32,
    },

    /// The rectangle would overlap the other portal on the same wall
    #[error("Portal would overlap its sibling")]
    Overlapping,

    /// The portal table rejected the spawn or move
    #[error("Portal error: {0}")]
    Portal(#[from] PortalError),
}

/// Portal table and frame sequencing errors
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PortalError {
    /// The handle does not resolve to a live portal
    #[error("Unknown portal: {0:?}")]
    UnknownPortal(PortalId),

    /// A portal cannot be linked to itself
    #[error("A portal cannot be linked to itself")]
    SelfLink,

    /// A frame phase was invoked out of order
    #[error("Frame phase out of order: expected {expected:?}, found {found:?}")]
    PhaseOrder {
        /// Phase that has to run next
        expected: FramePhase,
        /// Phase that was invoked
        found: FramePhase,
    },
}
