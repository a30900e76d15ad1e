//! Capture backend that records requests instead of rasterizing
//!
//! Used by the demo and by tests to observe what the portal renderer asked
//! for each frame.

use crate::foundation::collections::PortalId;
use crate::foundation::math::Transform;
use super::target::{CaptureBackend, ClipPlane, LinearColor, RenderTarget, VirtualCamera};

/// One recorded render request
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    /// Buffer was cleared to a colour
    Cleared {
        /// Portal owning the buffer
        portal: PortalId,
        /// Clear colour
        color: LinearColor,
    },
    /// Scene was captured
    Captured {
        /// Portal owning the camera
        portal: PortalId,
        /// Camera world transform
        transform: Transform,
        /// Buffer size
        size: (u32, u32),
        /// Clip plane in effect
        clip_plane: Option<ClipPlane>,
        /// Whether history was discarded
        camera_cut: bool,
    },
}

impl CaptureEvent {
    /// Portal the event belongs to
    pub fn portal(&self) -> PortalId {
        match self {
            Self::Cleared { portal, .. } | Self::Captured { portal, .. } => *portal,
        }
    }
}

/// Recording capture backend
#[derive(Debug, Default)]
pub struct HeadlessCapture {
    events: Vec<CaptureEvent>,
}

impl HeadlessCapture {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events in order
    pub fn events(&self) -> &[CaptureEvent] {
        &self.events
    }

    /// Number of captures issued for a portal
    pub fn capture_count(&self, portal: PortalId) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, CaptureEvent::Captured { portal: p, .. } if *p == portal))
            .count()
    }

    /// Number of clears issued for a portal
    pub fn clear_count(&self, portal: PortalId) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, CaptureEvent::Cleared { portal: p, .. } if *p == portal))
            .count()
    }

    /// Most recent capture for a portal
    pub fn last_capture(&self, portal: PortalId) -> Option<&CaptureEvent> {
        self.events
            .iter()
            .rev()
            .find(|e| matches!(e, CaptureEvent::Captured { .. }) && e.portal() == portal)
    }

    /// Forget recorded events
    pub fn reset(&mut self) {
        self.events.clear();
    }
}

impl CaptureBackend for HeadlessCapture {
    fn clear(&mut self, portal: PortalId, _target: &RenderTarget, color: LinearColor) {
        self.events.push(CaptureEvent::Cleared { portal, color });
    }

    fn capture(&mut self, portal: PortalId, camera: &VirtualCamera) {
        self.events.push(CaptureEvent::Captured {
            portal,
            transform: camera.transform,
            size: camera.target.size(),
            clip_plane: camera.clip_plane,
            camera_cut: camera.camera_cut,
        });
    }
}
