//! Offscreen render targets and the virtual camera that fills them

use serde::{Serialize, Deserialize};

use crate::foundation::collections::PortalId;
use crate::foundation::math::{Transform, Vec3};
use super::camera::{PostProcessSettings, Projection};

/// Linear RGBA colour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearColor {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha
    pub a: f32,
}

impl LinearColor {
    /// Opaque black
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Colour an inactive portal is cleared to so its material can mask it
    pub const MASK: Self = Self::new(1.0, 0.0, 1.0, 1.0);

    /// Create a colour
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Colour buffer a virtual camera renders into
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTarget {
    width: u32,
    height: u32,
    /// Colour the buffer clears to before a capture
    pub clear_color: LinearColor,
}

impl RenderTarget {
    /// Create a render target; dimensions are kept at least one pixel
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            clear_color: LinearColor::BLACK,
        }
    }

    /// Buffer size for a viewport at the given render scale
    pub fn scaled_size(viewport: (u32, u32), scale: f32) -> (u32, u32) {
        let scale_dimension = |d: u32| ((d as f32 * scale) as u32).max(1);
        (scale_dimension(viewport.0), scale_dimension(viewport.1))
    }

    /// Resize the buffer. Returns false when the size already matches.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        let (width, height) = (width.max(1), height.max(1));
        if self.width == width && self.height == height {
            return false;
        }
        log::trace!("Resizing portal render target {}x{} -> {}x{}", self.width, self.height, width, height);
        self.width = width;
        self.height = height;
        true
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size in pixels
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Custom near clip plane; geometry behind it (against the normal) is culled
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPlane {
    /// Point on the plane
    pub base: Vec3,
    /// Plane normal
    pub normal: Vec3,
}

/// Offscreen camera owned by a portal
#[derive(Debug, Clone)]
pub struct VirtualCamera {
    /// Buffer the capture writes to
    pub target: RenderTarget,
    /// World transform of the camera
    pub transform: Transform,
    /// Projection copied from the player's camera
    pub projection: Projection,
    /// Post-processing copied from the player's camera
    pub post_process: PostProcessSettings,
    /// Near clip plane at the linked portal's surface
    pub clip_plane: Option<ClipPlane>,
    /// Discard history (motion blur, temporal reuse) on the next capture
    pub camera_cut: bool,
}

impl VirtualCamera {
    /// Create a virtual camera rendering into a buffer of the given size
    pub fn new(size: (u32, u32)) -> Self {
        Self {
            target: RenderTarget::new(size.0, size.1),
            transform: Transform::identity(),
            projection: Projection::default(),
            post_process: PostProcessSettings::default(),
            clip_plane: None,
            camera_cut: false,
        }
    }

    /// Set the world position and orientation
    pub fn set_world_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }
}

/// Render capability the host provides for portal views
pub trait CaptureBackend {
    /// Clear a portal's buffer to a solid colour
    fn clear(&mut self, portal: PortalId, target: &RenderTarget, color: LinearColor);

    /// Render the scene from the virtual camera into its buffer
    fn capture(&mut self, portal: PortalId, camera: &VirtualCamera);
}
