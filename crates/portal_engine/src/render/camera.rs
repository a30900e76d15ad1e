//! # Camera Settings
//!
//! Projection and post-processing parameters shared between the player's
//! camera and the virtual cameras that render each portal's view.
//!
//! ## Design Principles
//! - **Library-agnostic**: no graphics API types; backends read plain data
//! - **Copyable**: a portal copies the player's settings every frame
//!   so perspective and grading match exactly through the opening

use serde::{Serialize, Deserialize};

use crate::foundation::collections::ObjectId;
use crate::foundation::math::{Mat4, Mat4Ext, utils};

/// Perspective projection parameters
///
/// A custom matrix, when present, overrides the derived perspective so
/// off-axis or oblique frusta set by the host pass through untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Aspect ratio (width / height)
    pub aspect: f32,
    /// Distance to near clipping plane
    pub near: f32,
    /// Distance to far clipping plane
    pub far: f32,
    /// Host-supplied projection matrix
    pub custom_matrix: Option<Mat4>,
}

impl Projection {
    /// Create a perspective projection
    ///
    /// # Arguments
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Aspect ratio (width / height) of the viewport
    /// * `near` - Distance to near clipping plane (must be > 0)
    /// * `far` - Distance to far clipping plane (must be > near)
    pub fn perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov_y: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
            custom_matrix: None,
        }
    }

    /// Use a host-supplied matrix instead of the derived perspective
    pub fn with_custom_matrix(mut self, matrix: Mat4) -> Self {
        self.custom_matrix = Some(matrix);
        self
    }

    /// Update the aspect ratio for viewport changes
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        if (self.aspect - aspect).abs() > 0.01 {
            log::debug!("Projection aspect ratio changed: {:.3} -> {:.3}", self.aspect, aspect);
        }
        self.aspect = aspect;
    }

    /// Projection matrix
    pub fn matrix(&self) -> Mat4 {
        self.custom_matrix
            .unwrap_or_else(|| Mat4::perspective(self.fov_y, self.aspect, self.near, self.far))
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::perspective(90.0, 16.0 / 9.0, 10.0, 100_000.0)
    }
}

/// Post-processing configuration carried by a camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostProcessSettings {
    /// Exposure compensation in stops
    pub exposure_bias: f32,
    /// Contrast multiplier
    pub contrast: f32,
    /// Saturation multiplier
    pub saturation: f32,
    /// Bloom strength
    pub bloom_intensity: f32,
    /// Colour grading lookup table asset, if any
    pub color_grading_lut: Option<String>,
}

impl Default for PostProcessSettings {
    fn default() -> Self {
        Self {
            exposure_bias: 0.0,
            contrast: 1.0,
            saturation: 1.0,
            bloom_intensity: 0.675,
            color_grading_lut: None,
        }
    }
}

/// The player's point of view as seen by the portal renderer
///
/// Position and orientation are read live from the pawn's camera anchor in
/// the world every time they are needed, so a teleport is reflected at once.
#[derive(Debug, Clone)]
pub struct Viewer {
    /// Pawn whose camera is the real camera
    pub pawn: ObjectId,
    /// Real camera projection
    pub projection: Projection,
    /// Real camera post-processing
    pub post_process: PostProcessSettings,
    /// Viewport size in pixels
    pub viewport: (u32, u32),
}

impl Viewer {
    /// Create a viewer for a pawn with default camera settings
    pub fn new(pawn: ObjectId, viewport: (u32, u32)) -> Self {
        let aspect = viewport.0 as f32 / viewport.1.max(1) as f32;
        Self {
            pawn,
            projection: Projection { aspect, ..Projection::default() },
            post_process: PostProcessSettings::default(),
            viewport,
        }
    }

    /// Set the projection
    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    /// Set the post-processing settings
    pub fn with_post_process(mut self, post_process: PostProcessSettings) -> Self {
        self.post_process = post_process;
        self
    }

    /// Handle a viewport resize
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
        self.projection.set_aspect_ratio(width as f32 / height.max(1) as f32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_custom_matrix_overrides_perspective() {
        let custom = Mat4::identity() * 2.0;
        let projection = Projection::default().with_custom_matrix(custom);

        assert_eq!(projection.matrix(), custom);
    }

    #[test]
    fn test_perspective_matrix_uses_fov() {
        let projection = Projection::perspective(90.0, 1.0, 1.0, 100.0);
        let matrix = projection.matrix();

        assert_relative_eq!(matrix[(1, 1)], 1.0, epsilon = 1e-5);
        assert_relative_eq!(matrix[(0, 0)], 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_viewer_resize_updates_aspect() {
        let mut viewer = Viewer::new(ObjectId::default(), (1920, 1080));
        viewer.resize(1000, 1000);

        assert_eq!(viewer.viewport, (1000, 1000));
        assert_relative_eq!(viewer.projection.aspect, 1.0);
    }
}
