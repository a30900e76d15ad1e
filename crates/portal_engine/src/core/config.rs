//! # Unified Configuration System
//!
//! All configuration structures for the portal engine in one place.
//!
//! ## Configuration Categories
//!
//! - **Engine Config**: logging and debug behaviour
//! - **Portal Config**: view synthesis and tracking volumes
//! - **Placement Config**: how the portal gun fits portals onto walls
//! - **Application Config**: the top-level file a host loads

use serde::{Serialize, Deserialize};

use crate::config::{Config, ConfigError};
use crate::foundation::math::Vec2;
use crate::physics::CollisionChannels;
use crate::render::LinearColor;

/// # Engine Configuration
///
/// Core engine behaviour shared by every subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Default log filter (overridden by `RUST_LOG`)
    pub log_level: String,
    /// Raise logging to at least `debug` regardless of `log_level`
    pub debug_mode: bool,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            debug_mode: false,
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable debug mode
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug_mode = enabled;
        self
    }

    /// Log filter to initialize logging with
    pub fn log_filter(&self) -> &str {
        let verbose = matches!(self.log_level.to_ascii_lowercase().as_str(), "debug" | "trace");
        if self.debug_mode && !verbose {
            "debug"
        } else {
            self.log_level.as_str()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Portal Configuration
///
/// Per-portal rendering and tracking parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Offscreen buffer size as a fraction of the player's viewport
    pub render_scale: f32,
    /// Distance behind the linked portal surface where the near clip plane sits
    pub clip_plane_offset: f32,
    /// Half-depth of the trigger volume along the portal normal
    pub trigger_depth: f32,
    /// Extra half-extent added around the passable rectangle for the trigger volume
    pub trigger_margin: f32,
    /// Half-depth of the portal surface volume used for duplicate visibility
    pub surface_depth: f32,
    /// Colour an unlinked portal's buffer is cleared to
    pub mask_color: LinearColor,
}

impl PortalConfig {
    /// Create a new portal configuration
    pub fn new() -> Self {
        Self {
            render_scale: 1.0,
            clip_plane_offset: 1.0,
            trigger_depth: 100.0,
            trigger_margin: 20.0,
            surface_depth: 5.0,
            mask_color: LinearColor::MASK,
        }
    }

    /// Set the render scale
    pub fn with_render_scale(mut self, scale: f32) -> Self {
        self.render_scale = scale;
        self
    }

    /// Set the clip plane offset
    pub fn with_clip_plane_offset(mut self, offset: f32) -> Self {
        self.clip_plane_offset = offset;
        self
    }

    /// Set trigger volume depth and margin
    pub fn with_trigger_volume(mut self, depth: f32, margin: f32) -> Self {
        self.trigger_depth = depth;
        self.trigger_margin = margin;
        self
    }

    /// Set surface volume depth
    pub fn with_surface_depth(mut self, depth: f32) -> Self {
        self.surface_depth = depth;
        self
    }

    /// Render scale clamped to a usable range
    pub fn effective_render_scale(&self) -> f32 {
        self.render_scale.clamp(f32::EPSILON, 1.0)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.render_scale > 0.0) {
            return Err(format!("Render scale must be positive, got {}", self.render_scale));
        }
        if self.trigger_depth <= 0.0 || self.surface_depth <= 0.0 {
            return Err("Trigger and surface depths must be positive".to_string());
        }
        if self.trigger_margin < 0.0 {
            return Err("Trigger margin cannot be negative".to_string());
        }
        Ok(())
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Placement Configuration
///
/// Parameters used when firing a portal at a wall.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Full portal width
    pub portal_width: f32,
    /// Full portal height
    pub portal_height: f32,
    /// Maximum line trace distance
    pub max_distance: f32,
    /// Channels a placement trace can hit
    pub wall_channel: CollisionChannels,
}

impl PlacementConfig {
    /// Create a new placement configuration
    pub fn new() -> Self {
        Self {
            portal_width: 100.0,
            portal_height: 50.0,
            max_distance: 10_000.0,
            wall_channel: CollisionChannels::WORLD_STATIC | CollisionChannels::PORTAL_WALL,
        }
    }

    /// Set the portal size
    pub fn with_portal_size(mut self, width: f32, height: f32) -> Self {
        self.portal_width = width;
        self.portal_height = height;
        self
    }

    /// Set the maximum trace distance
    pub fn with_max_distance(mut self, distance: f32) -> Self {
        self.max_distance = distance;
        self
    }

    /// Half-width and half-height of a placed portal
    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.portal_width * 0.5, self.portal_height * 0.5)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.portal_width <= 0.0 || self.portal_height <= 0.0 {
            return Err("Portal dimensions must be positive".to_string());
        }
        if self.max_distance <= 0.0 {
            return Err("Max placement distance must be positive".to_string());
        }
        Ok(())
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Portal rendering and tracking configuration
    pub portal: PortalConfig,
    /// Portal placement configuration
    pub placement: PlacementConfig,
}

impl ApplicationConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.portal.validate().map_err(ConfigError::Invalid)?;
        self.placement.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }
}

impl Config for ApplicationConfig {}
