//! # Core Engine Module
//!
//! Shared abstractions used by every subsystem. Currently this is the
//! unified configuration for the portal engine.

pub mod config;

pub use config::{
    ApplicationConfig,
    EngineConfig,
    PortalConfig,
    PlacementConfig,
};
pub use crate::config::{Config, ConfigError};
