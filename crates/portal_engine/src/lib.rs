//! # Portal Engine
//!
//! Linked see-through portals for a host game engine.
//!
//! ## Features
//!
//! - **Frame Mapping**: Positions, directions and orientations carried through a portal pair
//! - **Seamless Crossing**: Shadow duplicates so objects never pop while half-way through
//! - **View Synthesis**: Virtual cameras with oblique clip planes for each opening
//! - **Portal Gun Placement**: Fitting portals onto bounded walls without overlap
//! - **Headless Capture**: An in-memory backend for tests and tools
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use portal_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut world = SceneWorld::new();
//!     let player = world.spawn(SceneObject::pawn("player", Vec3::zeros(), Vec3::new(0.0, 0.0, 60.0)));
//!
//!     let mut portals = PortalSystem::new(PortalConfig::default())
//!         .with_viewer(Viewer::new(player, (1280, 720)));
//!     let mut capture = HeadlessCapture::new();
//!
//!     loop {
//!         let crossings = portals.run_frame(&mut world, &mut capture, |w| w.step_physics(1.0 / 60.0))?;
//!         for crossing in crossings {
//!             log::info!("{:?} went through {:?}", crossing.object, crossing.from);
//!         }
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;
pub mod config;

pub mod foundation;
pub mod physics;
pub mod render;
pub mod scene;
pub mod portal;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        foundation::{
            collections::{ObjectId, PortalId, WallId},
            math::{Quat, Transform, Vec2, Vec3},
        },
        physics::CollisionChannels,
        render::{CaptureBackend, HeadlessCapture, Projection, Viewer},
        scene::{ObjectWorld, SceneObject, SceneQuery, SceneWorld},
        portal::{
            Crossing, PlacementError, PortalError, PortalMapping, PortalPlacer, PortalSide,
            PortalSystem, PortalWall,
        },
        core::config::{ApplicationConfig, PlacementConfig, PortalConfig},
        config::Config,
    };
}
