//! Physics module for the geometric queries portal traversal needs
//!
//! Provides plane and box primitives for crossing tests and overlap volumes,
//! and collision channels for filtering. Integration of motion itself is left
//! to the host engine.

pub mod primitives;
pub mod collision_channels;

pub use primitives::{Ray, Plane, OrientedBox};
pub use collision_channels::{CollisionChannels, PhysicalInteraction};
