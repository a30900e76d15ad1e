//! Scene objects and the capabilities the portal engine consumes
//!
//! The host engine owns the world; the portal engine only reads transforms
//! and velocities, writes corrected values back after a crossing, spawns
//! cosmetic duplicates and traces against walls.

pub mod object;
pub mod world;

pub use object::{Anchor, Motion, ObjectClass, ObjectKind, SceneObject};
pub use world::{ObjectWorld, SceneQuery, SceneWorld, TraceHit};
