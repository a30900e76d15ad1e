//! Scene objects as the portal engine sees them
//!
//! Only the data portal traversal reads or writes: a root transform, what
//! kind of object it is, how it moves, and its collision state.

use crate::foundation::collections::ObjectId;
use crate::foundation::math::{Quat, Transform, Vec3};
use crate::physics::{CollisionChannels, PhysicalInteraction};

/// What an object is, for the purposes of portal traversal
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectKind {
    /// Player-controlled pawn with a first-person camera
    Pawn {
        /// Camera position relative to the root, in the root's frame
        camera_offset: Vec3,
        /// Look/control orientation, separate from the root rotation
        control_rotation: Quat,
    },
    /// Rigid body
    Body {
        /// Whether the body is simulated
        simulate_physics: bool,
    },
    /// Static prop
    Static,
    /// Cosmetic duplicate standing in for another object
    Duplicate {
        /// The object being mirrored
        source: ObjectId,
    },
}

/// Classification resolved once when an object starts being tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectClass {
    /// A pawn driven by a controller
    ControlledPawn,
    /// A body currently simulating physics
    PhysicsBody,
    /// Anything else (statics, sleeping bodies, duplicates)
    Other,
}

/// Which point of an object represents it for crossing tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// The object's camera (controlled pawns)
    Camera,
    /// The object's root
    Root,
}

/// Velocity state of a moving object
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    /// Character movement velocity
    Character {
        /// Linear velocity
        velocity: Vec3,
    },
    /// Rigid-body velocities
    Body {
        /// Linear velocity
        linear: Vec3,
        /// Angular velocity (axis * radians per second)
        angular: Vec3,
    },
}

impl Motion {
    /// Linear velocity of either variant
    pub fn linear(&self) -> Vec3 {
        match self {
            Self::Character { velocity } => *velocity,
            Self::Body { linear, .. } => *linear,
        }
    }
}

/// An object living in a [`super::SceneWorld`]
#[derive(Debug, Clone)]
pub struct SceneObject {
    /// Debug name
    pub name: String,
    /// Root transform
    pub transform: Transform,
    /// Kind of object
    pub kind: ObjectKind,
    /// Velocity state, if it moves
    pub motion: Option<Motion>,
    /// Radius of the bounding sphere around the root
    pub bounding_radius: f32,
    /// Channels the object is on
    pub channels: CollisionChannels,
    /// Grab and teleport state
    pub interaction: PhysicalInteraction,
    /// Hidden from the main render pass
    pub hidden: bool,
}

impl SceneObject {
    /// Create a player pawn
    pub fn pawn(name: impl Into<String>, position: Vec3, camera_offset: Vec3) -> Self {
        Self {
            name: name.into(),
            transform: Transform::from_position(position),
            kind: ObjectKind::Pawn {
                camera_offset,
                control_rotation: Quat::identity(),
            },
            motion: Some(Motion::Character { velocity: Vec3::zeros() }),
            bounding_radius: 40.0,
            channels: CollisionChannels::PAWN | CollisionChannels::PORTAL_WALL,
            interaction: PhysicalInteraction::default(),
            hidden: false,
        }
    }

    /// Create a simulated rigid body
    pub fn body(name: impl Into<String>, position: Vec3, radius: f32) -> Self {
        Self {
            name: name.into(),
            transform: Transform::from_position(position),
            kind: ObjectKind::Body { simulate_physics: true },
            motion: Some(Motion::Body { linear: Vec3::zeros(), angular: Vec3::zeros() }),
            bounding_radius: radius,
            channels: CollisionChannels::PHYSICS_BODY | CollisionChannels::PORTAL_WALL,
            interaction: PhysicalInteraction::default(),
            hidden: false,
        }
    }

    /// Create a static prop
    pub fn prop(name: impl Into<String>, position: Vec3, radius: f32) -> Self {
        Self {
            name: name.into(),
            transform: Transform::from_position(position),
            kind: ObjectKind::Static,
            motion: None,
            bounding_radius: radius,
            channels: CollisionChannels::WORLD_STATIC,
            interaction: PhysicalInteraction::default(),
            hidden: false,
        }
    }

    /// Builder pattern: set root rotation
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.transform.rotation = rotation;
        if let ObjectKind::Pawn { control_rotation, .. } = &mut self.kind {
            *control_rotation = rotation;
        }
        self
    }

    /// Builder pattern: set velocity (angular velocity only applies to bodies)
    pub fn with_velocity(mut self, linear: Vec3, angular: Vec3) -> Self {
        self.motion = match self.motion {
            Some(Motion::Character { .. }) => Some(Motion::Character { velocity: linear }),
            Some(Motion::Body { .. }) => Some(Motion::Body { linear, angular }),
            None => None,
        };
        self
    }

    /// Cosmetic copy of `source`: no portal channels, no simulation, hidden
    pub fn duplicate_of(source_id: ObjectId, source: &SceneObject, transform: Transform) -> Self {
        Self {
            name: format!("{}_duplicate", source.name),
            transform: Transform { scale: source.transform.scale, ..transform },
            kind: ObjectKind::Duplicate { source: source_id },
            motion: None,
            bounding_radius: source.bounding_radius,
            channels: source.channels.for_duplicate(),
            interaction: PhysicalInteraction::default(),
            hidden: true,
        }
    }

    /// Classification used for portal tracking eligibility
    pub fn class(&self) -> ObjectClass {
        match self.kind {
            ObjectKind::Pawn { .. } => ObjectClass::ControlledPawn,
            ObjectKind::Body { simulate_physics: true } => ObjectClass::PhysicsBody,
            _ => ObjectClass::Other,
        }
    }

    /// Camera transform for pawns, root transform otherwise
    pub fn view_transform(&self) -> Transform {
        match self.kind {
            ObjectKind::Pawn { camera_offset, control_rotation } => Transform::from_position_rotation(
                self.transform.transform_position_no_scale(camera_offset),
                control_rotation,
            ),
            _ => self.transform,
        }
    }

    /// Effective collision channels after grab/teleport masking
    pub fn effective_channels(&self) -> CollisionChannels {
        self.interaction.effective_channels(self.channels)
    }
}
